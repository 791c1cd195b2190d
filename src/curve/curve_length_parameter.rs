/// A curve parameter paired with the arc length from the start of the curve to that parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveLengthParameter<T: Copy> {
    parameter: T,
    length: T,
}

impl<T: Copy> CurveLengthParameter<T> {
    pub fn new(parameter: T, length: T) -> Self {
        Self { parameter, length }
    }

    pub fn parameter(&self) -> T {
        self.parameter
    }

    pub fn length(&self) -> T {
        self.length
    }
}
