/// A struct representing the intersection of two objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection<P, T0, T1> {
    /// The point & parameter of the first object at the intersection.
    a: (P, T0),
    /// The point & parameter of the second object at the intersection.
    b: (P, T1),
}

impl<P, T0, T1> Intersection<P, T0, T1> {
    pub fn new(a: (P, T0), b: (P, T1)) -> Self {
        Self { a, b }
    }

    pub fn a(&self) -> &(P, T0) {
        &self.a
    }

    pub fn b(&self) -> &(P, T1) {
        &self.b
    }

    pub fn as_tuple(self) -> ((P, T0), (P, T1)) {
        (self.a, self.b)
    }
}

impl<P, T0: Copy, T1: Copy> Intersection<P, T0, T1> {
    pub fn a_parameter(&self) -> T0 {
        self.a.1
    }

    pub fn b_parameter(&self) -> T1 {
        self.b.1
    }
}
