use nalgebra::RealField;

/// Returns the binomial coefficient of `n` and `k`.
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.;
    }
    if k == 0 || k == n {
        return 1.;
    }

    let k = k.min(n - k);
    let mut r = 1.;
    for i in 0..k {
        r = r * (n - i) as f64 / (i + 1) as f64;
    }
    r
}

/// Pascal triangle cache of binomial coefficients.
/// Owned by the caller, so its lifetime is one evaluation (or one algorithm run).
#[derive(Clone, Debug)]
pub struct Binomial<T> {
    rows: Vec<Vec<T>>,
}

impl<T: RealField + Copy> Default for Binomial<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RealField + Copy> Binomial<T> {
    pub fn new() -> Self {
        Self {
            rows: vec![vec![T::one()]],
        }
    }

    /// Returns the binomial coefficient of `n` and `k`, growing the triangle on demand.
    pub fn get(&mut self, n: usize, k: usize) -> T {
        if k > n {
            return T::zero();
        }

        while self.rows.len() <= n {
            let prev = &self.rows[self.rows.len() - 1];
            let mut row = Vec::with_capacity(prev.len() + 1);
            row.push(T::one());
            for i in 1..prev.len() {
                row.push(prev[i - 1] + prev[i]);
            }
            row.push(T::one());
            self.rows.push(row);
        }

        self.rows[n][k]
    }
}

#[cfg(test)]
mod tests {
    use super::{binomial, Binomial};

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(5, 0), 1.);
        assert_eq!(binomial(5, 1), 5.);
        assert_eq!(binomial(5, 2), 10.);
        assert_eq!(binomial(5, 3), 10.);
        assert_eq!(binomial(5, 5), 1.);
        assert_eq!(binomial(5, 6), 0.);
        assert_eq!(binomial(0, 0), 1.);
    }

    #[test]
    fn test_pascal_cache() {
        let mut cache = Binomial::<f64>::new();
        for n in 0..12 {
            for k in 0..=n + 1 {
                assert_eq!(cache.get(n, k), binomial(n, k));
            }
        }
        // querying a smaller row after growing keeps values intact
        assert_eq!(cache.get(4, 2), 6.);
    }
}
