/// Exponential smoothing seeded at the first value:
/// `v[0] = x[0]`, `v[i] = alpha * x[i] + (1 - alpha) * v[i-1]`
pub struct ExponentialSmoother {
    alpha: f64,
    current: Option<f64>,
}

impl ExponentialSmoother {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            current: None,
        }
    }

    /// Wilder smoothing as used by RSI
    pub fn wilder(window: usize) -> Self {
        Self::new(1.0 / window as f64)
    }

    pub fn next(&mut self, input: f64) -> f64 {
        let value = match self.current {
            None => input,
            Some(prev) => self.alpha * input + (1.0 - self.alpha) * prev,
        };
        self.current = Some(value);
        value
    }
}
