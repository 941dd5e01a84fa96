/// Realized volatility gauge: population standard deviation of
/// close-to-close percentage returns over the last `period` bars.
/// Values are in percent (0.5 means 0.5% per bar).
#[derive(Debug, Clone)]
pub struct VolatilityGauge {
    pub period: usize,
}

impl VolatilityGauge {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "volatility period must be >= 2");
        Self { period }
    }

    /// Compute from a slice of close prices (oldest first).
    /// Returns `None` if there are fewer than `period + 1` values.
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        if closes.len() < self.period + 1 {
            return None;
        }

        let window = &closes[closes.len() - (self.period + 1)..];
        let returns: Vec<f64> = window
            .windows(2)
            .filter(|w| w[0] != 0.0)
            .map(|w| (w[1] - w[0]) / w[0] * 100.0)
            .collect();
        if returns.is_empty() {
            return Some(0.0);
        }

        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let variance =
            returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
        Some(variance.sqrt())
    }
}
