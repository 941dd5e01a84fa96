/// Short-horizon trend label derived from a fast vs slow simple moving
/// average. A small dead band keeps near-flat markets labelled `Sideways`
/// instead of flapping between `Up` and `Down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Sideways,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Sideways => write!(f, "sideways"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrendDetector {
    pub fast: usize,
    pub slow: usize,
}

impl TrendDetector {
    /// Relative SMA separation below which the market counts as sideways.
    const DEAD_BAND: f64 = 0.001;

    pub fn new(fast: usize, slow: usize) -> Self {
        assert!(fast < slow, "trend fast period must be less than slow period");
        Self { fast, slow }
    }

    /// Label the trend from a slice of close prices (oldest first).
    /// Returns `None` if there are fewer than `slow` values.
    pub fn compute(&self, closes: &[f64]) -> Option<Trend> {
        if closes.len() < self.slow {
            return None;
        }

        let fast_sma = sma(&closes[closes.len() - self.fast..]);
        let slow_sma = sma(&closes[closes.len() - self.slow..]);
        if slow_sma == 0.0 {
            return Some(Trend::Sideways);
        }

        let separation = (fast_sma - slow_sma) / slow_sma;
        if separation > Self::DEAD_BAND {
            Some(Trend::Up)
        } else if separation < -Self::DEAD_BAND {
            Some(Trend::Down)
        } else {
            Some(Trend::Sideways)
        }
    }
}

fn sma(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_when_insufficient_data() {
        let trend = TrendDetector::new(3, 10);
        assert!(trend.compute(&[100.0; 9]).is_none());
    }

    #[test]
    fn rising_prices_label_up() {
        let trend = TrendDetector::new(3, 10);
        let closes: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();
        assert_eq!(trend.compute(&closes), Some(Trend::Up));
    }

    #[test]
    fn falling_prices_label_down() {
        let trend = TrendDetector::new(3, 10);
        let closes: Vec<f64> = (0..12).map(|i| 100.0 - i as f64).collect();
        assert_eq!(trend.compute(&closes), Some(Trend::Down));
    }

    #[test]
    fn flat_prices_label_sideways() {
        let trend = TrendDetector::new(3, 10);
        assert_eq!(trend.compute(&[100.0; 12]), Some(Trend::Sideways));
    }
}
