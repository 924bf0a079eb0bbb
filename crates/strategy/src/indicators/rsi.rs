use crate::params::ParamError;

/// Relative Strength Index with Wilder smoothing.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    pub period: usize,
}

impl RsiIndicator {
    pub fn new(period: usize) -> Result<Self, ParamError> {
        if period < 2 {
            return Err(ParamError::invalid("period", "must be >= 2"));
        }
        Ok(Self { period })
    }

    /// RSI of the last close, or `None` with fewer than `period + 1` closes.
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        if closes.len() <= self.period {
            return None;
        }

        let n = self.period as f64;
        let mut changes = closes.windows(2).map(|w| w[1] - w[0]);

        // Plain average over the first `period` changes seeds the smoothing.
        let (mut gain, mut loss) = changes
            .by_ref()
            .take(self.period)
            .fold((0.0, 0.0), |(g, l), c| (g + c.max(0.0), l + (-c).max(0.0)));
        gain /= n;
        loss /= n;

        for c in changes {
            gain = (gain * (n - 1.0) + c.max(0.0)) / n;
            loss = (loss * (n - 1.0) + (-c).max(0.0)) / n;
        }

        if loss == 0.0 {
            return Some(100.0);
        }
        Some(100.0 - 100.0 / (1.0 + gain / loss))
    }
}
