use crate::params::ParamError;

/// Moving Average Convergence/Divergence crossover detector.
///
/// MACD line = EMA(fast) - EMA(slow), signal line = EMA(MACD, signal).
#[derive(Debug, Clone)]
pub struct MacdIndicator {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

/// Crossover state on the latest bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MacdSignal {
    /// MACD crossed above the signal line.
    Bullish,
    /// MACD crossed below the signal line.
    Bearish,
    Neutral,
}

impl MacdIndicator {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, ParamError> {
        if fast == 0 || signal == 0 {
            return Err(ParamError::invalid("fast/signal", "periods must be positive"));
        }
        if fast >= slow {
            return Err(ParamError::invalid("fast", "must be less than slow"));
        }
        if slow.checked_add(signal).is_none() {
            return Err(ParamError::invalid("slow/signal", "periods are too large"));
        }
        Ok(Self { fast, slow, signal })
    }

    /// Needs at least `slow + signal` closes (oldest first).
    pub fn compute(&self, closes: &[f64]) -> Option<MacdSignal> {
        if closes.len() < self.slow + self.signal {
            return None;
        }

        let fast = ema_series(closes, self.fast);
        let slow = ema_series(closes, self.slow);
        // Align on the slow series: both end on the last close.
        let offset = fast.len() - slow.len();
        let macd: Vec<f64> = slow
            .iter()
            .zip(&fast[offset..])
            .map(|(s, f)| f - s)
            .collect();
        let signal = ema_series(&macd, self.signal);

        let [prev_sig, curr_sig] = last_two(&signal)?;
        let [prev_macd, curr_macd] = last_two(&macd)?;

        Some(if prev_macd <= prev_sig && curr_macd > curr_sig {
            MacdSignal::Bullish
        } else if prev_macd >= prev_sig && curr_macd < curr_sig {
            MacdSignal::Bearish
        } else {
            MacdSignal::Neutral
        })
    }
}

/// EMA of `data` seeded with the SMA of its first `period` values.
///
/// Element `i` of the result corresponds to `data[i + period - 1]`.
fn ema_series(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let seed = data[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(data.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for &x in &data[period..] {
        prev = x * k + prev * (1.0 - k);
        out.push(prev);
    }
    out
}

fn last_two(values: &[f64]) -> Option<[f64; 2]> {
    match values {
        [.., a, b] => Some([*a, *b]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_periods_are_rejected() {
        assert!(MacdIndicator::new(26, 12, 9).is_err());
        assert!(MacdIndicator::new(0, 12, 9).is_err());
        assert!(MacdIndicator::new(12, 26, 0).is_err());
        assert!(MacdIndicator::new(12, usize::MAX, 9).is_err());
    }

    #[test]
    fn needs_slow_plus_signal_closes() {
        let macd = MacdIndicator::new(12, 26, 9).unwrap();
        assert!(macd.compute(&[100.0; 34]).is_none());
        let rising: Vec<f64> = (0..35).map(|i| 100.0 + i as f64).collect();
        assert!(macd.compute(&rising).is_some());
    }

    #[test]
    fn jump_after_accelerating_decline_is_bullish() {
        let macd = MacdIndicator::new(3, 6, 3).unwrap();
        let mut closes: Vec<f64> = (0..30).map(|i| 200.0 - 0.05 * (i * i) as f64).collect();
        closes.push(260.0);
        assert_eq!(macd.compute(&closes), Some(MacdSignal::Bullish));
    }

    #[test]
    fn ema_series_starts_at_sma() {
        let ema = ema_series(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(ema.len(), 2);
        assert!((ema[0] - 2.0).abs() < 1e-12);
        assert!((ema[1] - 3.0).abs() < 1e-12);
    }
}
