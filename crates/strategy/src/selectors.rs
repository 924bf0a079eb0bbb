use chrono::NaiveDate;

use common::{bars_until, Bar, SeriesMap, Symbol};

use crate::indicators::{MacdIndicator, MacdSignal, RsiIndicator};
use crate::params::{ParamError, Params};
use crate::Selector;

/// Run `pick` over every symbol's history up to `date`, keeping map order.
fn scan<F>(date: NaiveDate, data: &SeriesMap, mut pick: F) -> Vec<Symbol>
where
    F: FnMut(&[Bar]) -> bool,
{
    data.iter()
        .filter_map(|(symbol, series)| {
            let history = bars_until(series, date);
            (!history.is_empty() && pick(history)).then(|| symbol.clone())
        })
        .collect()
}

fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

// ─── RSI ──────────────────────────────────────────────────────────────────────

/// Picks symbols whose RSI on the trade date is at or below `oversold`.
pub struct RsiOversoldSelector {
    indicator: RsiIndicator,
    oversold: f64,
}

impl RsiOversoldSelector {
    pub const IDENTIFIER: &'static str = "RsiOversoldSelector";

    pub fn from_params(params: &Params) -> Result<Self, ParamError> {
        let indicator = RsiIndicator::new(params.usize("period", 14)?)?;
        let oversold = params.f64("oversold", 30.0)?;
        if !(0.0..=100.0).contains(&oversold) {
            return Err(ParamError::invalid("oversold", "must be within 0..=100"));
        }
        Ok(Self {
            indicator,
            oversold,
        })
    }
}

impl Selector for RsiOversoldSelector {
    fn select(&self, date: NaiveDate, data: &SeriesMap) -> Vec<Symbol> {
        scan(date, data, |bars| {
            self.indicator
                .compute(&closes(bars))
                .is_some_and(|rsi| rsi <= self.oversold)
        })
    }
}

// ─── MACD ─────────────────────────────────────────────────────────────────────

/// Picks symbols whose MACD line crossed above its signal line on the trade date.
pub struct MacdCrossSelector {
    indicator: MacdIndicator,
}

impl MacdCrossSelector {
    pub const IDENTIFIER: &'static str = "MacdCrossSelector";

    pub fn from_params(params: &Params) -> Result<Self, ParamError> {
        let indicator = MacdIndicator::new(
            params.usize("fast", 12)?,
            params.usize("slow", 26)?,
            params.usize("signal", 9)?,
        )?;
        Ok(Self { indicator })
    }
}

impl Selector for MacdCrossSelector {
    fn select(&self, date: NaiveDate, data: &SeriesMap) -> Vec<Symbol> {
        scan(date, data, |bars| {
            self.indicator.compute(&closes(bars)) == Some(MacdSignal::Bullish)
        })
    }
}

// ─── Breakout ─────────────────────────────────────────────────────────────────

/// Picks symbols closing above the highest high of the previous `lookback`
/// bars on at least `volume_ratio` times their average volume.
pub struct BreakoutVolumeSelector {
    lookback: usize,
    volume_ratio: f64,
}

impl BreakoutVolumeSelector {
    pub const IDENTIFIER: &'static str = "BreakoutVolumeSelector";

    pub fn from_params(params: &Params) -> Result<Self, ParamError> {
        let lookback = params.usize("lookback", 20)?;
        if lookback == 0 {
            return Err(ParamError::invalid("lookback", "must be positive"));
        }
        let volume_ratio = params.f64("volume_ratio", 2.0)?;
        if volume_ratio <= 0.0 {
            return Err(ParamError::invalid("volume_ratio", "must be positive"));
        }
        Ok(Self {
            lookback,
            volume_ratio,
        })
    }

    fn is_breakout(&self, bars: &[Bar]) -> bool {
        let Some((today, before)) = bars.split_last() else {
            return false;
        };
        if before.len() < self.lookback {
            return false;
        }
        let window = &before[before.len() - self.lookback..];
        let prior_high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let avg_volume = window.iter().map(|b| b.volume).sum::<f64>() / window.len() as f64;
        today.close > prior_high && today.volume >= avg_volume * self.volume_ratio
    }
}

impl Selector for BreakoutVolumeSelector {
    fn select(&self, date: NaiveDate, data: &SeriesMap) -> Vec<Symbol> {
        scan(date, data, |bars| self.is_breakout(bars))
    }
}
