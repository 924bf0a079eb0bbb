pub mod macd;
pub mod rsi;

pub use macd::{MacdIndicator, MacdSignal};
pub use rsi::RsiIndicator;
