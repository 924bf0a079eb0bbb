pub mod config;
pub mod indicators;
pub mod params;
pub mod registry;
pub mod runner;
pub mod selectors;

pub use config::{load_selector_configs, parse_selector_configs, SelectorConfig};
pub use params::{ParamError, Params};
pub use registry::{SelectorFactory, SelectorRegistry};
pub use runner::{RunOutcome, SelectorPicks, SkippedSelector, StrategyRunner};

use chrono::NaiveDate;
use common::{SeriesMap, Symbol};

/// All selector implementations must satisfy this trait.
pub trait Selector: Send + Sync {
    /// Symbols matching the pattern on `date`, in a stable order.
    ///
    /// Only bars dated on or before `date` may influence the decision.
    /// Implementations may keep internal state; callers must not assume
    /// repeated calls with different inputs are independent.
    fn select(&self, date: NaiveDate, data: &SeriesMap) -> Vec<Symbol>;
}
