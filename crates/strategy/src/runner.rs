use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{info, warn};

use common::{Error, Result, SeriesMap, Symbol};

use crate::config::SelectorConfig;
use crate::registry::SelectorRegistry;

/// Candidates produced by one activated selector.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorPicks {
    pub alias: String,
    pub date: NaiveDate,
    pub candidates: Vec<Symbol>,
}

/// A config entry that could not be turned into a selector.
#[derive(Debug)]
pub struct SkippedSelector {
    /// Position of the entry in the configuration document.
    pub index: usize,
    pub name: String,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct RunOutcome {
    pub picks: Vec<SelectorPicks>,
    pub skipped: Vec<SkippedSelector>,
}

/// Runs every activated selector entry against the loaded history, in config order.
pub struct StrategyRunner {
    registry: SelectorRegistry,
}

impl StrategyRunner {
    pub fn new(registry: SelectorRegistry) -> Self {
        Self { registry }
    }

    /// An empty `data` map is fatal. A bad entry is logged, recorded in
    /// `skipped`, and the run moves on to the next entry.
    pub fn run(
        &self,
        configs: &[SelectorConfig],
        date: NaiveDate,
        data: &SeriesMap,
    ) -> Result<RunOutcome> {
        if data.is_empty() {
            return Err(Error::NoData("no quote history loaded".into()));
        }

        let mut outcome = RunOutcome::default();
        for (index, cfg) in configs.iter().enumerate() {
            if !cfg.activate {
                continue;
            }

            let (alias, selector) = match self.registry.resolve(cfg) {
                Ok(resolved) => resolved,
                Err(error) => {
                    warn!(index, selector = %cfg.display_name(), %error, "Skipping selector entry");
                    outcome.skipped.push(SkippedSelector {
                        index,
                        name: cfg.display_name().to_string(),
                        error,
                    });
                    continue;
                }
            };

            let candidates = dedup(selector.select(date, data));
            info!(%alias, %date, count = candidates.len(), "Selector finished");
            outcome.picks.push(SelectorPicks {
                alias,
                date,
                candidates,
            });
        }
        Ok(outcome)
    }
}

/// Drop repeated symbols, keeping the first occurrence.
fn dedup(symbols: Vec<Symbol>) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
