//! End-to-end selection pass: run every selector, then filter each
//! selector's candidates through the pool resolver.

mod report;

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

use common::{Error, Result, SeriesMap};
use pool::{load_universe, PoolResolver};
use strategy::{SelectorConfig, StrategyRunner};

pub use report::SelectionReport;

pub struct Pipeline {
    runner: StrategyRunner,
    resolver: PoolResolver,
    universe_path: PathBuf,
}

impl Pipeline {
    pub fn new(
        runner: StrategyRunner,
        resolver: PoolResolver,
        universe_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            resolver,
            universe_path: universe_path.into(),
        }
    }

    /// Run one selection pass.
    ///
    /// `as_of` defaults to the latest bar date across `series`. Empty data and
    /// an unreadable universe file abort the pass; everything else degrades
    /// the affected selector or symbol only.
    pub async fn run(
        &self,
        configs: &[SelectorConfig],
        as_of: Option<NaiveDate>,
        series: &SeriesMap,
    ) -> Result<Vec<SelectionReport>> {
        let date = match as_of {
            Some(date) => date,
            None => store::latest_date(series)
                .ok_or_else(|| Error::NoData("no bars in any loaded series".into()))?,
        };
        info!(%date, symbols = series.len(), selectors = configs.len(), "Starting selection pass");

        let outcome = self.runner.run(configs, date, series)?;
        if !outcome.skipped.is_empty() {
            info!(skipped = outcome.skipped.len(), "Some selector entries were skipped");
        }

        let universe = load_universe(&self.universe_path)?;

        let mut reports = Vec::with_capacity(outcome.picks.len());
        for picks in outcome.picks {
            let resolution = self.resolver.resolve(&picks.candidates, &universe).await;
            let report =
                SelectionReport::new(picks.alias, picks.date, picks.candidates, resolution);
            report.emit();
            reports.push(report);
        }
        Ok(reports)
    }
}
