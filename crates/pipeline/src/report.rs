use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use common::Symbol;
use pool::{ResolutionReport, SymbolOutcome};

/// Result of one selector after pool resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionReport {
    pub alias: String,
    pub as_of: NaiveDate,
    /// Raw selector output, deduplicated.
    pub candidates: Vec<Symbol>,
    pub concept_passed: Vec<Symbol>,
    pub final_symbols: Vec<Symbol>,
    pub outcomes: Vec<SymbolOutcome>,
}

impl SelectionReport {
    pub fn new(
        alias: String,
        as_of: NaiveDate,
        candidates: Vec<Symbol>,
        resolution: ResolutionReport,
    ) -> Self {
        Self {
            alias,
            as_of,
            candidates,
            concept_passed: resolution.concept_passed,
            final_symbols: resolution.final_symbols,
            outcomes: resolution.outcomes,
        }
    }

    /// Write the report to the log sink.
    pub fn emit(&self) {
        info!(
            alias = %self.alias,
            date = %self.as_of,
            candidates = %join(&self.candidates),
            concept_passed = %join(&self.concept_passed),
            selected = %join(&self.final_symbols),
            "Selection result"
        );
        for outcome in &self.outcomes {
            if let SymbolOutcome::Dropped {
                symbol,
                stage,
                reason,
            } = outcome
            {
                warn!(alias = %self.alias, %symbol, %stage, %reason, "Candidate dropped");
            }
        }
    }
}

fn join(symbols: &[Symbol]) -> String {
    if symbols.is_empty() {
        return "none".to_string();
    }
    symbols
        .iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
