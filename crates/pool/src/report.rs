use std::fmt;

use serde::Serialize;

use common::Symbol;

/// Resolution stage at which a symbol was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Concept,
    Industry,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Concept => write!(f, "concept"),
            Stage::Industry => write!(f, "industry"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropReason {
    /// Every membership source answered, none said member.
    NotInConcepts,
    /// A provider call failed; the symbol is excluded rather than admitted.
    LookupFailed { provider: String, reason: String },
    IndustryMismatch { industry: Option<String> },
    /// No row for the symbol in the industry table.
    NotListed,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NotInConcepts => write!(f, "not in target concepts"),
            DropReason::LookupFailed { provider, reason } => {
                write!(f, "{provider} lookup failed: {reason}")
            }
            DropReason::IndustryMismatch { industry: Some(i) } => {
                write!(f, "industry '{i}' not targeted")
            }
            DropReason::IndustryMismatch { industry: None } => write!(f, "no industry label"),
            DropReason::NotListed => write!(f, "not listed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SymbolOutcome {
    Passed {
        symbol: Symbol,
        /// Membership source that admitted the symbol.
        matched_by: String,
        industry: Option<String>,
    },
    Dropped {
        symbol: Symbol,
        stage: Stage,
        reason: DropReason,
    },
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &Symbol {
        match self {
            SymbolOutcome::Passed { symbol, .. } | SymbolOutcome::Dropped { symbol, .. } => symbol,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, SymbolOutcome::Passed { .. })
    }
}

/// Everything the resolver decided for one candidate list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionReport {
    /// Survivors of the concept stage, in candidate order.
    pub concept_passed: Vec<Symbol>,
    /// Survivors of both stages, in candidate order.
    pub final_symbols: Vec<Symbol>,
    /// One entry per candidate, in candidate order.
    pub outcomes: Vec<SymbolOutcome>,
}

impl ResolutionReport {
    /// Symbols dropped because a provider could not answer.
    pub fn failures(&self) -> impl Iterator<Item = &SymbolOutcome> {
        self.outcomes.iter().filter(|o| {
            matches!(
                o,
                SymbolOutcome::Dropped {
                    reason: DropReason::LookupFailed { .. },
                    ..
                }
            )
        })
    }
}
