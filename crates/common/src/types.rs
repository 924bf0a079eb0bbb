use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Bare instrument code as used in quote files and selector output, e.g. `600001`.
///
/// Providers that need an exchange-qualified code go through [`Symbol::ts_code`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exchange-qualified code: `6xxxxx`/`9xxxxx` trade in Shanghai, everything else in Shenzhen.
    pub fn ts_code(&self) -> String {
        if self.0.starts_with(['6', '9']) {
            format!("{}.SH", self.0)
        } else {
            format!("{}.SZ", self.0)
        }
    }

    /// Strip an exchange suffix (`600001.SH` -> `600001`).
    pub fn from_qualified(qualified: &str) -> Self {
        let bare = qualified
            .split_once('.')
            .map(|(code, _)| code)
            .unwrap_or(qualified);
        Self(bare.to_string())
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for Symbol {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// One daily observation for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
}

/// Per-symbol bar history, each series ascending by date.
pub type SeriesMap = BTreeMap<Symbol, Vec<Bar>>;

/// Bars of `series` dated on or before `date`.
pub fn bars_until(series: &[Bar], date: NaiveDate) -> &[Bar] {
    let end = series.partition_point(|b| b.date <= date);
    &series[..end]
}

/// Concepts and industries that define which symbols are eligible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetUniverse {
    #[serde(default, alias = "targetIndustries")]
    pub target_industries: BTreeSet<String>,
    #[serde(default, alias = "targetConcepts")]
    pub target_concepts: BTreeSet<String>,
}

impl TargetUniverse {
    pub fn new<I, C>(industries: I, concepts: C) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            target_industries: industries.into_iter().map(Into::into).collect(),
            target_concepts: concepts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_concept<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|t| self.target_concepts.contains(t.as_ref()))
    }
}

/// One row of the listed-instrument reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryRow {
    /// Exchange-qualified code, e.g. `600001.SH`.
    pub ts_code: String,
    pub name: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndustryTable {
    pub rows: Vec<IndustryRow>,
}

impl IndustryTable {
    pub fn new(rows: Vec<IndustryRow>) -> Self {
        Self { rows }
    }

    /// First row whose qualified code starts with the bare symbol.
    pub fn lookup(&self, symbol: &Symbol) -> Option<&IndustryRow> {
        self.rows
            .iter()
            .find(|row| row.ts_code.starts_with(symbol.as_str()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
