//! Local quote history: one CSV file per symbol under a data directory.
//!
//! Files are produced by the downloader with a `date,open,close,high,low,volume`
//! header. Extra columns are ignored.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use common::{Bar, Error, Result, SeriesMap, Symbol};

pub struct CsvStore {
    data_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct BarRecord {
    date: String,
    open: f64,
    close: f64,
    high: f64,
    low: f64,
    volume: f64,
}

impl CsvStore {
    /// Open a data directory. The directory must exist.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        if !data_dir.is_dir() {
            return Err(Error::Config(format!(
                "data directory {} does not exist",
                data_dir.display()
            )));
        }
        Ok(Self { data_dir })
    }

    fn csv_path(&self, symbol: &Symbol) -> PathBuf {
        self.data_dir.join(format!("{symbol}.csv"))
    }

    /// Every symbol with a quote file, sorted.
    pub fn list_symbols(&self) -> Result<Vec<Symbol>> {
        let mut symbols: Vec<Symbol> = std::fs::read_dir(&self.data_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("csv"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(Symbol::from))
            .collect();
        symbols.sort();
        Ok(symbols)
    }

    /// Load the series of each requested symbol.
    ///
    /// Missing or unreadable files are logged and skipped; they never abort the load.
    pub fn load_series(&self, symbols: &[Symbol]) -> SeriesMap {
        let mut series = SeriesMap::new();
        for symbol in symbols {
            let path = self.csv_path(symbol);
            if !path.exists() {
                warn!(file = %path.display(), "Quote file missing, skipping");
                continue;
            }
            match read_bars(&path) {
                Ok(bars) if bars.is_empty() => {
                    warn!(%symbol, "Quote file has no rows, skipping");
                }
                Ok(bars) => {
                    debug!(%symbol, bars = bars.len(), "Loaded quote history");
                    series.insert(symbol.clone(), bars);
                }
                Err(e) => warn!(%symbol, error = %e, "Failed to read quote file, skipping"),
            }
        }
        series
    }
}

/// Parse one quote file, sorted ascending and deduplicated by date.
pub fn read_bars(path: &Path) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::Parse(format!("{}: {e}", path.display())))?;

    let mut bars = Vec::new();
    for record in reader.deserialize::<BarRecord>() {
        let record = record.map_err(|e| Error::Parse(format!("{}: {e}", path.display())))?;
        bars.push(Bar {
            date: parse_date(&record.date)?,
            open: record.open,
            close: record.close,
            high: record.high,
            low: record.low,
            volume: record.volume,
        });
    }

    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    Ok(bars)
}

/// Accepts `2024-01-02`, `2024-01-02 00:00:00` and `20240102`.
fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .map_err(|e| Error::Parse(format!("invalid date '{raw}': {e}")))
}

/// Latest bar date across all loaded series.
pub fn latest_date(series: &SeriesMap) -> Option<NaiveDate> {
    series
        .values()
        .filter_map(|bars| bars.last())
        .map(|bar| bar.date)
        .max()
}
