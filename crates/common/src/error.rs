use std::time::Duration;

use thiserror::Error;

/// Boxed cause carried by errors that wrap a lower-level failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing configuration. Fatal for the run.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A selector entry could not be turned into a runnable instance.
    /// Only that entry is skipped.
    #[error("Selector '{identifier}' could not be loaded: {source}")]
    StrategyNotFound {
        identifier: String,
        #[source]
        source: BoxError,
    },

    /// No quote history was loaded. Fatal for the run.
    #[error("No market data: {0}")]
    NoData(String),

    /// A single provider call failed. The symbol fails the current stage.
    #[error("Provider '{provider}' lookup failed for {context}: {reason}")]
    ProviderLookup {
        provider: String,
        context: String,
        reason: String,
    },

    /// The industry table has no row for this symbol.
    #[error("Symbol {0} is not listed in the industry table")]
    SymbolNotListed(String),

    #[error("Provider '{provider}' timed out after {after:?}")]
    Timeout { provider: String, after: Duration },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn lookup(
        provider: impl Into<String>,
        context: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Error::ProviderLookup {
            provider: provider.into(),
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// True for errors that must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::NoData(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
