use async_trait::async_trait;

use crate::{IndustryTable, Result, Symbol};

/// Bulk concept-membership source: who belongs to a named concept board.
///
/// `TushareClient` and `EastmoneyClient` implement this. Results feed the
/// cached concept pools; callers never query these per symbol.
#[async_trait]
pub trait ConceptSource: Send + Sync {
    /// Stable provider identifier, also used as the cache key.
    fn name(&self) -> &str;

    /// Members of the concept board called `concept`.
    async fn concept_members(&self, concept: &str) -> Result<Vec<Symbol>>;
}

/// Per-symbol concept-tag lookup. Uncached, one network call per symbol.
#[async_trait]
pub trait ConceptTagLookup: Send + Sync {
    fn name(&self) -> &str;

    /// Every concept label attached to `symbol`.
    async fn concept_tags(&self, symbol: &Symbol) -> Result<Vec<String>>;
}

/// Bulk reference table of listed instruments and their industry labels.
#[async_trait]
pub trait IndustryTableSource: Send + Sync {
    fn name(&self) -> &str;

    async fn industry_table(&self) -> Result<IndustryTable>;
}
