//! On-disk concept pools, one JSON file per provider.
//!
//! A cached pool never expires: it is reused verbatim until the file is
//! deleted. Writes go to a temporary file that is renamed into place, so a
//! concurrent reader sees either the old pool or the new one.

use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use common::{ConceptSource, Error, Result, Symbol};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPool {
    pub provider: String,
    /// Target concepts the pool was built from.
    pub concepts: BTreeSet<String>,
    pub fetched_at: DateTime<Utc>,
    pub symbols: BTreeSet<Symbol>,
}

#[derive(Debug, Clone)]
pub struct PoolCache {
    dir: PathBuf,
}

impl PoolCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, provider: &str) -> PathBuf {
        self.dir.join(format!("{provider}_concepts.json"))
    }

    /// Read the cached pool for `provider`, if one exists.
    pub fn load(&self, provider: &str) -> Result<Option<CachedPool>> {
        let path = self.path(provider);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        let pool = serde_json::from_str(&json)?;
        Ok(Some(pool))
    }

    /// Persist a pool atomically, creating the cache directory if needed.
    pub fn store(
        &self,
        provider: &str,
        concepts: &BTreeSet<String>,
        symbols: &HashSet<Symbol>,
    ) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let pool = CachedPool {
            provider: provider.to_string(),
            concepts: concepts.clone(),
            fetched_at: Utc::now(),
            symbols: symbols.iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&pool)?;

        let path = self.path(provider);
        let tmp = self
            .dir
            .join(format!(".{provider}_concepts.{}.tmp", std::process::id()));
        std::fs::write(&tmp, json)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Delete the cached pool. Returns whether a file was removed.
    pub fn invalidate(&self, provider: &str) -> Result<bool> {
        let path = self.path(provider);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }

    /// Move an unreadable cache file aside so the next load refetches.
    fn quarantine(&self, provider: &str, reason: &serde_json::Error) {
        let path = self.path(provider);
        let target = path.with_extension("json.quarantined");
        warn!(
            provider,
            error = %reason,
            path = %path.display(),
            "Cached concept pool is corrupt, quarantining and refetching"
        );
        if let Err(e) = std::fs::rename(&path, &target) {
            warn!(provider, error = %e, "Failed to quarantine cache file, removing it");
            let _ = std::fs::remove_file(&path);
        }
    }

    /// Return the cached pool for `provider`, or run `fetch` and cache its result.
    ///
    /// A cache file that cannot be parsed is quarantined and treated as a miss.
    /// A failed fetch is returned as-is and nothing is written.
    pub async fn load_or_fetch<F, Fut>(
        &self,
        provider: &str,
        concepts: &BTreeSet<String>,
        fetch: F,
    ) -> Result<HashSet<Symbol>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<HashSet<Symbol>>>,
    {
        let cached = match self.load(provider) {
            Ok(cached) => cached,
            Err(Error::Json(e)) => {
                self.quarantine(provider, &e);
                None
            }
            Err(e) => return Err(e),
        };

        if let Some(cached) = cached {
            if &cached.concepts != concepts {
                warn!(
                    provider,
                    cached = ?cached.concepts,
                    "Cached concept pool was built for different target concepts; delete it to refresh"
                );
            }
            info!(provider, symbols = cached.symbols.len(), "Concept pool loaded from cache");
            return Ok(cached.symbols.into_iter().collect());
        }

        let symbols = fetch().await?;
        if let Err(e) = self.store(provider, concepts, &symbols) {
            warn!(provider, error = %e, "Failed to persist concept pool");
        } else {
            info!(provider, symbols = symbols.len(), "Concept pool fetched and cached");
        }
        Ok(symbols)
    }
}

/// Union of the members of every target concept on one provider.
///
/// A concept whose query fails (or times out) is logged and left out. If
/// every concept fails the whole fetch fails, so an empty pool is never cached
/// because of an outage.
pub async fn fetch_concept_pool(
    source: &dyn ConceptSource,
    concepts: &BTreeSet<String>,
    timeout: Duration,
) -> Result<HashSet<Symbol>> {
    let mut pool = HashSet::new();
    let mut failed = 0usize;

    for concept in concepts {
        let result = match tokio::time::timeout(timeout, source.concept_members(concept)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                provider: source.name().to_string(),
                after: timeout,
            }),
        };
        match result {
            Ok(members) => pool.extend(members),
            Err(e) => {
                failed += 1;
                warn!(provider = source.name(), %concept, error = %e, "Concept query failed, omitting");
            }
        }
    }

    if !concepts.is_empty() && failed == concepts.len() {
        return Err(Error::lookup(
            source.name(),
            "concept pool",
            "every concept query failed",
        ));
    }
    Ok(pool)
}
