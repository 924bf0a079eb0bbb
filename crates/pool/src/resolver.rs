//! Two-stage candidate filter: concept membership, then industry.
//!
//! Stage A asks a chain of membership sources ordered by cost (cached pools
//! first, then the live per-symbol tag lookup) and admits a symbol at the
//! first `Member`. Live lookups for different symbols run concurrently, but
//! results are put back into candidate order before Stage B.
//!
//! Stage B only runs when the universe names target industries.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use common::{
    ConceptSource, ConceptTagLookup, Config, Error, IndustryTable, IndustryTableSource, Symbol,
    TargetUniverse,
};

use crate::cache::{fetch_concept_pool, PoolCache};
use crate::membership::{Membership, MembershipCheck, PoolMembership, TagLookupMembership};
use crate::report::{DropReason, ResolutionReport, Stage, SymbolOutcome};

#[derive(Debug, Clone, Copy)]
pub struct ResolverSettings {
    /// Deadline for each individual provider call.
    pub provider_timeout: Duration,
    /// Symbols checked concurrently during Stage A.
    pub lookup_concurrency: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(15),
            lookup_concurrency: 4,
        }
    }
}

impl ResolverSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            provider_timeout: cfg.provider_timeout,
            lookup_concurrency: cfg.lookup_concurrency,
        }
    }
}

type ConceptVerdict = std::result::Result<String, DropReason>;

pub struct PoolResolver {
    cache: PoolCache,
    /// Bulk pool providers, cheapest first.
    pools: Vec<Arc<dyn ConceptSource>>,
    tags: Arc<dyn ConceptTagLookup>,
    industries: Arc<dyn IndustryTableSource>,
    settings: ResolverSettings,
}

impl PoolResolver {
    pub fn new(
        cache: PoolCache,
        pools: Vec<Arc<dyn ConceptSource>>,
        tags: Arc<dyn ConceptTagLookup>,
        industries: Arc<dyn IndustryTableSource>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            cache,
            pools,
            tags,
            industries,
            settings,
        }
    }

    pub fn cache(&self) -> &PoolCache {
        &self.cache
    }

    /// Filter `candidates` against `universe`.
    ///
    /// Never fails: provider errors drop the affected symbols and are
    /// recorded in the report. With no target concepts every candidate is
    /// dropped without touching a provider or the cache.
    pub async fn resolve(
        &self,
        candidates: &[Symbol],
        universe: &TargetUniverse,
    ) -> ResolutionReport {
        if candidates.is_empty() {
            return ResolutionReport::default();
        }
        // Nothing can match, and an empty pool must not be cached.
        if universe.target_concepts.is_empty() {
            warn!(
                candidates = candidates.len(),
                "No target concepts configured, dropping every candidate"
            );
            return ResolutionReport {
                outcomes: candidates
                    .iter()
                    .map(|symbol| SymbolOutcome::Dropped {
                        symbol: symbol.clone(),
                        stage: Stage::Concept,
                        reason: DropReason::NotInConcepts,
                    })
                    .collect(),
                ..ResolutionReport::default()
            };
        }

        let chain = self.membership_chain(universe).await;
        let verdicts = self.concept_stage(&chain, candidates, universe).await;

        let mut report = ResolutionReport::default();
        let mut survivors = Vec::new();
        let mut outcomes: Vec<Option<SymbolOutcome>> = vec![None; candidates.len()];

        for (index, (symbol, verdict)) in candidates.iter().zip(verdicts).enumerate() {
            match verdict {
                Ok(source) => {
                    report.concept_passed.push(symbol.clone());
                    survivors.push((index, source));
                }
                Err(reason) => {
                    outcomes[index] = Some(SymbolOutcome::Dropped {
                        symbol: symbol.clone(),
                        stage: Stage::Concept,
                        reason,
                    });
                }
            }
        }
        info!(
            candidates = candidates.len(),
            passed = report.concept_passed.len(),
            "Concept stage finished"
        );

        if universe.target_industries.is_empty() {
            for (index, source) in survivors {
                outcomes[index] = Some(SymbolOutcome::Passed {
                    symbol: candidates[index].clone(),
                    matched_by: source,
                    industry: None,
                });
            }
            report.final_symbols = report.concept_passed.clone();
        } else if !survivors.is_empty() {
            let table = match self.industries.industry_table().await {
                Ok(table) => Ok(table),
                Err(e) => {
                    warn!(
                        provider = self.industries.name(),
                        stage = %Stage::Industry,
                        error = %e,
                        "Industry table unavailable, dropping all survivors"
                    );
                    Err(e.to_string())
                }
            };

            for (index, source) in survivors {
                let symbol = &candidates[index];
                let outcome = match &table {
                    Ok(table) => industry_outcome(table, symbol, source, universe),
                    Err(reason) => SymbolOutcome::Dropped {
                        symbol: symbol.clone(),
                        stage: Stage::Industry,
                        reason: DropReason::LookupFailed {
                            provider: self.industries.name().to_string(),
                            reason: reason.clone(),
                        },
                    },
                };
                if outcome.passed() {
                    report.final_symbols.push(symbol.clone());
                }
                outcomes[index] = Some(outcome);
            }
            info!(
                passed = report.final_symbols.len(),
                industries = universe.target_industries.len(),
                "Industry stage finished"
            );
        }

        report.outcomes = outcomes.into_iter().flatten().collect();
        report
    }

    /// Cached pools in provider order, followed by the live tag lookup.
    async fn membership_chain(&self, universe: &TargetUniverse) -> Vec<Box<dyn MembershipCheck>> {
        let mut chain: Vec<Box<dyn MembershipCheck>> = Vec::with_capacity(self.pools.len() + 1);

        for source in &self.pools {
            let provider = source.name();
            let pool = match self
                .cache
                .load_or_fetch(provider, &universe.target_concepts, || {
                    fetch_concept_pool(
                        source.as_ref(),
                        &universe.target_concepts,
                        self.settings.provider_timeout,
                    )
                })
                .await
            {
                Ok(pool) => pool,
                Err(e) => {
                    warn!(provider, error = %e, "Concept pool unavailable, continuing without it");
                    HashSet::new()
                }
            };
            chain.push(Box::new(PoolMembership::new(provider, pool)));
        }

        chain.push(Box::new(TagLookupMembership::new(
            Arc::clone(&self.tags),
            self.settings.provider_timeout,
        )));
        chain
    }

    async fn concept_stage(
        &self,
        chain: &[Box<dyn MembershipCheck>],
        candidates: &[Symbol],
        universe: &TargetUniverse,
    ) -> Vec<ConceptVerdict> {
        let mut verdicts: Vec<(usize, ConceptVerdict)> = stream::iter(candidates.iter().enumerate())
            .map(|(index, symbol)| async move {
                (index, check_membership(chain, symbol, universe).await)
            })
            .buffer_unordered(self.settings.lookup_concurrency.max(1))
            .collect()
            .await;

        verdicts.sort_by_key(|(index, _)| *index);
        verdicts.into_iter().map(|(_, verdict)| verdict).collect()
    }
}

/// Walk the chain until a source claims the symbol.
///
/// An unknown answer does not stop the walk, but if no later source admits
/// the symbol the last failure is reported instead of a plain miss.
async fn check_membership(
    chain: &[Box<dyn MembershipCheck>],
    symbol: &Symbol,
    universe: &TargetUniverse,
) -> ConceptVerdict {
    let mut failure = None;

    for link in chain {
        match link.check(symbol, universe).await {
            Membership::Member => {
                debug!(%symbol, provider = link.source(), "Concept member");
                return Ok(link.source().to_string());
            }
            Membership::NonMember => {}
            Membership::Unknown(reason) => {
                warn!(
                    %symbol,
                    provider = link.source(),
                    stage = %Stage::Concept,
                    %reason,
                    "Membership lookup failed, treating as non-member"
                );
                failure = Some(DropReason::LookupFailed {
                    provider: link.source().to_string(),
                    reason,
                });
            }
        }
    }

    let reason = failure.unwrap_or(DropReason::NotInConcepts);
    debug!(%symbol, %reason, "Dropped at concept stage");
    Err(reason)
}

fn industry_outcome(
    table: &IndustryTable,
    symbol: &Symbol,
    matched_by: String,
    universe: &TargetUniverse,
) -> SymbolOutcome {
    let Some(row) = table.lookup(symbol) else {
        let error = Error::SymbolNotListed(symbol.to_string());
        warn!(%symbol, stage = %Stage::Industry, %error, "Dropping symbol");
        return SymbolOutcome::Dropped {
            symbol: symbol.clone(),
            stage: Stage::Industry,
            reason: DropReason::NotListed,
        };
    };

    match &row.industry {
        Some(industry) if universe.target_industries.contains(industry) => SymbolOutcome::Passed {
            symbol: symbol.clone(),
            matched_by,
            industry: Some(industry.clone()),
        },
        industry => {
            debug!(%symbol, industry = ?industry, "Industry not targeted");
            SymbolOutcome::Dropped {
                symbol: symbol.clone(),
                stage: Stage::Industry,
                reason: DropReason::IndustryMismatch {
                    industry: industry.clone(),
                },
            }
        }
    }
}
