use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use common::{ConceptTagLookup, Error, Symbol, TargetUniverse};

/// Answer of one membership source for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Membership {
    Member,
    NonMember,
    /// The source could not answer. Treated as non-member by the resolver.
    Unknown(String),
}

/// One link of the concept membership chain.
///
/// The resolver asks each link in order and stops at the first `Member`,
/// so cheap sources go first.
#[async_trait]
pub trait MembershipCheck: Send + Sync {
    /// Provider name reported in outcomes and logs.
    fn source(&self) -> &str;

    async fn check(&self, symbol: &Symbol, universe: &TargetUniverse) -> Membership;
}

/// Membership in a pre-built concept pool. Never fails, never touches the network.
pub struct PoolMembership {
    provider: String,
    pool: HashSet<Symbol>,
}

impl PoolMembership {
    pub fn new(provider: impl Into<String>, pool: HashSet<Symbol>) -> Self {
        Self {
            provider: provider.into(),
            pool,
        }
    }
}

#[async_trait]
impl MembershipCheck for PoolMembership {
    fn source(&self) -> &str {
        &self.provider
    }

    async fn check(&self, symbol: &Symbol, _universe: &TargetUniverse) -> Membership {
        if self.pool.contains(symbol) {
            Membership::Member
        } else {
            Membership::NonMember
        }
    }
}

/// Live per-symbol tag lookup with a deadline on each call.
pub struct TagLookupMembership {
    lookup: Arc<dyn ConceptTagLookup>,
    timeout: Duration,
}

impl TagLookupMembership {
    pub fn new(lookup: Arc<dyn ConceptTagLookup>, timeout: Duration) -> Self {
        Self { lookup, timeout }
    }
}

#[async_trait]
impl MembershipCheck for TagLookupMembership {
    fn source(&self) -> &str {
        self.lookup.name()
    }

    async fn check(&self, symbol: &Symbol, universe: &TargetUniverse) -> Membership {
        match tokio::time::timeout(self.timeout, self.lookup.concept_tags(symbol)).await {
            Ok(Ok(tags)) if universe.has_concept(&tags) => Membership::Member,
            Ok(Ok(_)) => Membership::NonMember,
            Ok(Err(e)) => Membership::Unknown(e.to_string()),
            Err(_) => Membership::Unknown(
                Error::Timeout {
                    provider: self.lookup.name().to_string(),
                    after: self.timeout,
                }
                .to_string(),
            ),
        }
    }
}
