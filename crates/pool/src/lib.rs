pub mod cache;
pub mod membership;
pub mod report;
pub mod resolver;
pub mod universe;

pub use cache::{fetch_concept_pool, CachedPool, PoolCache};
pub use membership::{Membership, MembershipCheck, PoolMembership, TagLookupMembership};
pub use report::{DropReason, ResolutionReport, Stage, SymbolOutcome};
pub use resolver::{PoolResolver, ResolverSettings};
pub use universe::{default_universe, load_universe, DEFAULT_CONCEPTS};
