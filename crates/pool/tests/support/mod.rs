#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use common::{
    ConceptSource, ConceptTagLookup, Error, IndustryRow, IndustryTable, IndustryTableSource,
    Result, Symbol,
};
use pool::{PoolCache, PoolResolver, ResolverSettings};

pub fn symbols(codes: &[&str]) -> Vec<Symbol> {
    codes.iter().map(|c| Symbol::from(*c)).collect()
}

/// Bulk pool source returning a fixed member list for every concept.
pub struct MockPool {
    pub name: &'static str,
    pub members: Vec<Symbol>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockPool {
    pub fn new(name: &'static str, codes: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name,
            members: symbols(codes),
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            members: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConceptSource for MockPool {
    fn name(&self) -> &str {
        self.name
    }

    async fn concept_members(&self, concept: &str) -> Result<Vec<Symbol>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::lookup(self.name, concept, "service unavailable"));
        }
        Ok(self.members.clone())
    }
}

/// Per-symbol tag lookup. Symbols listed in `failing` return an error.
#[derive(Default)]
pub struct MockTags {
    pub tags: HashMap<Symbol, Vec<String>>,
    pub failing: HashSet<Symbol>,
    pub delays: HashMap<Symbol, Duration>,
    pub calls: AtomicUsize,
    pub seen: std::sync::Mutex<Vec<Symbol>>,
    /// Symbols in the order their lookups completed.
    pub finished: std::sync::Mutex<Vec<Symbol>>,
}

impl MockTags {
    pub fn with(entries: &[(&str, &[&str])]) -> Self {
        Self {
            tags: entries
                .iter()
                .map(|(code, tags)| {
                    (
                        Symbol::from(*code),
                        tags.iter().map(|t| t.to_string()).collect(),
                    )
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn fail_on(mut self, code: &str) -> Self {
        self.failing.insert(Symbol::from(code));
        self
    }

    pub fn delay(mut self, code: &str, millis: u64) -> Self {
        self.delays
            .insert(Symbol::from(code), Duration::from_millis(millis));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Symbol> {
        self.seen.lock().unwrap().clone()
    }

    pub fn finished(&self) -> Vec<Symbol> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConceptTagLookup for MockTags {
    fn name(&self) -> &str {
        "live"
    }

    async fn concept_tags(&self, symbol: &Symbol) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(symbol.clone());
        if let Some(delay) = self.delays.get(symbol) {
            tokio::time::sleep(*delay).await;
        }
        self.finished.lock().unwrap().push(symbol.clone());
        if self.failing.contains(symbol) {
            return Err(Error::lookup("live", symbol.as_str(), "connection reset"));
        }
        Ok(self.tags.get(symbol).cloned().unwrap_or_default())
    }
}

/// Industry table built from `(ts_code, industry)` pairs.
pub struct MockIndustries {
    pub rows: Vec<IndustryRow>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockIndustries {
    pub fn new(rows: &[(&str, Option<&str>)]) -> Arc<Self> {
        Arc::new(Self {
            rows: rows
                .iter()
                .map(|(code, industry)| IndustryRow {
                    ts_code: code.to_string(),
                    name: None,
                    industry: industry.map(str::to_string),
                    exchange: None,
                })
                .collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            rows: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndustryTableSource for MockIndustries {
    fn name(&self) -> &str {
        "reference"
    }

    async fn industry_table(&self) -> Result<IndustryTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::lookup("reference", "stock_basic", "quota exceeded"));
        }
        Ok(IndustryTable::new(self.rows.clone()))
    }
}

pub fn resolver(
    cache_dir: &std::path::Path,
    pools: Vec<Arc<MockPool>>,
    tags: Arc<MockTags>,
    industries: Arc<MockIndustries>,
) -> PoolResolver {
    let pools: Vec<Arc<dyn ConceptSource>> = pools
        .into_iter()
        .map(|p| p as Arc<dyn ConceptSource>)
        .collect();
    PoolResolver::new(
        PoolCache::new(cache_dir),
        pools,
        tags,
        industries,
        ResolverSettings::default(),
    )
}
