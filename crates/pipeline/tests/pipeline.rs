use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use common::{
    Bar, ConceptSource, ConceptTagLookup, Error, IndustryRow, IndustryTable, IndustryTableSource,
    Result, SeriesMap, Symbol,
};
use pipeline::Pipeline;
use pool::{PoolCache, PoolResolver, ResolverSettings};
use strategy::{ParamError, Params, Selector, SelectorConfig, SelectorRegistry, StrategyRunner};

/// Picks every symbol that has a bar on the requested date.
struct TradedOn;

impl Selector for TradedOn {
    fn select(&self, date: NaiveDate, data: &SeriesMap) -> Vec<Symbol> {
        data.iter()
            .filter(|(_, bars)| bars.iter().any(|b| b.date == date))
            .map(|(symbol, _)| symbol.clone())
            .collect()
    }
}

fn build_traded_on(_: &Params) -> std::result::Result<Box<dyn Selector>, ParamError> {
    Ok(Box::new(TradedOn))
}

struct Pool(&'static str, Vec<&'static str>);

#[async_trait]
impl ConceptSource for Pool {
    fn name(&self) -> &str {
        self.0
    }

    async fn concept_members(&self, _concept: &str) -> Result<Vec<Symbol>> {
        Ok(self.1.iter().map(|c| Symbol::from(*c)).collect())
    }
}

#[derive(Default)]
struct Tags {
    calls: AtomicUsize,
}

#[async_trait]
impl ConceptTagLookup for Tags {
    fn name(&self) -> &str {
        "live"
    }

    async fn concept_tags(&self, symbol: &Symbol) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match symbol.as_str() {
            "300003" => Ok(vec!["robotics".into()]),
            "000002" => Ok(vec!["banking".into()]),
            _ => Err(Error::lookup("live", symbol.as_str(), "unexpected symbol")),
        }
    }
}

struct Industries;

#[async_trait]
impl IndustryTableSource for Industries {
    fn name(&self) -> &str {
        "reference"
    }

    async fn industry_table(&self) -> Result<IndustryTable> {
        let row = |code: &str, industry: &str| IndustryRow {
            ts_code: code.to_string(),
            name: None,
            industry: Some(industry.to_string()),
            exchange: None,
        };
        Ok(IndustryTable::new(vec![
            row("600001.SH", "Hardware"),
            row("300003.SZ", "Software"),
            row("000002.SZ", "Banking"),
        ]))
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn bar(date: NaiveDate) -> Bar {
    Bar {
        date,
        open: 10.0,
        close: 10.0,
        high: 10.0,
        low: 10.0,
        volume: 1_000.0,
    }
}

fn series() -> SeriesMap {
    let mut data = SeriesMap::new();
    for code in ["600001", "000002", "300003"] {
        data.insert(code.into(), vec![bar(day(1)), bar(day(4))]);
    }
    data
}

fn pipeline(dir: &std::path::Path, universe_json: Option<&str>, tags: Arc<Tags>) -> Pipeline {
    let mut registry = SelectorRegistry::with_builtins();
    registry
        .register("TradedOn", Box::new(build_traded_on))
        .unwrap();

    let pools: Vec<Arc<dyn ConceptSource>> = vec![
        Arc::new(Pool("alpha", vec!["600001"])) as Arc<dyn ConceptSource>,
        Arc::new(Pool("beta", vec![])),
    ];
    let resolver = PoolResolver::new(
        PoolCache::new(dir.join("cache")),
        pools,
        tags,
        Arc::new(Industries),
        ResolverSettings::default(),
    );

    let universe_path = dir.join("zpool.json");
    if let Some(json) = universe_json {
        std::fs::write(&universe_path, json).unwrap();
    }
    Pipeline::new(StrategyRunner::new(registry), resolver, universe_path)
}

#[tokio::test]
async fn selects_and_filters_on_latest_date() {
    let dir = tempfile::tempdir().unwrap();
    let tags = Arc::new(Tags::default());
    let p = pipeline(
        dir.path(),
        Some(r#"{"target_industries":["Software"],"target_concepts":["robotics"]}"#),
        tags.clone(),
    );

    let configs = vec![SelectorConfig::new("TradedOn").with_alias("traded")];
    let reports = p.run(&configs, None, &series()).await.unwrap();

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.alias, "traded");
    assert_eq!(report.as_of, day(4));
    assert_eq!(report.candidates.len(), 3);
    assert_eq!(
        report.concept_passed,
        vec![Symbol::from("300003"), Symbol::from("600001")]
    );
    assert_eq!(report.final_symbols, vec![Symbol::from("300003")]);
    assert_eq!(report.outcomes.len(), 3);
    // 600001 comes from the pool, the other two need the live lookup.
    assert_eq!(tags.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn explicit_date_is_passed_to_selectors() {
    let dir = tempfile::tempdir().unwrap();
    let p = pipeline(
        dir.path(),
        Some(r#"{"target_concepts":["robotics"]}"#),
        Arc::new(Tags::default()),
    );

    let configs = vec![SelectorConfig::new("TradedOn")];
    let reports = p.run(&configs, Some(day(2)), &series()).await.unwrap();

    assert_eq!(reports[0].as_of, day(2));
    assert!(reports[0].candidates.is_empty());
    assert!(reports[0].final_symbols.is_empty());
}

#[tokio::test]
async fn bad_entries_are_skipped_and_order_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let p = pipeline(
        dir.path(),
        Some(r#"{"target_concepts":["robotics"]}"#),
        Arc::new(Tags::default()),
    );

    let configs = vec![
        SelectorConfig::new("TradedOn").with_alias("first"),
        SelectorConfig::new("NoSuchSelector"),
        SelectorConfig::new("TradedOn").with_alias("off").deactivated(),
        SelectorConfig::new("TradedOn").with_alias("last"),
    ];
    let reports = p.run(&configs, None, &series()).await.unwrap();

    let aliases: Vec<_> = reports.iter().map(|r| r.alias.as_str()).collect();
    assert_eq!(aliases, vec!["first", "last"]);
    assert_eq!(reports[0].final_symbols, reports[1].final_symbols);
}

#[tokio::test]
async fn empty_series_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let p = pipeline(dir.path(), None, Arc::new(Tags::default()));

    let err = p
        .run(&[SelectorConfig::new("TradedOn")], None, &SeriesMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoData(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn malformed_universe_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let p = pipeline(dir.path(), Some("[broken"), Arc::new(Tags::default()));

    let err = p
        .run(&[SelectorConfig::new("TradedOn")], None, &series())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
