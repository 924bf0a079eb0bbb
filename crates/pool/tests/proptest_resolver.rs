mod support;

use std::sync::Arc;

use proptest::prelude::*;

use common::{Symbol, TargetUniverse};
use support::{resolver, MockIndustries, MockPool, MockTags};

fn code() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "600001", "600002", "000002", "000004", "300003", "300007", "688001",
    ])
    .prop_map(str::to_string)
}

proptest! {
    /// Resolution only ever removes candidates and keeps their relative order.
    #[test]
    fn final_symbols_are_ordered_subset_of_candidates(
        candidates in prop::collection::vec(code(), 0..12),
        with_industries in any::<bool>(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let tags = Arc::new(
                MockTags::with(&[("300003", &["robotics"]), ("000004", &["banking"])])
                    .fail_on("300007"),
            );
            let r = resolver(
                dir.path(),
                vec![MockPool::new("alpha", &["600001"]), MockPool::new("beta", &["000002"])],
                tags,
                MockIndustries::new(&[
                    ("600001.SH", Some("Software")),
                    ("000002.SZ", Some("Banking")),
                    ("300003.SZ", Some("Software")),
                ]),
            );
            let industries: Vec<&str> = if with_industries { vec!["Software"] } else { vec![] };
            let universe = TargetUniverse::new(industries, ["robotics"]);

            let candidates: Vec<Symbol> = candidates.iter().map(|c| Symbol::from(c.as_str())).collect();
            let report = r.resolve(&candidates, &universe).await;

            assert!(is_subsequence(&report.concept_passed, &candidates));
            assert!(is_subsequence(&report.final_symbols, &report.concept_passed));
            assert_eq!(report.outcomes.len(), candidates.len());
            if !with_industries {
                assert_eq!(report.final_symbols, report.concept_passed);
            }
        });
    }
}

fn is_subsequence(sub: &[Symbol], full: &[Symbol]) -> bool {
    let mut rest = full.iter();
    sub.iter().all(|s| rest.any(|f| f == s))
}
