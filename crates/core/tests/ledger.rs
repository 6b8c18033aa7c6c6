//! End-to-end behavior of the ledger: artifact compatibility, append-only
//! guarantees and regression scenarios.

use benchwatch_core::codec::{decode, encode};
use benchwatch_core::regression::{analyze, detect, SkipReason};
use benchwatch_core::{
    AppendError, BenchmarkRecord, CommitEntry, CommitInfo, DecodeError, DetectorConfig,
    HistoryStore, Person, Polarity,
};
use proptest::prelude::*;

const FIXTURE: &str = include_str!("fixtures/benchmark_data.js");

fn commit(n: u64) -> CommitInfo {
    let id = format!("{n:040x}");
    CommitInfo {
        author: Person::new("Ada Lovelace", "ada@example.com", "ada"),
        committer: Person::new("GitHub", "noreply@github.com", "web-flow"),
        distinct: Some(true),
        url: format!("https://github.com/example/pyparse/commit/{id}"),
        id,
        message: format!("Commit {n}"),
        timestamp: "2024-03-01T12:00:00Z".to_string(),
        tree_id: Some(format!("{:040x}", n + 1_000_000)),
    }
}

fn pytest_entry(n: u64, benches: &[(&str, f64)]) -> CommitEntry {
    let records = benches
        .iter()
        .map(|(name, value)| BenchmarkRecord::new(*name, *value, "iter/sec").unwrap())
        .collect();
    CommitEntry::create(commit(n), 1_709_294_400_000 + n as i64, "pytest", records).unwrap()
}

fn scenario_config() -> DetectorConfig {
    DetectorConfig {
        threshold_ratio: 1.5,
        min_samples: 1,
        ..DetectorConfig::default()
    }
}

#[test]
fn test_fixture_round_trips_byte_for_byte() {
    let store = decode(FIXTURE).unwrap();
    assert_eq!(encode(&store), FIXTURE);
}

#[test]
fn test_fixture_contents() {
    let store = decode(FIXTURE).unwrap();
    assert_eq!(store.repo_url(), "https://github.com/example/pyparse");
    assert_eq!(store.last_update(), 1_709_467_200_517);
    assert_eq!(store.tools().collect::<Vec<_>>(), vec!["cargo", "pytest"]);
    assert_eq!(store.entries_for("pytest").len(), 3);

    // commit looked up through the API carries no distinct/tree_id
    let api_commit = store.entries_for("pytest")[1].commit();
    assert!(api_commit.distinct.is_none());
    assert!(api_commit.tree_id.is_none());

    let series: Vec<_> = store
        .series_for("pytest", "tests/test_core.py::test_float_core")
        .collect();
    assert_eq!(series, vec![(1_709_467_200_000, 99000.5)]);

    let scan = store.latest("cargo").unwrap().bench("scan/large").unwrap();
    assert_eq!(scan.spread(), Some(1204.0));
}

#[test]
fn test_append_extends_every_series() {
    let mut store = decode(FIXTURE).unwrap();
    let before: Vec<_> = store
        .series_for("pytest", "tests/test_core.py::test_bool_core")
        .collect();

    let entry = pytest_entry(
        77,
        &[
            ("tests/test_core.py::test_bool_core", 199000.0),
            ("tests/test_core.py::test_new", 5.0),
        ],
    );
    let date = entry.date();
    store.append("pytest", entry.clone()).unwrap();

    for record in entry.benches() {
        let series: Vec<_> = store.series_for("pytest", record.name()).collect();
        assert_eq!(series.last(), Some(&(date, record.value())));
    }

    let after: Vec<_> = store
        .series_for("pytest", "tests/test_core.py::test_bool_core")
        .collect();
    assert_eq!(&after[..before.len()], &before[..]);
    assert!(store.last_update() >= date);
}

#[test]
fn test_duplicate_rejected_and_artifact_unchanged() {
    let mut store = decode(FIXTURE).unwrap();
    let existing = store.entries_for("pytest")[0].clone();
    let err = store.append("pytest", existing).unwrap_err();
    assert!(matches!(err, AppendError::DuplicateCommit { .. }));
    assert_eq!(encode(&store), FIXTURE);
}

#[test]
fn test_same_commit_may_appear_under_different_tools() {
    let mut store = HistoryStore::new("repo");
    store.append("pytest", pytest_entry(1, &[("a", 1.0)])).unwrap();
    let records = vec![BenchmarkRecord::new("a", 1.0, "ns/iter").unwrap()];
    let cargo = CommitEntry::create(commit(1), 5, "cargo", records).unwrap();
    assert!(store.append("cargo", cargo).is_ok());
}

#[test]
fn test_regression_scenario_flags_drop() {
    let mut store = HistoryStore::new("https://github.com/example/pyparse");
    store
        .append("pytest", pytest_entry(1, &[("test_bool_core", 200000.0)]))
        .unwrap();
    let new_entry = pytest_entry(2, &[("test_bool_core", 50000.0)]);

    let alerts = detect(&store, "pytest", &new_entry, &scenario_config());
    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.benchmark_name, "test_bool_core");
    assert_eq!(alert.baseline, 200000.0);
    assert_eq!(alert.new_value, 50000.0);
    assert_eq!(alert.ratio, 4.0);
    assert_eq!(alert.direction, Polarity::HigherIsBetter);
}

#[test]
fn test_regression_scenario_small_drop_ignored() {
    let mut store = HistoryStore::new("https://github.com/example/pyparse");
    store
        .append("pytest", pytest_entry(1, &[("test_bool_core", 200000.0)]))
        .unwrap();
    let new_entry = pytest_entry(2, &[("test_bool_core", 180000.0)]);
    assert!(detect(&store, "pytest", &new_entry, &scenario_config()).is_empty());
}

#[test]
fn test_threshold_boundary_is_strict() {
    let mut store = HistoryStore::new("repo");
    store.append("pytest", pytest_entry(1, &[("b", 150.0)])).unwrap();
    store.append("pytest", pytest_entry(2, &[("b", 150.0)])).unwrap();
    let config = DetectorConfig::default();

    // 150 / 100 == 1.5 exactly
    let at_boundary = pytest_entry(3, &[("b", 100.0)]);
    assert!(detect(&store, "pytest", &at_boundary, &config).is_empty());

    let past_boundary = pytest_entry(3, &[("b", 99.99)]);
    assert_eq!(detect(&store, "pytest", &past_boundary, &config).len(), 1);
}

#[test]
fn test_threshold_boundary_is_strict_for_lower_is_better() {
    let cargo_entry = |n: u64, value: f64| {
        let records = vec![BenchmarkRecord::new("scan", value, "ns/iter").unwrap()];
        CommitEntry::create(commit(n), 1_709_294_400_000 + n as i64, "cargo", records).unwrap()
    };
    let mut store = HistoryStore::new("repo");
    store.append("cargo", cargo_entry(1, 100.0)).unwrap();
    store.append("cargo", cargo_entry(2, 100.0)).unwrap();
    let config = DetectorConfig::default();

    // 150 / 100 == 1.5 exactly
    assert!(detect(&store, "cargo", &cargo_entry(3, 150.0), &config).is_empty());

    let alerts = detect(&store, "cargo", &cargo_entry(3, 150.01), &config);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].direction, Polarity::LowerIsBetter);
}

#[test]
fn test_cold_start_never_alerts() {
    let mut store = HistoryStore::new("repo");
    store.append("pytest", pytest_entry(1, &[("old", 100.0)])).unwrap();
    let new_entry = pytest_entry(2, &[("brand_new", 0.0)]);

    let report = analyze(&store, "pytest", &new_entry, &scenario_config());
    assert!(report.alerts.is_empty());
    assert_eq!(report.skipped[0].reason, SkipReason::NoHistory);
}

#[test]
fn test_detection_same_before_and_after_append() {
    let mut store = HistoryStore::new("repo");
    store.append("pytest", pytest_entry(1, &[("b", 200.0)])).unwrap();
    store.append("pytest", pytest_entry(2, &[("b", 210.0)])).unwrap();
    let new_entry = pytest_entry(3, &[("b", 90.0)]);
    let config = DetectorConfig::default();

    let before = analyze(&store, "pytest", &new_entry, &config);
    store.append("pytest", new_entry.clone()).unwrap();
    let after = analyze(&store, "pytest", &new_entry, &config);
    assert_eq!(before, after);
    assert_eq!(before.alerts.len(), 1);
}

#[test]
fn test_missing_commit_yields_decode_error() {
    let broken = FIXTURE.replacen("\"commit\": {", "\"commitx\": {", 1);
    match decode(&broken) {
        Err(DecodeError::Schema(message)) => assert!(message.contains("commit")),
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn test_malformed_commit_id_yields_decode_error() {
    let broken = FIXTURE.replacen(
        "\"id\": \"0000000000000000000000000000a1b2c3d4e600\"",
        "\"id\": \"not-a-sha\"",
        1,
    );
    assert!(matches!(decode(&broken), Err(DecodeError::Entry { .. })));
}

fn arb_record() -> impl Strategy<Value = (String, f64, String, Option<String>)> {
    (
        "[a-z_/:.]{1,24}",
        prop_oneof![
            (0u32..10_000_000).prop_map(f64::from),
            (0.0f64..1.0e9),
        ],
        prop_oneof![Just("iter/sec"), Just("ns/iter"), Just("usec")].prop_map(String::from),
        proptest::option::of("[ -~]{0,16}"),
    )
}

proptest! {
    #[test]
    fn prop_encode_decode_round_trip(
        runs in proptest::collection::vec(
            (
                prop_oneof![Just("pytest"), Just("cargo")],
                proptest::collection::btree_map("[a-z]{1,8}", arb_record(), 1..5),
                0i64..2_000_000_000_000,
            ),
            0..8,
        )
    ) {
        let mut store = HistoryStore::new("https://github.com/example/project");
        for (n, (tool, records, date)) in runs.into_iter().enumerate() {
            let records = records
                .into_values()
                .enumerate()
                .map(|(i, (name, value, unit, range))| {
                    let record = BenchmarkRecord::new(format!("{i}-{name}"), value, unit).unwrap();
                    match range {
                        Some(range) => record.with_range(range),
                        None => record,
                    }
                })
                .collect();
            let entry = CommitEntry::create(commit(n as u64), date, tool, records).unwrap();
            store.append(tool, entry).unwrap();
        }

        let text = encode(&store);
        let decoded = decode(&text).unwrap();
        prop_assert_eq!(&decoded, &store);
        prop_assert_eq!(encode(&decoded), text);
    }
}
