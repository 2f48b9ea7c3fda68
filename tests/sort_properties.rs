//! External Sort Tests
//!
//! - Sorting returns exactly the input rows, in order
//! - Duplicate suppression is idempotent
//! - Spilling never changes the output
//! - Strategies, limits, multi-pass merges, cancellation and corruption

use std::cmp::Ordering;
use std::io::{Seek, SeekFrom, Write};
use std::sync::Arc;

use aeroscan::executor::{collect_rows, RowsCursor};
use aeroscan::observability::MetricsRegistry;
use aeroscan::sort::{DuplicatePolicy, RunWriter, SortKey};
use aeroscan::{EngineConfig, Executor, OrderingSpec, QueryContext, Row, SortStrategy, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::{NamedTempFile, TempDir};

// =============================================================================
// Helper Functions
// =============================================================================

fn executor(dir: &TempDir, memory: usize, fan_in: usize) -> Executor {
    let config = EngineConfig::default()
        .with_sort_memory(memory)
        .with_tmp_dir(dir.path())
        .with_merge_fan_in(fan_in);
    Executor::new(QueryContext::new(Arc::new(config), Arc::new(MetricsRegistry::new())))
}

fn sort_rows(
    exec: &Executor,
    rows: Vec<Row>,
    columns: &[(usize, bool)],
    policy: DuplicatePolicy,
    strategy: SortStrategy,
) -> Vec<Row> {
    let ordering = OrderingSpec::by_columns(columns).unwrap();
    let mut cursor = exec
        .sort(Box::new(RowsCursor::new(rows)), ordering, policy, strategy)
        .unwrap();
    collect_rows(&mut cursor).unwrap()
}

fn random_rows(rng: &mut StdRng, count: usize) -> Vec<Row> {
    (0..count)
        .map(|_| {
            Row::new(vec![
                Value::Int(rng.gen_range(0..6)),
                Value::text(format!("s{}", rng.gen_range(0..4))),
                Value::Int(rng.gen_range(-1000..1000)),
            ])
        })
        .collect()
}

fn compare_on(a: &Row, b: &Row, columns: &[(usize, bool)]) -> Ordering {
    for (field, ascending) in columns {
        let ord = match (&a.values()[*field], &b.values()[*field]) {
            (Value::Int(x), Value::Int(y)) => x.cmp(y),
            (Value::Text(x), Value::Text(y)) => x.cmp(y),
            _ => Ordering::Equal,
        };
        let ord = if *ascending { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn canonical(rows: &[Row]) -> Vec<String> {
    let mut out: Vec<String> = rows
        .iter()
        .map(|r| r.values().iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","))
        .collect();
    out.sort();
    out
}

fn random_columns(rng: &mut StdRng) -> Vec<(usize, bool)> {
    let mut columns = vec![(0, rng.gen_bool(0.5))];
    if rng.gen_bool(0.5) {
        columns.push((1, rng.gen_bool(0.5)));
    }
    columns
}

// =============================================================================
// Property Tests
// =============================================================================

/// Preserving duplicates returns a sorted permutation of the input.
#[test]
fn test_sort_returns_every_row() {
    let mut rng = StdRng::seed_from_u64(3);
    let dir = TempDir::new().unwrap();
    for round in 0..12 {
        let rows = random_rows(&mut rng, 150);
        let columns = random_columns(&mut rng);
        let strategy = if round % 2 == 0 { SortStrategy::Merge } else { SortStrategy::Tree };
        let exec = executor(&dir, 512, 4);

        let out = sort_rows(&exec, rows.clone(), &columns, DuplicatePolicy::Preserve, strategy);
        assert_eq!(out.len(), rows.len());
        assert_eq!(canonical(&out), canonical(&rows));
        assert!(out.windows(2).all(|w| compare_on(&w[0], &w[1], &columns) != Ordering::Greater));
    }
}

/// Suppressed output has no adjacent equal keys and sorts to itself.
#[test]
fn test_suppression_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(11);
    let dir = TempDir::new().unwrap();
    for _ in 0..8 {
        let rows = random_rows(&mut rng, 120);
        let columns = random_columns(&mut rng);
        for strategy in [SortStrategy::Merge, SortStrategy::Tree] {
            let exec = executor(&dir, 256, 3);
            let suppress = DuplicatePolicy::Suppress;
            let once = sort_rows(&exec, rows.clone(), &columns, suppress, strategy);
            assert!(once.windows(2).all(|w| compare_on(&w[0], &w[1], &columns) == Ordering::Less));

            let twice = sort_rows(&exec, once.clone(), &columns, suppress, strategy);
            assert_eq!(twice, once);
        }
    }
}

/// The memory ceiling only changes how many spill files are written.
#[test]
fn test_spill_threshold_is_transparent() {
    let mut rng = StdRng::seed_from_u64(29);
    let dir = TempDir::new().unwrap();
    let rows = random_rows(&mut rng, 400);
    let columns = [(0, false), (1, true)];

    for policy in [DuplicatePolicy::Default, DuplicatePolicy::Preserve, DuplicatePolicy::Suppress] {
        let mut outputs = Vec::new();
        let mut spills = Vec::new();
        for memory in [64 << 20, 8 << 10, 600, 64] {
            let exec = executor(&dir, memory, 4);
            outputs.push(sort_rows(&exec, rows.clone(), &columns, policy, SortStrategy::Merge));
            spills.push(exec.context().metrics().snapshot().spill_files);
        }
        assert_eq!(spills[0], 0);
        assert!(spills[3] > spills[1]);
        assert!(outputs.windows(2).all(|w| w[0] == w[1]), "policy {}", policy.as_str());
    }
}

// =============================================================================
// Scenario Tests
// =============================================================================

/// Suppression keeps one row per key, the first one seen.
#[test]
fn test_suppress_keeps_first_duplicate() {
    let dir = TempDir::new().unwrap();
    let rows = vec![aeroscan::row![3, "x"], aeroscan::row![1, "y"], aeroscan::row![3, "z"]];
    for strategy in [SortStrategy::Merge, SortStrategy::Tree] {
        let exec = executor(&dir, 1 << 20, 16);
        let out = sort_rows(&exec, rows.clone(), &[(0, true)], DuplicatePolicy::Suppress, strategy);
        assert_eq!(out, vec![aeroscan::row![1, "y"], aeroscan::row![3, "x"]]);
        assert_eq!(exec.context().metrics().snapshot().duplicates_suppressed, 1);
    }
}

/// Equal keys keep arrival order without an ordinal.
#[test]
fn test_default_policy_is_stable() {
    let dir = TempDir::new().unwrap();
    let rows: Vec<Row> = (0..60).map(|i| aeroscan::row![i % 3, i]).collect();
    let exec = executor(&dir, 128, 2);
    let out = sort_rows(&exec, rows, &[(0, true)], DuplicatePolicy::Default, SortStrategy::Merge);
    for pair in out.windows(2) {
        if pair[0].values()[0] == pair[1].values()[0] {
            assert!(pair[0].values()[1].as_int() < pair[1].values()[1].as_int());
        }
    }
}

/// Too many runs for one merge are merged in passes.
#[test]
fn test_multi_pass_merge() {
    let dir = TempDir::new().unwrap();
    let rows: Vec<Row> = (0..200).map(|i| aeroscan::row![(i * 37) % 101, i]).collect();
    let exec = executor(&dir, 64, 2);
    let columns = [(0, true), (1, true)];
    let out =
        sort_rows(&exec, rows.clone(), &columns, DuplicatePolicy::Default, SortStrategy::Merge);

    let mut expected = rows;
    expected.sort_by(|a, b| compare_on(a, b, &columns));
    assert_eq!(out, expected);
    assert!(exec.context().metrics().snapshot().merge_passes > 0);
}

/// The top-N sort matches a prefix of the full sort.
#[test]
fn test_limited_sort_matches_full_prefix() {
    let mut rng = StdRng::seed_from_u64(5);
    let dir = TempDir::new().unwrap();
    let rows = random_rows(&mut rng, 100);
    let exec = executor(&dir, 1 << 20, 16);
    let columns = [(2, false)];
    let full =
        sort_rows(&exec, rows.clone(), &columns, DuplicatePolicy::Default, SortStrategy::Merge);

    for limit in [0, 1, 7, 100, 150] {
        let mut top = exec
            .sort_limited(
                Box::new(RowsCursor::new(rows.clone())),
                OrderingSpec::by_columns(&columns).unwrap(),
                DuplicatePolicy::Default,
                limit,
            )
            .unwrap();
        let out = collect_rows(&mut top).unwrap();
        assert_eq!(out, full[..limit.min(full.len())].to_vec());
    }
}

// =============================================================================
// Failure Tests
// =============================================================================

/// A canceled query fails the load phase and leaves no spill files behind.
#[test]
fn test_canceled_sort() {
    let dir = TempDir::new().unwrap();
    let exec = executor(&dir, 64, 16);
    exec.context().cancellation().cancel();
    let rows: Vec<Row> = (0..50).map(|i| aeroscan::row![i]).collect();
    let err = exec
        .sort(
            Box::new(RowsCursor::new(rows)),
            OrderingSpec::by_fields(&[true]).unwrap(),
            DuplicatePolicy::Default,
            SortStrategy::Merge,
        )
        .err()
        .unwrap();
    assert!(err.is_cancellation());
    assert!(!err.is_fatal());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

/// A damaged spill run is reported as corruption.
#[test]
fn test_spill_run_corruption() {
    let keys = vec![
        SortKey::new(vec![vec![0x20, 1]], vec![1, 2, 3]),
        SortKey::new(vec![vec![0x20, 2]], vec![4, 5, 6]),
    ];
    let run = RunWriter::new(NamedTempFile::new().unwrap()).write_all(&keys).unwrap();
    {
        let mut file = std::fs::OpenOptions::new().write(true).open(run.path()).unwrap();
        file.seek(SeekFrom::Start(5)).unwrap();
        file.write_all(&[0x7f]).unwrap();
    }
    let mut reader = run.reader().unwrap();
    let err = loop {
        match reader.next_key() {
            Ok(Some(_)) => continue,
            Ok(None) => panic!("damaged run read cleanly"),
            Err(e) => break e,
        }
    };
    assert_eq!(err.code().code(), "AERO_DATA_CORRUPTION");
    assert!(err.is_fatal());
}
