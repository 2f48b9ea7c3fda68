//! Mixed-Order Scan Tests
//!
//! - Every direction pattern yields every row once, in order
//! - Bound inclusivity at both ends, in both directions
//! - Jump and lifecycle through the public API

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use aeroscan::codec::Collation;
use aeroscan::executor::{collect_rows, ColumnSelector, CursorState};
use aeroscan::index::{IndexColumn, IndexDef, IndexWriter};
use aeroscan::scan::{KeyRange, MixedOrderCursor};
use aeroscan::storage::MemoryTree;
use aeroscan::{Cursor, QueryContext, Row, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// =============================================================================
// Helper Functions
// =============================================================================

fn store(index: &IndexDef, rows: &[Row]) -> Arc<MemoryTree> {
    let mut tree = MemoryTree::new(index.name.clone());
    IndexWriter::new(index, &mut tree).unwrap().insert_all(rows).unwrap();
    Arc::new(tree)
}

fn scan(index: &IndexDef, rows: &[Row], range: KeyRange, ascending: &[bool]) -> Vec<Row> {
    let mut cursor = MixedOrderCursor::new(
        store(index, rows),
        index.clone(),
        range,
        ascending.to_vec(),
        QueryContext::default(),
    );
    collect_rows(&mut cursor).unwrap()
}

fn ints(row: &Row) -> Vec<i64> {
    row.values().iter().filter_map(Value::as_int).collect()
}

fn compare(a: &[i64], b: &[i64], ascending: &[bool]) -> Ordering {
    for (i, asc) in ascending.iter().enumerate() {
        let ord = a[i].cmp(&b[i]);
        let ord = if *asc { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn random_rows(rng: &mut StdRng, columns: usize, count: usize) -> Vec<Row> {
    let mut keys = BTreeSet::new();
    while keys.len() < count {
        let key: Vec<i64> = (0..columns).map(|_| rng.gen_range(-3..4)).collect();
        keys.insert(key);
    }
    keys.into_iter()
        .map(|k| Row::new(k.into_iter().map(Value::Int).collect()))
        .collect()
}

fn grid() -> Vec<Row> {
    let mut rows = Vec::new();
    for a in 0..6 {
        for b in 0..3 {
            rows.push(aeroscan::row![a, b]);
        }
    }
    rows
}

// =============================================================================
// Direction Tests
// =============================================================================

/// Every direction pattern over three columns emits each row exactly once
/// in the declared order.
#[test]
fn test_every_direction_pattern_is_complete_and_ordered() {
    let mut rng = StdRng::seed_from_u64(7);
    let index = IndexDef::over("abc", &["a", "b", "c"]);
    let rows = random_rows(&mut rng, 3, 120);

    for pattern in 0..8u32 {
        let ascending: Vec<bool> = (0..3).map(|i| pattern & (1 << i) == 0).collect();
        let mut expected: Vec<Vec<i64>> = rows.iter().map(ints).collect();
        expected.sort_by(|a, b| compare(a, b, &ascending));

        let actual: Vec<Vec<i64>> = scan(&index, &rows, KeyRange::unbounded(), &ascending)
            .iter()
            .map(ints)
            .collect();
        assert_eq!(actual, expected, "directions {:?}", ascending);
    }
}

/// Random four-column patterns with random equality prefixes.
#[test]
fn test_random_patterns_with_prefix() {
    let mut rng = StdRng::seed_from_u64(42);
    let index = IndexDef::over("abcd", &["a", "b", "c", "d"]);
    let rows = random_rows(&mut rng, 4, 300);

    for _ in 0..20 {
        let ascending: Vec<bool> = (0..4).map(|_| rng.gen_bool(0.5)).collect();
        let prefix = rng.gen_range(-3..4);
        let mut expected: Vec<Vec<i64>> =
            rows.iter().map(ints).filter(|r| r[0] == prefix).collect();
        expected.sort_by(|a, b| compare(a, b, &ascending));

        let range = KeyRange::point(vec![Value::Int(prefix)]);
        let actual: Vec<Vec<i64>> =
            scan(&index, &rows, range, &ascending).iter().map(ints).collect();
        assert_eq!(actual, expected);
    }
}

/// Index (a ASC, b DESC, c ASC).
#[test]
fn test_three_column_mixed_scan() {
    let index = IndexDef::over("abc", &["a", "b", "c"]);
    let rows = vec![
        aeroscan::row![2, 1, 1],
        aeroscan::row![1, 3, 9],
        aeroscan::row![1, 5, 2],
        aeroscan::row![1, 5, 1],
    ];
    let out = scan(&index, &rows, KeyRange::unbounded(), &[true, false, true]);
    assert_eq!(
        out,
        vec![
            aeroscan::row![1, 5, 1],
            aeroscan::row![1, 5, 2],
            aeroscan::row![1, 3, 9],
            aeroscan::row![2, 1, 1],
        ]
    );
}

// =============================================================================
// Boundary Tests
// =============================================================================

/// a in [1, 2) excludes a = 2.
#[test]
fn test_half_open_range() {
    let index = IndexDef::over("abc", &["a", "b", "c"]);
    let rows = vec![
        aeroscan::row![1, 5, 1],
        aeroscan::row![1, 5, 2],
        aeroscan::row![1, 3, 9],
        aeroscan::row![2, 1, 1],
    ];
    let range = KeyRange::new(vec![Value::Int(1)], true, vec![Value::Int(2)], false).unwrap();
    let out = scan(&index, &rows, range, &[true, false, true]);
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|r| r.values()[0] == Value::Int(1)));
}

/// Exclusive bounds never emit the bound value; inclusive bounds emit it
/// first or last depending on direction.
#[test]
fn test_bound_inclusivity() {
    let index = IndexDef::over("ab", &["a", "b"]);
    let rows = grid();
    let first_a = |out: &[Row]| out.first().and_then(|r| r.values()[0].as_int());
    let last_a = |out: &[Row]| out.last().and_then(|r| r.values()[0].as_int());

    for ascending in [true, false] {
        let dirs = [ascending, true];
        let exclusive =
            KeyRange::new(vec![Value::Int(2)], false, vec![Value::Int(4)], false).unwrap();
        let out = scan(&index, &rows, exclusive, &dirs);
        assert!(out.iter().all(|r| r.values()[0] == Value::Int(3)));
        assert_eq!(out.len(), 3);

        let inclusive =
            KeyRange::new(vec![Value::Int(2)], true, vec![Value::Int(4)], true).unwrap();
        let out = scan(&index, &rows, inclusive, &dirs);
        assert_eq!(out.len(), 9);
        if ascending {
            assert_eq!(first_a(&out), Some(2));
            assert_eq!(last_a(&out), Some(4));
        } else {
            assert_eq!(first_a(&out), Some(4));
            assert_eq!(last_a(&out), Some(2));
        }
    }
}

/// An inequality on the second column under an equality prefix.
#[test]
fn test_prefix_with_inequality() {
    let index = IndexDef::over("ab", &["a", "b"]);
    let range = KeyRange::with_prefix(vec![Value::Int(3)], Some((Value::Int(0), false)), None);
    let out = scan(&index, &grid(), range, &[true, false]);
    assert_eq!(out, vec![aeroscan::row![3, 2], aeroscan::row![3, 1]]);
}

/// Empty when lo lies past hi.
#[test]
fn test_inverted_range_is_empty() {
    let index = IndexDef::over("ab", &["a", "b"]);
    let range = KeyRange::new(vec![Value::Int(4)], true, vec![Value::Int(1)], true).unwrap();
    assert!(scan(&index, &grid(), range, &[true, true]).is_empty());
}

/// Bounds beyond the index width are rejected at open.
#[test]
fn test_too_many_bound_columns() {
    let index = IndexDef::over("ab", &["a", "b"]);
    let range = KeyRange::point(vec![Value::Int(1), Value::Int(1), Value::Int(1)]);
    let store = store(&index, &grid());
    let mut cursor = MixedOrderCursor::new(store, index, range, vec![], QueryContext::default());
    let err = cursor.open().unwrap_err();
    assert_eq!(err.code().code(), "AERO_SCAN_INVALID_BOUNDS");
}

/// Unique index entries carry trailing columns in the value; bounds on them
/// still hold.
#[test]
fn test_unique_index_bounds() {
    let index = IndexDef::unique("u", vec![IndexColumn::new("id"), IndexColumn::new("v")], 1);
    let rows: Vec<Row> = (0..10).map(|i| aeroscan::row![i, i * 10]).collect();
    let bounds = |lo_inclusive| {
        let lo = vec![Value::Int(5), Value::Int(50)];
        KeyRange::new(lo, lo_inclusive, vec![Value::Int(5), Value::Int(90)], true).unwrap()
    };
    assert_eq!(scan(&index, &rows, bounds(true), &[true]), vec![aeroscan::row![5, 50]]);
    assert!(scan(&index, &rows, bounds(false), &[true]).is_empty());
}

/// Rows whose key columns only collate equal are all indexed and scanned.
#[test]
fn test_collated_index_keeps_equal_collating_rows() {
    let index = IndexDef::new(
        "names",
        vec![IndexColumn::collated("name", Collation::CaseInsensitive), IndexColumn::new("n")],
    );
    let rows = vec![
        aeroscan::row!["Ann", 1],
        aeroscan::row!["ANN", 1],
        aeroscan::row!["bob", 2],
        aeroscan::row!["Bob", 1],
    ];
    let mut tree = MemoryTree::new("names");
    assert_eq!(IndexWriter::new(&index, &mut tree).unwrap().insert_all(&rows).unwrap(), 4);

    let ascending = scan(&index, &rows, KeyRange::unbounded(), &[true, true]);
    assert_eq!(
        ascending,
        vec![
            aeroscan::row!["ANN", 1],
            aeroscan::row!["Ann", 1],
            aeroscan::row!["Bob", 1],
            aeroscan::row!["bob", 2],
        ]
    );

    let descending = scan(&index, &rows, KeyRange::unbounded(), &[false]);
    assert_eq!(
        descending,
        vec![
            aeroscan::row!["Bob", 1],
            aeroscan::row!["bob", 2],
            aeroscan::row!["ANN", 1],
            aeroscan::row!["Ann", 1],
        ]
    );

    let point = scan(&index, &rows, KeyRange::point(vec![Value::text("aNN")]), &[false, false]);
    assert_eq!(point, vec![aeroscan::row!["ANN", 1], aeroscan::row!["Ann", 1]]);
}

/// A unique index holds any number of rows with a NULL key.
#[test]
fn test_unique_index_accepts_repeated_nulls() {
    let index = IndexDef::unique("u", vec![IndexColumn::new("id"), IndexColumn::new("v")], 1);
    let rows = vec![
        aeroscan::row![Value::Null, 2],
        aeroscan::row![1, 10],
        aeroscan::row![Value::Null, 1],
        aeroscan::row![2, 20],
    ];
    let mut tree = MemoryTree::new("u");
    assert_eq!(IndexWriter::new(&index, &mut tree).unwrap().insert_all(&rows).unwrap(), 4);

    let all = scan(&index, &rows, KeyRange::unbounded(), &[true]);
    assert_eq!(
        all,
        vec![
            aeroscan::row![Value::Null, 1],
            aeroscan::row![Value::Null, 2],
            aeroscan::row![1, 10],
            aeroscan::row![2, 20],
        ]
    );

    let reversed = scan(&index, &rows, KeyRange::unbounded(), &[false]);
    assert_eq!(reversed[0], aeroscan::row![2, 20]);
    assert_eq!(reversed.len(), 4);

    let nulls = scan(&index, &rows, KeyRange::point(vec![Value::Null]), &[true]);
    assert_eq!(nulls.len(), 2);
    assert!(nulls.iter().all(|r| r.values()[0].is_null()));
}

// =============================================================================
// Jump and Lifecycle Tests
// =============================================================================

/// Jump resumes at the first row at or after the target.
#[test]
fn test_jump_then_continue() {
    let index = IndexDef::over("ab", &["a", "b"]);
    let mut cursor = MixedOrderCursor::new(
        store(&index, &grid()),
        index,
        KeyRange::unbounded(),
        vec![true, true],
        QueryContext::default(),
    );
    cursor.open().unwrap();
    assert_eq!(cursor.next().unwrap(), Some(aeroscan::row![0, 0]));

    cursor.jump(&aeroscan::row![4, 1], &ColumnSelector::Leading(2)).unwrap();
    assert_eq!(cursor.next().unwrap(), Some(aeroscan::row![4, 1]));
    assert_eq!(cursor.next().unwrap(), Some(aeroscan::row![4, 2]));
    assert_eq!(cursor.next().unwrap(), Some(aeroscan::row![5, 0]));
}

/// Exhaustion returns to idle; the cursor can be reopened and destroyed.
#[test]
fn test_reopen_and_destroy() {
    let index = IndexDef::over("ab", &["a", "b"]);
    let mut cursor = MixedOrderCursor::new(
        store(&index, &grid()),
        index,
        KeyRange::point(vec![Value::Int(1)]),
        vec![],
        QueryContext::default(),
    );
    assert_eq!(collect_rows(&mut cursor).unwrap().len(), 3);
    assert_eq!(cursor.state(), CursorState::Idle);
    assert_eq!(collect_rows(&mut cursor).unwrap().len(), 3);

    cursor.destroy();
    assert_eq!(cursor.state(), CursorState::Destroyed);
    assert_eq!(cursor.open().unwrap_err().code().code(), "AERO_CURSOR_STATE");
}

/// Cancellation is observed per row and leaves the cursor closed.
#[test]
fn test_scan_cancellation() {
    let index = IndexDef::over("ab", &["a", "b"]);
    let context = QueryContext::default();
    let token = context.cancellation().clone();
    let store = store(&index, &grid());
    let mut cursor =
        MixedOrderCursor::new(store, index, KeyRange::unbounded(), vec![], context.clone());
    cursor.open().unwrap();
    cursor.next().unwrap();
    token.cancel();
    assert!(cursor.next().unwrap_err().is_cancellation());
    assert_eq!(cursor.state(), CursorState::Idle);
    assert_eq!(context.metrics().snapshot().cancellations, 1);
}
