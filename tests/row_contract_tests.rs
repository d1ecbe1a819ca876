//! Tests for the row contract
//!
//! Every row representation must behave the same way through `Row`:
//! - Timestamp, dimension and metric reads return what was constructed
//! - Missing dimensions read as empty, missing metrics as the default
//! - Names are case-folded at construction
//! - Reads never drift and rows can be shared across tasks

use eventrow::columnar::{rows_to_batch, RowBatch};
use eventrow::row::{AnyRow, InputRow, MapBasedRow, Row, DEFAULT_FLOAT_METRIC};
use eventrow::schema::{ColumnName, RowSchema};

use std::sync::Arc;

fn name(raw: &str) -> ColumnName {
    ColumnName::new(raw)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// The reference event used across these tests
fn clicks_row() -> MapBasedRow {
    MapBasedRow::builder(1_700_000_000_000)
        .dimension("country", ["us"])
        .metric("clicks", 3.0)
        .build()
}

/// Assert the reference event reads back correctly through any representation
fn assert_clicks_row(row: &dyn Row) {
    assert_eq!(row.timestamp_from_epoch(), 1_700_000_000_000);
    assert_eq!(row.dimension(&name("country")).to_vec(), strings(&["us"]));
    assert!(row.dimension(&name("missing")).is_empty());
    assert_eq!(row.float_metric(&name("clicks")), 3.0);
    assert_eq!(row.float_metric(&name("missing")), DEFAULT_FLOAT_METRIC);
    assert_eq!(row.float_metric(&name("missing")), 0.0);
}

#[test]
fn test_concrete_scenario_map_based() {
    assert_clicks_row(&clicks_row());
}

#[test]
fn test_concrete_scenario_tagged() {
    let row: AnyRow = clicks_row().into();
    assert_clicks_row(&row);

    let decoded = AnyRow::from_json(&row.to_json().unwrap()).unwrap();
    assert_clicks_row(&decoded);
}

#[test]
fn test_concrete_scenario_columnar() {
    let schema = RowSchema::builder()
        .with_dimension("country")
        .with_metric("clicks")
        .build()
        .unwrap();
    let batch = rows_to_batch(&schema, &[clicks_row()]).unwrap();
    let view = RowBatch::try_new(batch).unwrap();
    assert_clicks_row(&view.row(0).unwrap());
}

#[test]
fn test_multi_value_order_across_representations() {
    let row = MapBasedRow::builder(5)
        .dimension("Tags", ["v2", "v1", "v3"])
        .build();
    let expected = strings(&["v2", "v1", "v3"]);

    assert_eq!(row.dimension(&name("tags")).to_vec(), expected);

    let tagged = AnyRow::from_json(&AnyRow::from(row.clone()).to_json().unwrap()).unwrap();
    assert_eq!(tagged.dimension(&name("tags")).to_vec(), expected);

    let schema = RowSchema::builder().with_dimension("tags").build().unwrap();
    let view = RowBatch::try_new(rows_to_batch(&schema, &[row]).unwrap()).unwrap();
    assert_eq!(view.row(0).unwrap().dimension(&name("tags")).to_vec(), expected);
}

#[test]
fn test_case_folded_construction_is_indistinguishable() {
    let upper = MapBasedRow::builder(1).dimension("Foo", ["bar"]).build();
    let lower = MapBasedRow::builder(1).dimension("foo", ["bar"]).build();

    assert_eq!(upper.dimension(&name("foo")), lower.dimension(&name("foo")));
    assert_eq!(upper.dimension(&name("FOO")), lower.dimension(&name("Foo")));
    assert_eq!(upper.dimension_names(), lower.dimension_names());
    assert_eq!(
        AnyRow::from(upper).to_json().unwrap(),
        AnyRow::from(lower).to_json().unwrap()
    );
}

#[test]
fn test_round_trip_of_inputs() {
    let dimensions = vec![
        (name("country"), strings(&["us"])),
        (name("device"), strings(&["ios", "tablet"])),
        (name("page"), strings(&["/home"])),
    ];
    let metrics = vec![(name("clicks"), 3.0), (name("latency_ms"), 41.25), (name("neg"), -2.0)];
    let row = MapBasedRow::new(1_234, dimensions.clone(), metrics.clone());

    assert_eq!(row.timestamp_from_epoch(), 1_234);
    for (key, values) in &dimensions {
        assert_eq!(&row.dimension(key).to_vec(), values);
    }
    for (key, value) in &metrics {
        assert_eq!(row.float_metric(key), *value);
    }
}

#[test]
fn test_absent_metric_reads_default_for_every_representation() {
    let row = MapBasedRow::builder(0).dimension("a", ["x"]).build();
    let absent = name("never_declared");
    assert_eq!(row.float_metric(&absent), DEFAULT_FLOAT_METRIC);

    let tagged: AnyRow = row.clone().into();
    assert_eq!(tagged.float_metric(&absent), DEFAULT_FLOAT_METRIC);

    let schema = RowSchema::builder()
        .with_dimension("a")
        .with_metric("declared")
        .build()
        .unwrap();
    let view = RowBatch::try_new(rows_to_batch(&schema, &[row]).unwrap()).unwrap();
    let batch_row = view.row(0).unwrap();
    assert_eq!(batch_row.float_metric(&absent), DEFAULT_FLOAT_METRIC);
    assert_eq!(batch_row.float_metric(&name("declared")), DEFAULT_FLOAT_METRIC);
}

#[test]
fn test_repeated_reads_do_not_drift() {
    let row: AnyRow = MapBasedRow::builder(99)
        .dimension("a", ["1", "2"])
        .metric("m", 7.5)
        .build()
        .into();

    let first = (
        row.timestamp_from_epoch(),
        row.dimension(&name("a")).to_vec(),
        row.float_metric(&name("m")),
    );
    for _ in 0..100 {
        assert_eq!(row.timestamp_from_epoch(), first.0);
        assert_eq!(row.dimension(&name("a")).to_vec(), first.1);
        assert_eq!(row.float_metric(&name("m")), first.2);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_see_same_values() {
    let row: Arc<AnyRow> = Arc::new(
        MapBasedRow::builder(1_700_000_000_000)
            .dimension("country", ["us", "ca"])
            .metric("clicks", 3.0)
            .build()
            .into(),
    );

    let mut handles = Vec::new();
    for _ in 0..16 {
        let row = Arc::clone(&row);
        handles.push(tokio::spawn(async move {
            let mut reads = Vec::new();
            for _ in 0..50 {
                reads.push((
                    row.timestamp_from_epoch(),
                    row.dimension(&ColumnName::new("country")).to_vec(),
                    row.float_metric(&ColumnName::new("clicks")),
                ));
                tokio::task::yield_now().await;
            }
            reads
        }));
    }

    for handle in handles {
        for (ts, countries, clicks) in handle.await.unwrap() {
            assert_eq!(ts, 1_700_000_000_000);
            assert_eq!(countries, strings(&["us", "ca"]));
            assert_eq!(clicks, 3.0);
        }
    }
}

#[test]
fn test_trait_objects_over_mixed_representations() {
    let schema = RowSchema::builder()
        .with_dimension("country")
        .with_metric("clicks")
        .build()
        .unwrap();
    let view = RowBatch::try_new(rows_to_batch(&schema, &[clicks_row()]).unwrap()).unwrap();
    let batch_row = view.row(0).unwrap();

    let map_row = clicks_row();
    let tagged: AnyRow = clicks_row().into();
    let rows: [&dyn Row; 3] = [&map_row, &tagged, &batch_row];
    let total: f64 = rows.iter().map(|r| r.float_metric(&name("clicks"))).sum();
    assert_eq!(total, 9.0);
}
