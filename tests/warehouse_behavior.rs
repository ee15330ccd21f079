//! Behavior-driven tests for the result warehouse
//!
//! These tests verify HOW containers survive a trip through the warehouse,
//! focusing on what a caller reads back.

use sigval_core::{
    BooleanTimeSeries, PercentageTimeSeries, ResultKind, ScalarValue, TimeSeries, Unit,
    UnitCatalog,
};
use sigval_tests::{flags, open_warehouse, signal};
use sigval_warehouse::WarehouseError;
use tempfile::tempdir;

// =============================================================================
// Warehouse: Round Trips
// =============================================================================

#[test]
fn when_user_stores_a_series_then_reload_reproduces_range_values_and_timestamps() {
    // Given: A fresh warehouse and a series with a missing sample
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());
    let original = signal(
        "speed",
        vec![1.0, f64::NAN, 3.5],
        vec![100.0, 200.0, 300.0],
        -5.0,
        50.0,
    );

    // When: User stores and reloads it
    let id = warehouse.store_series(&original).expect("store");
    let loaded = warehouse.load_series(id).expect("load");

    // Then: Range, timestamps and values come back, the gap included
    assert_eq!(loaded.name(), "speed");
    assert_eq!((loaded.range_min(), loaded.range_max()), (-5.0, 50.0));
    assert_eq!(loaded.timestamps(), original.timestamps());
    assert_eq!(loaded.values()[0], 1.0);
    assert!(loaded.values()[1].is_nan());
    assert_eq!(loaded.values()[2], 3.5);
    assert_eq!(loaded.unit().label, "m");
}

#[test]
fn when_warehouse_is_reopened_then_stored_results_persist() {
    // Given: A series stored through one warehouse handle
    let temp = tempdir().expect("tempdir");
    let id = {
        let warehouse = open_warehouse(temp.path());
        warehouse
            .store_series(&signal("gap", vec![2.0], vec![1.0], 0.0, 10.0))
            .expect("store")
    };

    // When: User opens the same database again
    let warehouse = open_warehouse(temp.path());

    // Then: The series is still there
    let loaded = warehouse.load_series(id).expect("load");
    assert_eq!(loaded.values(), &[2.0]);
}

#[test]
fn when_user_stores_flavored_series_then_each_reloads_as_its_flavor() {
    // Given: A boolean and a percentage series
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());
    let moving = flags("moving", &[false, true, true], vec![1.0, 2.0, 3.0]);
    let share = PercentageTimeSeries::new("share", vec![12.5, 80.0], vec![1.0, 2.0], None)
        .expect("valid percentage series");

    // When: User stores both
    let moving_id = warehouse.store_boolean_series(&moving).expect("store");
    let share_id = warehouse.store_percentage_series(&share).expect("store");

    // Then: Each comes back with its own guardrails
    let moving_back: BooleanTimeSeries =
        warehouse.load_boolean_series(moving_id).expect("load");
    assert_eq!(moving_back.values(), &[0.0, 1.0, 1.0]);
    assert!(moving_back.negate().is_err());

    let share_back = warehouse.load_percentage_series(share_id).expect("load");
    assert_eq!(share_back.values(), &[12.5, 80.0]);
    assert!(share_back.negate().is_err());
}

#[test]
fn when_user_stores_an_absent_scalar_then_it_reloads_absent() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());

    let id = warehouse
        .store_scalar(&ScalarValue::new("first_brake", Unit::from_name("second"), None))
        .expect("store");
    let loaded = warehouse.load_scalar(id).expect("load");

    assert!(loaded.is_absent());
    assert_eq!(loaded.unit.name, "second");
}

// =============================================================================
// Warehouse: Error Handling
// =============================================================================

#[test]
fn when_user_loads_with_the_wrong_kind_then_the_mismatch_is_reported() {
    // Given: A stored series
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());
    let id = warehouse
        .store_series(&signal("s", vec![1.0], vec![1.0], 0.0, 1.0))
        .expect("store");

    // When: User loads it as a histogram
    let err = warehouse.load_histogram(id).expect_err("must fail");

    // Then: The error names both kinds
    assert!(matches!(
        err,
        WarehouseError::KindMismatch {
            expected: ResultKind::Histogram,
            found: ResultKind::Series,
            ..
        }
    ));
}

#[test]
fn when_user_loads_a_deleted_result_then_it_is_not_found() {
    // Given: A stored and then deleted series
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());
    let id = warehouse
        .store_series(&signal("s", vec![1.0], vec![1.0], 0.0, 1.0))
        .expect("store");
    assert!(warehouse.delete_result(id).expect("delete"));

    // When: User loads it
    let err = warehouse.load_series(id).expect_err("must fail");

    // Then: It is reported missing, and a second delete is a no-op
    assert!(matches!(err, WarehouseError::NotFound { .. }));
    assert!(!warehouse.delete_result(id).expect("delete"));
}

// =============================================================================
// Warehouse: Listing and Unit Catalog
// =============================================================================

#[test]
fn when_user_lists_results_then_every_stored_container_appears_in_order() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());

    warehouse
        .store_series(&signal("a", vec![1.0, 2.0], vec![1.0, 2.0], 0.0, 5.0))
        .expect("store");
    warehouse
        .store_scalar(&ScalarValue::from_number("b", Unit::none(), 3))
        .expect("store");

    let listed = warehouse.list_results().expect("list");
    let names: Vec<&str> = listed.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(listed[0].kind, ResultKind::Series);
    // Range bounds are stored ahead of the values.
    assert_eq!(listed[0].value_count, 4);
}

#[test]
fn when_a_composed_unit_is_stored_then_the_catalog_learns_it() {
    // Given: A series in a unit the catalog has never seen
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());
    let distance = signal("d", vec![2.0], vec![1.0], 0.0, 10.0);
    let time = TimeSeries::new(
        "t",
        Unit::from_name("second"),
        vec![1.0],
        vec![1.0],
        1.0,
        2.0,
        None,
    )
    .expect("valid series");
    let speed = (&distance / &time).expect("division");

    // When: User stores it
    warehouse.store_series(&speed).expect("store");

    // Then: The catalog resolves the composed unit by name
    let record = warehouse
        .unit_by_name(&speed.unit().name)
        .expect("lookup")
        .expect("unit registered");
    assert_eq!(record.label, "m/s");
}
