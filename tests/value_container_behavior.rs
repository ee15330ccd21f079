//! Behavior-driven tests for value containers
//!
//! These tests verify HOW vectors, series and scalars guard their ranges
//! and report statistics.

use sigval_core::{BoundedVector, Number, ScalarValue, TimeSeries, Unit, ValueDomain};
use sigval_tests::{meters, signal};

// =============================================================================
// BoundedVector: Statistics
// =============================================================================

#[test]
fn when_user_builds_a_vector_then_statistics_reflect_its_values() {
    // Given: A vector of mixed integers and floats
    let v = BoundedVector::new(
        "d",
        meters(),
        [
            Number::Int(1),
            Number::Int(2),
            Number::Float(3.1),
            Number::Float(4.5),
        ],
        0.0,
        10.0,
    )
    .expect("valid vector");

    // When: User asks for statistics
    let mean = v.mean().expect("mean of a non-empty vector");

    // Then: The values are promoted to float and summarized
    assert_eq!(v.domain(), ValueDomain::Float);
    assert!((mean - 2.65).abs() < 1e-9);
    assert_eq!(v.max(), Some(4.5));
    assert_eq!(v.min(), Some(1.0));
}

#[test]
fn when_vector_is_empty_then_statistics_are_absent() {
    // Given: An empty vector
    let v = BoundedVector::new("empty", meters(), Vec::<f64>::new(), 0.0, 1.0)
        .expect("valid vector");

    // Then: No statistic is invented
    assert_eq!(v.mean(), None);
    assert_eq!(v.max(), None);
    assert_eq!(v.std_dev(), None);
}

// =============================================================================
// BoundedVector: Range Guarding
// =============================================================================

#[test]
fn when_user_inserts_out_of_range_value_then_vector_is_unchanged() {
    // Given: A vector on [0, 10]
    let mut v = BoundedVector::new("d", meters(), vec![1.0, 2.0], 0.0, 10.0)
        .expect("valid vector");

    // When: User inserts one value inside and one outside the range
    let inside = v.insert(Some(0), 5.0);
    let outside = v.insert(None, 11.0);

    // Then: Only the admissible value lands
    assert!(inside);
    assert!(!outside);
    assert_eq!(v.values(), &[5.0, 1.0, 2.0]);
}

#[test]
fn when_initial_values_fall_outside_range_then_they_are_dropped() {
    // Given/When: A vector built with a value above its range
    let v = BoundedVector::new("d", meters(), vec![1.0, 20.0, 3.0], 0.0, 10.0)
        .expect("valid vector");

    // Then: The offending value is gone
    assert_eq!(v.values(), &[1.0, 3.0]);
}

#[test]
fn when_user_gives_inverted_range_then_construction_fails() {
    let result = BoundedVector::new("d", meters(), vec![1.0], 10.0, 0.0);
    assert!(result.is_err());
}

#[test]
fn when_user_cleans_twice_then_second_pass_removes_nothing() {
    // Given: A vector holding raw, unchecked data
    let mut v = BoundedVector::from_unchecked(
        "raw",
        meters(),
        vec![-1.0, 0.5, 2.0, f64::NAN, 0.7],
        0.0,
        1.0,
        ValueDomain::Float,
    )
    .expect("valid range");

    // When: User removes out-of-range values twice
    let first = v.remove_out_of_range();
    let after_first = v.clone();
    let second = v.remove_out_of_range();

    // Then: The second pass is a no-op
    assert_eq!(first, 3);
    assert_eq!(second, 0);
    assert_eq!(v, after_first);
    assert_eq!(v.values(), &[0.5, 0.7]);
}

// =============================================================================
// TimeSeries: Samples
// =============================================================================

#[test]
fn when_user_adds_samples_then_timestamps_stay_sorted_and_unique() {
    // Given: A series with two samples
    let mut s = signal("s", vec![1.0, 3.0], vec![10.0, 30.0], 0.0, 10.0);

    // When: User adds in the middle, duplicates a timestamp and exceeds the range
    let middle = s.add_sample(20.0, 2.0);
    let duplicate = s.add_sample(10.0, 5.0);
    let too_large = s.add_sample(40.0, 50.0);

    // Then: Only the middle sample is accepted
    assert!(middle);
    assert!(!duplicate);
    assert!(!too_large);
    assert_eq!(s.timestamps(), &[10.0, 20.0, 30.0]);
    assert_eq!(s.values(), &[1.0, 2.0, 3.0]);
    assert_eq!(s.value_at(20.0), Some(2.0));
    assert_eq!(s.value_at(25.0), None);
}

#[test]
fn when_user_builds_a_series_from_unsorted_input_then_it_is_ordered() {
    // Given/When: Samples out of order with a duplicate timestamp
    let s = TimeSeries::new(
        "s",
        meters(),
        vec![3.0, 1.0, 2.0, 9.0],
        vec![30.0, 10.0, 20.0, 10.0],
        0,
        10,
        None,
    )
    .expect("valid series");

    // Then: Samples are sorted and the first duplicate wins
    assert_eq!(s.timestamps(), &[10.0, 20.0, 30.0]);
    assert_eq!(s.values(), &[1.0, 2.0, 3.0]);
}

#[test]
fn when_integer_series_receives_fraction_then_it_is_skipped() {
    // Given: An integer-valued series
    let mut counts = TimeSeries::new(
        "counts",
        Unit::none(),
        vec![1_i64, 2],
        vec![1.0, 2.0],
        0,
        10,
        None,
    )
    .expect("valid series");

    // When: User adds an integral and a fractional sample
    let added = counts.add_samples(&[(3.0, Number::Float(2.5)), (4.0, Number::Int(4))]);

    // Then: Only the integral sample lands
    assert!(added);
    assert_eq!(counts.domain(), ValueDomain::Integer);
    assert_eq!(counts.timestamps(), &[1.0, 2.0, 4.0]);
}

// =============================================================================
// Scalars and Units
// =============================================================================

#[test]
fn when_scalar_text_does_not_parse_then_value_is_absent() {
    let parsed = ScalarValue::from_text("gap", meters(), "12.5");
    let missing = ScalarValue::from_text("gap", meters(), "n/a");

    assert_eq!(parsed.value, Some(12.5));
    assert!(missing.is_absent());
}

#[test]
fn when_user_divides_speed_by_time_then_unit_is_an_acceleration() {
    // Given: A speed series and a time series
    let speed = TimeSeries::new(
        "v",
        Unit::from_name("meters_per_second"),
        vec![2.0, 4.0],
        vec![1.0, 2.0],
        0.0,
        10.0,
        None,
    )
    .expect("valid series");
    let time = TimeSeries::new(
        "t",
        Unit::from_name("second"),
        vec![1.0, 2.0],
        vec![1.0, 2.0],
        1.0,
        2.0,
        None,
    )
    .expect("valid series");

    // When: User divides
    let acceleration = (&speed / &time).expect("division should succeed");

    // Then: The composed unit keeps both operands and matches m/s**2
    assert_eq!(acceleration.unit().label, "(m/s)/s");
    assert!(acceleration
        .unit()
        .same_dimension(&Unit::from_name("meters_per_second_squared")));
    assert_eq!(acceleration.values(), &[2.0, 2.0]);
}
