//! Property tests for the value model invariants.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use sigval_core::{
    ArithmeticOp, BooleanTimeSeries, BoundedVector, CompareOp, Number, Pack, TimeSeries,
    ValueDomain,
};
use sigval_tests::{meters, signal};

fn series_from(name: &str, samples: &BTreeMap<i32, f64>) -> TimeSeries {
    signal(
        name,
        samples.values().copied().collect(),
        samples.keys().map(|timestamp| f64::from(*timestamp)).collect(),
        0.0,
        10.0,
    )
}

fn samples() -> impl Strategy<Value = BTreeMap<i32, f64>> {
    prop::collection::btree_map(-500_i32..500, 0.0_f64..=10.0, 0..24)
}

fn arithmetic_op() -> impl Strategy<Value = ArithmeticOp> {
    prop::sample::select(vec![
        ArithmeticOp::Add,
        ArithmeticOp::Sub,
        ArithmeticOp::Mul,
        ArithmeticOp::Max,
        ArithmeticOp::Min,
    ])
}

fn expected(op: ArithmeticOp, a: f64, b: f64) -> f64 {
    match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Sub => a - b,
        ArithmeticOp::Mul => a * b,
        ArithmeticOp::Max => a.max(b),
        ArithmeticOp::Min => a.min(b),
        ArithmeticOp::Div | ArithmeticOp::FloorDiv => unreachable!("not generated"),
    }
}

proptest! {
    #[test]
    fn insertion_succeeds_iff_value_is_in_range(
        low in -50.0_f64..50.0,
        width in 0.0_f64..50.0,
        value in -120.0_f64..120.0,
    ) {
        let high = low + width;
        let mut v = BoundedVector::new("v", meters(), vec![low], low, high)
            .expect("valid vector");
        let before = v.clone();

        let inserted = v.append(value);

        prop_assert_eq!(inserted, low <= value && value <= high);
        if !inserted {
            prop_assert_eq!(v, before);
        }
    }

    #[test]
    fn binary_operations_cover_exactly_the_shared_timestamps(
        left in samples(),
        right in samples(),
        op in arithmetic_op(),
    ) {
        let a = series_from("a", &left);
        let b = series_from("b", &right);
        let shared: BTreeSet<i32> = left.keys().filter(|key| right.contains_key(key)).copied().collect();

        let result = a.apply(op, &b).expect("supported operation");

        prop_assert_eq!(result.len(), shared.len());
        for timestamp in shared {
            let t = f64::from(timestamp);
            let want = expected(op, left[&timestamp], right[&timestamp]);
            prop_assert_eq!(result.value_at(t), Some(want));
        }
    }

    #[test]
    fn comparisons_cover_exactly_the_shared_timestamps(
        left in samples(),
        right in samples(),
    ) {
        let a = series_from("a", &left);
        let b = series_from("b", &right);
        let shared = left.keys().filter(|key| right.contains_key(key)).count();

        let result = a.compare(CompareOp::Ge, &b).expect("comparison");

        prop_assert_eq!(result.len(), shared);
        for (timestamp, value) in result.timestamps().iter().zip(result.values()) {
            let key = *timestamp as i32;
            let holds = left[&key] >= right[&key];
            prop_assert_eq!(*value, if holds { 1.0 } else { 0.0 });
        }
    }

    #[test]
    fn removing_out_of_range_values_is_idempotent(
        raw in prop::collection::vec(-20.0_f64..20.0, 0..32),
    ) {
        let mut v = BoundedVector::from_unchecked("raw", meters(), raw, -5.0, 5.0, ValueDomain::Float)
            .expect("valid range");

        v.remove_out_of_range();
        let once = v.clone();
        let removed_again = v.remove_out_of_range();

        prop_assert_eq!(removed_again, 0);
        prop_assert_eq!(v, once);
    }

    #[test]
    fn packing_a_series_preserves_range_and_values(
        source in samples(),
        low in -100.0_f64..0.0,
        high in 10.0_f64..100.0,
    ) {
        let original = signal(
            "s",
            source.values().copied().collect(),
            source.keys().map(|timestamp| f64::from(*timestamp)).collect(),
            low,
            high,
        );

        let mut restored = TimeSeries::builder("s")
            .unit(meters())
            .range(0.0, 0.0)
            .build()
            .expect("empty series");
        restored
            .unpack(&original.pack(), original.timestamps().to_vec())
            .expect("unpack");

        prop_assert_eq!(restored.range_min(), original.range_min());
        prop_assert_eq!(restored.range_max(), original.range_max());
        prop_assert_eq!(restored.values(), original.values());
        prop_assert_eq!(restored.timestamps(), original.timestamps());
    }

    #[test]
    fn resampling_keeps_known_samples_and_fills_the_rest(
        source in samples(),
        targets in prop::collection::btree_set(-500_i32..500, 0..24),
        fill in 0.0_f64..=10.0,
    ) {
        let s = series_from("s", &source);
        let new_timestamps: Vec<f64> = targets.iter().map(|timestamp| f64::from(*timestamp)).collect();

        let resampled = s
            .resample(&new_timestamps, Some(Number::Float(fill)))
            .expect("fill value is in range");

        prop_assert_eq!(resampled.timestamps(), new_timestamps.as_slice());
        for timestamp in targets {
            let t = f64::from(timestamp);
            let want = source.get(&timestamp).copied().unwrap_or(fill);
            prop_assert_eq!(resampled.value_at(t), Some(want));
        }
    }

    #[test]
    fn boolean_series_never_yield_numeric_results(
        left in prop::collection::vec(any::<bool>(), 0..16),
        right in prop::collection::vec(any::<bool>(), 0..16),
    ) {
        let timestamps = |count: usize| (0..count).map(|index| index as f64).collect::<Vec<_>>();
        let a = BooleanTimeSeries::from_bools("a", &left, timestamps(left.len()))
            .expect("valid boolean series");
        let b = BooleanTimeSeries::from_bools("b", &right, timestamps(right.len()))
            .expect("valid boolean series");

        prop_assert!(a.apply(ArithmeticOp::Add, &b).is_err());
        prop_assert!(a.negate().is_err());
        prop_assert!(a.pow(2).is_err());
    }
}
