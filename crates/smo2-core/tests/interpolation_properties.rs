//! Property tests for channel interpolation

use proptest::prelude::*;
use smo2_core::{Extrapolation, Interpolator};

/// Strictly increasing axis with random positive steps
fn axis_and_values() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    prop::collection::vec((0.1f64..20.0, 40.0f64..200.0), 2..200).prop_map(|rows| {
        let mut position = 0.0;
        let (axis, values): (Vec<f64>, Vec<f64>) = rows
            .into_iter()
            .map(|(step, value)| {
                position += step;
                (position, value)
            })
            .unzip();
        (axis, values)
    })
}

proptest! {
    // Sampled positions return the stored sample bit for bit
    #[test]
    fn prop_round_trip_at_sample_positions((axis, values) in axis_and_values()) {
        for policy in [Extrapolation::Linear, Extrapolation::Flat] {
            let interp = Interpolator::new(&axis, &values, policy).unwrap();
            for (i, &x) in axis.iter().enumerate() {
                prop_assert_eq!(interp.at(x), values[i]);
            }
        }
    }

    // Between samples the value stays within the bracketing samples
    #[test]
    fn prop_interior_values_are_bracketed(
        (axis, values) in axis_and_values(),
        fraction in 0.0f64..1.0,
    ) {
        let interp = Interpolator::new(&axis, &values, Extrapolation::Linear).unwrap();
        for i in 0..axis.len() - 1 {
            let x = axis[i] + fraction * (axis[i + 1] - axis[i]);
            let v = interp.at(x);
            let (lo, hi) = if values[i] <= values[i + 1] {
                (values[i], values[i + 1])
            } else {
                (values[i + 1], values[i])
            };
            prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
        }
    }

    // Flat extrapolation never leaves the sampled range
    #[test]
    fn prop_flat_extrapolation_is_clamped(
        (axis, values) in axis_and_values(),
        offset in 0.1f64..1000.0,
    ) {
        let interp = Interpolator::new(&axis, &values, Extrapolation::Flat).unwrap();
        prop_assert_eq!(interp.at(axis[0] - offset), values[0]);
        prop_assert_eq!(interp.at(axis[axis.len() - 1] + offset), values[values.len() - 1]);
    }
}
