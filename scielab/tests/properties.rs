//! Property-based tests for the S-CIELAB pipeline.

mod common;

use common::generators::{gen_random, gen_uniform};
use common::to_img;
use proptest::prelude::*;
use scielab::{DeltaE, DisplayGeometry, ScielabParams, compute_sampling_density, scielab};

proptest! {
    /// Sampling density is positive and falls as the screen gets larger.
    #[test]
    fn prop_density_decreases_with_diagonal(
        width in 1usize..8000,
        height in 1usize..8000,
        diagonal in 1.0f64..100.0,
        grow in 0.5f64..50.0,
    ) {
        let small = compute_sampling_density(width, height, diagonal).unwrap();
        let large = compute_sampling_density(width, height, diagonal + grow).unwrap();
        prop_assert!(small > 0.0 && large > 0.0);
        prop_assert!(large < small, "{large} should be below {small}");
    }

    /// Non-positive diagonals never produce a density.
    #[test]
    fn prop_rejects_non_positive_diagonal(diagonal in -100.0f64..=0.0) {
        prop_assert!(compute_sampling_density(1920, 1080, diagonal).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Comparing an image with itself gives an all-zero map.
    #[test]
    fn prop_self_difference_is_zero(
        width in 1usize..24,
        height in 1usize..24,
        seed in any::<u64>(),
        diagonal in 5.0f64..40.0,
    ) {
        let img = to_img(&gen_random(width, height, seed), width, height);
        let params = ScielabParams::new()
            .with_display(DisplayGeometry::new(1920, 1080, diagonal).unwrap());
        let result = scielab(img.as_ref(), img.as_ref(), &params).unwrap();
        prop_assert_eq!(result.avg_diff, 0.0);
        prop_assert_eq!(result.max_diff, 0.0);
        prop_assert_eq!(result.max_pos, (0, 0));
    }

    /// The difference does not depend on argument order.
    #[test]
    fn prop_difference_is_symmetric(
        size in 2usize..20,
        seed in any::<u64>(),
        gray in 0u8..=255,
        ciede2000 in any::<bool>(),
    ) {
        let a = to_img(&gen_random(size, size, seed), size, size);
        let b = to_img(&gen_uniform(size, size, gray, gray, gray), size, size);
        let formula = if ciede2000 { DeltaE::Ciede2000 } else { DeltaE::Cie76 };
        let params = ScielabParams::new().with_delta_e(formula);
        let ab = scielab(a.as_ref(), b.as_ref(), &params).unwrap();
        let ba = scielab(b.as_ref(), a.as_ref(), &params).unwrap();
        for (p, q) in ab.diffmap.buf().iter().zip(ba.diffmap.buf()) {
            prop_assert!((p - q).abs() < 1e-3, "{} vs {}", p, q);
        }
    }
}
