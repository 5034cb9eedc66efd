use common::float_ext::FloatExt;

use super::*;
use crate::diff;

fn sample(rel_diff: f32) -> PixelSample {
    PixelSample {
        rel_diff,
        ..Default::default()
    }
}

fn samples_from(golden: &[f32], comparison: &[f32], width: u32) -> (Vec<PixelSample>, usize) {
    let out = diff::compute::<Vec<u8>>(golden, comparison, width, None).unwrap();
    (out.samples, out.bad_pixel_count)
}

// =============================================================================
// Sorting
// =============================================================================

#[test]
fn test_sort_is_descending_by_magnitude() {
    let mut samples: Vec<_> = [0.1, -0.5, 0.0, 0.02, -0.02, 1e-7, -3.0]
        .into_iter()
        .map(sample)
        .collect();
    sort_by_magnitude(&mut samples);

    for pair in samples.windows(2) {
        assert!(pair[0].rel_diff.abs() >= pair[1].rel_diff.abs());
    }
    assert_eq!(samples[0].rel_diff, -3.0);
    assert_eq!(samples.last().unwrap().rel_diff, 0.0);
}

#[test]
fn test_sort_puts_nan_first() {
    let mut samples: Vec<_> = [0.1, f32::NAN, 5.0].into_iter().map(sample).collect();
    sort_by_magnitude(&mut samples);
    assert!(samples[0].rel_diff.is_nan());
    assert_eq!(samples[1].rel_diff, 5.0);
}

#[test]
fn test_top_n_clamps_to_length() {
    let samples: Vec<_> = [0.3, 0.2, 0.1].into_iter().map(sample).collect();
    assert_eq!(top_n(&samples, 10).len(), 3);
    assert_eq!(top_n(&samples, 2).len(), 2);
    assert!(top_n(&samples, 0).is_empty());
}

// =============================================================================
// Aggregation
// =============================================================================

#[test]
fn test_no_differences() {
    let values = [3.0f32; 9];
    let (mut samples, bad) = samples_from(&values, &values, 3);
    let stats = StatsAggregator::new(bad, 9).aggregate(&mut samples);

    assert_eq!(stats.count_nonzero, 0);
    assert_eq!(stats.sum_abs_rel_diff_nonzero, 0.0);
    assert!(stats.nonzero.is_none());
    assert_eq!(stats.bad_pct(), 0.0);
}

#[test]
fn test_single_bad_pixel_has_no_nonzero_stats() {
    let golden = [1.0, 1.0, 1.0, 0.0];
    let comparison = [1.0, 1.0, 1.0, 1.0];
    let (mut samples, bad) = samples_from(&golden, &comparison, 2);
    let stats = StatsAggregator::new(bad, 4).aggregate(&mut samples);

    assert_eq!(stats.bad_pixel_count, 1);
    assert_eq!(stats.count_nonzero, 0);
    assert!(stats.nonzero.is_none());
    assert!(stats.bad_pct().approximately_eq(25.0));
    assert!(stats.bad_ppm().approximately_eq(250_000.0));
}

#[test]
fn test_uniform_one_percent_drift() {
    let golden = vec![1.01f32; 16];
    let comparison = vec![1.0f32; 16];
    let (mut samples, bad) = samples_from(&golden, &comparison, 4);
    let stats = StatsAggregator::new(bad, 16).aggregate(&mut samples);

    let rel = ((1.01f32 - 1.0f32) / 1.0f32) as f64;
    let nonzero = stats.nonzero.as_ref().unwrap();
    assert_eq!(stats.count_nonzero, 16);
    assert!(nonzero.average.relative_eq(rel, 1e-12));
    assert!(nonzero.avg_pct().relative_eq(rel * 100.0, 1e-12));
    assert!(nonzero.median_estimate_ppm.relative_eq(rel * 1e6, 1e-12));
    assert_eq!(nonzero.top.len(), 10);
    assert!(stats.nonzero_pct().approximately_eq(100.0));
}

#[test]
fn test_average_ignores_zero_differences() {
    let mut samples: Vec<_> = [0.0, 0.2, 0.0, -0.4, 0.0].into_iter().map(sample).collect();
    let stats = StatsAggregator::new(0, 5).aggregate(&mut samples);

    assert_eq!(stats.count_nonzero, 2);
    let expected = (0.2f32 as f64 + 0.4f32 as f64) / 2.0;
    assert!(stats.nonzero.unwrap().average.relative_eq(expected, 1e-12));
}

#[test]
fn test_aggregate_ignores_input_order() {
    const LEN: usize = 23;
    let values: Vec<f32> = (0..LEN)
        .map(|i| match i % 4 {
            0 => 0.0,
            1 => i as f32 * 1e-4,
            2 => -(i as f32) * 3e-3,
            _ => i as f32 * 0.05,
        })
        .collect();

    let mut in_order: Vec<_> = values.iter().copied().map(sample).collect();
    // 7 is coprime with 23, so this visits every index once.
    let mut permuted: Vec<_> = (0..LEN).map(|i| sample(values[i * 7 % LEN])).collect();
    let mut reversed: Vec<_> = values.iter().rev().copied().map(sample).collect();

    let expected = StatsAggregator::new(0, LEN).aggregate(&mut in_order);
    let expected_nonzero = expected.nonzero.clone().unwrap();
    for samples in [&mut permuted, &mut reversed] {
        let stats = StatsAggregator::new(0, LEN).aggregate(samples);
        assert_eq!(stats.count_nonzero, expected.count_nonzero);
        assert!(stats
            .sum_abs_rel_diff_nonzero
            .relative_eq(expected.sum_abs_rel_diff_nonzero, 1e-12));

        let nonzero = stats.nonzero.unwrap();
        assert!(nonzero.average.relative_eq(expected_nonzero.average, 1e-12));
        assert_eq!(nonzero.median_estimate_ppm, expected_nonzero.median_estimate_ppm);
        assert_eq!(nonzero.top, expected_nonzero.top);
    }
}

#[test]
fn test_median_uses_nonzero_count_on_full_sequence() {
    // Sorted magnitudes: 0.4, 0.3, 0.2, 0, 0, 0; count_nonzero = 3, index 1.
    let mut samples: Vec<_> = [0.0, 0.2, 0.0, -0.4, 0.0, 0.3]
        .into_iter()
        .map(sample)
        .collect();
    let stats = StatsAggregator::new(0, 6).aggregate(&mut samples);

    let nonzero = stats.nonzero.unwrap();
    assert!(nonzero.median_estimate_ppm.relative_eq(0.3f32 as f64 * 1e6, 1e-12));
}

#[test]
fn test_top_includes_zero_entries_when_few_differ() {
    let mut samples: Vec<_> = [0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        .into_iter()
        .map(sample)
        .collect();
    let stats = StatsAggregator::new(0, 12).aggregate(&mut samples);

    let top = stats.nonzero.unwrap().top;
    assert_eq!(top.len(), 10);
    assert_eq!(top[0].rel_diff, 0.5);
    assert!(top[1..].iter().all(|s| s.rel_diff == 0.0));
}

#[test]
fn test_top_n_is_configurable() {
    let mut samples: Vec<_> = (1..=20).map(|i| sample(i as f32 * 0.01)).collect();
    let stats = StatsAggregator::new(0, 20)
        .with_top_n(3)
        .aggregate(&mut samples);

    let top = stats.nonzero.unwrap().top;
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].rel_diff, 20.0f32 * 0.01);
    assert_eq!(top[2].rel_diff, 18.0f32 * 0.01);
}

#[test]
fn test_mixed_scenario() {
    // Golden [1,2,0,4] against comparison [1,1,0,5].
    let golden = [1.0, 2.0, 0.0, 4.0];
    let comparison = [1.0, 1.0, 0.0, 5.0];
    let (mut samples, bad) = samples_from(&golden, &comparison, 2);
    let stats = StatsAggregator::new(bad, 4).aggregate(&mut samples);

    assert_eq!(stats.bad_pixel_count, 0);
    assert_eq!(stats.count_nonzero, 2);
    assert!(stats.sum_abs_rel_diff_nonzero.relative_eq(1.2, 1e-6));

    let nonzero = stats.nonzero.unwrap();
    assert!(nonzero.average.relative_eq(0.6, 1e-6));
    assert!(nonzero.median_estimate_ppm.relative_eq(-200_000.0, 1e-6));
    assert_eq!(nonzero.top[0].rel_diff, 1.0);
    assert_eq!(nonzero.top[1].rel_diff, -0.2);
}

#[test]
fn test_empty_raster_ratios_are_zero() {
    let stats = StatsAggregator::new(0, 0).aggregate(&mut []);
    assert_eq!(stats.total_pixels, 0);
    assert_eq!(stats.bad_pct(), 0.0);
    assert_eq!(stats.bad_ppm(), 0.0);
    assert_eq!(stats.nonzero_pct(), 0.0);
    assert!(stats.nonzero.is_none());
}
