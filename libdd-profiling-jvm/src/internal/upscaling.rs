// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Computes the factor undoing Poisson sampling for one sample.
///
/// Samples are taken on average every `sampling_rate` units of the metric,
/// so an event of size `s` is seen with probability `1 - e^(-s/rate)`. The
/// average event size is taken from the sample's own `metric_value / count`.
/// Returns 1 (no correction) when sampling is disabled (`rate <= 1`) or the
/// values cannot yield an average.
pub fn calculate_sampling_ratio(sampling_rate: i64, count: i64, metric_value: i64) -> f64 {
    if sampling_rate <= 1 || count < 1 {
        return 1_f64;
    }
    // This should not happen, but if it happens, do not upscale.
    if metric_value <= 0 {
        return 1_f64;
    }

    let avg = metric_value as f64 / count as f64;
    1_f64 / (1_f64 - (-avg / sampling_rate as f64).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn disabled_sampling() {
        for rate in [i64::MIN, -1, 0, 1] {
            assert_eq!(1.0, calculate_sampling_ratio(rate, 10, 1000));
            assert_eq!(1.0, calculate_sampling_ratio(rate, 0, 0));
        }
    }

    #[test]
    fn degenerate_values() {
        assert_eq!(1.0, calculate_sampling_ratio(10, 0, 100));
        assert_eq!(1.0, calculate_sampling_ratio(10, -3, 100));
        assert_eq!(1.0, calculate_sampling_ratio(10, 5, 0));
    }

    #[test]
    fn half_probability_doubles() {
        // avg = 10 * ln 2, so each event had a 50% chance to be seen.
        let metric = 10.0 * std::f64::consts::LN_2;
        let avg_as_sum = (metric * 1000.0).round() as i64;
        let ratio = calculate_sampling_ratio(10_000, 1, avg_as_sum);
        assert!((ratio - 2.0).abs() < 1e-3, "ratio was {ratio}");

        let ratio = calculate_sampling_ratio(10, 1, metric.round() as i64);
        assert!((ratio - 2.0).abs() < 0.1, "ratio was {ratio}");
    }

    #[test]
    fn large_events_are_not_scaled() {
        let ratio = calculate_sampling_ratio(512 * 1024, 1, 64 * 1024 * 1024);
        assert!((ratio - 1.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn ratio_is_at_least_one(
            rate in 2..10_000_000i64,
            count in 1..1_000i64,
            metric in 1..1_000_000_000i64,
        ) {
            let ratio = calculate_sampling_ratio(rate, count, metric);
            prop_assert!(ratio.is_finite());
            prop_assert!(ratio >= 1.0);
        }
    }
}
