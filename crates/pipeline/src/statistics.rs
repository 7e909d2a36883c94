//! Small-sample confidence estimates.

/// z for a one-sided 90% confidence level
pub const WILSON_Z_90: f64 = 1.281551565545;

/// Lower bound of the Wilson score interval at 90% confidence.
///
/// See [`wilson_lower_bound_with_z`].
pub fn wilson_lower_bound(successes: u32, total: u32) -> f64 {
    wilson_lower_bound_with_z(successes, total, WILSON_Z_90)
}

/// Lower bound of the Wilson score interval for `successes / total`.
///
/// Returns 0 for an empty sample or no successes. The result lies in
/// `[0, 1)`: a director liked 1 out of 1 times scores well below one liked
/// 18 out of 20 times.
pub fn wilson_lower_bound_with_z(successes: u32, total: u32, z: f64) -> f64 {
    if total == 0 || successes == 0 {
        return 0.0;
    }
    let n = total as f64;
    let p = (successes.min(total)) as f64 / n;
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let centre = p + z2 / (2.0 * n);
    let margin = z * ((p * (1.0 - p)) / n + z2 / (4.0 * n * n)).sqrt();
    ((centre - margin) / denom).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_samples() {
        for n in 0..50 {
            assert_eq!(wilson_lower_bound(0, n), 0.0);
        }
        for s in 0..50 {
            assert_eq!(wilson_lower_bound(s, 0), 0.0);
        }
    }

    #[test]
    fn test_small_sample_penalized() {
        let one_of_one = wilson_lower_bound(1, 1);
        let eighteen_of_twenty = wilson_lower_bound(18, 20);
        assert!(one_of_one < eighteen_of_twenty);
    }

    #[test]
    fn test_perfect_ratio_approaches_one() {
        let mut previous = 0.0;
        for s in [1, 2, 5, 10, 100, 1_000, 100_000] {
            let bound = wilson_lower_bound(s, s);
            assert!(bound > previous);
            assert!(bound < 1.0);
            previous = bound;
        }
        assert!(previous > 0.99);
    }

    #[test]
    fn test_range() {
        for total in 1..40 {
            for successes in 0..=total {
                let bound = wilson_lower_bound(successes, total);
                assert!((0.0..1.0).contains(&bound), "{successes}/{total} -> {bound}");
                assert!(bound <= successes as f64 / total as f64);
            }
        }
    }

    #[test]
    fn test_known_value() {
        // p = 0.5, n = 10, z = 1.2816
        let bound = wilson_lower_bound(5, 10);
        assert!((bound - 0.3122).abs() < 1e-3, "{bound}");
    }
}
