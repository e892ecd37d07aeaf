//! Rate-of-change to fill color, as a fixed threshold scale.

pub const DARK_RED: &str = "#990000";
pub const RED: &str = "#d90000";
pub const LIMIT_RED: &str = "#ff2020";
pub const GREEN: &str = "#75e560";
pub const DARK_GREEN: &str = "#137C00";
/// Sixth entry of the range. The four thresholds cut five intervals, so
/// this color is never produced for a finite rate; it is kept verbatim
/// from the observed scale and pinned by test rather than removed.
pub const DEEP_GREEN: &str = "#054d00";

pub const THRESHOLDS: [f64; 4] = [-3.0, -0.25, 0.25, 3.0];
const RANGE: [&str; 6] = [DARK_RED, RED, LIMIT_RED, GREEN, DARK_GREEN, DEEP_GREEN];

/// Maps a rate to its bucket color. Bisect-right semantics: a rate equal
/// to a threshold takes the bucket above it. NaN fails every comparison
/// and lands in the top reachable bucket.
pub fn rate_color(rate: f64) -> &'static str {
    let mut i = 0;
    for &t in &THRESHOLDS {
        if rate < t {
            break;
        }
        i += 1;
    }
    RANGE[i]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_values_hit_their_buckets() {
        assert_eq!(rate_color(-7.5), DARK_RED);
        assert_eq!(rate_color(-2.31), RED);
        assert_eq!(rate_color(0.0), LIMIT_RED);
        assert_eq!(rate_color(2.31), GREEN);
        assert_eq!(rate_color(5.9), DARK_GREEN);
    }

    #[test]
    fn boundaries_take_the_bucket_above() {
        assert_eq!(rate_color(-3.0), RED);
        assert_eq!(rate_color(-0.25), LIMIT_RED);
        assert_eq!(rate_color(0.25), GREEN);
        assert_eq!(rate_color(3.0), DARK_GREEN);
    }

    #[test]
    fn sixth_color_is_a_dead_branch() {
        // the scale supplies one more color than the thresholds can reach
        assert_eq!(RANGE.len(), THRESHOLDS.len() + 2);
        assert_eq!(rate_color(f64::MAX), DARK_GREEN);
        assert_eq!(rate_color(f64::INFINITY), DARK_GREEN);
        let mut r = -10.0;
        while r <= 10.0 {
            assert_ne!(rate_color(r), DEEP_GREEN);
            r += 0.01;
        }
    }

    #[test]
    fn nan_falls_through_to_the_top_bucket() {
        assert_eq!(rate_color(f64::NAN), DARK_GREEN);
    }
}
