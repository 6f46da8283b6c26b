//! Rounding helpers for percentages.
//!
//! Enrollment progress and test scores are stored as percentages rounded to
//! two decimal places. Both the services and the storage adapters go through
//! these helpers so the rounding rule lives in exactly one place.

/// Round to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `completed` over `total`, rounded to two decimals.
///
/// A zero `total` yields 0.0 rather than NaN; a course with no live lessons
/// has no meaningful progress.
pub fn progress_percent(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round2(completed as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(65.004), 65.0);
        assert_eq!(round2(65.005), 65.01);
        assert_eq!(round2(33.333333), 33.33);
    }

    #[test]
    fn percent_of_lessons() {
        assert_eq!(progress_percent(1, 3), 33.33);
        assert_eq!(progress_percent(2, 3), 66.67);
        assert_eq!(progress_percent(3, 3), 100.0);
    }

    #[test]
    fn empty_course_has_zero_progress() {
        assert_eq!(progress_percent(0, 0), 0.0);
        assert_eq!(progress_percent(5, 0), 0.0);
    }
}
