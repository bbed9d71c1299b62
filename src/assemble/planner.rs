//! Segment planning: equal time windows over the narration track.

use super::{AssemblyError, Result};

/// Number of image segments in a story. The asset bundle carries exactly
/// this many stills, so the partition count is fixed rather than derived.
pub const SEGMENT_COUNT: usize = 3;

/// A contiguous time range assigned to one image segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    /// Segment index, ascending from 0.
    pub index: usize,
    /// Offset into the narration track, in seconds.
    pub start_seconds: f64,
    /// Window length in seconds. Fractional values are expected.
    pub duration_seconds: f64,
}

impl Window {
    /// End offset of this window, in seconds.
    #[must_use]
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }
}

/// Partition `[0, total_duration_seconds)` into `segment_count` equal windows.
///
/// No remainder handling on the last window: every window gets exactly
/// `total / count` seconds, so the windows always sum back to the total.
pub fn plan(total_duration_seconds: f64, segment_count: usize) -> Result<Vec<Window>> {
    if !total_duration_seconds.is_finite() || total_duration_seconds <= 0.0 {
        return Err(AssemblyError::InvalidInput(format!(
            "narration duration must be positive, got {total_duration_seconds}"
        )));
    }
    if segment_count == 0 {
        return Err(AssemblyError::InvalidInput(
            "segment count must be at least 1".to_string(),
        ));
    }

    let duration = total_duration_seconds / segment_count as f64;
    Ok((0..segment_count)
        .map(|index| Window {
            index,
            start_seconds: index as f64 * duration,
            duration_seconds: duration,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifteen_seconds_in_thirds() {
        let windows = plan(15.0, 3).unwrap();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start_seconds, 0.0);
        assert_eq!(windows[0].duration_seconds, 5.0);
        assert_eq!(windows[1].start_seconds, 5.0);
        assert_eq!(windows[1].duration_seconds, 5.0);
        assert_eq!(windows[2].start_seconds, 10.0);
        assert_eq!(windows[2].duration_seconds, 5.0);
    }

    #[test]
    fn test_durations_sum_to_total() {
        for total in [0.1, 1.0, 7.3, 15.0, 61.7, 3600.5] {
            let windows = plan(total, SEGMENT_COUNT).unwrap();
            let sum: f64 = windows.iter().map(|w| w.duration_seconds).sum();
            assert!(
                (sum - total).abs() < 1e-9,
                "windows for {total}s sum to {sum}s"
            );
        }
    }

    #[test]
    fn test_windows_are_ordered_and_disjoint() {
        let windows = plan(10.0, SEGMENT_COUNT).unwrap();

        for pair in windows.windows(2) {
            assert!(pair[0].start_seconds < pair[1].start_seconds);
            assert!((pair[0].end_seconds() - pair[1].start_seconds).abs() < 1e-9);
        }
        for (i, window) in windows.iter().enumerate() {
            assert_eq!(window.index, i);
        }
    }

    #[test]
    fn test_fractional_durations_allowed() {
        let windows = plan(10.0, 3).unwrap();
        assert!((windows[0].duration_seconds - 10.0 / 3.0).abs() < 1e-9);
        assert!((windows[2].start_seconds - 20.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        assert!(matches!(
            plan(0.0, 3),
            Err(AssemblyError::InvalidInput(_))
        ));
        assert!(matches!(
            plan(-4.2, 3),
            Err(AssemblyError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_duration() {
        assert!(plan(f64::NAN, 3).is_err());
        assert!(plan(f64::INFINITY, 3).is_err());
    }

    #[test]
    fn test_rejects_zero_segments() {
        assert!(matches!(
            plan(10.0, 0),
            Err(AssemblyError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(plan(12.34, 3).unwrap(), plan(12.34, 3).unwrap());
    }
}
