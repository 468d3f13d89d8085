// vodfetch - Twitch VOD and clip downloader
// Copyright (C) 2025 vodfetch contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Segment selection against a time window
//!
//! Membership is computed against cumulative segment duration in the source
//! timeline, never wall-clock fetch time. Boundary segments that straddle
//! the requested start or end are included whole: sub-segment trimming is
//! not performed, so it is better to download a bit more than a bit less.

use crate::error::{Result, VodError};
use crate::playlist::Segment;

/// Optional [start, end) window in seconds of the source timeline
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeWindow {
    /// Window start in seconds; unset means "from the beginning"
    pub start: Option<f64>,

    /// Window end in seconds; unset means "to the end"
    pub end: Option<f64>,
}

impl TimeWindow {
    pub fn new(start: Option<f64>, end: Option<f64>) -> Self {
        Self { start, end }
    }

    /// Window covering the whole source
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Fails with `InvalidTimeWindow` when both bounds are set and
    /// `end <= start`. Must run before any segment network I/O.
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end <= start {
                return Err(VodError::InvalidTimeWindow { start, end });
            }
        }
        Ok(())
    }
}

/// Produce the ordered locators of all segments intersecting the window.
///
/// A segment spanning [t, t+duration) is included iff the window start is
/// unset or `t + duration > start`, and the window end is unset or
/// `t < end`. The strict comparisons are deliberate: they give whole-segment
/// inclusion at both trim boundaries. An empty result is valid, not an
/// error.
pub fn select_segments(segments: &[Segment], window: TimeWindow) -> Vec<String> {
    let mut selected = Vec::new();
    let mut t = 0.0;

    for segment in segments {
        let segment_end = t + segment.duration;

        let start_ok = window.start.map_or(true, |start| segment_end > start);
        let end_ok = window.end.map_or(true, |end| t < end);

        if start_ok && end_ok {
            selected.push(segment.uri.clone());
        }

        t = segment_end;
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(durations: &[f64]) -> Vec<Segment> {
        durations
            .iter()
            .enumerate()
            .map(|(i, &duration)| Segment {
                duration,
                uri: format!("{i}.ts"),
            })
            .collect()
    }

    #[test]
    fn test_unset_window_selects_everything() {
        let segs = segments(&[10.0, 10.0, 10.0]);
        let selected = select_segments(&segs, TimeWindow::unbounded());
        assert_eq!(selected, vec!["0.ts", "1.ts", "2.ts"]);
    }

    #[test]
    fn test_boundary_segments_included_whole() {
        // Cumulative starts [0, 10, 20, 30]; window 15..25 must include the
        // segments starting at 10 and 20, and exclude those at 0 and 30.
        let segs = segments(&[10.0, 10.0, 10.0, 10.0]);
        let window = TimeWindow::new(Some(15.0), Some(25.0));
        let selected = select_segments(&segs, window);
        assert_eq!(selected, vec!["1.ts", "2.ts"]);
    }

    #[test]
    fn test_window_fully_after_source_is_empty() {
        let segs = segments(&[10.0, 10.0]);
        let window = TimeWindow::new(Some(100.0), Some(200.0));
        assert!(select_segments(&segs, window).is_empty());
    }

    #[test]
    fn test_window_ending_at_zero_is_empty() {
        let segs = segments(&[10.0, 10.0]);
        let window = TimeWindow::new(None, Some(0.0));
        assert!(select_segments(&segs, window).is_empty());
    }

    #[test]
    fn test_start_only_window() {
        let segs = segments(&[10.0, 10.0, 10.0]);
        // Segment 0 ends exactly at the start bound; strict > excludes it.
        let selected = select_segments(&segs, TimeWindow::new(Some(10.0), None));
        assert_eq!(selected, vec!["1.ts", "2.ts"]);
    }

    #[test]
    fn test_end_only_window() {
        let segs = segments(&[10.0, 10.0, 10.0]);
        // Segment 1 starts exactly at the end bound; strict < excludes it.
        let selected = select_segments(&segs, TimeWindow::new(None, Some(10.0)));
        assert_eq!(selected, vec!["0.ts"]);
    }

    #[test]
    fn test_selection_is_ordered_contiguous_subsequence() {
        let segs = segments(&[4.0, 4.0, 4.0]);
        let selected = select_segments(&segs, TimeWindow::new(Some(2.0), Some(6.0)));
        // Segment 0: end 4 > 2 and start 0 < 6 -> in.
        // Segment 1: end 8 > 2 and start 4 < 6 -> in.
        // Segment 2: start 8 < 6 fails -> out.
        assert_eq!(selected, vec!["0.ts", "1.ts"]);

        // Never reordered, never duplicated: indices must be strictly
        // increasing positions of the input.
        let positions: Vec<usize> = selected
            .iter()
            .map(|uri| segs.iter().position(|s| &s.uri == uri).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] + 1 == w[1]));
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let window = TimeWindow::new(Some(6.0), Some(2.0));
        assert!(matches!(
            window.validate(),
            Err(VodError::InvalidTimeWindow { .. })
        ));

        let window = TimeWindow::new(Some(2.0), Some(2.0));
        assert!(window.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_partial_windows() {
        assert!(TimeWindow::new(Some(5.0), None).validate().is_ok());
        assert!(TimeWindow::new(None, Some(5.0)).validate().is_ok());
        assert!(TimeWindow::unbounded().validate().is_ok());
        assert!(TimeWindow::new(Some(2.0), Some(6.0)).validate().is_ok());
    }
}
