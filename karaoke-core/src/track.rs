//! Lyric track model and time-to-line selection.

use crate::error::{CoreError, Result};
use crate::time::position_from_secs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A single cue: the moment a lyric line starts and its text.
///
/// The text is handed to the host as-is and may contain inline markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLyricLine", into = "RawLyricLine")]
pub struct LyricLine {
    pub time: Duration,
    pub text: String,
}

/// Wire form of a lyric line: `{ "time": seconds, "text": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawLyricLine {
    time: f64,
    #[serde(default)]
    text: String,
}

impl TryFrom<RawLyricLine> for LyricLine {
    type Error = CoreError;

    fn try_from(raw: RawLyricLine) -> Result<Self> {
        Self::from_secs(raw.time, raw.text)
    }
}

impl From<LyricLine> for RawLyricLine {
    fn from(line: LyricLine) -> Self {
        Self {
            time: line.time.as_secs_f64(),
            text: line.text,
        }
    }
}

impl LyricLine {
    /// Create a line starting at `time`
    pub fn new(time: Duration, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }

    /// Create a line from a timestamp in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTimestamp`] if `seconds` is negative or not finite.
    pub fn from_secs(seconds: f64, text: impl Into<String>) -> Result<Self> {
        let time = position_from_secs(seconds).ok_or(CoreError::InvalidTimestamp { seconds })?;
        Ok(Self::new(time, text))
    }
}

/// Time-sorted sequence of cues, immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricTrack {
    lines: Vec<LyricLine>,
}

impl LyricTrack {
    /// Build a track, stably sorting lines by start time.
    ///
    /// Lines sharing a timestamp keep their input order, so the later one in
    /// the input wins when both are due.
    #[must_use]
    pub fn new(mut lines: Vec<LyricLine>) -> Self {
        lines.sort_by_key(|line| line.time);
        Self { lines }
    }

    /// Parse a JSON array of `{ "time": seconds, "text": "..." }` objects.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a timestamp is invalid.
    pub fn from_json(input: &str) -> Result<Self> {
        let lines: Vec<LyricLine> = serde_json::from_str(input)?;
        Ok(Self::new(lines))
    }

    /// Load a lyrics file: LRC for a `.lrc` extension, otherwise the JSON
    /// cue array accepted by [`LyricTrack::from_json`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let is_lrc = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("lrc"));

        if is_lrc {
            Self::from_lrc(&content)
        } else {
            Self::from_json(&content)
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LyricLine> {
        self.lines.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the final cue, if any
    #[must_use]
    pub fn last_index(&self) -> Option<usize> {
        self.lines.len().checked_sub(1)
    }

    /// Index of the cue active at `position`
    #[must_use]
    pub fn select_line(&self, position: Duration) -> Option<usize> {
        select_line(&self.lines, position)
    }
}

impl From<Vec<LyricLine>> for LyricTrack {
    fn from(lines: Vec<LyricLine>) -> Self {
        Self::new(lines)
    }
}

/// Find the index of the last line whose start time is at or before `position`.
///
/// Returns `None` when `position` precedes the first line or `lines` is empty.
/// `lines` must be sorted by start time; ties resolve to the highest index.
#[must_use]
pub fn select_line(lines: &[LyricLine], position: Duration) -> Option<usize> {
    lines
        .partition_point(|line| line.time <= position)
        .checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(secs: u64, text: &str) -> LyricLine {
        LyricLine::new(Duration::from_secs(secs), text)
    }

    fn sample_track() -> LyricTrack {
        LyricTrack::new(vec![line(0, "a"), line(2, "b"), line(5, "c")])
    }

    #[test]
    fn test_select_line_empty_track() {
        let track = LyricTrack::default();
        assert_eq!(track.select_line(Duration::ZERO), None);
        assert_eq!(track.select_line(Duration::from_secs(1000)), None);
    }

    #[test]
    fn test_select_line_before_first() {
        let track = LyricTrack::new(vec![line(3, "first"), line(6, "second")]);
        assert_eq!(track.select_line(Duration::ZERO), None);
        assert_eq!(track.select_line(Duration::from_millis(2999)), None);
    }

    #[test]
    fn test_select_line_inclusive_lower_bound() {
        let track = sample_track();
        assert_eq!(track.select_line(Duration::from_secs(2)), Some(1));
        assert_eq!(track.select_line(Duration::from_millis(1999)), Some(0));
    }

    #[test]
    fn test_select_line_after_last() {
        let track = sample_track();
        assert_eq!(track.select_line(Duration::from_secs(600)), Some(2));
    }

    #[test]
    fn test_select_line_ties_pick_highest_index() {
        let track = LyricTrack::new(vec![line(1, "x"), line(4, "y"), line(4, "z"), line(9, "w")]);
        assert_eq!(track.select_line(Duration::from_secs(4)), Some(2));
        assert_eq!(track.select_line(Duration::from_secs(5)), Some(2));
    }

    #[test]
    fn test_select_line_monotonic() {
        let track = LyricTrack::new(vec![
            line(1, "a"),
            line(1, "b"),
            line(3, "c"),
            line(7, "d"),
            line(8, "e"),
        ]);

        let mut previous = None;
        for tenth in 0..100 {
            let selected = track.select_line(Duration::from_millis(tenth * 100));
            assert!(selected >= previous, "regressed at {tenth}: {selected:?} < {previous:?}");
            previous = selected;
        }
    }

    #[test]
    fn test_select_line_scenario_sequence() {
        let track = sample_track();
        let indices: Vec<_> = [0, 1, 2, 3, 5, 6]
            .into_iter()
            .map(|t| track.select_line(Duration::from_secs(t)))
            .collect();
        assert_eq!(
            indices,
            vec![Some(0), Some(0), Some(1), Some(1), Some(2), Some(2)]
        );
    }

    #[test]
    fn test_new_sorts_stably() {
        let track = LyricTrack::new(vec![line(5, "late"), line(1, "tie-1"), line(1, "tie-2")]);
        let texts: Vec<_> = track.lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["tie-1", "tie-2", "late"]);
    }

    #[test]
    fn test_from_json() {
        let track =
            LyricTrack::from_json(r#"[{"time": 2.5, "text": "<b>b</b>"}, {"time": 0, "text": "a"}]"#)
                .unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track.lines()[0].text, "a");
        assert_eq!(track.lines()[1].time, Duration::from_millis(2500));
        assert_eq!(track.lines()[1].text, "<b>b</b>");
    }

    #[test]
    fn test_from_json_rejects_negative_time() {
        let result = LyricTrack::from_json(r#"[{"time": -1, "text": "a"}]"#);
        assert!(matches!(result, Err(CoreError::LyricsJson(_))));
    }

    #[test]
    fn test_from_secs_rejects_nan() {
        assert!(matches!(
            LyricLine::from_secs(f64::NAN, "a"),
            Err(CoreError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_last_index() {
        assert_eq!(LyricTrack::default().last_index(), None);
        assert_eq!(sample_track().last_index(), Some(2));
    }
}
