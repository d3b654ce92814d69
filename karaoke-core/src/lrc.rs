//! LRC lyric file loading.

use crate::error::{CoreError, Result};
use crate::time::DurationExt;
use crate::track::{LyricLine, LyricTrack};
use std::time::Duration;

impl LyricTrack {
    /// Build a track from LRC text.
    ///
    /// Supports `[mm:ss.xx]`, `[mm:ss:xx]` and `[mm:ss]` timestamps, several
    /// timestamps per line and the `[offset:±ms]` tag. Other ID tags are
    /// ignored. Word-level `<mm:ss.xx>` stamps are stripped from the text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LrcParseError`] if the input is not blank but
    /// contains no timed lines.
    pub fn from_lrc(input: &str) -> Result<Self> {
        let mut offset_ms = 0_i64;
        let mut lines = Vec::new();

        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some((tag, value)) = parse_id_tag(line) {
                if tag.eq_ignore_ascii_case("offset") {
                    if let Ok(offset) = value.parse::<i64>() {
                        offset_ms = offset;
                    }
                }
                continue;
            }

            if let Some(parsed) = parse_lyric_line(line) {
                lines.extend(parsed);
            }
        }

        let has_lyric_text = input
            .lines()
            .map(str::trim)
            .any(|l| !l.is_empty() && parse_id_tag(l).is_none());
        if lines.is_empty() && has_lyric_text {
            return Err(CoreError::LrcParseError {
                reason: "no timed lines found".to_string(),
            });
        }

        if offset_ms != 0 {
            for line in &mut lines {
                line.time = line.time.offset_by_millis(offset_ms);
            }
        }

        Ok(Self::new(lines))
    }
}

/// Parse an ID tag like [ti:Title] or [offset:+250]
fn parse_id_tag(line: &str) -> Option<(&str, &str)> {
    let content = line.strip_prefix('[')?;
    let end = content.find(']')?;
    let content = &content[..end];

    let (tag, value) = content.split_once(':')?;

    // A numeric tag part means this is a timestamp
    if tag.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some((tag.trim(), value.trim()))
}

/// Parse a lyric line like [00:12.34]Hello or [00:12.34][00:15.67]Chorus
fn parse_lyric_line(line: &str) -> Option<Vec<LyricLine>> {
    let mut remaining = line;
    let mut timestamps = Vec::new();

    while let Some(rest) = remaining.strip_prefix('[') {
        let Some(end) = rest.find(']') else {
            break;
        };
        let Some(time) = parse_timestamp(&rest[..end]) else {
            break;
        };
        timestamps.push(time);
        remaining = &rest[end + 1..];
    }

    if timestamps.is_empty() {
        return None;
    }

    let text = strip_word_stamps(remaining.trim());

    Some(
        timestamps
            .into_iter()
            .map(|time| LyricLine::new(time, text.clone()))
            .collect(),
    )
}

/// Parse a timestamp string like "00:12.34", "00:12:34" or "00:12"
fn parse_timestamp(s: &str) -> Option<Duration> {
    let parts: Vec<&str> = s.trim().split(':').collect();

    match parts.as_slice() {
        [minutes, seconds] => {
            let minutes: u64 = minutes.parse().ok()?;
            let seconds: f64 = seconds.parse().ok()?;
            if !seconds.is_finite() || seconds < 0.0 {
                return None;
            }
            let whole = Duration::from_secs(minutes.checked_mul(60)?);
            whole.checked_add(Duration::try_from_secs_f64(seconds).ok()?)
        }
        [minutes, seconds, hundredths] => {
            let minutes: u64 = minutes.parse().ok()?;
            let seconds: u64 = seconds.parse().ok()?;
            let hundredths: u64 = hundredths.parse().ok()?;
            let millis = minutes
                .checked_mul(60_000)?
                .checked_add(seconds.checked_mul(1000)?)?
                .checked_add(hundredths.checked_mul(10)?)?;
            Some(Duration::from_millis(millis))
        }
        _ => None,
    }
}

/// Remove enhanced-LRC word stamps (`<mm:ss.xx>`), leaving other markup intact.
fn strip_word_stamps(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut remaining = text;

    while let Some(start) = remaining.find('<') {
        out.push_str(&remaining[..start]);
        let tail = &remaining[start..];
        match tail.find('>') {
            Some(end) if parse_timestamp(&tail[1..end]).is_some() => {
                remaining = &tail[end + 1..];
            }
            _ => {
                out.push('<');
                remaining = &tail[1..];
            }
        }
    }
    out.push_str(remaining);

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
