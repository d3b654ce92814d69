//! Rolling window of rendered lyric lines.
//!
//! The window holds the current line plus a short scroll-back of previous
//! ones. A new line enters as [`LineStatus::Pending`] and is promoted to
//! [`LineStatus::Highlighted`] in a second step, once the host has had a
//! chance to place it.

use crate::track::LyricLine;
use std::collections::VecDeque;

/// Default number of lines kept visible.
pub const DEFAULT_WINDOW_CAPACITY: usize = 3;

/// Visual status of a rendered line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineStatus {
    /// Appended but not yet highlighted
    Pending,
    /// Dimmed scroll-back line
    Waiting,
    /// The line currently being sung
    Highlighted,
}

impl LineStatus {
    /// CSS class applied to the line element for this status.
    #[must_use]
    pub const fn css_class(&self) -> Option<&'static str> {
        match self {
            Self::Pending => None,
            Self::Waiting => Some("waiting"),
            Self::Highlighted => Some("highlight"),
        }
    }
}

/// Identifies a rendered line for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderedLineId(u64);

impl std::fmt::Display for RenderedLineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line-{}", self.0)
    }
}

/// A visible line bound to a cue of the track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub id: RenderedLineId,
    /// Index of the cue in the track
    pub index: usize,
    pub line: LyricLine,
    pub status: LineStatus,
}

/// Result of appending a line to the window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    /// Handle of the new pending line, to be passed to [`RenderWindow::promote`]
    pub id: RenderedLineId,
    /// True only for the first advance of the session
    pub expand: bool,
    /// Visible lines that just became [`LineStatus::Waiting`]
    pub demoted: Vec<RenderedLineId>,
    /// Oldest lines dropped to stay within capacity, oldest first
    pub evicted: Vec<RenderedLineId>,
}

/// Bounded FIFO of rendered lines.
#[derive(Debug, Clone)]
pub struct RenderWindow {
    lines: VecDeque<RenderedLine>,
    capacity: usize,
    next_id: u64,
    expanded: bool,
}

impl RenderWindow {
    /// Create an empty window. A capacity of zero is raised to one so the
    /// newest line always stays visible.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity + 1),
            capacity,
            next_id: 0,
            expanded: false,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether the expand transition has happened in this session
    #[must_use]
    pub const fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Visible lines, oldest first
    pub fn lines(&self) -> impl Iterator<Item = &RenderedLine> {
        self.lines.iter()
    }

    #[must_use]
    pub fn get(&self, id: RenderedLineId) -> Option<&RenderedLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    /// Append the line for cue `index`, dimming everything already visible.
    pub fn advance_to(&mut self, index: usize, line: LyricLine) -> Advance {
        let id = RenderedLineId(self.next_id);
        self.next_id += 1;

        self.lines.push_back(RenderedLine {
            id,
            index,
            line,
            status: LineStatus::Pending,
        });

        let expand = !self.expanded;
        self.expanded = true;

        let mut evicted = Vec::new();
        while self.lines.len() > self.capacity {
            if let Some(oldest) = self.lines.pop_front() {
                evicted.push(oldest.id);
            }
        }

        let mut demoted = Vec::new();
        for existing in &mut self.lines {
            if existing.id != id && existing.status != LineStatus::Waiting {
                existing.status = LineStatus::Waiting;
                demoted.push(existing.id);
            }
        }

        Advance {
            id,
            expand,
            demoted,
            evicted,
        }
    }

    /// Highlight a pending line.
    ///
    /// Returns a snapshot of the highlighted line, or `None` if it has
    /// already left the window or was superseded by a newer line.
    pub fn promote(&mut self, id: RenderedLineId) -> Option<RenderedLine> {
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.id == id && line.status == LineStatus::Pending)?;
        line.status = LineStatus::Highlighted;
        Some(line.clone())
    }
}

impl Default for RenderWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
