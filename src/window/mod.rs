//! Pagination window: the materialized slice of one bucket
//!
//! A window holds a contiguous, ordered run of sibling entries and grows it
//! one page at a time in either direction. It performs no I/O itself: every
//! operation that needs data returns a [`FetchRequest`] for the host to run
//! against a [`crate::api::BrowseApi`], and the response is handed back with
//! [`PaginationWindow::complete`].
//!
//! # State machine
//!
//! ```text
//!              load(anchor)                 grow(dir)
//! Empty ─────────────────────► Loaded ◄────────────────────┐
//!   ▲  anchored + empty page:         │ boundary captured,  │
//!   └── reload once, unanchored       │ loading[dir] = true │
//!                                     ▼                     │
//!                              response arrives ────────────┘
//!                              boundary moved?  → discard
//!                              empty page?      → exhausted[dir]
//!                              otherwise        → merge at that end
//! ```
//!
//! Responses may arrive in any order. Nothing is ever cancelled; instead a
//! grow response is checked against the boundary key captured when it was
//! requested and dropped if the window has changed underneath it, and an
//! initial-load response is dropped if a newer load was issued since.

use crate::api::{BrowseQuery, Cursor, FetchError};
use crate::key::Key;
use crate::models::Entry;
use crate::path::KeyPath;
use std::fmt;
use tracing::debug;

/// End of the window a grow extends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Before,
    After,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::After => f.write_str("after"),
        }
    }
}

/// Identity of one window for its whole lifetime
///
/// Ids are never reused, so a response addressed to a destroyed window can
/// always be recognized as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelId(pub u64);

/// What a request was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchKind {
    /// Initial page, optionally anchored at a key
    Initial {
        anchor: Option<Key>,
        /// Load generation of the window when issued
        epoch: u64,
        /// This is the unanchored retry after an anchored load came back empty
        fallback: bool,
    },
    /// Extension at one end
    Grow {
        direction: Direction,
        /// First or last key of the window when issued
        boundary: Key,
    },
}

/// A page request produced by a window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub level: LevelId,
    pub query: BrowseQuery,
    pub kind: FetchKind,
}

/// What a completed request did to the window
#[derive(Debug)]
pub enum Completion {
    /// Initial page installed
    Loaded { entries: usize },
    /// Anchored load came back empty; run this unanchored load next
    Retry(FetchRequest),
    /// Entries were merged at one end
    Extended { direction: Direction, added: usize },
    /// The store has nothing further in that direction
    Exhausted(Direction),
    /// The response no longer matches the window and was dropped
    Stale,
    /// The fetch failed; the window is unchanged apart from its flags
    Failed(FetchError),
}

/// Window over the entries of a single bucket
#[derive(Debug, Clone)]
pub struct PaginationWindow {
    id: LevelId,
    path: KeyPath,
    entries: Vec<Entry>,
    exhausted_before: bool,
    exhausted_after: bool,
    loading_before: bool,
    loading_after: bool,
    loading_initial: bool,
    epoch: u64,
}

impl PaginationWindow {
    /// Create an empty window over the bucket at `path`
    #[must_use]
    pub const fn new(id: LevelId, path: KeyPath) -> Self {
        Self {
            id,
            path,
            entries: Vec::new(),
            exhausted_before: false,
            exhausted_after: false,
            loading_before: false,
            loading_after: false,
            loading_initial: false,
            epoch: 0,
        }
    }

    #[must_use]
    pub const fn id(&self) -> LevelId {
        self.id
    }

    #[must_use]
    pub const fn path(&self) -> &KeyPath {
        &self.path
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn is_exhausted(&self, direction: Direction) -> bool {
        match direction {
            Direction::Before => self.exhausted_before,
            Direction::After => self.exhausted_after,
        }
    }

    #[must_use]
    pub const fn is_loading(&self, direction: Direction) -> bool {
        match direction {
            Direction::Before => self.loading_before,
            Direction::After => self.loading_after,
        }
    }

    /// Whether an initial load is in flight
    #[must_use]
    pub const fn is_loading_initial(&self) -> bool {
        self.loading_initial
    }

    /// Entry with the given key, if it is in the window
    #[must_use]
    pub fn find(&self, key: &Key) -> Option<&Entry> {
        self.entries.iter().find(|e| &e.key == key)
    }

    /// Request the initial page, starting at `anchor` if given
    ///
    /// Supersedes any initial load still in flight. Current entries stay
    /// visible until the response replaces them.
    pub fn load(&mut self, anchor: Option<Key>) -> FetchRequest {
        self.issue_initial(anchor, false)
    }

    fn issue_initial(&mut self, anchor: Option<Key>, fallback: bool) -> FetchRequest {
        self.epoch += 1;
        self.loading_initial = true;
        let cursor = anchor.clone().map(Cursor::From);
        FetchRequest {
            level: self.id,
            query: BrowseQuery::new(self.path.clone(), cursor),
            kind: FetchKind::Initial {
                anchor,
                epoch: self.epoch,
                fallback,
            },
        }
    }

    fn boundary(&self, direction: Direction) -> Option<&Key> {
        match direction {
            Direction::Before => self.entries.first(),
            Direction::After => self.entries.last(),
        }
        .map(|e| &e.key)
    }

    /// Request the next page in `direction`
    ///
    /// Returns `None` without touching any state when a grow in that
    /// direction is already in flight, the direction is exhausted, or the
    /// window is empty.
    pub fn grow(&mut self, direction: Direction) -> Option<FetchRequest> {
        if self.is_loading(direction) || self.is_exhausted(direction) {
            return None;
        }
        let boundary = self.boundary(direction)?.clone();

        self.set_loading(direction, true);
        let cursor = match direction {
            Direction::Before => Cursor::Before(boundary.clone()),
            Direction::After => Cursor::After(boundary.clone()),
        };
        Some(FetchRequest {
            level: self.id,
            query: BrowseQuery::new(self.path.clone(), Some(cursor)),
            kind: FetchKind::Grow {
                direction,
                boundary,
            },
        })
    }

    pub fn grow_before(&mut self) -> Option<FetchRequest> {
        self.grow(Direction::Before)
    }

    pub fn grow_after(&mut self) -> Option<FetchRequest> {
        self.grow(Direction::After)
    }

    fn set_loading(&mut self, direction: Direction, loading: bool) {
        match direction {
            Direction::Before => self.loading_before = loading,
            Direction::After => self.loading_after = loading,
        }
    }

    fn set_exhausted(&mut self, direction: Direction) {
        match direction {
            Direction::Before => self.exhausted_before = true,
            Direction::After => self.exhausted_after = true,
        }
    }

    /// Apply the outcome of a request this window issued
    pub fn complete(
        &mut self,
        request: &FetchRequest,
        result: Result<Vec<Entry>, FetchError>,
    ) -> Completion {
        if request.level != self.id {
            debug!(level = ?request.level, window = ?self.id, "response for another window dropped");
            return Completion::Stale;
        }
        match &request.kind {
            FetchKind::Initial {
                anchor,
                epoch,
                fallback,
            } => self.complete_initial(anchor.as_ref(), *epoch, *fallback, result),
            FetchKind::Grow {
                direction,
                boundary,
            } => self.complete_grow(*direction, boundary, result),
        }
    }

    fn complete_initial(
        &mut self,
        anchor: Option<&Key>,
        epoch: u64,
        fallback: bool,
        result: Result<Vec<Entry>, FetchError>,
    ) -> Completion {
        if epoch != self.epoch {
            debug!(path = %self.path, epoch, current = self.epoch, "superseded initial load dropped");
            return Completion::Stale;
        }
        self.loading_initial = false;

        let entries = match result {
            Ok(entries) => entries,
            Err(e) => return Completion::Failed(e),
        };

        if entries.is_empty() && anchor.is_some() && !fallback {
            debug!(path = %self.path, "anchor no longer exists, loading from the first entry");
            return Completion::Retry(self.issue_initial(None, true));
        }

        self.entries = entries;
        self.exhausted_before = false;
        self.exhausted_after = false;
        Completion::Loaded {
            entries: self.entries.len(),
        }
    }

    fn complete_grow(
        &mut self,
        direction: Direction,
        boundary: &Key,
        result: Result<Vec<Entry>, FetchError>,
    ) -> Completion {
        self.set_loading(direction, false);

        let entries = match result {
            Ok(entries) => entries,
            Err(e) => return Completion::Failed(e),
        };

        if self.boundary(direction) != Some(boundary) {
            debug!(path = %self.path, %direction, "window moved while growing, response dropped");
            return Completion::Stale;
        }

        // Only keys strictly beyond the boundary keep the window ordered and unique.
        let fresh: Vec<Entry> = entries
            .into_iter()
            .filter(|e| match direction {
                Direction::Before => &e.key < boundary,
                Direction::After => &e.key > boundary,
            })
            .collect();

        if fresh.is_empty() {
            self.set_exhausted(direction);
            return Completion::Exhausted(direction);
        }

        let added = fresh.len();
        match direction {
            Direction::Before => {
                self.entries.splice(0..0, fresh);
            }
            Direction::After => self.entries.extend(fresh),
        }
        Completion::Extended { direction, added }
    }
}
