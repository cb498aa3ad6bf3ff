//! Browse session: linked levels of pagination windows
//!
//! A session owns one [`PaginationWindow`] per bucket level the user has
//! descended into, plus the key of the selected value in the deepest level.
//! Level `0` is always the store root and the path of level `i + 1` is the
//! path of level `i` extended by one key.
//!
//! # Workflow
//!
//! ```text
//! reload() / load_from_expression() / from_location()
//!     ↓ one window per level, anchored at the key on the path
//! ┌─→ host runs FetchRequests, feeds results to complete()
//! │       ↓
//! │   User event?
//! │   ├─ entry activated → truncate deeper levels
//! │   │                    bucket: open a level, clear selection
//! │   │                    leaf:   select it
//! │   └─ scrolled near an edge → grow that window
//! └───────┘
//! ```
//!
//! The session never performs I/O. Operations return the [`FetchRequest`]s
//! they need and [`BrowseSession::complete`] returns any follow-ups. Hosts
//! observe state transitions through [`BrowseSession::subscribe`].

use super::location::Location;
use super::notifications::{Notification, NotificationConfig, Notifications};
use crate::api::FetchError;
use crate::key::{Key, KeyError};
use crate::models::{Entry, Tree};
use crate::path::{KeyPath, PathError};
use crate::window::{Completion, Direction, FetchKind, FetchRequest, LevelId, PaginationWindow};
use tracing::{debug, warn};

/// Browse session error type
pub type Result<T> = std::result::Result<T, BrowseError>;

/// Errors that can occur during a browse session
#[derive(Debug, thiserror::Error)]
pub enum BrowseError {
    #[error("Invalid expression: {0}")]
    InvalidExpression(#[from] PathError),

    #[error("{0}")]
    MalformedKey(#[from] KeyError),

    #[error("No level at index {0}")]
    UnknownLevel(usize),

    #[error("Entry {key} is not loaded at level {level}")]
    UnknownEntry { level: usize, key: String },
}

/// Message shown when a page cannot be fetched
pub const FETCH_FAILED_MESSAGE: &str = "Could not query the backend.";

/// Message shown when an edited path does not parse
pub const INVALID_EXPRESSION_MESSAGE: &str = "Invalid path expression.";

/// State transitions reported to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Levels were added, removed or rebuilt
    LevelsChanged,
    /// The entries or flags of one level changed
    WindowChanged { level: usize },
    /// The selected value key changed
    SelectionChanged {
        previous: Option<Key>,
        current: Option<Key>,
    },
    /// The user moved to a new location the host should record
    Navigate(Location),
    /// A notification was appended
    Notified(Notification),
}

/// Configuration for a browse session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Levels shown at once; a selected value takes one of the slots
    pub visible_levels: usize,
    pub notifications: NotificationConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            visible_levels: 3,
            notifications: NotificationConfig::default(),
        }
    }
}

/// Result of activating an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Requests to run for newly opened levels
    pub requests: Vec<FetchRequest>,
    /// Whether the selected value key differs from before
    pub selection_changed: bool,
}

/// The tail of the session a host should render
#[derive(Debug, Clone, Copy)]
pub struct VisibleLevels<'a> {
    /// Index of the first visible level
    pub first: usize,
    pub levels: &'a [PaginationWindow],
    pub value: Option<&'a Key>,
}

type Observer = Box<dyn FnMut(&SessionEvent)>;
type ScrollProbe = Box<dyn FnMut(usize, Direction) -> bool>;

/// Browse session - manages levels and the selected value
pub struct BrowseSession {
    config: SessionConfig,
    levels: Vec<PaginationWindow>,
    selected: Option<Key>,
    next_level_id: u64,
    notifications: Notifications,
    observers: Vec<Observer>,
    scroll_probe: Option<ScrollProbe>,
}

impl BrowseSession {
    /// Create a session with no levels
    ///
    /// Call [`BrowseSession::reload`] or [`BrowseSession::navigate`] to
    /// materialize the root.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            levels: Vec::new(),
            selected: None,
            next_level_id: 0,
            notifications: Notifications::new(config.notifications),
            observers: Vec::new(),
            scroll_probe: None,
        }
    }

    /// Create a session positioned at `location`, e.g. the current route
    #[must_use]
    pub fn from_location(config: SessionConfig, location: Location) -> (Self, Vec<FetchRequest>) {
        let mut session = Self::new(config);
        let requests = session.navigate(location);
        (session, requests)
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Register a callback invoked on every state transition
    pub fn subscribe(&mut self, observer: impl FnMut(&SessionEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Register the host's "is this level still scrolled near that edge" check
    ///
    /// Consulted after every grow completes, since a freshly merged page may
    /// still leave the viewport within the load threshold.
    pub fn set_scroll_probe(&mut self, probe: impl FnMut(usize, Direction) -> bool + 'static) {
        self.scroll_probe = Some(Box::new(probe));
    }

    /// Discard every level and load the root from its first entry
    pub fn reload(&mut self) -> Vec<FetchRequest> {
        self.navigate(Location::default())
    }

    /// Discard every level and rebuild one level per prefix of `location.path`
    ///
    /// Each level is anchored at the key the path continues with, and the
    /// deepest level at the selected value, so the windows open around the
    /// location instead of at the first entry.
    pub fn navigate(&mut self, location: Location) -> Vec<FetchRequest> {
        let destroyed = self.levels.len();
        self.levels.clear();
        if destroyed > 0 {
            debug!(destroyed, "levels discarded");
        }

        let Location { path, value } = location;
        let requests = path
            .prefixes()
            .map(|prefix| {
                let anchor = path
                    .keys()
                    .get(prefix.len())
                    .cloned()
                    .or_else(|| value.clone());
                self.open_level(prefix, anchor)
            })
            .collect();

        self.set_selected(value);
        self.emit(SessionEvent::LevelsChanged);
        requests
    }

    /// Parse an edited path expression and move there
    ///
    /// On failure nothing but the notification list changes.
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::InvalidExpression` if the text does not parse.
    pub fn load_from_expression(&mut self, expression: &str) -> Result<Vec<FetchRequest>> {
        let location = match Location::from_expression(expression) {
            Ok(location) => location,
            Err(e) => {
                self.notify_error(INVALID_EXPRESSION_MESSAGE, Some(e.to_string()));
                return Err(e.into());
            }
        };
        let requests = self.navigate(location.clone());
        self.emit(SessionEvent::Navigate(location));
        Ok(requests)
    }

    /// Handle a click on `entry` in level `level`
    ///
    /// Levels deeper than `level` are destroyed. A bucket opens a new level
    /// below `level` and clears the selection; a leaf becomes the selection.
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::UnknownLevel` if `level` does not exist.
    pub fn on_entry_activated(&mut self, level: usize, entry: &Entry) -> Result<Activation> {
        if level >= self.levels.len() {
            return Err(BrowseError::UnknownLevel(level));
        }

        let previous = self.selected.clone();
        self.truncate(level + 1);

        let mut requests = Vec::new();
        if entry.bucket {
            let path = self.levels[level].path().child(entry.key.clone());
            requests.push(self.open_level(path, None));
            self.set_selected(None);
        } else {
            self.set_selected(Some(entry.key.clone()));
        }
        self.emit(SessionEvent::LevelsChanged);

        let selection_changed = previous != self.selected;
        if entry.bucket || selection_changed {
            self.emit(SessionEvent::Navigate(self.location()));
        }

        Ok(Activation {
            requests,
            selection_changed,
        })
    }

    /// Handle the viewport of `level` approaching one of its edges
    pub fn on_scroll_near(&mut self, level: usize, direction: Direction) -> Option<FetchRequest> {
        self.levels.get_mut(level)?.grow(direction)
    }

    /// Feed the outcome of a request back into the session
    ///
    /// Returns follow-up requests: the unanchored retry of a load whose anchor
    /// vanished, or the next grow when the scroll probe says the level is
    /// still near that edge. Responses for destroyed levels are dropped.
    pub fn complete(
        &mut self,
        request: &FetchRequest,
        result: std::result::Result<Tree, FetchError>,
    ) -> Vec<FetchRequest> {
        let Some(index) = self.levels.iter().position(|w| w.id() == request.level) else {
            debug!(level = ?request.level, "response for destroyed level dropped");
            return Vec::new();
        };

        let outcome = self.levels[index].complete(request, result.map(|tree| tree.entries));
        match outcome {
            Completion::Loaded { .. } | Completion::Exhausted(_) => {
                self.emit(SessionEvent::WindowChanged { level: index });
                Vec::new()
            }
            Completion::Retry(retry) => vec![retry],
            Completion::Extended { direction, .. } => {
                self.emit(SessionEvent::WindowChanged { level: index });
                self.recheck_scroll(index, direction)
            }
            Completion::Stale => match request.kind {
                FetchKind::Grow { direction, .. } => self.recheck_scroll(index, direction),
                FetchKind::Initial { .. } => Vec::new(),
            },
            Completion::Failed(e) => {
                warn!(path = %self.levels[index].path(), error = %e, "fetch failed");
                self.emit(SessionEvent::WindowChanged { level: index });
                self.notify_error(FETCH_FAILED_MESSAGE, Some(e.to_string()));
                Vec::new()
            }
        }
    }

    fn recheck_scroll(&mut self, index: usize, direction: Direction) -> Vec<FetchRequest> {
        let near = self
            .scroll_probe
            .as_mut()
            .is_some_and(|probe| probe(index, direction));
        if !near {
            return Vec::new();
        }
        self.levels[index].grow(direction).into_iter().collect()
    }

    fn open_level(&mut self, path: KeyPath, anchor: Option<Key>) -> FetchRequest {
        let id = LevelId(self.next_level_id);
        self.next_level_id += 1;
        let mut window = PaginationWindow::new(id, path);
        let request = window.load(anchor);
        self.levels.push(window);
        request
    }

    fn truncate(&mut self, len: usize) {
        if self.levels.len() > len {
            debug!(destroyed = self.levels.len() - len, "levels discarded");
            self.levels.truncate(len);
        }
    }

    fn set_selected(&mut self, selected: Option<Key>) {
        if self.selected != selected {
            let previous = std::mem::replace(&mut self.selected, selected);
            self.emit(SessionEvent::SelectionChanged {
                previous,
                current: self.selected.clone(),
            });
        }
    }

    fn notify_error(&mut self, message: &str, extra: Option<String>) {
        let notification = self.notifications.push_error(message, extra).clone();
        self.emit(SessionEvent::Notified(notification));
    }

    fn emit(&mut self, event: SessionEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    /// All materialized levels, root first
    #[must_use]
    pub fn levels(&self) -> &[PaginationWindow] {
        &self.levels
    }

    #[must_use]
    pub fn level(&self, index: usize) -> Option<&PaginationWindow> {
        self.levels.get(index)
    }

    /// Path of every level, root first
    pub fn paths(&self) -> impl Iterator<Item = &KeyPath> {
        self.levels.iter().map(PaginationWindow::path)
    }

    #[must_use]
    pub const fn selected_value_key(&self) -> Option<&Key> {
        self.selected.as_ref()
    }

    /// Path of the deepest level followed by the selected value, if any
    #[must_use]
    pub fn selected_path(&self) -> KeyPath {
        let location = self.location();
        match location.value {
            Some(value) => location.path.child(value),
            None => location.path,
        }
    }

    /// Entry of `level` that lies on the selected path
    #[must_use]
    pub fn selected_in_level(&self, level: usize) -> Option<&Entry> {
        let selected = self.selected_path();
        let key = selected.keys().get(level)?;
        self.levels.get(level)?.find(key)
    }

    /// Current location: deepest level plus the selected value
    #[must_use]
    pub fn location(&self) -> Location {
        let path = self
            .levels
            .last()
            .map(|w| w.path().clone())
            .unwrap_or_default();
        Location::new(path, self.selected.clone())
    }

    /// Current location as editable expression text
    #[must_use]
    pub fn expression(&self) -> String {
        self.location().to_expression()
    }

    /// The last `window_size` levels, one fewer when a value is selected
    #[must_use]
    pub fn visible_levels(&self, window_size: usize) -> VisibleLevels<'_> {
        let slots = if self.selected.is_some() {
            window_size.saturating_sub(1)
        } else {
            window_size
        };
        let first = self.levels.len().saturating_sub(slots);
        VisibleLevels {
            first,
            levels: &self.levels[first..],
            value: self.selected.as_ref(),
        }
    }

    /// Visible levels using the configured window size
    #[must_use]
    pub fn visible(&self) -> VisibleLevels<'_> {
        self.visible_levels(self.config.visible_levels)
    }

    #[must_use]
    pub const fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
