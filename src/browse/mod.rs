//! Browse module - multi-level bucket navigation
//!
//! This module holds the orchestration layer above the pagination windows. It
//! is I/O free and UI-agnostic: a terminal frontend, a test, or a remote
//! host all drive the same [`BrowseSession`].
//!
//! # Architecture
//!
//! - `session`: Levels, selection, activation and scroll handling
//! - `location`: Route and expression forms of "where the user is"
//! - `notifications`: Bounded list of transient messages

pub mod location;
pub mod notifications;
pub mod session;

pub use location::Location;
pub use notifications::{Notification, NotificationConfig, NotificationKind, Notifications};
pub use session::{
    Activation, BrowseError, BrowseSession, SessionConfig, SessionEvent, VisibleLevels,
};
