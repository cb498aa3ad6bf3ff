//! Synchronous driver running a session against a `BrowseApi`

use super::BrowseApi;
use crate::browse::{BrowseError, BrowseSession, Location};
use crate::key::Key;
use crate::window::{Direction, FetchRequest};
use std::collections::VecDeque;
use tracing::debug;

/// A session plus the API answering its requests
///
/// Requests are executed in the order they were issued, follow-ups last, so
/// a call returns only once the session is idle again.
pub struct Browser<A> {
    api: A,
    session: BrowseSession,
    pending: VecDeque<FetchRequest>,
}

impl<A: BrowseApi> Browser<A> {
    #[must_use]
    pub const fn new(api: A, session: BrowseSession) -> Self {
        Self {
            api,
            session,
            pending: VecDeque::new(),
        }
    }

    #[must_use]
    pub const fn session(&self) -> &BrowseSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut BrowseSession {
        &mut self.session
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Queue requests without running them
    pub fn submit(&mut self, requests: impl IntoIterator<Item = FetchRequest>) {
        self.pending.extend(requests);
    }

    /// Run queued requests and their follow-ups; returns how many ran
    pub fn run_until_idle(&mut self) -> usize {
        let mut executed = 0;
        while let Some(request) = self.pending.pop_front() {
            let result = self.api.browse(&request.query);
            let follow_ups = self.session.complete(&request, result);
            self.pending.extend(follow_ups);
            executed += 1;
        }
        debug!(executed, "browser idle");
        executed
    }

    /// Reload from the root
    pub fn reload(&mut self) {
        let requests = self.session.reload();
        self.submit(requests);
        self.run_until_idle();
    }

    /// Move to a location read from the host's route
    pub fn open(&mut self, location: Location) {
        let requests = self.session.navigate(location);
        self.submit(requests);
        self.run_until_idle();
    }

    /// Move to the location an edited expression names
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::InvalidExpression` if the text does not parse.
    pub fn load_from_expression(&mut self, expression: &str) -> Result<(), BrowseError> {
        let requests = self.session.load_from_expression(expression)?;
        self.submit(requests);
        self.run_until_idle();
        Ok(())
    }

    /// Activate the loaded entry `key` of level `level`
    ///
    /// Returns whether the selected value changed.
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::UnknownLevel` or `BrowseError::UnknownEntry` if
    /// the level or the entry is not loaded.
    pub fn activate(&mut self, level: usize, key: &Key) -> Result<bool, BrowseError> {
        let entry = self
            .session
            .level(level)
            .ok_or(BrowseError::UnknownLevel(level))?
            .find(key)
            .cloned()
            .ok_or_else(|| BrowseError::UnknownEntry {
                level,
                key: key.to_string(),
            })?;
        let activation = self.session.on_entry_activated(level, &entry)?;
        self.submit(activation.requests);
        self.run_until_idle();
        Ok(activation.selection_changed)
    }

    /// Report that `level` scrolled near one of its edges
    ///
    /// Returns whether a page was requested.
    pub fn scroll_near(&mut self, level: usize, direction: Direction) -> bool {
        let Some(request) = self.session.on_scroll_near(level, direction) else {
            return false;
        };
        self.submit([request]);
        self.run_until_idle();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browse::SessionConfig;
    use crate::path::KeyPath;
    use crate::testing::{byte_key, ScriptedApi};

    fn browser() -> Browser<ScriptedApi> {
        let bucket: KeyPath = vec![Key::from_text("logs")].into();
        let api = ScriptedApi::new(4).with_leaves(&bucket, 0..9);
        Browser::new(api, BrowseSession::new(SessionConfig::default()))
    }

    #[test]
    fn test_reload_and_descend() {
        let mut browser = browser();
        browser.reload();
        assert_eq!(browser.session().levels().len(), 1);

        let changed = browser.activate(0, &Key::from_text("logs")).unwrap();
        assert!(!changed);
        assert_eq!(browser.session().levels()[1].entries().len(), 4);

        assert!(browser.activate(1, &byte_key(2)).unwrap());
        assert_eq!(browser.session().expression(), r#""logs" - 0x02"#);
    }

    #[test]
    fn test_activate_unloaded_entry() {
        let mut browser = browser();
        browser.reload();
        let result = browser.activate(0, &Key::from_text("missing"));
        assert!(matches!(result, Err(BrowseError::UnknownEntry { level: 0, .. })));
        assert!(matches!(
            browser.activate(3, &Key::from_text("logs")),
            Err(BrowseError::UnknownLevel(3))
        ));
    }

    #[test]
    fn test_scroll_in_both_directions() {
        let mut browser = browser();
        browser.load_from_expression(r#""logs" - 0x04"#).unwrap();
        let keys = |b: &Browser<ScriptedApi>| -> Vec<u8> {
            b.session().levels()[1]
                .entries()
                .iter()
                .map(|e| e.key.as_bytes()[0])
                .collect()
        };
        assert_eq!(keys(&browser), vec![4, 5, 6, 7]);

        assert!(browser.scroll_near(1, Direction::Before));
        assert_eq!(keys(&browser), vec![0, 1, 2, 3, 4, 5, 6, 7]);

        assert!(browser.scroll_near(1, Direction::After));
        assert_eq!(keys(&browser), (0..9).collect::<Vec<u8>>());

        // Each direction is exhausted after one empty page
        assert!(browser.scroll_near(1, Direction::After));
        assert!(!browser.scroll_near(1, Direction::After));
    }

    #[test]
    fn test_submit_runs_in_order() {
        let mut browser = browser();
        let requests = browser.session_mut().reload();
        browser.submit(requests);
        assert_eq!(browser.run_until_idle(), 1);
        assert_eq!(browser.run_until_idle(), 0);
        assert_eq!(browser.api().calls().len(), 1);
    }
}
