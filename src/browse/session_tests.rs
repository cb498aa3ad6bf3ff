//! Unit tests for the browse session

use super::*;
use crate::api::{BrowseApi, Cursor};
use crate::testing::{byte_key, ScriptedApi};
use std::cell::RefCell;
use std::rc::Rc;

fn text(s: &str) -> Key {
    Key::from_text(s)
}

fn path(keys: &[&str]) -> KeyPath {
    keys.iter().map(|k| text(k)).collect()
}

/// root / "a" / "b" holding leaves 0..25, plus an empty bucket "e"
fn store() -> ScriptedApi {
    ScriptedApi::new(10)
        .with_leaves(&path(&["a", "b"]), 0..25)
        .with_bucket(&path(&["e"]))
}

/// Run requests and their follow-ups to completion, first in first out
fn drive(session: &mut BrowseSession, api: &ScriptedApi, requests: Vec<FetchRequest>) {
    let mut queue: std::collections::VecDeque<FetchRequest> = requests.into();
    while let Some(request) = queue.pop_front() {
        let result = api.browse(&request.query);
        queue.extend(session.complete(&request, result));
    }
}

fn loaded(api: &ScriptedApi) -> BrowseSession {
    let mut session = BrowseSession::new(SessionConfig::default());
    let requests = session.reload();
    drive(&mut session, api, requests);
    session
}

fn activate(session: &mut BrowseSession, api: &ScriptedApi, level: usize, key: &Key) -> Activation {
    let entry = session.level(level).unwrap().find(key).unwrap().clone();
    let activation = session.on_entry_activated(level, &entry).unwrap();
    drive(session, api, activation.requests.clone());
    activation
}

#[test]
fn test_reload_loads_root() {
    let api = store();
    let mut session = BrowseSession::new(SessionConfig::default());
    let requests = session.reload();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query.cursor, None);

    drive(&mut session, &api, requests);
    assert_eq!(session.levels().len(), 1);
    let keys: Vec<&Key> = session.levels()[0].entries().iter().map(|e| &e.key).collect();
    assert_eq!(keys, vec![&text("a"), &text("e")]);
}

#[test]
fn test_activating_bucket_adds_level_and_clears_selection() {
    let api = store();
    let mut session = loaded(&api);
    activate(&mut session, &api, 0, &text("a"));
    activate(&mut session, &api, 1, &text("b"));
    activate(&mut session, &api, 2, &byte_key(3));
    assert_eq!(session.selected_value_key(), Some(&byte_key(3)));
    let depth = session.paths().count();

    // Re-activating "b" one level up replaces the deeper level
    activate(&mut session, &api, 1, &text("b"));
    assert_eq!(session.paths().count(), depth);
    assert_eq!(session.selected_value_key(), None);

    activate(&mut session, &api, 0, &text("e"));
    assert_eq!(session.paths().count(), 2);
    assert_eq!(session.levels()[1].path(), &path(&["e"]));
    assert!(session.levels()[1].is_empty());
}

#[test]
fn test_paths_are_strict_prefixes() {
    let api = store();
    let mut session = loaded(&api);
    activate(&mut session, &api, 0, &text("a"));
    activate(&mut session, &api, 1, &text("b"));

    let paths: Vec<&KeyPath> = session.paths().collect();
    for pair in paths.windows(2) {
        assert!(pair[0].is_prefix_of(pair[1]));
        assert_eq!(pair[0].len() + 1, pair[1].len());
    }
}

#[test]
fn test_activating_leaf_reports_selection_change() {
    let api = store();
    let mut session = loaded(&api);
    activate(&mut session, &api, 0, &text("a"));
    activate(&mut session, &api, 1, &text("b"));

    let first = activate(&mut session, &api, 2, &byte_key(4));
    assert!(first.selection_changed);
    assert!(first.requests.is_empty());

    let again = activate(&mut session, &api, 2, &byte_key(4));
    assert!(!again.selection_changed);

    let other = activate(&mut session, &api, 2, &byte_key(5));
    assert!(other.selection_changed);
    assert_eq!(session.paths().count(), 3);
}

#[test]
fn test_activation_on_unknown_level_fails() {
    let api = store();
    let mut session = loaded(&api);
    let entry = Entry::bucket(text("a"));
    let result = session.on_entry_activated(4, &entry);
    assert!(matches!(result, Err(BrowseError::UnknownLevel(4))));
    assert_eq!(session.levels().len(), 1);
}

#[test]
fn test_load_from_expression_anchors_every_level() {
    let mut session = BrowseSession::new(SessionConfig::default());
    let requests = session
        .load_from_expression(r#""a" / "b" - 0x07"#)
        .unwrap();

    let cursors: Vec<Option<Cursor>> = requests.iter().map(|r| r.query.cursor.clone()).collect();
    assert_eq!(
        cursors,
        vec![
            Some(Cursor::From(text("a"))),
            Some(Cursor::From(text("b"))),
            Some(Cursor::From(byte_key(7))),
        ]
    );
    assert_eq!(session.selected_value_key(), Some(&byte_key(7)));
    assert_eq!(session.expression(), r#""a" / "b" - 0x07"#);
}

#[test]
fn test_load_from_expression_windows_open_at_anchor() {
    let api = store();
    let mut session = BrowseSession::new(SessionConfig::default());
    let requests = session.load_from_expression(r#""a" / "b" - 0x0f"#).unwrap();
    drive(&mut session, &api, requests);

    let deepest = &session.levels()[2];
    assert_eq!(deepest.entries().first().map(|e| &e.key), Some(&byte_key(15)));
    assert_eq!(deepest.entries().len(), 10);
    assert_eq!(session.selected_in_level(2).map(|e| &e.key), Some(&byte_key(15)));
    assert_eq!(session.selected_in_level(0).map(|e| &e.key), Some(&text("a")));
    assert!(session.selected_in_level(3).is_none());
}

#[test]
fn test_missing_anchor_falls_back_to_first_page() {
    let api = store();
    let mut session = BrowseSession::new(SessionConfig::default());
    let requests = session.load_from_expression(r#""a" / "b" - 0xee"#).unwrap();
    drive(&mut session, &api, requests);

    let deepest = &session.levels()[2];
    assert_eq!(deepest.entries().first().map(|e| &e.key), Some(&byte_key(0)));
    assert!(api
        .calls()
        .iter()
        .any(|q| q.path == path(&["a", "b"]) && q.cursor.is_none()));
}

#[test]
fn test_invalid_expression_changes_nothing_but_notifications() {
    let api = store();
    let mut session = loaded(&api);
    activate(&mut session, &api, 0, &text("a"));
    let before = session.expression();

    let result = session.load_from_expression(r#""a" - "b" / "c""#);
    assert!(matches!(result, Err(BrowseError::InvalidExpression(_))));
    assert_eq!(session.expression(), before);
    assert_eq!(session.levels().len(), 2);
    assert_eq!(session.notifications().len(), 1);
}

#[test]
fn test_visible_levels_reserve_a_slot_for_the_value() {
    let api = store();
    let mut session = loaded(&api);
    activate(&mut session, &api, 0, &text("a"));
    activate(&mut session, &api, 1, &text("b"));

    let visible = session.visible_levels(2);
    assert_eq!(visible.first, 1);
    assert_eq!(visible.levels.len(), 2);
    assert!(visible.value.is_none());

    activate(&mut session, &api, 2, &byte_key(1));
    let visible = session.visible_levels(2);
    assert_eq!(visible.first, 2);
    assert_eq!(visible.levels.len(), 1);
    assert_eq!(visible.value, Some(&byte_key(1)));

    // Hidden levels still exist
    assert_eq!(session.paths().count(), 3);
    assert_eq!(session.visible_levels(10).first, 0);
}

#[test]
fn test_response_for_destroyed_level_is_dropped() {
    let api = store();
    let mut session = loaded(&api);
    let entry = Entry::bucket(text("a"));
    let activation = session.on_entry_activated(0, &entry).unwrap();
    let orphan = activation.requests[0].clone();

    // Ascend before the response arrives
    let entry = Entry::bucket(text("e"));
    let activation = session.on_entry_activated(0, &entry).unwrap();
    drive(&mut session, &api, activation.requests);

    let follow_ups = session.complete(&orphan, api.browse(&orphan.query));
    assert!(follow_ups.is_empty());
    assert_eq!(session.levels()[1].path(), &path(&["e"]));
    assert!(session.levels()[1].is_empty());
}

#[test]
fn test_fetch_failure_notifies() {
    let api = store();
    let mut session = BrowseSession::new(SessionConfig::default());
    let requests = session.reload();
    api.fail_next(1);
    drive(&mut session, &api, requests);

    assert!(session.levels()[0].is_empty());
    let notification = session.notifications().iter().next().unwrap();
    assert_eq!(notification.message, FETCH_FAILED_MESSAGE);
    assert_eq!(notification.kind, crate::browse::NotificationKind::Error);
}

#[test]
fn test_scroll_near_grows_and_probe_rechecks() {
    let api = store();
    let mut session = BrowseSession::new(SessionConfig::default());
    let requests = session.load_from_expression(r#""a" / "b""#).unwrap();
    drive(&mut session, &api, requests);
    assert_eq!(session.levels()[2].entries().len(), 10);

    // The probe keeps reporting "near the bottom" until the bucket is exhausted
    session.set_scroll_probe(|_, direction| direction == Direction::After);
    let request = session.on_scroll_near(2, Direction::After).unwrap();
    drive(&mut session, &api, vec![request]);

    assert_eq!(session.levels()[2].entries().len(), 25);
    assert!(session.levels()[2].is_exhausted(Direction::After));
    assert!(session.on_scroll_near(2, Direction::After).is_none());
}

#[test]
fn test_scroll_near_unknown_level_is_noop() {
    let api = store();
    let mut session = loaded(&api);
    assert!(session.on_scroll_near(5, Direction::Before).is_none());
}

#[test]
fn test_observers_see_navigation() {
    let api = store();
    let mut session = loaded(&api);
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    session.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    activate(&mut session, &api, 0, &text("a"));

    let events = events.borrow();
    assert!(events.contains(&SessionEvent::LevelsChanged));
    assert!(events.contains(&SessionEvent::WindowChanged { level: 1 }));
    assert!(events.contains(&SessionEvent::Navigate(Location::new(path(&["a"]), None))));
}

#[test]
fn test_from_location_restores_route() {
    let api = store();
    let location = Location::from_route("/61/62?value=02").unwrap();
    let (mut session, requests) = BrowseSession::from_location(SessionConfig::default(), location);
    drive(&mut session, &api, requests);

    assert_eq!(session.levels().len(), 3);
    assert_eq!(session.selected_path(), path(&["a", "b"]).child(byte_key(2)));
    assert_eq!(session.location().to_route(), "/61/62?value=02");
}
