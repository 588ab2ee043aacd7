use std::cell::RefCell;
use std::rc::Rc;

use super::*;

fn comms() -> Comms {
    Comms::new(Identity::new("secret", "alice", "game-7"))
}

fn open() -> Comms {
    let c = comms();
    c.on_open();
    c.drain_outbox();
    c
}

fn connect(name: &str, host: bool) -> String {
    format!(r#"{{"Connect":{{"username":"{name}","host":{host}}}}}"#)
}

// =============================================================
// Handshake and phases
// =============================================================

#[test]
fn starts_connecting() {
    let c = comms();
    assert_eq!(c.phase(), Phase::Connecting);
    assert!(c.should_show_refresh());
    assert!(!c.is_host());
}

#[test]
fn handshake_precedes_buffered_intents() {
    let c = comms();
    c.delete_token("t1");
    c.on_open();
    let out = c.drain_outbox();
    assert_eq!(out.len(), 3);
    assert_eq!(out[0], "secret");
    assert_eq!(out[1], "game-7");
    assert!(out[2].starts_with(r#"{"DeleteToken""#));
    assert_eq!(c.phase(), Phase::Open);
}

#[test]
fn failed_connection_is_terminal_and_suppresses_lost() {
    let c = open();
    let notice = c.receive(r#"{"FailedConnection":{"reason":"game is full"}}"#);
    assert_eq!(notice, Some(Notice::ConnectionFailed { reason: "game is full".into() }));
    assert_eq!(c.phase(), Phase::Failed);
    assert!(!c.should_show_refresh());
    assert_eq!(c.on_close(), None);
    assert_eq!(c.phase(), Phase::Failed);
}

#[test]
fn unexpected_close_reports_connection_lost_once() {
    let c = open();
    assert_eq!(c.on_close(), Some(Notice::ConnectionLost));
    assert_eq!(c.phase(), Phase::Closed);
    assert_eq!(c.on_close(), None);
}

#[test]
fn intents_after_close_are_dropped() {
    let c = open();
    c.on_close();
    c.delete_token("t1");
    assert!(c.drain_outbox().is_empty());
}

#[test]
fn malformed_frames_are_ignored() {
    let c = open();
    assert_eq!(c.receive("not json"), None);
    assert_eq!(c.receive(r#"{"Bogus":{}}"#), None);
    assert_eq!(c.receive("{}"), None);
    assert_eq!(c.phase(), Phase::Open);
}

// =============================================================
// Roster and host
// =============================================================

#[test]
fn connect_naming_self_as_host_grants_host() {
    let c = open();
    c.receive(&connect("alice", true));
    assert!(c.is_host());
}

#[test]
fn host_flag_for_someone_else_does_not_grant_host() {
    let c = open();
    c.receive(&connect("bob", true));
    assert!(!c.is_host());
}

#[test]
fn host_is_pinned_first() {
    let c = open();
    c.receive(&connect("bob", false));
    c.receive(&connect("carol", false));
    c.receive(&connect("alice", true));
    assert_eq!(c.player_names(), vec!["alice", "bob", "carol"]);
    assert!(c.players()[0].host);
}

#[test]
fn reconnect_does_not_duplicate_and_disconnect_removes() {
    let c = open();
    c.receive(&connect("bob", false));
    c.receive(&connect("bob", false));
    assert_eq!(c.player_names(), vec!["bob"]);
    c.receive(r#"{"Disconnect":{"username":"bob"}}"#);
    assert!(c.players().is_empty());
}

#[test]
fn host_id_is_remembered() {
    let c = open();
    c.receive(r#"{"Connect":{"username":"bob","host":true,"host_id":42}}"#);
    assert_eq!(c.host_id(), Some(42));
    c.receive(&connect("carol", false));
    assert_eq!(c.host_id(), Some(42));
}

// =============================================================
// Listeners
// =============================================================

#[test]
fn listeners_receive_only_their_kind() {
    let c = open();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = c.add_listener(MessageKind::DeleteToken, "test", move |m| sink.borrow_mut().push(m.clone()));

    c.receive(r#"{"DeleteObj":{"obj_id":"o1"}}"#);
    c.receive(r#"{"DeleteToken":{"token_id":"t1"}}"#);
    assert_eq!(*seen.borrow(), vec![Message::DeleteToken { token_id: "t1".into() }]);
}

#[test]
fn same_key_replaces_listener() {
    let c = open();
    let count = Rc::new(RefCell::new((0, 0)));
    let a = Rc::clone(&count);
    let b = Rc::clone(&count);
    let _first = c.add_listener(MessageKind::Disconnect, "roster", move |_| a.borrow_mut().0 += 1);
    let _second = c.add_listener(MessageKind::Disconnect, "roster", move |_| b.borrow_mut().1 += 1);

    c.receive(r#"{"Disconnect":{"username":"x"}}"#);
    assert_eq!(*count.borrow(), (0, 1));
    assert_eq!(c.listener_keys(MessageKind::Disconnect), vec!["roster"]);
}

#[test]
fn dropping_subscription_unregisters() {
    let c = open();
    let sub = c.add_listener(MessageKind::Movement, "m", |_| {});
    assert_eq!(c.listener_keys(MessageKind::Movement).len(), 1);
    drop(sub);
    assert!(c.listener_keys(MessageKind::Movement).is_empty());
}

#[test]
fn listeners_see_state_already_updated() {
    let c = Rc::new(open());
    let seen_host = Rc::new(RefCell::new(false));
    let weak = Rc::downgrade(&c);
    let sink = Rc::clone(&seen_host);
    let _sub = c.add_listener(MessageKind::Connect, "k", move |_| {
        if let Some(c) = weak.upgrade() {
            *sink.borrow_mut() = c.is_host();
        }
    });
    c.receive(&connect("alice", true));
    assert!(*seen_host.borrow());
}

// =============================================================
// Outbound encoding
// =============================================================

#[test]
fn place_token_rounds_cell() {
    let c = open();
    c.place_token("t1", TokenKind::Circle, BoardPoint::new(128.0, 63.6), "#ff0000");
    let out = c.drain_outbox();
    let decoded = frames::decode(&out[0]).expect("valid frame");
    let Message::PlaceToken(p) = decoded else {
        panic!("expected PlaceToken, got {decoded:?}");
    };
    assert_eq!((p.x, p.y), (128, 64));
    assert_eq!(p.kind, TokenKind::Circle);
    assert_eq!(p.id, "t1");
}

#[test]
fn place_obj_rounds_geometry_and_has_no_id() {
    let c = open();
    c.place_obj(3, &Bounds::new(0.4, 10.6, 63.5, 64.2));
    let decoded = frames::decode(&c.drain_outbox()[0]).expect("valid frame");
    assert_eq!(
        decoded,
        Message::PlaceObj(ObjPlacement { id: None, obj_id: 3, x: 0, y: 11, width: 64, height: 64, controller: None })
    );
}

#[test]
fn move_token_sends_integer_deltas() {
    let c = open();
    c.move_token("m1", "t1", -64.0, 0.0);
    let decoded = frames::decode(&c.drain_outbox()[0]).expect("valid frame");
    assert_eq!(
        decoded,
        Message::Movement(frames::Movement { id: "m1".into(), token_id: "t1".into(), dx: -64, dy: 0 })
    );
}

#[test]
fn drain_empties_outbox() {
    let c = open();
    c.set_controller("t1", "bob");
    c.rename_token("t1", "Orc");
    assert_eq!(c.drain_outbox().len(), 2);
    assert!(c.drain_outbox().is_empty());
}

// =============================================================
// Assets
// =============================================================

#[test]
fn asset_miss_without_host_id_queues_nothing() {
    let c = open();
    assert!(c.object_image(5).is_none());
    assert_eq!(c.take_asset_request(), None);
}

#[test]
fn host_lists_owned_assets_once() {
    let c = open();
    c.receive(&connect("alice", true));
    assert!(c.object_image(5).is_none());
    assert!(c.object_image(6).is_none());
    assert_eq!(c.take_asset_request(), Some(AssetScope::Owned));
    assert_eq!(c.take_asset_request(), None);

    c.assets_loaded(vec![Image::new(5, "map", "http://x/5.png", Vec::new())]);
    assert_eq!(c.object_image(5).map(|i| i.id), Some(5));
}

#[test]
fn guest_lists_hosts_shared_assets() {
    let c = open();
    c.receive(r#"{"Connect":{"username":"bob","host":true,"host_id":9}}"#);
    assert!(c.object_image(1).is_none());
    assert_eq!(c.take_asset_request(), Some(AssetScope::SharedBy(9)));
}

#[test]
fn failed_fetch_allows_retry() {
    let c = open();
    c.receive(&connect("alice", true));
    c.object_image(1);
    c.take_asset_request();
    c.assets_failed();
    c.object_image(1);
    assert_eq!(c.take_asset_request(), Some(AssetScope::Owned));
}
