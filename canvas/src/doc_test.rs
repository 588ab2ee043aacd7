#![allow(clippy::float_cmp)]

use super::*;

fn placement() -> TokenPlacement {
    TokenPlacement {
        id: "t1".into(),
        name: Some("Goblin".into()),
        kind: TokenKind::Triangle,
        x: 128,
        y: -64,
        colour: "#00ff00".into(),
        controller: Some("bob".into()),
    }
}

#[test]
fn token_from_placement_keeps_all_fields() {
    let token = Token::from_placement(placement());
    assert_eq!(token.id, "t1");
    assert_eq!(token.kind, TokenKind::Triangle);
    assert_eq!(token.pos, BoardPoint::new(128.0, -64.0));
    assert_eq!(token.colour, "#00ff00");
    assert_eq!(token.display_name(), Some("Goblin"));
}

#[test]
fn controller_match_is_exact() {
    let token = Token::from_placement(placement());
    assert!(token.is_controlled_by("bob"));
    assert!(!token.is_controlled_by("Bob"));
    assert!(!token.is_controlled_by("alice"));
}

#[test]
fn empty_name_is_not_displayed() {
    let mut token = Token::from_placement(placement());
    token.name = Some(String::new());
    assert_eq!(token.display_name(), None);
}

#[test]
fn placed_obj_requires_placement_id() {
    let request = ObjPlacement { id: None, obj_id: 3, x: 0, y: 0, width: 64, height: 64, controller: None };
    assert!(PlacedObj::from_placement(request.clone()).is_none());

    let placed = PlacedObj::from_placement(ObjPlacement { id: Some("9".into()), ..request }).expect("has id");
    assert_eq!(placed.id, "9");
    assert_eq!(placed.bounds, Bounds::new(0.0, 0.0, 64.0, 64.0));
}

#[test]
fn to_move_rounds_pose() {
    let obj = PlacedObj {
        id: "5".into(),
        obj_id: 2,
        bounds: Bounds::new(10.4, -3.6, 95.5, 64.49),
        controller: None,
    };
    let m = obj.to_move();
    assert_eq!((m.obj_id.as_str(), m.x, m.y, m.w, m.h), ("5", 10, -4, 96, 64));
}

#[test]
fn apply_move_overwrites_bounds() {
    let mut obj = PlacedObj { id: "5".into(), obj_id: 2, bounds: Bounds::default(), controller: None };
    obj.apply_move(&ObjMove { obj_id: "5".into(), x: 1, y: 2, w: 30, h: 40 });
    assert_eq!(obj.bounds, Bounds::new(1.0, 2.0, 30.0, 40.0));
}

#[test]
fn bounds_contains_edges_inclusively() {
    let b = Bounds::new(0.0, 0.0, 10.0, 20.0);
    assert!(b.contains(BoardPoint::new(0.0, 0.0)));
    assert!(b.contains(BoardPoint::new(10.0, 20.0)));
    assert!(!b.contains(BoardPoint::new(10.1, 5.0)));
    assert_eq!((b.right(), b.bottom()), (10.0, 20.0));
}
