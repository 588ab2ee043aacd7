#![allow(clippy::float_cmp)]

use super::*;

fn parse(line: &str) -> Command {
    Command::parse_line(line).unwrap()
}

// =============================================================================
// MODES
// =============================================================================

#[test]
fn place_parses_kind_case_insensitively() {
    assert_eq!(parse("place Circle #ff0000"), Command::Place { kind: TokenKind::Circle, colour: "#ff0000".into() });
    assert_eq!(parse("place diamond blue"), Command::Place { kind: TokenKind::Diamond, colour: "blue".into() });
}

#[test]
fn place_rejects_unknown_kind() {
    let err = Command::parse_line("place hexagon #fff").unwrap_err();
    assert!(matches!(err, CommandError::Usage(msg) if msg.contains("hexagon")));
}

#[test]
fn object_and_select() {
    assert_eq!(parse("object 12"), Command::Object { obj_id: 12 });
    assert_eq!(parse("select"), Command::Select);
}

// =============================================================================
// POINTER
// =============================================================================

#[test]
fn pointer_commands_take_coordinates() {
    assert_eq!(parse("click 130 70.5"), Command::Click { x: 130.0, y: 70.5 });
    assert_eq!(parse("move -4 8"), Command::Move { x: -4.0, y: 8.0 });
    assert_eq!(parse("up 1 2"), Command::Up { x: 1.0, y: 2.0 });
}

#[test]
fn down_defaults_to_primary_without_shift() {
    assert_eq!(parse("down 5 6"), Command::Down { x: 5.0, y: 6.0, button: MouseButton::Primary, shift: false });
    assert_eq!(
        parse("down 5 6 --button secondary --shift"),
        Command::Down { x: 5.0, y: 6.0, button: MouseButton::Secondary, shift: true }
    );
}

#[test]
fn missing_coordinate_is_usage_error() {
    assert!(matches!(Command::parse_line("click 10"), Err(CommandError::Usage(_))));
}

// =============================================================================
// VIEW
// =============================================================================

#[test]
fn zoom_with_and_without_point() {
    assert_eq!(parse("zoom in"), Command::Zoom { direction: ZoomDirection::In, x: None, y: None });
    assert_eq!(parse("zoom out 10 -20"), Command::Zoom { direction: ZoomDirection::Out, x: Some(10.0), y: Some(-20.0) });
}

#[test]
fn pan_accepts_negative_deltas() {
    assert_eq!(parse("pan -40 5"), Command::Pan { dx: -40.0, dy: 5.0 });
}

#[test]
fn bare_commands() {
    assert_eq!(parse("reset"), Command::Reset);
    assert_eq!(parse("confirm"), Command::Confirm);
    assert_eq!(parse("players"), Command::Players);
    assert_eq!(parse("tokens"), Command::Tokens);
    assert_eq!(parse("  quit  "), Command::Quit);
    assert_eq!(parse("key Escape"), Command::Key { name: "Escape".into() });
}

// =============================================================================
// RENAME / ERRORS
// =============================================================================

#[test]
fn rename_keeps_every_word() {
    assert_eq!(parse("rename Goblin King"), Command::Rename { name: vec!["Goblin".into(), "King".into()] });
    assert!(matches!(Command::parse_line("rename"), Err(CommandError::Usage(_))));
}

#[test]
fn blank_line_is_empty() {
    assert!(matches!(Command::parse_line("   "), Err(CommandError::Empty)));
}

#[test]
fn help_lists_commands() {
    let Err(CommandError::Usage(help)) = Command::parse_line("help") else {
        panic!("help should render usage");
    };
    assert!(help.contains("place"));
    assert!(help.contains("rename"));
}

#[test]
fn unknown_command_is_usage_error() {
    assert!(matches!(Command::parse_line("teleport 1 2"), Err(CommandError::Usage(_))));
}
