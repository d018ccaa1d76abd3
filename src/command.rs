use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::card::{Point, Size};

/// Everything the player can do, independent of the input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Left mouse button pressed at a cell.
    Click(Point),
    /// Mouse moved over a cell (hover highlighting).
    Hover(Point),
    Up,
    Down,
    Left,
    Right,
    /// Enter or space.
    Confirm,
    /// Escape.
    Back,
    /// Any other printable key, lower-cased.
    Key(char),
    /// Ctrl-C.
    Quit,
    /// The terminal changed size.
    Resize(Size),
}

/// Translate a terminal event into a `Command`.
///
/// Key bindings:
/// ```text
/// mouse left         Click            mouse move   Hover
/// ← → ↑ ↓            Left/Right/Up/Down
/// Enter | Space      Confirm          Esc          Back
/// Ctrl-C             Quit             other keys   Key(c)
/// ```
/// Key releases and repeats (reported on Windows) are dropped.
pub fn command_from_event(event: &Event) -> Option<Command> {
    match event {
        Event::Key(key) => from_key(key),
        Event::Mouse(mouse) => from_mouse(mouse),
        Event::Resize(w, h) => Some(Command::Resize(Size::new(*w, *h))),
        _ => None,
    }
}

fn from_key(key: &KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        KeyCode::Char(' ') | KeyCode::Enter => Some(Command::Confirm),
        KeyCode::Char(c) => Some(Command::Key(c.to_ascii_lowercase())),
        KeyCode::Esc => Some(Command::Back),
        KeyCode::Up => Some(Command::Up),
        KeyCode::Down => Some(Command::Down),
        KeyCode::Left => Some(Command::Left),
        KeyCode::Right => Some(Command::Right),
        _ => None,
    }
}

fn from_mouse(mouse: &MouseEvent) -> Option<Command> {
    let at = Point::new(mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(Command::Click(at)),
        MouseEventKind::Moved => Some(Command::Hover(at)),
        _ => None,
    }
}
