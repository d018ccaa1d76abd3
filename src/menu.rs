use ratatui::layout::Rect;
use ratatui::style::Color;

use crate::card::{Point, Size};
use crate::command::Command;

/// A clickable, hover-highlighted label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub rect: Rect,
    pub label: &'static str,
    pub color: Color,
    pub hover_color: Color,
    pub hovered: bool,
}

impl Button {
    pub fn new(rect: Rect, label: &'static str, color: Color, hover_color: Color) -> Self {
        Button {
            rect,
            label,
            color,
            hover_color,
            hovered: false,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        self.rect.contains(ratatui::layout::Position::new(p.x, p.y))
    }

    /// Update the hover flag; returns whether the point is over the button.
    pub fn check_hover(&mut self, p: Point) -> bool {
        self.hovered = self.contains(p);
        self.hovered
    }

    pub fn fill(&self) -> Color {
        if self.hovered { self.hover_color } else { self.color }
    }
}

/// A rect of `width × height` centered horizontally at row `y`.
pub fn centered(screen: Size, width: u16, height: u16, y: u16) -> Rect {
    let width = width.min(screen.width);
    Rect::new((screen.width - width) / 2, y, width, height)
}

/// What the portal asks the game loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalAction {
    MemoryGame,
    MatchGame,
    Exit,
}

pub const PORTAL_TITLE: &str = "Brawl Stars Games";
pub const PORTAL_SUBTITLE: &str = "Select a Game Mode";

/// One-line pitch for each mode, shown under the buttons.
pub const MODE_DESCRIPTIONS: [&str; 2] = [
    "Classic memory game! Find matching pairs of Brawl Stars characters.",
    "Can you remember where the cards are? Find the card that matches the one shown!",
];

const BUTTON_WIDTH: u16 = 30;
const BUTTON_HEIGHT: u16 = 3;

/// The main menu: pick a game mode or exit.
#[derive(Debug, Clone)]
pub struct Portal {
    pub screen: Size,
    pub buttons: Vec<(Button, PortalAction)>,
}

impl Portal {
    pub fn new(screen: Size) -> Self {
        let mut portal = Portal {
            screen,
            buttons: vec![
                (
                    Button::new(
                        Rect::default(),
                        "Memory Card Game",
                        Color::Rgb(70, 80, 200),
                        Color::Rgb(100, 120, 255),
                    ),
                    PortalAction::MemoryGame,
                ),
                (
                    Button::new(
                        Rect::default(),
                        "Match Card Challenge",
                        Color::Rgb(200, 70, 70),
                        Color::Rgb(255, 100, 100),
                    ),
                    PortalAction::MatchGame,
                ),
                (
                    Button::new(
                        Rect::default(),
                        "Exit",
                        Color::Rgb(70, 70, 70),
                        Color::Rgb(100, 100, 100),
                    ),
                    PortalAction::Exit,
                ),
            ],
        };
        portal.relayout(screen);
        portal
    }

    /// Row of the first description line.
    pub fn descriptions_top(&self) -> u16 {
        self.first_button_row() + 3 * (BUTTON_HEIGHT + 1) + 1
    }

    fn first_button_row(&self) -> u16 {
        (self.screen.height / 3).max(5)
    }

    pub fn relayout(&mut self, screen: Size) {
        self.screen = screen;
        let top = self.first_button_row();
        for (i, (button, _)) in self.buttons.iter_mut().enumerate() {
            let row = top + i as u16 * (BUTTON_HEIGHT + 1);
            button.rect = centered(screen, BUTTON_WIDTH, BUTTON_HEIGHT, row);
        }
    }

    fn hovered_index(&self) -> Option<usize> {
        self.buttons.iter().position(|(b, _)| b.hovered)
    }

    fn select(&mut self, index: usize) {
        for (i, (button, _)) in self.buttons.iter_mut().enumerate() {
            button.hovered = i == index;
        }
    }

    /// Feed a command; returns an action when a button is activated.
    ///
    /// Mouse hover and Up/Down share the highlight, Enter activates it,
    /// `1`/`2` jump straight into a mode, Esc or `q` exits.
    pub fn handle(&mut self, cmd: Command) -> Option<PortalAction> {
        match cmd {
            Command::Hover(p) => {
                for (button, _) in &mut self.buttons {
                    button.check_hover(p);
                }
                None
            }
            Command::Click(p) => self
                .buttons
                .iter()
                .find(|(b, _)| b.contains(p))
                .map(|(_, action)| *action),
            Command::Up => {
                let n = self.buttons.len();
                let next = self.hovered_index().map_or(n - 1, |i| (i + n - 1) % n);
                self.select(next);
                None
            }
            Command::Down => {
                let n = self.buttons.len();
                let next = self.hovered_index().map_or(0, |i| (i + 1) % n);
                self.select(next);
                None
            }
            Command::Confirm => self.hovered_index().map(|i| self.buttons[i].1),
            Command::Key('1') => Some(PortalAction::MemoryGame),
            Command::Key('2') => Some(PortalAction::MatchGame),
            Command::Back | Command::Key('q') => Some(PortalAction::Exit),
            Command::Resize(size) => {
                self.relayout(size);
                None
            }
            _ => None,
        }
    }
}
