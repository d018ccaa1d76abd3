use ratatui::layout::Rect;
use ratatui::style::Color;

use crate::card::{Point, Size};
use crate::command::Command;
use crate::menu::{Button, centered};

/// Outcome of the difficulty screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyAction {
    Start(usize),
    Back,
}

/// Row of the big count readout.
pub const COUNT_ROW: u16 = 9;

/// Chooses how many characters go on the board.
#[derive(Debug, Clone)]
pub struct DifficultySelector {
    pub min: usize,
    pub max: usize,
    pub selected: usize,
    pub screen: Size,
    pub decrement: Button,
    pub increment: Button,
    pub confirm: Button,
    pub back: Button,
}

impl DifficultySelector {
    pub fn new(screen: Size, min: usize, max: usize) -> Self {
        let mut sel = DifficultySelector {
            min,
            max: max.max(min),
            selected: min,
            screen,
            decrement: Button::new(
                Rect::default(),
                "-",
                Color::Rgb(200, 50, 50),
                Color::Rgb(255, 100, 100),
            ),
            increment: Button::new(
                Rect::default(),
                "+",
                Color::Rgb(50, 200, 50),
                Color::Rgb(100, 255, 100),
            ),
            confirm: Button::new(
                Rect::default(),
                "Start",
                Color::Rgb(70, 120, 200),
                Color::Rgb(100, 150, 255),
            ),
            back: Button::new(
                Rect::default(),
                "Back",
                Color::Rgb(100, 100, 100),
                Color::Rgb(150, 150, 150),
            ),
        };
        sel.relayout(screen);
        sel
    }

    pub fn relayout(&mut self, screen: Size) {
        self.screen = screen;
        let mid = screen.width / 2;
        self.decrement.rect = Rect::new(mid.saturating_sub(12), COUNT_ROW - 1, 5, 3);
        self.increment.rect = Rect::new(mid + 8, COUNT_ROW - 1, 5, 3);
        self.confirm.rect = centered(screen, 20, 3, COUNT_ROW + 6);
        self.back.rect = centered(screen, 16, 3, COUNT_ROW + 10);
    }

    fn buttons_mut(&mut self) -> [&mut Button; 4] {
        [&mut self.decrement, &mut self.increment, &mut self.confirm, &mut self.back]
    }

    pub fn decrement_count(&mut self) {
        if self.selected > self.min {
            self.selected -= 1;
        }
    }

    pub fn increment_count(&mut self) {
        if self.selected < self.max {
            self.selected += 1;
        }
    }

    /// Easy (≤ 6), Medium (≤ 8), Hard.
    pub fn label(&self) -> &'static str {
        match self.selected {
            0..=6 => "Easy",
            7..=8 => "Medium",
            _ => "Hard",
        }
    }

    pub fn label_color(&self) -> Color {
        match self.selected {
            0..=6 => Color::Rgb(100, 255, 100),
            7..=8 => Color::Rgb(255, 255, 100),
            _ => Color::Rgb(255, 100, 100),
        }
    }

    pub fn description(&self) -> &'static str {
        match self.selected {
            0..=6 => "Fewer characters make the game easier to remember",
            7..=8 => "A balanced challenge for most players",
            _ => "More characters create a greater memory challenge",
        }
    }

    pub fn handle(&mut self, cmd: Command) -> Option<DifficultyAction> {
        match cmd {
            Command::Hover(p) => {
                for button in self.buttons_mut() {
                    button.check_hover(p);
                }
                None
            }
            Command::Click(p) => self.click(p),
            Command::Left => {
                self.decrement_count();
                None
            }
            Command::Right => {
                self.increment_count();
                None
            }
            Command::Confirm => Some(DifficultyAction::Start(self.selected)),
            Command::Back => Some(DifficultyAction::Back),
            Command::Resize(size) => {
                self.relayout(size);
                None
            }
            _ => None,
        }
    }

    fn click(&mut self, p: Point) -> Option<DifficultyAction> {
        if self.decrement.contains(p) {
            self.decrement_count();
        } else if self.increment.contains(p) {
            self.increment_count();
        } else if self.confirm.contains(p) {
            return Some(DifficultyAction::Start(self.selected));
        } else if self.back.contains(p) {
            return Some(DifficultyAction::Back);
        }
        None
    }
}
