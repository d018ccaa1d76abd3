use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use crate::board::{Layout, Roster, pick_characters};
use crate::card::{Card, Point, Size};
use crate::config::Config;

/// Rows above the grid kept for the score/time/attempts HUD.
pub const HUD_ROWS: u16 = 3;

/// A mismatched pair waiting to be turned back over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mismatch {
    since: Instant,
    deadline: Instant,
}

/// What a successful click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flip {
    /// First card of a pair turned up.
    First(usize),
    /// Second card matched the first; both are now locked face up.
    Match(usize, usize),
    /// Second card differs; both flip back after the delay.
    Mismatch(usize, usize),
}

/// "Find the pair": every character is dealt twice, face down.
#[derive(Debug, Clone)]
pub struct GameManager {
    layout: Layout,
    max_card: Size,
    max_padding: u16,
    roster: Roster,
    character_count: usize,
    flip_delay: Duration,
    rng: SmallRng,

    pub cards: Vec<Card>,
    /// Indices of face-up, unmatched cards; never more than two.
    flipped: Vec<usize>,
    score: u32,
    attempts: u32,
    started: Instant,
    finished: Option<Instant>,
    mismatch: Option<Mismatch>,
}

impl GameManager {
    pub fn new(
        roster: Roster,
        character_count: usize,
        screen: Size,
        config: &Config,
        rng: SmallRng,
        now: Instant,
    ) -> Self {
        let max_card = config.card_size();
        let mut gm = GameManager {
            layout: Layout::fit(screen, max_card, config.padding, 2 * character_count, below_hud),
            max_card,
            max_padding: config.padding,
            roster,
            character_count,
            flip_delay: config.flip_delay(),
            rng,
            cards: Vec::new(),
            flipped: Vec::with_capacity(2),
            score: 0,
            attempts: 0,
            started: now,
            finished: None,
            mismatch: None,
        };
        gm.setup_cards();
        gm
    }

    fn setup_cards(&mut self) {
        let selected = pick_characters(&self.roster, self.character_count, &mut self.rng);
        let mut pairs = selected.clone();
        pairs.extend(selected);
        pairs.shuffle(&mut self.rng);
        self.layout = self.fitted(self.layout.screen, pairs.len());
        self.cards = self.layout.deal(&pairs, self.roster.back, HUD_ROWS);
        log::debug!(
            "dealt {} pairs: {:?}",
            self.pairs(),
            self.cards.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
        );
    }

    // -------------------------------------------------------------------------
    // Input / timing
    // -------------------------------------------------------------------------

    /// Flip the face-down card under `point`, if the board accepts input.
    pub fn handle_click(&mut self, point: Point, now: Instant) -> Result<Flip, &'static str> {
        if self.is_game_over() {
            return Err("game is over");
        }
        if self.flipped.len() >= 2 || self.mismatch.is_some() {
            return Err("waiting for cards to flip back");
        }

        let idx = self
            .cards
            .iter()
            .position(|c| c.contains_point(point) && !c.flipped && !c.matched)
            .ok_or("no face-down card there")?;
        self.cards[idx].flip();
        self.flipped.push(idx);

        let &[a, b] = &self.flipped[..] else {
            return Ok(Flip::First(idx));
        };

        self.attempts += 1;
        if self.cards[a].name == self.cards[b].name {
            self.score += 1;
            self.cards[a].matched = true;
            self.cards[b].matched = true;
            self.flipped.clear();
            log::debug!("matched {} (score {})", self.cards[a].name, self.score);
            self.check_game_over(now);
            Ok(Flip::Match(a, b))
        } else {
            self.mismatch = Some(Mismatch {
                since: now,
                deadline: now + self.flip_delay,
            });
            log::debug!("mismatch {} / {}", self.cards[a].name, self.cards[b].name);
            Ok(Flip::Mismatch(a, b))
        }
    }

    /// Advance timers: turn a mismatched pair back once its delay is over.
    pub fn update(&mut self, now: Instant) {
        if let Some(m) = self.mismatch {
            if now >= m.deadline {
                for &i in &self.flipped {
                    self.cards[i].flipped = false;
                }
                self.flipped.clear();
                self.mismatch = None;
            }
        }
        self.check_game_over(now);
    }

    fn check_game_over(&mut self, now: Instant) {
        if self.finished.is_none() && self.cards.iter().all(|c| c.matched) {
            self.finished = Some(now);
            log::info!(
                "memory game over: {} pairs in {} attempts, {:?}",
                self.score,
                self.attempts,
                self.elapsed(now)
            );
        }
    }

    /// Start over with a fresh selection and shuffle.
    pub fn reset(&mut self, now: Instant) {
        self.flipped.clear();
        self.score = 0;
        self.attempts = 0;
        self.started = now;
        self.finished = None;
        self.mismatch = None;
        self.setup_cards();
    }

    /// Re-fit and re-center the grid for a new screen size.
    pub fn relayout(&mut self, screen: Size) {
        self.layout = self.fitted(screen, self.cards.len());
        self.layout.reposition(&mut self.cards, HUD_ROWS);
    }

    fn fitted(&self, screen: Size, count: usize) -> Layout {
        Layout::fit(screen, self.max_card, self.max_padding, count, below_hud)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn is_game_over(&self) -> bool {
        self.finished.is_some()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn pairs(&self) -> usize {
        self.cards.len() / 2
    }

    #[allow(dead_code)]
    pub fn screen(&self) -> Size {
        self.layout.screen
    }

    /// Card size after fitting the grid to the screen.
    #[allow(dead_code)]
    pub fn card_size(&self) -> Size {
        self.layout.card
    }

    /// Screen size the board needs when the terminal is too small for it.
    pub fn required_screen(&self) -> Option<Size> {
        self.layout.required_screen(self.cards.len(), HUD_ROWS)
    }

    /// Play time; frozen once the last pair is found.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.finished.unwrap_or(now).saturating_duration_since(self.started)
    }

    /// The pair currently shown as a mismatch, if any.
    pub fn mismatched(&self) -> Option<(usize, usize)> {
        match (self.mismatch, &self.flipped[..]) {
            (Some(_), &[a, b]) => Some((a, b)),
            _ => None,
        }
    }

    /// Fraction of the flip-back delay still remaining, `1.0` down to `0.0`.
    pub fn mismatch_remaining(&self, now: Instant) -> Option<f64> {
        let m = self.mismatch?;
        let total = m.deadline.saturating_duration_since(m.since).as_secs_f64();
        if total <= 0.0 {
            return Some(0.0);
        }
        let left = m.deadline.saturating_duration_since(now).as_secs_f64();
        Some((left / total).clamp(0.0, 1.0))
    }
}

/// The grid starts under the HUD whatever the card size.
fn below_hud(_card_height: u16) -> u16 {
    HUD_ROWS
}
