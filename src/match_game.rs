use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;

use crate::board::{Layout, Roster, pick_characters};
use crate::card::{Card, Point, Size};
use crate::config::Config;

/// Row where the target card is drawn.
pub const TARGET_TOP: u16 = 4;

/// Phases of the match challenge.  Input is only accepted while `Playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Every card face up for memorizing.
    Preview,
    /// Cards face down; waiting for a guess at the target.
    Playing,
    /// The guessed card is face up with CORRECT!/WRONG! on screen.
    ShowingResult,
    GameOver,
}

/// Result of a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guess {
    pub index: usize,
    pub correct: bool,
}

/// "Find the shown card": one card per character; after a preview the
/// player must find the card shown above the board, round after round.
#[derive(Debug, Clone)]
pub struct MatchGameManager {
    layout: Layout,
    max_card: Size,
    max_padding: u16,
    roster: Roster,
    character_count: usize,
    rounds: u32,
    preview: Duration,
    result: Duration,
    rng: SmallRng,

    pub cards: Vec<Card>,
    target: Option<Card>,
    previous_name: Option<String>,
    score: u32,
    total_rounds: u32,
    started: Instant,
    finished: Option<Instant>,
    phase: Phase,
    phase_since: Instant,
    last_correct: bool,
}

impl MatchGameManager {
    pub fn new(
        roster: Roster,
        character_count: usize,
        screen: Size,
        config: &Config,
        rng: SmallRng,
        now: Instant,
    ) -> Self {
        let max_card = config.card_size();
        let mut mm = MatchGameManager {
            layout: Layout::fit(screen, max_card, config.padding, character_count, grid_top),
            max_card,
            max_padding: config.padding,
            roster,
            character_count,
            rounds: config.match_rounds,
            preview: config.preview_duration(),
            result: config.result_duration(),
            rng,
            cards: Vec::new(),
            target: None,
            previous_name: None,
            score: 0,
            total_rounds: 0,
            started: now,
            finished: None,
            phase: Phase::Preview,
            phase_since: now,
            last_correct: false,
        };
        mm.setup_cards();
        mm
    }

    /// First row the grid may use: below the target card.
    fn grid_offset(&self) -> u16 {
        grid_top(self.layout.card.height)
    }

    fn fitted(&self, screen: Size, count: usize) -> Layout {
        Layout::fit(screen, self.max_card, self.max_padding, count, grid_top)
    }

    fn target_position(&self) -> Point {
        Point::new(
            self.layout.screen.width.saturating_sub(self.layout.card.width) / 2,
            TARGET_TOP,
        )
    }

    fn setup_cards(&mut self) {
        let selected = pick_characters(&self.roster, self.character_count, &mut self.rng);
        self.layout = self.fitted(self.layout.screen, selected.len());
        let offset = self.grid_offset();
        self.cards = self.layout.deal(&selected, self.roster.back, offset);
        // Face up for the preview.
        for card in &mut self.cards {
            card.flipped = true;
        }
    }

    /// Pick the next target, avoiding the previous name when there is a choice.
    fn choose_target(&mut self) {
        let candidates: Vec<&Card> = match &self.previous_name {
            Some(prev) if self.cards.len() > 1 => {
                self.cards.iter().filter(|c| &c.name != prev).collect()
            }
            _ => self.cards.iter().collect(),
        };
        let Some(source) = candidates.choose(&mut self.rng) else {
            return;
        };

        let mut target = Card::new(
            source.name.clone(),
            source.front,
            source.back,
            self.target_position(),
            self.layout.card,
        );
        target.flipped = true;
        log::debug!("round {}: find {}", self.total_rounds + 1, target.name);
        self.previous_name = Some(target.name.clone());
        self.target = Some(target);
    }

    fn enter(&mut self, phase: Phase, now: Instant) {
        self.phase = phase;
        self.phase_since = now;
    }

    fn hide_all(&mut self) {
        for card in &mut self.cards {
            card.flipped = false;
        }
    }

    // -------------------------------------------------------------------------
    // Input / timing
    // -------------------------------------------------------------------------

    /// Guess the face-down card under `point`.
    pub fn handle_click(&mut self, point: Point, now: Instant) -> Result<Guess, &'static str> {
        if self.phase != Phase::Playing {
            return Err("not accepting guesses in this phase");
        }

        let index = self
            .cards
            .iter()
            .position(|c| c.contains_point(point) && !c.flipped)
            .ok_or("no face-down card there")?;
        self.cards[index].flip();
        self.total_rounds += 1;

        let correct = self
            .target
            .as_ref()
            .is_some_and(|t| t.name == self.cards[index].name);
        if correct {
            self.score += 1;
        }
        self.last_correct = correct;
        log::debug!(
            "round {}: picked {} ({})",
            self.total_rounds,
            self.cards[index].name,
            if correct { "correct" } else { "wrong" }
        );

        self.enter(Phase::ShowingResult, now);
        Ok(Guess { index, correct })
    }

    /// Advance the phase timers.
    pub fn update(&mut self, now: Instant) {
        let in_phase = now.saturating_duration_since(self.phase_since);
        match self.phase {
            Phase::Preview if in_phase >= self.preview => {
                self.hide_all();
                self.choose_target();
                self.enter(Phase::Playing, now);
            }
            Phase::ShowingResult if in_phase >= self.result => {
                self.hide_all();
                self.target = None;
                if self.total_rounds >= self.rounds {
                    self.finished = Some(now);
                    self.enter(Phase::GameOver, now);
                    log::info!(
                        "match game over: {}/{} correct, {}% accuracy",
                        self.score,
                        self.total_rounds,
                        self.accuracy()
                    );
                } else {
                    self.choose_target();
                    self.enter(Phase::Playing, now);
                }
            }
            _ => {}
        }
    }

    /// Start over: new selection, new preview.
    pub fn reset(&mut self, now: Instant) {
        self.score = 0;
        self.total_rounds = 0;
        self.started = now;
        self.finished = None;
        self.previous_name = None;
        self.target = None;
        self.last_correct = false;
        self.enter(Phase::Preview, now);
        self.setup_cards();
    }

    /// Re-fit and re-center the grid and the target for a new screen size.
    pub fn relayout(&mut self, screen: Size) {
        self.layout = self.fitted(screen, self.cards.len());
        let offset = self.grid_offset();
        self.layout.reposition(&mut self.cards, offset);
        let pos = self.target_position();
        if let Some(target) = &mut self.target {
            target.position = pos;
            target.size = self.layout.card;
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn target(&self) -> Option<&Card> {
        self.target.as_ref()
    }

    pub fn last_correct(&self) -> bool {
        self.last_correct
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    #[allow(dead_code)]
    pub fn screen(&self) -> Size {
        self.layout.screen
    }

    /// Screen size the board needs when the terminal is too small for it.
    pub fn required_screen(&self) -> Option<Size> {
        self.layout.required_screen(self.cards.len(), self.grid_offset())
    }

    /// Whole-number percentage of correct guesses.
    pub fn accuracy(&self) -> u32 {
        self.score * 100 / self.total_rounds.max(1)
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.finished.unwrap_or(now).saturating_duration_since(self.started)
    }

    /// Time left in the preview and the matching fraction of the bar.
    pub fn preview_remaining(&self, now: Instant) -> Option<(Duration, f64)> {
        if self.phase != Phase::Preview {
            return None;
        }
        let left = self
            .preview
            .saturating_sub(now.saturating_duration_since(self.phase_since));
        let ratio = if self.preview.is_zero() {
            0.0
        } else {
            left.as_secs_f64() / self.preview.as_secs_f64()
        };
        Some((left, ratio))
    }
}

/// The grid starts one row below a target card of `card_height`.
fn grid_top(card_height: u16) -> u16 {
    TARGET_TOP + card_height + 1
}
