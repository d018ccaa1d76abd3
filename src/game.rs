use std::time::Instant;

use color_eyre::eyre::{Result, WrapErr};
use crossterm::event;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::assets::ArtBook;
use crate::board::Roster;
use crate::card::{Point, Size};
use crate::command::{Command, command_from_event};
use crate::config::Config;
use crate::difficulty::{DifficultyAction, DifficultySelector};
use crate::match_game::MatchGameManager;
use crate::memory::GameManager;
use crate::menu::{Portal, PortalAction};
use crate::renderer::Renderer;

/// The two game modes offered by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Memory,
    Match,
}

impl Mode {
    pub fn title(self) -> &'static str {
        match self {
            Mode::Memory => "Memory Card Game",
            Mode::Match => "Match Card Challenge",
        }
    }

    fn index(self) -> usize {
        match self {
            Mode::Memory => 0,
            Mode::Match => 1,
        }
    }
}

/// A board in progress.
#[derive(Debug, Clone)]
pub enum Session {
    Memory(GameManager),
    Match(MatchGameManager),
}

impl Session {
    pub fn mode(&self) -> Mode {
        match self {
            Session::Memory(_) => Mode::Memory,
            Session::Match(_) => Mode::Match,
        }
    }

    pub fn is_game_over(&self) -> bool {
        match self {
            Session::Memory(gm) => gm.is_game_over(),
            Session::Match(mm) => mm.is_game_over(),
        }
    }

    /// Forward a click; the reason is returned when the board ignores it.
    pub fn handle_click(&mut self, point: Point, now: Instant) -> Result<(), &'static str> {
        match self {
            Session::Memory(gm) => gm.handle_click(point, now).map(|flip| log::trace!("{flip:?}")),
            Session::Match(mm) => mm.handle_click(point, now).map(|guess| log::trace!("{guess:?}")),
        }
    }

    pub fn update(&mut self, now: Instant) {
        match self {
            Session::Memory(gm) => gm.update(now),
            Session::Match(mm) => mm.update(now),
        }
    }

    pub fn reset(&mut self, now: Instant) {
        match self {
            Session::Memory(gm) => gm.reset(now),
            Session::Match(mm) => mm.reset(now),
        }
    }

    pub fn relayout(&mut self, screen: Size) {
        match self {
            Session::Memory(gm) => gm.relayout(screen),
            Session::Match(mm) => mm.relayout(screen),
        }
    }
}

/// What is on screen.
#[derive(Debug, Clone)]
pub enum Screen {
    Portal(Portal),
    Difficulty { mode: Mode, selector: DifficultySelector },
    Playing(Session),
}

/// Screen changes requested while handling a command.
enum Transition {
    ToPortal,
    ToDifficulty(Mode),
    Start(Mode, usize),
    Exit,
}

/// The main loop.  `renderer` is injected so screen logic can be driven
/// without a terminal.
pub struct Game<R: Renderer> {
    screen: Screen,
    renderer: R,
    art: ArtBook,
    roster: Roster,
    config: Config,
    rng: SmallRng,
    size: Size,
    /// Last difficulty picked per mode, restored when its selector reopens.
    last_count: [usize; 2],
    running: bool,
}

impl<R: Renderer> Game<R> {
    pub fn new(config: Config, art: ArtBook, roster: Roster, renderer: R) -> Result<Self> {
        let size = renderer.size()?;
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let min = config.min_characters;
        Ok(Game {
            screen: Screen::Portal(Portal::new(size)),
            renderer,
            art,
            roster,
            config,
            rng,
            size,
            last_count: [min, min],
            running: true,
        })
    }

    #[allow(dead_code)]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run the fixed-rate loop until the player quits: update, draw, then
    /// handle input until the frame budget is spent.
    pub fn run(&mut self) -> Result<()> {
        log::info!("entering main loop at {} fps", self.config.fps);
        while self.is_running() {
            let frame_start = Instant::now();
            self.update(frame_start);
            self.renderer.render(&self.screen, &self.art, frame_start)?;

            let deadline = frame_start + self.config.frame_budget();
            while self.running {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                if !event::poll(deadline - now).wrap_err("polling input")? {
                    continue;
                }
                let ev = event::read().wrap_err("reading input")?;
                if let Some(cmd) = command_from_event(&ev) {
                    self.handle(cmd, Instant::now());
                }
            }
        }
        log::info!("leaving main loop");
        Ok(())
    }

    /// Advance the active board's timers.
    pub fn update(&mut self, now: Instant) {
        if let Screen::Playing(session) = &mut self.screen {
            session.update(now);
        }
    }

    /// Dispatch a command to the active screen.
    pub fn handle(&mut self, cmd: Command, now: Instant) {
        if cmd == Command::Quit {
            self.running = false;
            return;
        }
        if let Command::Resize(size) = cmd {
            self.size = size;
        }

        let transition = match &mut self.screen {
            Screen::Portal(portal) => match portal.handle(cmd) {
                Some(PortalAction::MemoryGame) => Some(Transition::ToDifficulty(Mode::Memory)),
                Some(PortalAction::MatchGame) => Some(Transition::ToDifficulty(Mode::Match)),
                Some(PortalAction::Exit) => Some(Transition::Exit),
                None => None,
            },
            Screen::Difficulty { mode, selector } => match selector.handle(cmd) {
                Some(DifficultyAction::Start(count)) => Some(Transition::Start(*mode, count)),
                Some(DifficultyAction::Back) => Some(Transition::ToPortal),
                None => None,
            },
            Screen::Playing(session) => match cmd {
                Command::Back => Some(Transition::ToDifficulty(session.mode())),
                Command::Key('r') if session.is_game_over() => {
                    log::info!("restarting {}", session.mode().title());
                    session.reset(now);
                    None
                }
                Command::Key('m') if session.is_game_over() => {
                    Some(Transition::ToDifficulty(session.mode()))
                }
                Command::Click(p) => {
                    if let Err(reason) = session.handle_click(p, now) {
                        log::trace!("click at {:?} ignored: {}", p, reason);
                    }
                    None
                }
                Command::Resize(size) => {
                    session.relayout(size);
                    None
                }
                _ => None,
            },
        };

        if let Some(t) = transition {
            self.apply(t, now);
        }
    }

    fn apply(&mut self, transition: Transition, now: Instant) {
        match transition {
            Transition::ToPortal => self.screen = Screen::Portal(Portal::new(self.size)),
            Transition::ToDifficulty(mode) => {
                let mut selector = DifficultySelector::new(
                    self.size,
                    self.config.min_characters,
                    self.config.max_characters,
                );
                selector.selected = self.last_count[mode.index()].clamp(selector.min, selector.max);
                self.screen = Screen::Difficulty { mode, selector };
            }
            Transition::Start(mode, count) => {
                self.last_count[mode.index()] = count;
                log::info!("starting {} with {} characters", mode.title(), count);
                let rng = SmallRng::from_rng(&mut self.rng);
                let roster = self.roster.clone();
                let session = match mode {
                    Mode::Memory => Session::Memory(GameManager::new(
                        roster, count, self.size, &self.config, rng, now,
                    )),
                    Mode::Match => Session::Match(MatchGameManager::new(
                        roster, count, self.size, &self.config, rng, now,
                    )),
                };
                self.screen = Screen::Playing(session);
            }
            Transition::Exit => {
                log::info!("exit requested from portal");
                self.running = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::roster;
    use crate::match_game::Phase;
    use std::time::Duration;

    /// Renderer that draws nothing and reports a fixed size.
    struct NullRenderer;

    impl Renderer for NullRenderer {
        fn size(&self) -> Result<Size> {
            Ok(Size::new(100, 44))
        }

        fn render(&mut self, _: &Screen, _: &ArtBook, _: Instant) -> Result<()> {
            Ok(())
        }
    }

    fn game() -> Game<NullRenderer> {
        let config = Config {
            seed: Some(5),
            ..Config::default()
        };
        Game::new(config, ArtBook::default(), roster(10), NullRenderer).unwrap()
    }

    fn start(game: &mut Game<NullRenderer>, key: char, now: Instant) {
        game.handle(Command::Key(key), now);
        game.handle(Command::Confirm, now);
    }

    fn memory(game: &mut Game<NullRenderer>) -> &mut GameManager {
        match &mut game.screen {
            Screen::Playing(Session::Memory(gm)) => gm,
            other => panic!("expected memory game, got {other:?}"),
        }
    }

    fn center_of(gm: &GameManager, i: usize) -> Point {
        let p = gm.cards[i].position;
        Point::new(p.x + 1, p.y + 1)
    }

    #[test]
    fn portal_to_memory_game_and_back() {
        let now = Instant::now();
        let mut g = game();
        assert!(matches!(g.screen(), Screen::Portal(_)));

        g.handle(Command::Key('1'), now);
        assert!(matches!(g.screen(), Screen::Difficulty { mode: Mode::Memory, .. }));

        g.handle(Command::Right, now);
        g.handle(Command::Confirm, now);
        assert_eq!(memory(&mut g).pairs(), 6);

        g.handle(Command::Back, now);
        match g.screen() {
            Screen::Difficulty { mode, selector } => {
                assert_eq!(*mode, Mode::Memory);
                assert_eq!(selector.selected, 6, "difficulty is remembered");
            }
            other => panic!("unexpected {other:?}"),
        }

        g.handle(Command::Back, now);
        assert!(matches!(g.screen(), Screen::Portal(_)));
        g.handle(Command::Key('q'), now);
        assert!(!g.is_running());
    }

    #[test]
    fn clicks_reach_the_board() {
        let now = Instant::now();
        let mut g = game();
        start(&mut g, '1', now);
        let p = center_of(memory(&mut g), 0);
        g.handle(Command::Click(p), now);
        assert!(memory(&mut g).cards[0].flipped);
    }

    #[test]
    fn restart_and_menu_only_after_game_over() {
        let now = Instant::now();
        let mut g = game();
        start(&mut g, '1', now);

        g.handle(Command::Key('m'), now);
        assert!(matches!(g.screen(), Screen::Playing(_)));

        let n = memory(&mut g).cards.len();
        for i in 0..n {
            let gm = memory(&mut g);
            if gm.cards[i].matched {
                continue;
            }
            let j = (i + 1..n).find(|&j| gm.cards[j].name == gm.cards[i].name).unwrap();
            let (a, b) = (center_of(gm, i), center_of(gm, j));
            g.handle(Command::Click(a), now);
            g.handle(Command::Click(b), now);
        }
        g.update(now);
        assert!(memory(&mut g).is_game_over());

        g.handle(Command::Key('r'), now);
        assert!(!memory(&mut g).is_game_over());
        assert_eq!(memory(&mut g).score(), 0);
    }

    #[test]
    fn match_mode_runs_on_update() {
        let t0 = Instant::now();
        let mut g = game();
        start(&mut g, '2', t0);
        g.update(t0 + Duration::from_secs(5));
        match g.screen() {
            Screen::Playing(Session::Match(mm)) => {
                assert_eq!(mm.phase(), Phase::Playing);
                assert_eq!(mm.cards.len(), 5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn resize_relayouts_active_board() {
        let now = Instant::now();
        let mut g = game();
        start(&mut g, '1', now);
        g.handle(Command::Resize(Size::new(140, 50)), now);
        assert_eq!(memory(&mut g).screen(), Size::new(140, 50));

        g.handle(Command::Back, now);
        match g.screen() {
            Screen::Difficulty { selector, .. } => assert_eq!(selector.screen, Size::new(140, 50)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ctrl_c_quits_anywhere() {
        let now = Instant::now();
        let mut g = game();
        start(&mut g, '2', now);
        g.handle(Command::Quit, now);
        assert!(!g.is_running());
    }

    #[test]
    fn seeded_games_deal_the_same_board() {
        let now = Instant::now();
        let names = |g: &mut Game<NullRenderer>| {
            start(g, '1', now);
            memory(g).cards.iter().map(|c| c.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&mut game()), names(&mut game()));
    }
}
