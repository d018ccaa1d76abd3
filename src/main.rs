mod assets;
mod board;
mod card;
mod command;
mod config;
mod difficulty;
mod game;
mod logging;
mod match_game;
mod memory;
mod menu;
mod renderer;

use std::io::stdout;

use color_eyre::eyre::{Result, WrapErr};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;

use assets::{ArtBook, DEFAULT_ROSTER};
use board::Roster;
use config::{Config, USAGE};
use game::Game;
use renderer::TuiRenderer;

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = match config::parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            std::process::exit(2);
        }
    };
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let log_path = match logging::init() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("[WARN] logging disabled: {e:#}");
            None
        }
    };

    let config = Config::load(args.config.as_deref())?.with_args(&args);
    log::info!("starting with {:?}", config);

    // Missing art is generated, never fatal.
    match assets::ensure_assets(&config.assets_dir, &DEFAULT_ROSTER) {
        Ok(0) => {}
        Ok(n) => log::info!("generated {} placeholder image(s)", n),
        Err(e) => log::warn!("could not prepare assets: {e:#}"),
    }
    let (art, roster) =
        assets::load_roster(&config.assets_dir, &DEFAULT_ROSTER, config.card_size());

    let result = play(config, art, roster);

    println!("Thanks for playing. Goodbye!");
    if result.is_err() {
        if let Some(path) = log_path {
            eprintln!("See {} for details.", path.display());
        }
    }
    result
}

/// Own the terminal for the duration of the game and always hand it back.
fn play(config: Config, art: ArtBook, roster: Roster) -> Result<()> {
    let terminal = ratatui::init();
    let result = execute!(stdout(), EnableMouseCapture)
        .wrap_err("enabling mouse capture")
        .and_then(|()| Game::new(config, art, roster, TuiRenderer::new(terminal)))
        .and_then(|mut game| game.run());
    let _ = execute!(stdout(), DisableMouseCapture);
    ratatui::restore();
    result
}
