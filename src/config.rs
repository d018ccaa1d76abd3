use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Largest board: ten characters, i.e. ten pairs in the memory game.
pub const MAX_CHARACTERS: usize = 10;

/// Tunables for both game modes and the frame loop.
///
/// Every field has a default, so a partial `config.json` only overrides what
/// it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed for the board shuffle; `None` draws from the OS.
    pub seed: Option<u64>,
    pub assets_dir: PathBuf,
    pub fps: u32,
    /// How long a mismatched pair stays face up.
    pub flip_delay_ms: u64,
    /// Match mode: how long the whole board is shown before play.
    pub preview_ms: u64,
    /// Match mode: how long CORRECT!/WRONG! stays on screen.
    pub result_ms: u64,
    pub match_rounds: u32,
    pub min_characters: usize,
    pub max_characters: usize,
    /// Largest card in terminal cells, border included.  Boards shrink
    /// their cards below this to fit the terminal.
    pub card_width: u16,
    pub card_height: u16,
    pub padding: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            seed: None,
            assets_dir: PathBuf::from("assets").join("images"),
            fps: 60,
            flip_delay_ms: 1500,
            preview_ms: 5000,
            result_ms: 1500,
            match_rounds: 10,
            min_characters: 5,
            max_characters: MAX_CHARACTERS,
            card_width: 14,
            card_height: 8,
            padding: 2,
        }
    }
}

impl Config {
    /// Load `config.json`.  An explicit path must exist; the default path is
    /// optional and falls back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let text = fs::read_to_string(&path)
            .wrap_err_with(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .wrap_err_with(|| format!("parsing config file {}", path.display()))?;
        log::info!("loaded config from {}", path.display());
        Ok(config.sanitized())
    }

    /// Apply command-line overrides on top of the file settings.
    pub fn with_args(mut self, args: &CliArgs) -> Self {
        if let Some(seed) = args.seed {
            self.seed = Some(seed);
        }
        if let Some(dir) = &args.assets_dir {
            self.assets_dir = dir.clone();
        }
        if let Some(fps) = args.fps {
            self.fps = fps;
        }
        self.sanitized()
    }

    /// Clamp values into ranges the board and the frame loop can handle.
    pub fn sanitized(mut self) -> Self {
        self.fps = self.fps.clamp(1, 240);
        self.max_characters = self.max_characters.clamp(1, MAX_CHARACTERS);
        self.min_characters = self.min_characters.clamp(1, self.max_characters);
        self.match_rounds = self.match_rounds.max(1);
        self.card_width = self.card_width.max(4);
        self.card_height = self.card_height.max(3);
        self
    }

    pub fn flip_delay(&self) -> Duration {
        Duration::from_millis(self.flip_delay_ms)
    }

    pub fn preview_duration(&self) -> Duration {
        Duration::from_millis(self.preview_ms)
    }

    pub fn result_duration(&self) -> Duration {
        Duration::from_millis(self.result_ms)
    }

    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }

    pub fn card_size(&self) -> crate::card::Size {
        crate::card::Size::new(self.card_width, self.card_height)
    }

    fn default_path() -> Option<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "brawl-memory", "brawl-memory")?;
        Some(proj_dirs.config_dir().join("config.json"))
    }
}

/// Flags accepted on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub seed: Option<u64>,
    pub assets_dir: Option<PathBuf>,
    pub fps: Option<u32>,
    pub config: Option<PathBuf>,
    pub help: bool,
}

pub const USAGE: &str =
    "Usage: brawl-memory [--seed N] [--assets DIR] [--fps N] [--config FILE] [--help]";

/// Parse command-line flags (without the program name).
///
/// ```text
/// --seed <u64>      reproducible shuffles
/// --assets <dir>    card image directory
/// --fps <n>         frame rate
/// --config <file>   config.json to load instead of the default
/// --help | -h       print usage
/// ```
pub fn parse_args<I, S>(args: I) -> Result<CliArgs, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = CliArgs::default();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        let flag = arg.as_ref().to_string();
        match flag.as_str() {
            "--help" | "-h" => out.help = true,
            "--seed" | "--assets" | "--fps" | "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("Missing value for '{}'. {}", flag, USAGE))?;
                let value = value.as_ref();
                match flag.as_str() {
                    "--seed" => {
                        out.seed = Some(
                            value
                                .parse()
                                .map_err(|_| format!("'{}' is not a valid seed", value))?,
                        )
                    }
                    "--fps" => {
                        out.fps = Some(
                            value
                                .parse()
                                .map_err(|_| format!("'{}' is not a valid frame rate", value))?,
                        )
                    }
                    "--assets" => out.assets_dir = Some(PathBuf::from(value)),
                    _ => out.config = Some(PathBuf::from(value)),
                }
            }
            _ => return Err(format!("Unknown argument '{}'. {}", flag, USAGE)),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_flags() {
        let args = parse_args([
            "--seed", "42", "--assets", "art", "--fps", "30", "--config", "c.json",
        ])
        .unwrap();
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.assets_dir, Some(PathBuf::from("art")));
        assert_eq!(args.fps, Some(30));
        assert_eq!(args.config, Some(PathBuf::from("c.json")));
        assert!(!args.help);
    }

    #[test]
    fn rejects_unknown_and_incomplete_flags() {
        assert!(parse_args(["--bogus"]).unwrap_err().contains("Unknown argument"));
        assert!(parse_args(["--seed"]).unwrap_err().contains("Missing value"));
        assert!(parse_args(["--seed", "abc"]).unwrap_err().contains("not a valid seed"));
    }

    #[test]
    fn cli_overrides_file_values() {
        let args = CliArgs {
            seed: Some(7),
            fps: Some(1000),
            ..CliArgs::default()
        };
        let config = Config::default().with_args(&args);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.fps, 240);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{ "flip_delay_ms": 800 }"#).unwrap();
        assert_eq!(config.flip_delay(), Duration::from_millis(800));
        assert_eq!(config.match_rounds, 10);
        assert_eq!(config.min_characters, 5);
    }

    #[test]
    fn sanitizing_keeps_character_range_ordered() {
        let config = Config {
            min_characters: 12,
            max_characters: 40,
            ..Config::default()
        }
        .sanitized();
        assert_eq!(config.max_characters, MAX_CHARACTERS);
        assert_eq!(config.min_characters, MAX_CHARACTERS);
    }
}
