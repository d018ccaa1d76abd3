use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use color_eyre::eyre::{Result, WrapErr};
use directories::ProjectDirs;
use env_logger::{Builder, Env, Target};

/// Route `log` output to a file.  The terminal belongs to the UI, so nothing
/// may be written to stdout/stderr while the game is running.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.  Returns the log
/// path so `main` can mention it after the terminal is restored.
pub fn init() -> Result<Option<PathBuf>> {
    let Some(path) = log_path() else {
        return Ok(None);
    };

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .wrap_err_with(|| format!("creating log directory {}", dir.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("opening log file {}", path.display()))?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .wrap_err("installing logger")?;

    Ok(Some(path))
}

fn log_path() -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "brawl-memory", "brawl-memory")?;
    Some(proj_dirs.data_dir().join("brawl-memory.log"))
}
