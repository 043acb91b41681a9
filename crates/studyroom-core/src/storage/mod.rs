pub mod store;

pub use store::{RecordOutcome, Store};

use std::path::PathBuf;

/// Returns `~/.config/studyroom[-dev]/` based on STUDYROOM_ENV.
///
/// Set STUDYROOM_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYROOM_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studyroom-dev")
    } else {
        base_dir.join("studyroom")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
