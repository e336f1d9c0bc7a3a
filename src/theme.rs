//! The single persisted user preference: the visual theme.
//!
//! Stored as one small file in the cache directory, holding the literal
//! string `"dark"` or `"light"`. Anything missing or unrecognized means
//! light, so loading can never fail.

use crate::error::RegenstatError;
use log::warn;
use std::io::ErrorKind;
use std::path::Path;

const THEME_FILE: &str = "theme";

/// The dashboard's visual theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// `"dark"` selects the dark theme; any other value is light.
    pub fn parse(value: &str) -> Theme {
        if value.trim() == "dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

pub async fn load_theme(cache_dir: &Path) -> Theme {
    let path = cache_dir.join(THEME_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => Theme::parse(&contents),
        Err(e) if e.kind() == ErrorKind::NotFound => Theme::Light,
        Err(e) => {
            warn!("Failed to read theme preference from {:?}: {}", path, e);
            Theme::Light
        }
    }
}

pub async fn save_theme(cache_dir: &Path, theme: Theme) -> Result<(), RegenstatError> {
    let path = cache_dir.join(THEME_FILE);
    tokio::fs::write(&path, theme.as_str())
        .await
        .map_err(|e| RegenstatError::ThemeWrite(path, e))
}
