//! Game configuration: the board parameters of a single game and the settings file they may come from.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SIZE: u8 = 3;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Everything that can be wrong with a board configuration.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The board has less than two cells. The value is the requested side length.
    #[error("a {0}x{0} board is too small, it must have at least two cells")]
    NotEnoughCells(u8),
    /// The requested amount of mines doesn't leave room for the opening click and at least one more safe cell.
    #[error("{mines} mines requested, but the board accepts at most {max}")]
    InvalidMinesAmount { mines: u16, max: u16 },
}

/// The parameters of a single game: the side length of the square board and the amount of mines hidden in it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: u8,
    pub mines: u16,
}

impl GameConfig {
    pub const fn new(size: u8, mines: u16) -> Self {
        GameConfig { size, mines }
    }

    /// The default mine policy: as many mines as the board's side length.
    pub const fn for_size(size: u8) -> Self {
        GameConfig {
            size,
            mines: size as u16,
        }
    }

    pub const fn cells_amount(&self) -> u32 {
        self.size as u32 * self.size as u32
    }

    /// The largest mines amount a board of this size accepts.
    pub fn max_mines(&self) -> u16 {
        // 255 * 255 - 2 still fits into `u16`.
        self.cells_amount().saturating_sub(2) as u16
    }

    /// Checks that the board has at least two cells and that `mines < size * size - 1`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.cells_amount() < 2 {
            Err(ConfigurationError::NotEnoughCells(self.size))
        } else if self.mines > self.max_mines() {
            Err(ConfigurationError::InvalidMinesAmount {
                mines: self.mines,
                max: self.max_mines(),
            })
        } else {
            Ok(())
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::for_size(DEFAULT_SIZE)
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("couldn't read the settings file")]
    Io(#[from] std::io::Error),
    #[error("couldn't parse the settings file")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigurationError),
}

/// The application settings, as read from a TOML file. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub size: u8,
    /// `None` means "as many mines as the board's side length".
    pub mines: Option<u16>,
    pub tick_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            size: DEFAULT_SIZE,
            mines: None,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.as_ref().display(), ?settings, "settings loaded");
        Ok(settings)
    }

    /// Loads the settings from the given file, or falls back to the defaults when there's no file to load.
    pub fn load_or_default(path: Option<impl AsRef<Path>>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Overrides the board parameters with the ones given explicitly (e.g. on the command line).
    pub fn with_overrides(mut self, size: Option<u8>, mines: Option<u16>) -> Self {
        if let Some(size) = size {
            if mines.is_none() && self.size != size {
                // the file's mines amount was meant for another board size
                self.mines = None;
            }
            self.size = size;
        }
        if mines.is_some() {
            self.mines = mines;
        }
        self
    }

    /// Resolves the mine policy and validates the result.
    pub fn game_config(&self) -> Result<GameConfig, SettingsError> {
        let config = match self.mines {
            Some(mines) => GameConfig::new(self.size, mines),
            None => GameConfig::for_size(self.size),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
