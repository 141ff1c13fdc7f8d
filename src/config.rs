//! Session configuration.
//!
//! Values come from built-in defaults, optionally overridden by a TOML file,
//! and finally by command-line flags applied in `main`.
//!
//! ```toml
//! mode = "bot"
//! bot_color = "black"
//! bot_delay_ms = 500
//! seed = 42
//! start_fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
//! ```

use crate::engine::{Color, StandardRules};
use crate::error::ConfigError;
use crate::selector::RandomSelector;
use crate::session::{Mode, SessionController};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BOT_DELAY_MS: u64 = 500;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub mode: Mode,
    /// Side moved by the bot in bot mode.
    pub bot_color: Color,
    /// Visible "thinking" delay before a scheduled bot move.
    pub bot_delay_ms: u64,
    /// Seed for the bot's move choice; entropy when absent.
    pub seed: Option<u64>,
    /// Start (and reset) position; standard start when absent.
    pub start_fen: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Human,
            bot_color: Color::Black,
            bot_delay_ms: DEFAULT_BOT_DELAY_MS,
            seed: None,
            start_fen: None,
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn bot_delay(&self) -> Duration {
        Duration::from_millis(self.bot_delay_ms)
    }

    pub fn rules(&self) -> Result<StandardRules, ConfigError> {
        match &self.start_fen {
            Some(fen) => Ok(StandardRules::from_fen(fen)?),
            None => Ok(StandardRules::new()),
        }
    }

    pub fn selector(&self) -> RandomSelector {
        match self.seed {
            Some(seed) => RandomSelector::seeded(seed),
            None => RandomSelector::new(),
        }
    }

    /// Controller for a new session built from this configuration.
    pub fn controller(&self) -> Result<SessionController<StandardRules, RandomSelector>, ConfigError> {
        Ok(SessionController::new(self.rules()?, self.selector())
            .with_bot_color(self.bot_color)
            .with_mode(self.mode))
    }
}
