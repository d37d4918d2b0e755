use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::app_dirs::AppDirs;

/// Test mode: fixed countdown or full-passage count-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mode {
    Timed(u32),
    Passage,
}

impl Mode {
    pub const DEFAULT_SECS: u32 = 60;

    /// Countdown duration, or None for count-up passage mode.
    pub fn seconds(&self) -> Option<u32> {
        match self {
            Mode::Timed(s) => Some(*s),
            Mode::Passage => None,
        }
    }

    pub fn is_countdown(&self) -> bool {
        matches!(self, Mode::Timed(_))
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Timed(Self::DEFAULT_SECS)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Timed(s) => write!(f, "t:{s}"),
            Mode::Passage => write!(f, "passage"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "passage" {
            return Ok(Mode::Passage);
        }
        if let Some(digits) = s.strip_prefix("t:") {
            // anything unparseable after the prefix falls back to the default
            return Ok(Mode::Timed(digits.parse().unwrap_or(Self::DEFAULT_SECS)));
        }
        Err(format!("unknown mode '{s}', expected t:<secs> or passage"))
    }
}

impl TryFrom<String> for Mode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Mode> for String {
    fn from(m: Mode) -> Self {
        m.to_string()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CursorStyle {
    Block,
    Underline,
    Beam,
}

/// Everything the host hands the engine and UI at construction time.
/// No hidden global state: persistence goes through an injected store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub mode: Mode,
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub sound: bool,
    pub volume: u8,
    pub cursor_style: CursorStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            category: None,
            difficulty: None,
            sound: false,
            volume: 50,
            cursor_style: CursorStyle::Underline,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("velo_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Settings {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(settings) = serde_json::from_slice::<Settings>(&bytes) {
                return settings;
            }
        }
        Settings::default()
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
