//! Run configuration.
//!
//! Everything the run needs from the outside world is collected here once,
//! at startup, and handed to each component by reference. Tests build a
//! `Config` directly and point it at a mock server and temporary files.

use anyhow::{Result, bail};
use secrecy::SecretString;
use std::path::PathBuf;
use std::str::FromStr;

/// Account whose statistics end up in the cards.
pub const GITHUB_USERNAME: &str = "roniel-rhack";

pub const GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Card templates, relative to the working directory.
pub const SVG_FILES: [&str; 2] = ["dark_mode.svg", "light_mode.svg"];

pub const TOKEN_VAR: &str = "GH_TOKEN";
pub const ASCII_VAR: &str = "ASCII_ART";

/// How the avatar is turned into ASCII art, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AsciiMode {
    Off,
    Basic,
    /// Basic pipeline plus auto-contrast and a contrast boost.
    #[default]
    Enhanced,
}

impl FromStr for AsciiMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(AsciiMode::Off),
            "basic" => Ok(AsciiMode::Basic),
            "enhanced" => Ok(AsciiMode::Enhanced),
            other => bail!("unknown {ASCII_VAR} mode {other:?} (expected off, basic or enhanced)"),
        }
    }
}

/// What to do when no API token is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingToken {
    /// Fail the run.
    #[default]
    Abort,
    /// Write "~" into every stat span and carry on.
    Placeholder,
}

#[derive(Debug)]
pub struct Config {
    pub login: String,
    pub token: Option<SecretString>,
    pub api_url: String,
    pub targets: Vec<PathBuf>,
    pub ascii: AsciiMode,
    pub on_missing_token: MissingToken,
}

impl Config {
    /// Default configuration with an explicit token.
    pub fn new(token: Option<SecretString>) -> Self {
        Self {
            login: GITHUB_USERNAME.to_string(),
            token,
            api_url: GRAPHQL_URL.to_string(),
            targets: SVG_FILES.iter().map(PathBuf::from).collect(),
            ascii: AsciiMode::default(),
            on_missing_token: MissingToken::default(),
        }
    }

    /// Read `GH_TOKEN` and `ASCII_ART` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup(TOKEN_VAR)
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::new);

        let mut config = Self::new(token);
        if let Some(mode) = lookup(ASCII_VAR) {
            config.ascii = mode.parse()?;
        }
        Ok(config)
    }
}
