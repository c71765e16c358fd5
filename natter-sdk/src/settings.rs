//! Immutable client settings and token resolution.

use std::path::{Path, PathBuf};

use crate::error::ChatError;

/// Connection parameters, created once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub read_port: u16,
    pub write_port: u16,
    pub display_name: String,
    pub token: String,
}

/// Default location of the saved token: `<config dir>/natter/access_token.txt`.
pub fn default_token_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("natter")
        .join("access_token.txt")
}

/// Resolve the token: an explicit value wins, otherwise the token file.
/// A missing or empty token is the fatal invalid-token startup
/// condition, not a connection error.
pub fn resolve_token(explicit: Option<&str>, token_file: &Path) -> Result<String, ChatError> {
    if let Some(token) = explicit {
        let token = token.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }
    match std::fs::read_to_string(token_file) {
        Ok(contents) => {
            let token = contents.trim();
            if token.is_empty() {
                Err(ChatError::InvalidToken(format!(
                    "token file {} is empty; run natter-register first",
                    token_file.display()
                )))
            } else {
                Ok(token.to_string())
            }
        }
        Err(e) => Err(ChatError::InvalidToken(format!(
            "cannot read token file {}: {e}; run natter-register first",
            token_file.display()
        ))),
    }
}
