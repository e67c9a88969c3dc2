//! Player-name validation and filesystem-safe encoding for per-player snapshot files.

/// Player name validation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlayerNameError {
    #[error("Player name is empty")]
    Empty,

    #[error("Player name is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Player name cannot start or end with whitespace")]
    InvalidWhitespace,

    #[error("Player name contains control characters")]
    ControlCharacters,
}

pub const MAX_PLAYER_NAME_LEN: usize = 64;

/// Check a player name before it is used to select a snapshot file.
pub fn validate_player_name(name: &str) -> Result<&str, PlayerNameError> {
    if name.is_empty() {
        return Err(PlayerNameError::Empty);
    }
    if name.chars().count() > MAX_PLAYER_NAME_LEN {
        return Err(PlayerNameError::TooLong {
            max: MAX_PLAYER_NAME_LEN,
        });
    }
    if name.trim() != name {
        return Err(PlayerNameError::InvalidWhitespace);
    }
    if name.chars().any(char::is_control) {
        return Err(PlayerNameError::ControlCharacters);
    }
    Ok(name)
}

/// Generate safe filename from a player name using percent encoding
pub fn safe_filename(name: &str) -> String {
    use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
    utf8_percent_encode(name, NON_ALPHANUMERIC).to_string()
}
