//! Validation helpers for DTOs.

use validator::ValidationError;

/// Maximum length accepted for player display names.
pub const MAX_PLAYER_NAME_LEN: usize = 24;
/// Maximum length accepted for game names.
pub const MAX_GAME_NAME_LEN: usize = 48;

/// Validates a player display name: non-blank after trimming, at most
/// [`MAX_PLAYER_NAME_LEN`] characters and free of control characters.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    validate_display_name(name, MAX_PLAYER_NAME_LEN, "player_name")
}

/// Validates a game name with the same rules as player names but a longer cap.
pub fn validate_game_name(name: &str) -> Result<(), ValidationError> {
    validate_display_name(name, MAX_GAME_NAME_LEN, "game_name")
}

fn validate_display_name(name: &str, max_len: usize, code: &'static str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new(code);
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > max_len {
        let mut err = ValidationError::new(code);
        err.message = Some(format!("Name must be at most {max_len} characters").into());
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new(code);
        err.message = Some("Name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a coordinate carried by a query string or socket frame is a
/// finite number. JSON bodies cannot encode NaN or infinities, but
/// percent-encoded forms can.
pub fn validate_finite(value: f32) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        let mut err = ValidationError::new("not_finite");
        err.message = Some("Coordinate must be a finite number".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_name_valid() {
        assert!(validate_player_name("Finn").is_ok());
        assert!(validate_player_name("salty dog 42").is_ok());
        assert!(validate_player_name(&"x".repeat(MAX_PLAYER_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_validate_player_name_invalid() {
        assert!(validate_player_name("").is_err()); // empty
        assert!(validate_player_name("   ").is_err()); // blank after trim
        assert!(validate_player_name(&"x".repeat(MAX_PLAYER_NAME_LEN + 1)).is_err()); // too long
        assert!(validate_player_name("fi\tnn").is_err()); // control character
    }

    #[test]
    fn test_validate_game_name_allows_longer_names() {
        let name = "x".repeat(MAX_GAME_NAME_LEN);
        assert!(validate_game_name(&name).is_ok());
        assert!(validate_player_name(&name).is_err());
    }

    #[test]
    fn test_validate_finite() {
        assert!(validate_finite(0.0).is_ok());
        assert!(validate_finite(-12.5).is_ok());
        assert!(validate_finite(f32::NAN).is_err());
        assert!(validate_finite(f32::INFINITY).is_err());
    }
}
