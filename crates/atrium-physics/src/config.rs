//! Character movement tuning

use atrium_core::{AtriumError, Result};
use serde::Deserialize;

/// Movement constants for the kinematic character.
///
/// Loadable from TOML so tuning passes don't require a rebuild; absent
/// fields keep their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CharacterTuning {
    /// Grounded speed, units per second
    pub walk_speed: f32,
    /// Grounded speed while sprinting
    pub run_speed: f32,
    /// Vertical impulse added on a grounded jump
    pub jump_speed: f32,
    /// Facing slerp rate, radians-ish per second
    pub rotation_speed: f32,
    /// Horizontal deceleration while airborne (negative)
    pub friction: f32,
    /// Vertical acceleration (negative; applied doubled, matching the
    /// tuned fall feel)
    pub gravity: f32,
    /// Character controller skin offset
    pub controller_offset: f32,
}

impl Default for CharacterTuning {
    fn default() -> Self {
        Self {
            walk_speed: 8.0,
            run_speed: 20.0,
            jump_speed: 4.0,
            rotation_speed: 8.0,
            friction: -8.0,
            gravity: -9.81,
            controller_offset: 0.01,
        }
    }
}

impl CharacterTuning {
    /// Parse tuning overrides from a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AtriumError::ConfigParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let tuning = CharacterTuning::default();
        assert_eq!(tuning.walk_speed, 8.0);
        assert_eq!(tuning.run_speed, 20.0);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let tuning = CharacterTuning::from_toml_str("walk_speed = 4.5\njump_speed = 6.0").unwrap();
        assert_eq!(tuning.walk_speed, 4.5);
        assert_eq!(tuning.jump_speed, 6.0);
        assert_eq!(tuning.run_speed, 20.0);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        assert!(matches!(
            CharacterTuning::from_toml_str("walk_speed = \"fast\""),
            Err(AtriumError::ConfigParseError(_))
        ));
    }
}
