//! Player preferences
//!
//! Held in memory for the lifetime of the page. A host can hand them over
//! as JSON at startup.

use serde::{Deserialize, Serialize};

use crate::tuning::ConfigError;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Camera ===
    /// Multiplier on drag-to-orbit speed
    pub drag_sensitivity: f32,
    /// Dragging up lowers the camera instead of raising it
    pub invert_pitch: bool,

    // === HUD ===
    pub show_fps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            mute_on_blur: true,

            drag_sensitivity: 1.0,
            invert_pitch: false,

            show_fps: false,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut settings: Settings = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Pull out-of-range values back into range
    pub fn sanitize(&mut self) {
        let unit = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 1.0 };
        self.master_volume = unit(self.master_volume);
        self.sfx_volume = unit(self.sfx_volume);
        self.drag_sensitivity = if self.drag_sensitivity.is_finite() {
            self.drag_sensitivity.clamp(0.1, 5.0)
        } else {
            1.0
        };
    }

    /// Gain applied to sound effects
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Gain for sound effects given whether the page has focus
    pub fn sfx_volume_when(&self, focused: bool) -> f32 {
        if !focused && self.mute_on_blur {
            0.0
        } else {
            self.effective_sfx_volume()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_silences_effects() {
        let mut settings = Settings::default();
        assert!((settings.effective_sfx_volume() - 0.8).abs() < 1e-6);
        settings.muted = true;
        assert_eq!(settings.effective_sfx_volume(), 0.0);
    }

    #[test]
    fn test_blur_mutes_only_when_enabled() {
        let mut settings = Settings::default();
        assert_eq!(settings.sfx_volume_when(false), 0.0);
        assert!((settings.sfx_volume_when(true) - 0.8).abs() < 1e-6);

        settings.mute_on_blur = false;
        assert!((settings.sfx_volume_when(false) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_from_json_fills_defaults_and_clamps() {
        let settings = Settings::from_json(r#"{"sfx_volume": 3.0, "drag_sensitivity": 0.0, "invert_pitch": true}"#).unwrap();
        assert_eq!(settings.sfx_volume, 1.0);
        assert_eq!(settings.drag_sensitivity, 0.1);
        assert!(settings.invert_pitch);
        assert_eq!(settings.master_volume, 0.8);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(Settings::from_json("{"), Err(ConfigError::Parse(_))));
    }
}
