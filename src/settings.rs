use crate::types::Emotion;
use serde::{Deserialize, Serialize};
use std::env;

/// Recognized shape of the voice preferences blob. Bump when a field is
/// added or renamed so the backend can tell stale clients apart.
pub const VOICE_SETTINGS_VERSION: u32 = 1;

pub const MIN_VOLUME: f32 = 0.0;
pub const MAX_VOLUME: f32 = 1.0;
pub const MIN_PLAYBACK_RATE: f32 = 0.5;
pub const MAX_PLAYBACK_RATE: f32 = 2.0;

/// Client-side voice preferences, serialized into every stream and
/// synthesis request. The field set is closed and versioned; values are
/// clamped before serialization rather than trusted from UI state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSettings {
    #[serde(default = "current_settings_version")]
    pub version: u32,
    pub volume: f32,
    pub playback_rate: f32,
    pub auto_play: bool,
    pub voice_enabled: bool,
    pub emotional_tone: Emotion,
}

fn current_settings_version() -> u32 {
    VOICE_SETTINGS_VERSION
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            version: VOICE_SETTINGS_VERSION,
            volume: 0.8,
            playback_rate: 1.0,
            auto_play: false,
            voice_enabled: true,
            emotional_tone: Emotion::Warm,
        }
    }
}

impl VoiceSettings {
    /// Clamp every numeric field into its documented range and pin the
    /// version. Call before putting the struct on the wire.
    pub fn validated(mut self) -> Self {
        self.version = VOICE_SETTINGS_VERSION;
        self.volume = self.volume.clamp(MIN_VOLUME, MAX_VOLUME);
        self.playback_rate = self.playback_rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
        if !self.volume.is_finite() {
            self.volume = MAX_VOLUME;
        }
        if !self.playback_rate.is_finite() {
            self.playback_rate = 1.0;
        }
        self
    }
}

/// Which echo this install talks to. Configured via environment so the same
/// build serves different personas.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EchoProfile {
    /// Display name of the person the echo is modeled on, if any.
    pub persona_name: Option<String>,
    /// Voice-clone profile id for synthesis requests.
    pub voice_id: Option<String>,
}

impl EchoProfile {
    pub fn from_env() -> Self {
        Self {
            persona_name: env::var("ECHO_PERSONA_NAME").ok().filter(|s| !s.is_empty()),
            voice_id: env::var("ECHO_VOICE_ID").ok().filter(|s| !s.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_range() {
        let settings = VoiceSettings::default().validated();
        assert_eq!(settings, VoiceSettings::default());
    }

    #[test]
    fn validation_clamps_out_of_range_values() {
        let settings = VoiceSettings {
            volume: 3.5,
            playback_rate: 0.1,
            ..VoiceSettings::default()
        }
        .validated();
        assert_eq!(settings.volume, MAX_VOLUME);
        assert_eq!(settings.playback_rate, MIN_PLAYBACK_RATE);
    }

    #[test]
    fn validation_replaces_non_finite_values() {
        let settings = VoiceSettings {
            volume: f32::NAN,
            playback_rate: f32::INFINITY,
            ..VoiceSettings::default()
        }
        .validated();
        assert!(settings.volume.is_finite());
        assert!(settings.playback_rate.is_finite());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(VoiceSettings::default()).unwrap();
        assert!(json.get("playbackRate").is_some());
        assert!(json.get("voiceEnabled").is_some());
        assert_eq!(json["emotionalTone"], "warm");
    }
}
