use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Cosmetic emotional register of an assistant message. Derived client-side
/// by keyword matching and used only to pick a style bucket and icon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Loving,
    Reflective,
    Wise,
    Comforting,
    #[default]
    Warm,
}

impl Emotion {
    pub fn css_class(self) -> &'static str {
        match self {
            Emotion::Loving => "emotion-loving",
            Emotion::Reflective => "emotion-reflective",
            Emotion::Wise => "emotion-wise",
            Emotion::Comforting => "emotion-comforting",
            Emotion::Warm => "emotion-warm",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Emotion::Loving => "\u{2764}",
            Emotion::Reflective => "\u{1F4AD}",
            Emotion::Wise => "\u{1F4D6}",
            Emotion::Comforting => "\u{1F54A}",
            Emotion::Warm => "\u{2600}",
        }
    }
}

/// Provenance metadata reported by the backend with a completed turn.
/// Display-only; never drives a control decision.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Opaque, unique within a session: `user_<ts>`, `ai_<ts>`, or the
    /// literal placeholders `welcome` / `streaming`.
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Unix milliseconds.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    // Voice sub-state, populated asynchronously after text completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip)]
    pub audio_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<f32>,
    // UI-only flags.
    #[serde(skip)]
    pub is_playing: bool,
    #[serde(skip)]
    pub is_favorite: bool,
    #[serde(default)]
    pub emotion: Emotion,
}

impl ChatMessage {
    pub fn new(id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            timestamp: now_ms(),
            confidence: None,
            source: None,
            model_version: None,
            audio_url: None,
            audio_loading: false,
            voice_error: None,
            voice_quality: None,
            generation_time: None,
            is_playing: false,
            is_favorite: false,
            emotion: Emotion::default(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        let ts = now_ms();
        Self::new(format!("user_{ts}"), Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        let ts = now_ms();
        Self::new(format!("ai_{ts}"), Role::Assistant, content)
    }
}

/// Denormalized conversation summary; the full history lives server-side and
/// is loaded wholesale when the user selects a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub message_count: usize,
    #[serde(default)]
    pub preview: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeMode {
    Dusk,
    Light,
    Ember,
}

pub fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
