use super::client::{EchoBackend, EchoError, EchoResult};
use crate::settings::{EchoProfile, VoiceSettings};
use bytes::Bytes;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// How much of the text participates in the synthesis cache key. Long
/// messages differ early or not at all in practice.
const CACHE_KEY_PREFIX_CHARS: usize = 64;

/// Result of a successful synthesis call, attached to the message it was
/// requested for.
#[derive(Clone, Debug, PartialEq)]
pub struct Synthesis {
    pub audio_url: String,
    pub quality: Option<String>,
    pub generation_time: Option<f32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_id: Option<&'a str>,
    emotional_tone: crate::types::Emotion,
    settings: &'a VoiceSettings,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    audio_url: Option<String>,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    generation_time: Option<f32>,
    #[serde(default)]
    error: Option<String>,
}

// Re-synthesizing identical text within a session is pure waste; the cache
// is an optimization only and never consulted across voice ids.
static SYNTHESIS_CACHE: Lazy<Mutex<HashMap<(String, String), Synthesis>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn cache_key(voice_id: Option<&str>, text: &str) -> (String, String) {
    let prefix: String = text.chars().take(CACHE_KEY_PREFIX_CHARS).collect();
    (voice_id.unwrap_or_default().to_string(), prefix)
}

/// Request synthesized speech for a finalized assistant message.
///
/// Callers gate on `voice_enabled` themselves; this function only rejects
/// empty text. One network call per message, modulo the in-session cache.
pub async fn synthesize(
    backend: &EchoBackend,
    profile: &EchoProfile,
    settings: &VoiceSettings,
    text: &str,
) -> EchoResult<Synthesis> {
    if text.trim().is_empty() {
        return Err(EchoError::other("nothing to synthesize"));
    }

    let key = cache_key(profile.voice_id.as_deref(), text);
    if let Some(hit) = SYNTHESIS_CACHE
        .lock()
        .expect("synthesis cache poisoned")
        .get(&key)
    {
        return Ok(hit.clone());
    }

    let settings = settings.clone().validated();
    let response = backend
        .post("/api/voice/synthesize")
        .json(&SynthesisRequest {
            text,
            voice_id: profile.voice_id.as_deref(),
            emotional_tone: settings.emotional_tone,
            settings: &settings,
        })
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(EchoError::Backend { status, body });
    }

    let synthesis = parse_synthesis_body(&body)?;
    SYNTHESIS_CACHE
        .lock()
        .expect("synthesis cache poisoned")
        .insert(key, synthesis.clone());
    Ok(synthesis)
}

fn parse_synthesis_body(body: &str) -> EchoResult<Synthesis> {
    let parsed: SynthesisResponse = serde_json::from_str(body)?;
    match (parsed.success, parsed.audio_url) {
        (true, Some(audio_url)) => Ok(Synthesis {
            audio_url,
            quality: parsed.quality,
            generation_time: parsed.generation_time,
        }),
        _ => Err(EchoError::other(
            parsed
                .error
                .unwrap_or_else(|| "synthesis did not produce audio".to_string()),
        )),
    }
}

/// Gentle copy for a failed synthesis, persona-aware. The wording stays far
/// away from anything that reads like a stack trace.
pub fn voice_unavailable_copy(persona: Option<&str>, text: &str) -> String {
    let variant = text.len() % 2;
    match (persona, variant) {
        (Some(name), 0) => {
            format!("{name}'s voice needs a short rest right now. The words are still here for you.")
        }
        (Some(name), _) => {
            format!("I couldn't bring {name}'s voice through this time. Reading together still counts.")
        }
        (None, 0) => "The voice needs a short rest right now. The words are still here for you."
            .to_string(),
        (None, _) => {
            "I couldn't bring the voice through this time. The message is still here to read."
                .to_string()
        }
    }
}

// ============================================
// Audio fetch + on-disk cache
// ============================================

fn audio_cache_dir() -> PathBuf {
    if let Some(cache_dir) = dirs::cache_dir() {
        return cache_dir.join("ai-echo").join("audio");
    }
    PathBuf::from("cache").join("audio")
}

/// Sanitize a URL for filesystem use.
fn sanitize_cache_name(url: &str) -> String {
    url.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .rev()
        .take(96)
        .collect::<String>()
        .chars()
        .rev()
        .collect()
}

/// Fetch synthesized audio, serving repeats from the local cache directory
/// so replaying a message never re-downloads it.
pub async fn fetch_audio(backend: &EchoBackend, audio_url: &str) -> EchoResult<Bytes> {
    let cache_path = audio_cache_dir().join(sanitize_cache_name(audio_url));
    if let Ok(cached) = tokio::fs::read(&cache_path).await {
        return Ok(Bytes::from(cached));
    }

    let response = backend.get(audio_url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EchoError::Backend { status, body });
    }
    let data = response.bytes().await?;

    if let Err(err) = write_cache_file(&cache_path, &data).await {
        tracing::debug!("audio cache write skipped: {err}");
    }
    Ok(data)
}

async fn write_cache_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data).await
}

// ============================================
// Recording upload
// ============================================

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Upload one recorded training passage for the voice clone.
pub async fn upload_recording(
    backend: &EchoBackend,
    path: &Path,
    passage: Option<&str>,
) -> EchoResult<()> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|err| EchoError::other(format!("could not read recording: {err}")))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("recording.wav")
        .to_string();

    let part = reqwest::multipart::Part::bytes(data)
        .file_name(file_name)
        .mime_str("audio/wav")?;
    let mut form = reqwest::multipart::Form::new().part("audio", part);
    if let Some(passage) = passage {
        form = form.text("passage", passage.to_string());
    }

    let response = backend
        .post("/api/voice/upload")
        .multipart(form)
        .send()
        .await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(EchoError::Backend { status, body });
    }

    let parsed: UploadResponse = serde_json::from_str(&body).unwrap_or(UploadResponse {
        success: status.is_success(),
        error: None,
    });
    if parsed.success {
        Ok(())
    } else {
        Err(EchoError::other(
            parsed
                .error
                .unwrap_or_else(|| "upload was not accepted".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_successful_synthesis() {
        let body = r#"{"success":true,"audioUrl":"/audio/ai_1.mp3","quality":"high","generationTime":1.8}"#;
        let synthesis = parse_synthesis_body(body).unwrap();
        assert_eq!(synthesis.audio_url, "/audio/ai_1.mp3");
        assert_eq!(synthesis.quality.as_deref(), Some("high"));
    }

    #[test]
    fn unsuccessful_synthesis_is_an_error() {
        assert!(parse_synthesis_body(r#"{"success":false,"error":"voice model cold"}"#).is_err());
        assert!(parse_synthesis_body(r#"{"success":true}"#).is_err());
    }

    #[test]
    fn cache_key_truncates_long_text() {
        let long = "a".repeat(500);
        let (voice, prefix) = cache_key(Some("voice_7"), &long);
        assert_eq!(voice, "voice_7");
        assert_eq!(prefix.chars().count(), CACHE_KEY_PREFIX_CHARS);
        assert_eq!(cache_key(None, "hi").0, "");
    }

    #[test]
    fn fallback_copy_names_the_persona() {
        let with_name = voice_unavailable_copy(Some("June"), "hello there");
        assert!(with_name.contains("June"));
        let without = voice_unavailable_copy(None, "hello there");
        assert!(!without.contains("June"));
    }

    #[test]
    fn cache_names_are_filesystem_safe() {
        let name = sanitize_cache_name("https://cdn.echo/audio/ai 1.mp3?sig=a/b");
        assert!(!name.contains('/'));
        assert!(!name.contains('?'));
        assert!(!name.contains(' '));
        assert!(name.ends_with("sig_a_b"));
    }
}
