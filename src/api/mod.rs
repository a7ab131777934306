/// Echo backend client
///
/// Everything in this module is an HTTP client of the AI Echo backend; the
/// client owns no wire format of its own.
///
/// # Architecture
///
/// - `client` - backend configuration and session endpoints
/// - `stream` - streaming chat turns (`/api/ai-echo/stream`) with a pollable
///   in-process registry bridging the reader task into the UI
/// - `voice` - speech synthesis, audio fetch/cache, recording upload
/// - `training` - read-only training progress
///
/// # Usage
///
/// ```rust,no_run
/// use ai_echo::api::EchoBackend;
///
/// # async fn example() -> anyhow::Result<()> {
/// let backend = EchoBackend::from_env()?;
/// let sessions = backend.list_sessions().await?;
/// # Ok(())
/// # }
/// ```
mod client;
mod stream;
mod training;
mod voice;

pub use client::{EchoBackend, EchoError, EchoResult, SessionDetail};
pub use stream::{
    FinalTurn, StreamEvent, StreamSnapshot, TurnRequest, cancel_inflight_streams,
    parse_stream_line, stream_turn_discard, stream_turn_poll, stream_turn_start,
};
pub use training::{TrainingJob, TrainingKind, training_status};
pub use voice::{
    Synthesis, fetch_audio, synthesize, upload_recording, voice_unavailable_copy,
};
