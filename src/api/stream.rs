use super::client::{EchoBackend, EchoError, EchoResult};
use crate::settings::VoiceSettings;
use crate::types::TurnMetadata;
use futures_util::StreamExt;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================
// Wire events
// ============================================

/// One `data:` line of the chat stream.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    Chunk {
        content: String,
    },
    Complete {
        response: String,
        #[serde(default)]
        metadata: TurnMetadata,
    },
    SessionCreated {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
}

/// Parse one line of the stream body. Lines without the `data:` prefix are
/// protocol noise (keep-alives, blanks) and yield nothing; a malformed JSON
/// payload is logged and skipped rather than killing the read loop.
pub fn parse_stream_line(line: &str) -> Option<StreamEvent> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    match serde_json::from_str::<StreamEvent>(data) {
        Ok(event) => Some(event),
        Err(err) => {
            tracing::warn!("skipping malformed stream line: {err}");
            None
        }
    }
}

/// Body of a streaming turn request. Voice settings ride along on every
/// request; the backend never holds client preferences.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub settings: VoiceSettings,
}

// ============================================
// Streaming State Management
// ============================================

static STREAM_STORE: Lazy<StreamStore> = Lazy::new(StreamStore::default);

pub(crate) struct StreamStore {
    counter: AtomicU64,
    entries: Mutex<HashMap<u64, StreamEntry>>,
}

impl Default for StreamStore {
    fn default() -> Self {
        Self {
            counter: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[derive(Default)]
struct StreamEntry {
    buffer: String,
    done: bool,
    failed: bool,
    cancelled: bool,
    final_turn: Option<FinalTurn>,
    session_id: Option<String>,
}

/// Authoritative result of a completed turn. `response` supersedes the
/// locally accumulated chunk text.
#[derive(Clone, Debug, PartialEq)]
pub struct FinalTurn {
    pub response: String,
    pub metadata: TurnMetadata,
}

/// Point-in-time view of one stream, as the UI polls it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreamSnapshot {
    /// Concatenation of every chunk received so far, cleared on completion.
    pub text: String,
    pub done: bool,
    pub failed: bool,
    pub cancelled: bool,
    pub final_turn: Option<FinalTurn>,
    pub session_id: Option<String>,
}

impl StreamStore {
    /// Register a new stream. Any stream still in flight is cancelled first:
    /// one active assistant turn per session, always.
    pub(crate) fn begin(&self) -> u64 {
        let id = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock().expect("stream store poisoned");
        for entry in entries.values_mut() {
            if !entry.done {
                entry.cancelled = true;
            }
        }
        entries.insert(id, StreamEntry::default());
        id
    }

    pub(crate) fn append(&self, id: u64, piece: &str) {
        let mut entries = self.entries.lock().expect("stream store poisoned");
        if let Some(entry) = entries.get_mut(&id) {
            entry.buffer.push_str(piece);
        }
    }

    pub(crate) fn complete(&self, id: u64, turn: FinalTurn) {
        let mut entries = self.entries.lock().expect("stream store poisoned");
        if let Some(entry) = entries.get_mut(&id) {
            entry.buffer.clear();
            entry.final_turn = Some(turn);
            entry.done = true;
        }
    }

    pub(crate) fn fail(&self, id: u64) {
        let mut entries = self.entries.lock().expect("stream store poisoned");
        if let Some(entry) = entries.get_mut(&id) {
            entry.failed = true;
            entry.done = true;
        }
    }

    pub(crate) fn announce_session(&self, id: u64, session_id: String) {
        let mut entries = self.entries.lock().expect("stream store poisoned");
        if let Some(entry) = entries.get_mut(&id) {
            entry.session_id = Some(session_id);
        }
    }

    pub(crate) fn cancel_inflight(&self) {
        let mut entries = self.entries.lock().expect("stream store poisoned");
        for entry in entries.values_mut() {
            if !entry.done {
                entry.cancelled = true;
            }
        }
    }

    pub(crate) fn is_cancelled(&self, id: u64) -> bool {
        let entries = self.entries.lock().expect("stream store poisoned");
        entries.get(&id).map(|entry| entry.cancelled).unwrap_or(true)
    }

    pub(crate) fn snapshot(&self, id: u64) -> EchoResult<StreamSnapshot> {
        let entries = self.entries.lock().expect("stream store poisoned");
        match entries.get(&id) {
            Some(entry) => Ok(StreamSnapshot {
                text: entry.buffer.clone(),
                done: entry.done,
                failed: entry.failed,
                cancelled: entry.cancelled,
                final_turn: entry.final_turn.clone(),
                session_id: entry.session_id.clone(),
            }),
            None => Err(EchoError::other("invalid stream id")),
        }
    }

    pub(crate) fn discard(&self, id: u64) {
        let mut entries = self.entries.lock().expect("stream store poisoned");
        entries.remove(&id);
    }
}

#[derive(Clone)]
struct StreamHandle {
    id: u64,
}

impl StreamHandle {
    fn append(&self, piece: &str) {
        STREAM_STORE.append(self.id, piece);
    }

    fn complete(&self, turn: FinalTurn) {
        STREAM_STORE.complete(self.id, turn);
    }

    fn fail(&self) {
        STREAM_STORE.fail(self.id);
    }

    fn announce_session(&self, session_id: String) {
        STREAM_STORE.announce_session(self.id, session_id);
    }

    fn is_cancelled(&self) -> bool {
        STREAM_STORE.is_cancelled(self.id)
    }
}

// ============================================
// Public API Functions
// ============================================

/// Start a streaming turn. Cancels any turn still in flight, spawns the
/// reader task, and returns the id to poll.
pub fn stream_turn_start(backend: EchoBackend, request: TurnRequest) -> u64 {
    let id = STREAM_STORE.begin();
    let handle = StreamHandle { id };

    tokio::spawn(async move {
        if let Err(err) = run_stream(backend, request, handle.clone()).await {
            tracing::warn!("echo stream failed: {err}");
            handle.fail();
        }
    });

    id
}

/// Poll streaming turn status.
pub fn stream_turn_poll(id: u64) -> EchoResult<StreamSnapshot> {
    STREAM_STORE.snapshot(id)
}

/// Drop a finished stream's registry entry.
pub fn stream_turn_discard(id: u64) {
    STREAM_STORE.discard(id);
}

/// Cancel every stream still in flight (used when the conversation resets).
pub fn cancel_inflight_streams() {
    STREAM_STORE.cancel_inflight();
}

async fn run_stream(
    backend: EchoBackend,
    request: TurnRequest,
    handle: StreamHandle,
) -> EchoResult<()> {
    let request = TurnRequest {
        message: request.message,
        session_id: request.session_id,
        settings: request.settings.validated(),
    };
    let response = backend
        .post("/api/ai-echo/stream")
        .header("accept", "text/event-stream")
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EchoError::Backend { status, body });
    }

    let mut buffer = String::new();
    let mut stream = response.bytes_stream();
    while let Some(item) = stream.next().await {
        if handle.is_cancelled() {
            return Ok(());
        }
        let bytes = item.map_err(EchoError::from)?;
        buffer.push_str(&String::from_utf8_lossy(&bytes));
        while let Some(pos) = buffer.find('\n') {
            let mut line = buffer[..pos].to_string();
            if line.ends_with('\r') {
                line.pop();
            }
            buffer = buffer[pos + 1..].to_string();

            match parse_stream_line(&line) {
                Some(StreamEvent::Chunk { content }) => {
                    if !content.is_empty() {
                        handle.append(&content);
                    }
                }
                Some(StreamEvent::Complete { response, metadata }) => {
                    handle.complete(FinalTurn { response, metadata });
                    return Ok(());
                }
                Some(StreamEvent::SessionCreated { session_id }) => {
                    handle.announce_session(session_id);
                }
                None => {}
            }
        }
    }

    // The body ended without a terminal event; treat it like a dropped
    // connection so the caller surfaces the canned reply.
    Err(EchoError::other("stream ended before completion"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stream_events() {
        assert_eq!(parse_stream_line("retry: 500"), None);
        assert_eq!(parse_stream_line("data: "), None);
        assert_eq!(parse_stream_line("data: {not json"), None);
        assert_eq!(
            parse_stream_line(r#"data: {"event":"chunk","content":"Hel"}"#),
            Some(StreamEvent::Chunk {
                content: "Hel".into()
            })
        );
        assert_eq!(
            parse_stream_line(r#"data: {"event":"session_created","sessionId":"sess_9"}"#),
            Some(StreamEvent::SessionCreated {
                session_id: "sess_9".into()
            })
        );
    }

    #[test]
    fn complete_event_carries_metadata() {
        let line = r#"data: {"event":"complete","response":"Hello there","metadata":{"confidence":0.92,"source":"echo-v2","modelVersion":"2024.11"}}"#;
        match parse_stream_line(line) {
            Some(StreamEvent::Complete { response, metadata }) => {
                assert_eq!(response, "Hello there");
                assert_eq!(metadata.confidence, Some(0.92));
                assert_eq!(metadata.model_version.as_deref(), Some("2024.11"));
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn buffer_accumulates_in_arrival_order_and_clears_on_complete() {
        let store = StreamStore::default();
        let id = store.begin();
        store.append(id, "Hel");
        store.append(id, "lo");
        assert_eq!(store.snapshot(id).unwrap().text, "Hello");

        store.complete(
            id,
            FinalTurn {
                response: "Hello there".into(),
                metadata: TurnMetadata::default(),
            },
        );
        let snapshot = store.snapshot(id).unwrap();
        assert!(snapshot.done);
        assert!(snapshot.text.is_empty());
        assert_eq!(snapshot.final_turn.unwrap().response, "Hello there");
    }

    #[test]
    fn starting_a_new_stream_cancels_the_old_reader() {
        let store = StreamStore::default();
        let first = store.begin();
        store.append(first, "partial");
        let second = store.begin();

        assert!(store.is_cancelled(first));
        assert!(!store.is_cancelled(second));
        assert!(store.snapshot(first).unwrap().cancelled);
    }

    #[test]
    fn completed_streams_survive_a_new_begin() {
        let store = StreamStore::default();
        let first = store.begin();
        store.complete(
            first,
            FinalTurn {
                response: "done".into(),
                metadata: TurnMetadata::default(),
            },
        );
        store.begin();
        assert!(!store.is_cancelled(first));
    }

    #[test]
    fn unknown_ids_poll_as_cancelled_errors() {
        let store = StreamStore::default();
        assert!(store.is_cancelled(404));
        assert!(store.snapshot(404).is_err());
    }
}
