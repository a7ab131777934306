use crate::emotion::detect_message_emotion;
use crate::types::{ChatMessage, ChatSession, Role, TurnMetadata};

pub const WELCOME_ID: &str = "welcome";
pub const STREAMING_ID: &str = "streaming";

// Failure copy stays gentle on purpose; these read as the echo speaking, not
// as a network diagnostic.
const ERROR_REPLIES: &[&str] = &[
    "I'm having a little trouble finding my words right now. Could you give me a moment and try again?",
    "Something interrupted me mid-thought. I'm still here - let's try that once more.",
];

fn welcome_copy(persona: Option<&str>) -> String {
    match persona {
        Some(name) => format!(
            "Hello. I'm an echo of {name}. I'm here whenever you want to talk, remember, or just sit together for a while."
        ),
        None => "Hello. I'm your echo. Ask me anything, or just tell me about your day.".to_string(),
    }
}

/// Ordered, exclusively-owned list of chat messages for one conversation.
///
/// All mutation goes through these operations; in particular the
/// one-message-playing invariant is enforced here rather than on the
/// `ChatMessage` struct itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageStore {
    messages: Vec<ChatMessage>,
    /// Session this conversation belongs to, once the backend has named one.
    session_id: Option<String>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh conversation seeded with the welcome placeholder.
    pub fn with_welcome(persona: Option<&str>) -> Self {
        let mut welcome = ChatMessage::new(WELCOME_ID, Role::Assistant, welcome_copy(persona));
        welcome.emotion = detect_message_emotion(&welcome.content);
        Self {
            messages: vec![welcome],
            session_id: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|msg| msg.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|msg| msg.id == id)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn set_session_id(&mut self, id: String) {
        self.session_id = Some(id);
    }

    /// Append a user message. Whitespace-only input is rejected so an empty
    /// send never reaches the wire.
    pub fn push_user(&mut self, content: &str) -> Option<String> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }
        let msg = ChatMessage::user(trimmed);
        let id = msg.id.clone();
        self.messages.push(msg);
        Some(id)
    }

    /// True while a streaming placeholder is live.
    pub fn is_streaming(&self) -> bool {
        self.messages.iter().any(|msg| msg.id == STREAMING_ID)
    }

    /// Insert the streaming placeholder for the assistant turn in flight.
    pub fn begin_streaming(&mut self) {
        if self.is_streaming() {
            return;
        }
        self.messages
            .push(ChatMessage::new(STREAMING_ID, Role::Assistant, ""));
    }

    /// Republish the accumulated stream text into the placeholder.
    pub fn set_streaming_text(&mut self, text: &str) {
        if let Some(msg) = self.get_mut(STREAMING_ID) {
            msg.content = text.to_string();
        }
    }

    /// Replace the placeholder with the finalized assistant turn. `response`
    /// is the backend's authoritative text, which wins over whatever was
    /// accumulated locally. Returns the new message id.
    pub fn finalize_streaming(&mut self, response: String, metadata: TurnMetadata) -> Option<String> {
        let index = self.messages.iter().position(|msg| msg.id == STREAMING_ID)?;
        let mut msg = ChatMessage::assistant(response);
        msg.emotion = detect_message_emotion(&msg.content);
        msg.confidence = metadata.confidence;
        msg.source = metadata.source;
        msg.model_version = metadata.model_version;
        let id = msg.id.clone();
        self.messages[index] = msg;
        Some(id)
    }

    /// Replace the placeholder with a single canned empathetic reply,
    /// marked `source == "error"` so the UI can style it differently.
    pub fn fail_streaming(&mut self) -> Option<String> {
        let index = self.messages.iter().position(|msg| msg.id == STREAMING_ID)?;
        let copy = ERROR_REPLIES[index % ERROR_REPLIES.len()];
        let mut msg = ChatMessage::assistant(copy);
        msg.source = Some("error".to_string());
        msg.emotion = detect_message_emotion(&msg.content);
        let id = msg.id.clone();
        self.messages[index] = msg;
        Some(id)
    }

    pub fn set_audio_loading(&mut self, id: &str, loading: bool) {
        if let Some(msg) = self.get_mut(id) {
            msg.audio_loading = loading;
        }
    }

    /// Attach a successful synthesis result to the message it was made for.
    pub fn attach_audio(&mut self, id: &str, url: String, quality: Option<String>, generation_time: Option<f32>) {
        if let Some(msg) = self.get_mut(id) {
            msg.audio_url = Some(url);
            msg.voice_quality = quality;
            msg.generation_time = generation_time;
            msg.voice_error = None;
            msg.audio_loading = false;
        }
    }

    pub fn attach_voice_error(&mut self, id: &str, error: String) {
        if let Some(msg) = self.get_mut(id) {
            msg.voice_error = Some(error);
            msg.audio_url = None;
            msg.audio_loading = false;
        }
    }

    /// Record a playback problem without discarding the synthesized audio,
    /// so the user can try the same clip again.
    pub fn note_playback_error(&mut self, id: &str, error: String) {
        if let Some(msg) = self.get_mut(id) {
            msg.voice_error = Some(error);
            msg.is_playing = false;
        }
    }

    /// Mark one message as playing and every other message as not. Returns
    /// false when the id is unknown (flags are left untouched).
    pub fn mark_playing(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        for msg in &mut self.messages {
            msg.is_playing = msg.id == id;
        }
        true
    }

    pub fn clear_playing(&mut self) {
        for msg in &mut self.messages {
            msg.is_playing = false;
        }
    }

    pub fn playing_id(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|msg| msg.is_playing)
            .map(|msg| msg.id.as_str())
    }

    pub fn toggle_favorite(&mut self, id: &str) {
        if let Some(msg) = self.get_mut(id) {
            msg.is_favorite = !msg.is_favorite;
        }
    }

    /// Swap in a session loaded from the backend, preserving server order
    /// exactly. Emotions are (re)derived locally since they never persist.
    pub fn load_session(&mut self, session: &ChatSession, mut messages: Vec<ChatMessage>) {
        for msg in &mut messages {
            msg.is_playing = false;
            msg.audio_loading = false;
            if matches!(msg.role, Role::Assistant) {
                msg.emotion = detect_message_emotion(&msg.content);
            }
        }
        self.messages = messages;
        self.session_id = Some(session.id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_user_input() {
        let mut store = MessageStore::new();
        assert!(store.push_user("").is_none());
        assert!(store.push_user("   \n\t").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn finalize_uses_authoritative_response() {
        let mut store = MessageStore::new();
        store.push_user("hi");
        store.begin_streaming();
        store.set_streaming_text("Hel");
        store.set_streaming_text("Hello");
        let id = store
            .finalize_streaming("Hello there".to_string(), TurnMetadata::default())
            .unwrap();
        assert!(!store.is_streaming());
        let msg = store.get(&id).unwrap();
        assert_eq!(msg.content, "Hello there");
        assert!(msg.id.starts_with("ai_"));
    }

    #[test]
    fn fail_streaming_appends_one_error_reply() {
        let mut store = MessageStore::new();
        store.push_user("hi");
        store.begin_streaming();
        let id = store.fail_streaming().unwrap();
        assert!(!store.is_streaming());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&id).unwrap().source.as_deref(), Some("error"));
    }

    #[test]
    fn at_most_one_message_plays() {
        let mut store = MessageStore::new();
        store.push_user("q1");
        store.begin_streaming();
        let a = store
            .finalize_streaming("first".into(), TurnMetadata::default())
            .unwrap();
        store.begin_streaming();
        let b = store
            .finalize_streaming("second".into(), TurnMetadata::default())
            .unwrap();

        assert!(store.mark_playing(&a));
        assert!(store.mark_playing(&b));
        let playing: Vec<_> = store
            .messages()
            .iter()
            .filter(|msg| msg.is_playing)
            .collect();
        assert_eq!(playing.len(), 1);
        assert_eq!(playing[0].id, b);

        store.clear_playing();
        assert!(store.playing_id().is_none());
    }

    #[test]
    fn mark_playing_unknown_id_changes_nothing() {
        let mut store = MessageStore::with_welcome(None);
        store.mark_playing(WELCOME_ID);
        assert!(!store.mark_playing("ai_missing"));
        assert_eq!(store.playing_id(), Some(WELCOME_ID));
    }

    #[test]
    fn load_session_preserves_order() {
        let session = ChatSession {
            id: "sess_1".into(),
            title: "Sunday call".into(),
            created_at: 0,
            updated_at: 0,
            message_count: 3,
            preview: String::new(),
            settings: None,
        };
        let loaded = vec![
            ChatMessage::new("user_1", Role::User, "hello"),
            ChatMessage::new("ai_2", Role::Assistant, "hi, I remember you"),
            ChatMessage::new("user_3", Role::User, "good"),
        ];
        let mut store = MessageStore::with_welcome(Some("June"));
        store.load_session(&session, loaded.clone());
        assert_eq!(store.len(), loaded.len());
        let ids: Vec<_> = store.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["user_1", "ai_2", "user_3"]);
        assert_eq!(store.session_id(), Some("sess_1"));
    }

    #[test]
    fn audio_attachment_clears_loading_and_error() {
        let mut store = MessageStore::with_welcome(None);
        store.set_audio_loading(WELCOME_ID, true);
        store.attach_audio(
            WELCOME_ID,
            "https://cdn/welcome.mp3".into(),
            Some("high".into()),
            Some(1.2),
        );
        let msg = store.get(WELCOME_ID).unwrap();
        assert!(!msg.audio_loading);
        assert!(msg.voice_error.is_none());
        assert_eq!(msg.audio_url.as_deref(), Some("https://cdn/welcome.mp3"));
    }
}
