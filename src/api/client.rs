use crate::types::{ChatMessage, ChatSession};
use serde::Deserialize;
use std::env;

const DEFAULT_API_BASE: &str = "http://127.0.0.1:3000";

#[derive(Debug, thiserror::Error)]
pub enum EchoError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("backend error {status}: {body}")]
    Backend {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("{0}")]
    Other(String),
}

impl EchoError {
    pub fn other(message: impl Into<String>) -> Self {
        EchoError::Other(message.into())
    }
}

pub type EchoResult<T> = Result<T, EchoError>;

/// Configured handle to the Echo backend. Cheap to clone; every request
/// path hangs off the same base URL and optional bearer key.
#[derive(Clone)]
pub struct EchoBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl Default for EchoBackend {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE.to_string(), None)
    }
}

impl EchoBackend {
    /// Read `ECHO_API_BASE` / `ECHO_API_KEY` from the environment, falling
    /// back to the local development backend when neither is set.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = env::var("ECHO_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            anyhow::bail!("ECHO_API_BASE must be an http(s) URL, got '{base_url}'");
        }
        Ok(Self::new(base_url, env::var("ECHO_API_KEY").ok()))
    }

    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(self.url(path)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    pub async fn list_sessions(&self) -> EchoResult<Vec<ChatSession>> {
        let response = self.get("/api/ai-echo/sessions").send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(EchoError::Backend { status, body });
        }
        parse_session_list(&body)
    }

    pub async fn create_session(&self, title: Option<&str>) -> EchoResult<ChatSession> {
        #[derive(serde::Serialize)]
        struct CreateSessionRequest<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            title: Option<&'a str>,
        }

        let response = self
            .post("/api/ai-echo/sessions")
            .json(&CreateSessionRequest { title })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(EchoError::Backend { status, body });
        }
        // Either the bare session or a { session } wrapper.
        if let Ok(session) = serde_json::from_str::<ChatSession>(&body) {
            return Ok(session);
        }
        let wrapped: SessionWrapper = serde_json::from_str(&body)?;
        Ok(wrapped.session)
    }

    /// Load the full message history for one session. The message order is
    /// the backend's; callers must not reorder it.
    pub async fn load_session(&self, id: &str) -> EchoResult<SessionDetail> {
        let response = self
            .get(&format!("/api/ai-echo/sessions/{id}"))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(EchoError::Backend { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Deserialize)]
struct SessionWrapper {
    session: ChatSession,
}

#[derive(Deserialize)]
struct SessionListWrapper {
    sessions: Vec<ChatSession>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub session: ChatSession,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

fn parse_session_list(body: &str) -> EchoResult<Vec<ChatSession>> {
    if let Ok(list) = serde_json::from_str::<Vec<ChatSession>>(body) {
        return Ok(list);
    }
    let wrapped: SessionListWrapper = serde_json::from_str(body)?;
    Ok(wrapped.sessions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_relative_paths_against_base() {
        let backend = EchoBackend::new("https://echo.example/".to_string(), None);
        assert_eq!(
            backend.url("/api/ai-echo/sessions"),
            "https://echo.example/api/ai-echo/sessions"
        );
        assert_eq!(backend.url("https://cdn/a.mp3"), "https://cdn/a.mp3");
    }

    #[test]
    fn parses_bare_and_wrapped_session_lists() {
        let bare = r#"[{"id":"s1","title":"First"}]"#;
        let wrapped = r#"{"sessions":[{"id":"s1","title":"First"},{"id":"s2"}]}"#;
        assert_eq!(parse_session_list(bare).unwrap().len(), 1);
        assert_eq!(parse_session_list(wrapped).unwrap().len(), 2);
    }

    #[test]
    fn session_detail_preserves_message_order() {
        let body = r#"{
            "session": {"id":"s1","title":"Sunday","messageCount":2},
            "messages": [
                {"id":"user_1","role":"user","content":"hi"},
                {"id":"ai_2","role":"assistant","content":"hello"}
            ]
        }"#;
        let detail: SessionDetail = serde_json::from_str(body).unwrap();
        assert_eq!(detail.messages.len(), 2);
        assert_eq!(detail.messages[0].id, "user_1");
        assert_eq!(detail.messages[1].id, "ai_2");
    }
}
