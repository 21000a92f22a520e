//! Core chat session management.
//!
//! This module provides the `ChatSession` handle, which owns the message log
//! of one conversation and talks to the `/chat` endpoint.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};

use crate::client::ApiClient;
use crate::config::SettingsHandle;
use crate::error::{Error, Result};
use crate::observability::{CHAT_FAILURES, CHAT_SENDS, CHAT_SENDS_REJECTED};
use crate::types::{ConversationId, Message, Mode};
use crate::utils::{self, Release, lock};

/// First assistant message of a new session.
pub const GREETING: &str = "Hello! I'm your AEM Compliance Assistant. How can I help you today?";

/// Assistant message that replaces the log after a clear.
pub const CLEARED_GREETING: &str = "Chat cleared. How can I help you?";

/// Body of a `/chat` request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    mode: Mode,
    model: &'a str,
    temperature: f32,
    conversation_id: ConversationId,
}

/// Body of a successful `/chat` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant's reply.
    #[serde(default)]
    pub message: String,
    /// Mode the backend thinks fits the request better, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_mode: Option<String>,
}

impl ChatResponse {
    /// Parses the suggested mode, ignoring values this client does not know.
    pub fn suggestion(&self) -> Option<Mode> {
        self.suggested_mode.as_deref()?.parse().ok()
    }
}

#[derive(Debug)]
struct ChatState {
    messages: Vec<Message>,
    busy: bool,
    requests: u64,
    failures: u64,
    /// Bumped by every clear; replies from an older epoch are dropped.
    epoch: u64,
}

/// Snapshot of session counters.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// Identifier sent with every request.
    pub conversation_id: ConversationId,
    /// Number of entries in the log, greeting included.
    pub message_count: usize,
    /// Whether a send is in flight.
    pub busy: bool,
    /// Requests issued to `/chat`.
    pub total_requests: u64,
    /// Requests that ended in an error message.
    pub failed_requests: u64,
}

/// A chat session that manages conversation state and API interactions.
///
/// Cloning yields another handle to the same conversation.  At most one send
/// is in flight per session; overlapping sends are rejected, so the log is a
/// linear sequence of user/assistant pairs in call order.
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: ApiClient,
    settings: SettingsHandle,
    conversation_id: ConversationId,
    state: Arc<Mutex<ChatState>>,
}

impl ChatSession {
    /// Creates a new chat session with a fresh conversation identifier.
    pub fn new(client: ApiClient, settings: SettingsHandle) -> Self {
        Self {
            client,
            settings,
            conversation_id: ConversationId::generate(),
            state: Arc::new(Mutex::new(ChatState {
                messages: vec![Message::assistant(GREETING)],
                busy: false,
                requests: 0,
                failures: 0,
                epoch: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ChatState> {
        lock(&self.state)
    }

    /// The identifier sent with every request of this session.
    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// A copy of the message log.
    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.state().messages.len()
    }

    /// Whether a send is in flight.
    pub fn is_busy(&self) -> bool {
        self.state().busy
    }

    /// Sends a user message in the given mode.
    ///
    /// Returns `None` without touching the log when `text` is blank or another
    /// send is in flight.  Otherwise the user message is appended before the
    /// request is issued, and exactly one assistant message follows: the reply
    /// on success, or `"Error: <reason>"` on failure (which also returns
    /// `None`).  A reply that arrives after [`ChatSession::clear_chat`] reset
    /// the log is discarded and also returns `None`.
    pub async fn send_message(&self, text: &str, mode: Mode) -> Option<ChatResponse> {
        if text.trim().is_empty() {
            return None;
        }
        let epoch = {
            let mut state = self.state();
            if state.busy {
                CHAT_SENDS_REJECTED.click();
                tracing::debug!(conversation_id = %self.conversation_id, "send rejected: busy");
                return None;
            }
            state.busy = true;
            state.requests += 1;
            state.messages.push(Message::user(text));
            state.epoch
        };
        let _busy = Release::new(&self.state, |state: &mut ChatState| state.busy = false);
        CHAT_SENDS.click();

        let settings = self.settings.get();
        let request = ChatRequest {
            message: text,
            mode,
            model: &settings.model,
            temperature: settings.temperature,
            conversation_id: self.conversation_id,
        };
        let result = self.client.post::<_, ChatResponse>("/chat", &request).await;
        let mut state = self.state();
        if state.epoch != epoch {
            tracing::debug!(conversation_id = %self.conversation_id, "dropping reply to a cleared chat");
            return None;
        }
        match result {
            Ok(response) => {
                state
                    .messages
                    .push(Message::assistant(response.message.clone()));
                Some(response)
            }
            Err(err) => {
                CHAT_FAILURES.click();
                tracing::warn!(conversation_id = %self.conversation_id, error = %err, "chat send failed");
                state.failures += 1;
                state
                    .messages
                    .push(Message::assistant(format!("Error: {}", err.message())));
                None
            }
        }
    }

    /// Clears the conversation on the server and resets the local log.
    ///
    /// The local reset happens whether or not the server acknowledged; a
    /// server failure is only logged.  Replies to sends still in flight
    /// when the log is reset are not appended.
    pub async fn clear_chat(&self) {
        let path = format!("/conversation/clear/{}", self.conversation_id);
        if let Err(err) = self.client.post_empty::<serde_json::Value>(&path).await {
            tracing::warn!(conversation_id = %self.conversation_id, error = %err, "failed to clear chat on server");
        }
        let mut state = self.state();
        state.epoch += 1;
        state.messages = vec![Message::assistant(CLEARED_GREETING)];
    }

    /// Renders the log as `"ROLE: content"` entries separated by blank lines.
    pub fn export_chat(&self) -> String {
        transcript_text(&self.state().messages)
    }

    /// The file name an export made today receives, `chat-YYYY-MM-DD.txt`.
    pub fn export_file_name() -> String {
        format!("chat-{}.txt", utils::time::today())
    }

    /// Writes [`ChatSession::export_chat`] into `dir` and returns the path.
    pub fn export_chat_to<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let text = self.export_chat();
        utils::write_download(dir.as_ref(), &Self::export_file_name(), text.as_bytes())
    }

    /// Saves the log and conversation identifier as JSON.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let transcript = TranscriptFile::new(self.conversation_id, &self.state().messages);
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &transcript).map_err(|err| {
            Error::serialization("failed to serialize transcript", Some(Box::new(err)))
        })
    }

    /// Loads a saved log, replacing the current one.
    ///
    /// The conversation identifier of this session is kept; the saved one is
    /// informational only.
    pub fn load_transcript_from<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::open(path.as_ref())
            .map_err(|err| Error::io("failed to open transcript file", err))?;
        let reader = BufReader::new(file);
        let transcript: TranscriptFile = from_reader(reader).map_err(|err| {
            Error::serialization("failed to parse transcript", Some(Box::new(err)))
        })?;
        if transcript.version != TRANSCRIPT_VERSION {
            return Err(Error::validation(
                format!("unsupported transcript version {}", transcript.version),
                Some("version".to_string()),
            ));
        }
        let mut state = self.state();
        if state.busy {
            return Err(Error::validation(
                "cannot load a transcript while a message is being sent",
                None,
            ));
        }
        state.messages = transcript.messages;
        Ok(())
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let state = self.state();
        SessionStats {
            conversation_id: self.conversation_id,
            message_count: state.messages.len(),
            busy: state.busy,
            total_requests: state.requests,
            failed_requests: state.failures,
        }
    }
}

/// Joins messages into the plain-text transcript format.
pub fn transcript_text(messages: &[Message]) -> String {
    messages
        .iter()
        .map(Message::transcript_line)
        .collect::<Vec<_>>()
        .join("\n\n")
}

const TRANSCRIPT_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct TranscriptFile {
    version: u8,
    conversation_id: ConversationId,
    messages: Vec<Message>,
}

impl TranscriptFile {
    fn new(conversation_id: ConversationId, messages: &[Message]) -> Self {
        Self {
            version: TRANSCRIPT_VERSION,
            conversation_id,
            messages: messages.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::types::Role;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_for(base_url: &str) -> ChatSession {
        let settings = Settings::new().with_api_url(base_url);
        let client = ApiClient::new(&settings).unwrap();
        ChatSession::new(client, SettingsHandle::new(settings))
    }

    #[test]
    fn new_session_has_greeting() {
        let session = session_for("http://localhost:8000/api");
        assert_eq!(session.messages(), vec![Message::assistant(GREETING)]);
        assert!(!session.is_busy());
    }

    #[test]
    fn export_format() {
        let session = session_for("http://localhost:8000/api");
        session.state().messages = vec![Message::assistant("Hi"), Message::user("Hello")];
        assert_eq!(session.export_chat(), "ASSISTANT: Hi\n\nUSER: Hello");
    }

    #[test]
    fn export_to_dated_file() {
        let session = session_for("http://localhost:8000/api");
        let dir = tempfile::tempdir().unwrap();
        let path = session.export_chat_to(dir.path()).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("chat-"));
        assert!(name.ends_with(".txt"));
        assert_eq!(name.len(), "chat-YYYY-MM-DD.txt".len());
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!("ASSISTANT: {GREETING}"));
    }

    #[test]
    fn suggestion_parsing() {
        let response = ChatResponse {
            message: "ok".to_string(),
            suggested_mode: Some("aem".to_string()),
        };
        assert_eq!(response.suggestion(), Some(Mode::Aem));
        let response = ChatResponse {
            message: "ok".to_string(),
            suggested_mode: Some("hologram".to_string()),
        };
        assert_eq!(response.suggestion(), None);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let session = session_for(&server.uri());
        assert!(session.send_message("   \n", Mode::Chat).await.is_none());
        assert_eq!(session.message_count(), 1);
    }

    #[tokio::test]
    async fn send_appends_user_then_assistant() {
        let server = MockServer::start().await;
        let session = session_for(&server.uri());
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(json!({
                "message": "list pages",
                "mode": "chat",
                "model": "gemma3",
                "temperature": 0.7,
                "conversation_id": session.conversation_id().to_string(),
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "Here they are", "suggested_mode": "aem"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = session.send_message("list pages", Mode::Chat).await.unwrap();
        assert_eq!(response.suggestion(), Some(Mode::Aem));
        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], Message::user("list pages"));
        assert_eq!(messages[2], Message::assistant("Here they are"));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn overlapping_send_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "done"}))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server.uri());
        let first = session.send_message("first", Mode::Chat);
        let second = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert!(session.is_busy());
            session.send_message("second", Mode::Chat).await
        };
        let (first, second) = tokio::join!(first, second);
        assert!(first.is_some());
        assert!(second.is_none());

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], Message::user("first"));
        assert_eq!(messages[2], Message::assistant("done"));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn transport_failure_becomes_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({"error": "inference offline"})),
            )
            .mount(&server)
            .await;

        let session = session_for(&server.uri());
        assert!(session.send_message("hello", Mode::Web).await.is_none());
        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        let last = messages.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.content.starts_with("Error: "));
        assert!(last.content.contains("inference offline"));
        assert!(!session.is_busy());
        assert_eq!(session.stats().failed_requests, 1);
    }

    #[tokio::test]
    async fn clear_resets_even_when_server_fails() {
        let server = MockServer::start().await;
        let session = session_for(&server.uri());
        Mock::given(method("POST"))
            .and(path(format!(
                "/conversation/clear/{}",
                session.conversation_id()
            )))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        session.state().messages.push(Message::user("old"));
        session.clear_chat().await;
        assert_eq!(session.messages(), vec![Message::assistant(CLEARED_GREETING)]);
    }

    #[tokio::test]
    async fn reply_after_clear_is_dropped() {
        let server = MockServer::start().await;
        let session = session_for(&server.uri());
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "late reply"}))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!(
                "/conversation/clear/{}",
                session.conversation_id()
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;

        let send = session.send_message("slow question", Mode::Chat);
        let clear = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            session.clear_chat().await;
        };
        let (reply, ()) = tokio::join!(send, clear);
        assert!(reply.is_none());
        assert_eq!(session.messages(), vec![Message::assistant(CLEARED_GREETING)]);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn conversation_id_is_stable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .mount(&server)
            .await;

        let session = session_for(&server.uri());
        let id = session.conversation_id();
        session.send_message("one", Mode::Chat).await;
        session.clear_chat().await;
        session.send_message("two", Mode::Chat).await;
        assert_eq!(session.conversation_id(), id);

        let requests = server.received_requests().await.unwrap();
        let chat_ids: Vec<String> = requests
            .iter()
            .filter(|r| r.url.path() == "/chat")
            .map(|r| {
                let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
                body["conversation_id"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(chat_ids, vec![id.to_string(), id.to_string()]);
    }

    #[test]
    fn transcript_round_trip() {
        let session = session_for("http://localhost:8000/api");
        session.state().messages.push(Message::user("saved"));
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("transcript.json");
        session.save_transcript_to(&file).unwrap();

        let other = session_for("http://localhost:8000/api");
        other.load_transcript_from(&file).unwrap();
        assert_eq!(other.messages(), session.messages());
        assert_ne!(other.conversation_id(), session.conversation_id());
    }
}
