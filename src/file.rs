//! Upload a local file and ask the assistant about it.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::client::ApiClient;
use crate::config::SettingsHandle;
use crate::error::{Error, Result};
use crate::utils::{Release, lock};

/////////////////////////////////////////// FileTask /////////////////////////////////////////////

/// What to do with an uploaded file.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileTask {
    /// Answer a question about the file.
    #[default]
    Qa,
    Summarize,
    Analyze,
    Extract,
    Translate,
}

impl FileTask {
    pub const ALL: [FileTask; 5] = [
        FileTask::Qa,
        FileTask::Summarize,
        FileTask::Analyze,
        FileTask::Extract,
        FileTask::Translate,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            FileTask::Qa => "qa",
            FileTask::Summarize => "summarize",
            FileTask::Analyze => "analyze",
            FileTask::Extract => "extract",
            FileTask::Translate => "translate",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileTask::Qa => "Question & Answer",
            FileTask::Summarize => "Summarize",
            FileTask::Analyze => "Analyze",
            FileTask::Extract => "Extract Key Info",
            FileTask::Translate => "Translate",
        }
    }
}

impl fmt::Display for FileTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug)]
pub struct FileTaskParseError {
    pub invalid_value: String,
}

impl fmt::Display for FileTaskParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown file task: {}", self.invalid_value)
    }
}

impl std::error::Error for FileTaskParseError {}

impl FromStr for FileTask {
    type Err = FileTaskParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        FileTask::ALL
            .into_iter()
            .find(|task| task.id() == wanted)
            .ok_or_else(|| FileTaskParseError {
                invalid_value: s.to_string(),
            })
    }
}

///////////////////////////////////////// FileAnalysis ////////////////////////////////////////////

/// The backend's answer about an uploaded file, kept as returned.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAnalysis(Value);

impl FileAnalysis {
    pub fn from_error(reason: impl Into<String>) -> Self {
        Self(json!({ "error": reason.into() }))
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn error(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }

    /// The first of `answer`, `summary` or `result`; the whole payload
    /// pretty-printed otherwise.
    pub fn text(&self) -> String {
        ["answer", "summary", "result"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| serde_json::to_string_pretty(&self.0).unwrap_or_default())
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.0.get("metadata")
    }
}

////////////////////////////////////////// FileUpload /////////////////////////////////////////////

#[derive(Debug, Default)]
struct UploadState {
    uploading: bool,
    result: Option<FileAnalysis>,
}

/// File analysis view state: one upload at a time and the last result.
#[derive(Debug, Clone)]
pub struct FileUpload {
    client: ApiClient,
    settings: SettingsHandle,
    state: Arc<Mutex<UploadState>>,
}

impl FileUpload {
    pub fn new(client: ApiClient, settings: SettingsHandle) -> Self {
        Self {
            client,
            settings,
            state: Arc::new(Mutex::new(UploadState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, UploadState> {
        lock(&self.state)
    }

    pub fn is_uploading(&self) -> bool {
        self.state().uploading
    }

    pub fn result(&self) -> Option<FileAnalysis> {
        self.state().result.clone()
    }

    /// Uploads `file` with `question` and `task` and stores the answer.
    ///
    /// Any failure, local or remote, is stored as an error result.  Returns
    /// `None` when an upload is already in flight.
    pub async fn analyze(&self, file: &Path, question: &str, task: FileTask) -> Option<FileAnalysis> {
        {
            let mut state = self.state();
            if state.uploading {
                return None;
            }
            state.uploading = true;
        }
        let _uploading = Release::new(&self.state, |state: &mut UploadState| {
            state.uploading = false
        });

        let analysis = match self.upload(file, question, task).await {
            Ok(value) => FileAnalysis(value),
            Err(err) => {
                tracing::warn!(file = %file.display(), error = %err, "file analysis failed");
                FileAnalysis::from_error(err.message())
            }
        };
        self.state().result = Some(analysis.clone());
        Some(analysis)
    }

    async fn upload(&self, file: &Path, question: &str, task: FileTask) -> Result<Value> {
        let contents = tokio::fs::read(file)
            .await
            .map_err(|err| Error::io(format!("failed to read {}", file.display()), err))?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let form = Form::new()
            .part("file", Part::bytes(contents).file_name(file_name))
            .text("question", question.to_string())
            .text("task", task.id())
            .text("model", self.settings.get().model);
        self.client.post_multipart("/file/upload", form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn upload_for(uri: &str) -> FileUpload {
        let settings = Settings::new().with_api_url(uri).with_model("llama3");
        let client = ApiClient::new(&settings).unwrap();
        FileUpload::new(client, SettingsHandle::new(settings))
    }

    #[test]
    fn analysis_text_prefers_answer_fields() {
        let analysis = FileAnalysis(json!({"summary": "short", "metadata": {"pages": 2}}));
        assert_eq!(analysis.text(), "short");
        assert_eq!(analysis.metadata(), Some(&json!({"pages": 2})));
        assert!(!analysis.is_error());

        let analysis = FileAnalysis(json!({"words": 10}));
        assert!(analysis.text().contains("\"words\": 10"));
    }

    #[test]
    fn task_parse() {
        assert_eq!("Summarize".parse::<FileTask>().unwrap(), FileTask::Summarize);
        assert!("poem".parse::<FileTask>().is_err());
    }

    #[tokio::test]
    async fn upload_sends_multipart_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/file/upload"))
            .and(body_string_contains("name=\"question\""))
            .and(body_string_contains("What is this?"))
            .and(body_string_contains("filename=\"notes.txt\""))
            .and(body_string_contains("llama3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"answer": "Meeting notes"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "agenda").unwrap();

        let upload = upload_for(&server.uri());
        let analysis = upload.analyze(&file, "What is this?", FileTask::Qa).await.unwrap();
        assert_eq!(analysis.text(), "Meeting notes");
        assert_eq!(upload.result(), Some(analysis));
        assert!(!upload.is_uploading());
    }

    #[tokio::test]
    async fn missing_file_is_stored_as_error() {
        let server = MockServer::start().await;
        let upload = upload_for(&server.uri());
        let dir = tempfile::tempdir().unwrap();
        let analysis = upload
            .analyze(&dir.path().join("absent.pdf"), "", FileTask::Summarize)
            .await
            .unwrap();
        assert!(analysis.error().unwrap().contains("absent.pdf"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_error_is_stored_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/file/upload"))
            .respond_with(
                ResponseTemplate::new(415).set_body_json(json!({"error": "Unsupported file type"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("image.bmp");
        std::fs::write(&file, [0u8, 1, 2]).unwrap();

        let upload = upload_for(&server.uri());
        let analysis = upload.analyze(&file, "", FileTask::Analyze).await.unwrap();
        assert_eq!(analysis.error(), Some("Unsupported file type"));
    }
}
