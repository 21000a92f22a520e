//! Side-by-side comparison of two versions of a page.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::render::Renderer;
use crate::types::{Version, VersionContent, VersionDiff};
use crate::utils::{Release, lock};

pub const COMPARISON_FAILED_ALERT: &str = "Comparison failed";

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    page_path: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    versions: Option<Vec<Version>>,
}

#[derive(Debug, Serialize)]
struct CompareRequest<'a> {
    page_path: &'a str,
    version1: &'a str,
    version2: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompareResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    version1: VersionContent,
    #[serde(default)]
    version2: VersionContent,
}

#[derive(Debug, Default)]
struct VersionState {
    versions: Vec<Version>,
    comparison: Option<VersionDiff>,
    comparing: bool,
}

/// Version list and last comparison for a single page.
#[derive(Clone)]
pub struct VersionComparison {
    client: ApiClient,
    renderer: Arc<dyn Renderer>,
    page_path: String,
    state: Arc<Mutex<VersionState>>,
}

impl VersionComparison {
    pub fn new(client: ApiClient, renderer: Arc<dyn Renderer>, page_path: impl Into<String>) -> Self {
        Self {
            client,
            renderer,
            page_path: page_path.into(),
            state: Arc::new(Mutex::new(VersionState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, VersionState> {
        lock(&self.state)
    }

    pub fn page_path(&self) -> &str {
        &self.page_path
    }

    pub fn versions(&self) -> Vec<Version> {
        self.state().versions.clone()
    }

    pub fn comparison(&self) -> Option<VersionDiff> {
        self.state().comparison.clone()
    }

    pub fn is_comparing(&self) -> bool {
        self.state().comparing
    }

    /// Loads the versions of the page.  Failures are logged.
    pub async fn list(&self) -> bool {
        let request = ListRequest {
            page_path: &self.page_path,
        };
        match self
            .client
            .post::<_, ListResponse>("/version/list", &request)
            .await
        {
            Ok(response) if response.success => {
                self.state().versions = response.versions.unwrap_or_default();
                true
            }
            Ok(_) => false,
            Err(err) => {
                tracing::warn!(page_path = %self.page_path, error = %err, "failed to load versions");
                false
            }
        }
    }

    /// Compares `version1` with `version2`.
    ///
    /// Blank version names and a comparison already in flight are ignored.
    /// A failed request alerts and keeps the previous comparison.
    pub async fn compare(&self, version1: &str, version2: &str) -> bool {
        if version1.is_empty() || version2.is_empty() {
            return false;
        }
        {
            let mut state = self.state();
            if state.comparing {
                return false;
            }
            state.comparing = true;
        }
        let _comparing = Release::new(&self.state, |state: &mut VersionState| {
            state.comparing = false
        });

        let request = CompareRequest {
            page_path: &self.page_path,
            version1,
            version2,
        };
        match self
            .client
            .post::<_, CompareResponse>("/version/compare", &request)
            .await
        {
            Ok(response) if response.success => {
                self.state().comparison = Some(VersionDiff {
                    page_path: self.page_path.clone(),
                    version1: response.version1,
                    version2: response.version2,
                });
                true
            }
            Ok(_) => false,
            Err(err) => {
                tracing::warn!(page_path = %self.page_path, error = %err, "version comparison failed");
                self.renderer.print_error(COMPARISON_FAILED_ALERT);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingRenderer;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn comparison_for(uri: &str) -> (VersionComparison, Arc<RecordingRenderer>) {
        let renderer = Arc::new(RecordingRenderer::new());
        let client = ApiClient::with_base_url(uri).unwrap();
        (
            VersionComparison::new(client, renderer.clone(), "/content/site/en"),
            renderer,
        )
    }

    #[tokio::test]
    async fn list_and_compare() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/version/list"))
            .and(body_json(json!({"page_path": "/content/site/en"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "versions": [{"name": "1.0"}, {"name": "1.1", "label": "Updated"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/version/compare"))
            .and(body_json(json!({
                "page_path": "/content/site/en",
                "version1": "1.0",
                "version2": "1.1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "version1": {"name": "1.0", "content": "old"},
                "version2": {"name": "1.1", "content": "new"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (versions, _) = comparison_for(&server.uri());
        assert!(versions.list().await);
        assert_eq!(versions.versions()[1].display_label(), "Updated");
        assert!(versions.compare("1.0", "1.1").await);
        let diff = versions.comparison().unwrap();
        assert_eq!(diff.version1.content, "old");
        assert_eq!(diff.version2.content, "new");
        assert!(!versions.is_comparing());
    }

    #[tokio::test]
    async fn missing_version_is_local_noop() {
        let server = MockServer::start().await;
        let (versions, renderer) = comparison_for(&server.uri());
        assert!(!versions.compare("1.0", "").await);
        assert!(server.received_requests().await.unwrap().is_empty());
        assert!(renderer.errors().is_empty());
    }

    #[tokio::test]
    async fn failed_comparison_alerts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/version/compare"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .mount(&server)
            .await;
        let (versions, renderer) = comparison_for(&server.uri());
        assert!(!versions.compare("1.0", "1.1").await);
        assert_eq!(renderer.errors(), vec![COMPARISON_FAILED_ALERT]);
        assert!(versions.comparison().is_none());
        assert!(!versions.is_comparing());
    }
}
