//! Workflow models and batch workflow starts.

use std::sync::{Arc, Mutex};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ApiClient;
use crate::observability::{WORKFLOW_START_ERRORS, WORKFLOW_STARTS};
use crate::types::{WorkflowModel, WorkflowStart};
use crate::utils::lock;

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    workflows: Option<Vec<WorkflowModel>>,
}

#[derive(Debug, Serialize)]
struct StartRequest<'a> {
    page_path: &'a str,
    workflow_model: &'a str,
}

/// Lists workflow models and starts them on pages.
#[derive(Debug, Clone)]
pub struct WorkflowManager {
    client: ApiClient,
    models: Arc<Mutex<Vec<WorkflowModel>>>,
}

impl WorkflowManager {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            models: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn models(&self) -> Vec<WorkflowModel> {
        lock(&self.models).clone()
    }

    /// Loads the available models.  When the backend cannot be reached the
    /// built-in models are listed instead.
    pub async fn list(&self) -> Vec<WorkflowModel> {
        let models = match self.client.get::<ListResponse>("/workflow/list").await {
            Ok(response) if response.success => response.workflows.unwrap_or_default(),
            Ok(_) => return self.models(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load workflows, using built-in models");
                WorkflowModel::builtin()
            }
        };
        *lock(&self.models) = models.clone();
        models
    }

    /// Starts `model` on every page concurrently.
    ///
    /// Returns one outcome per page, in the order given.  Nothing is sent
    /// when either the model or the page list is empty.
    pub async fn start(&self, model: &str, pages: &[String]) -> Vec<WorkflowStart> {
        if model.is_empty() || pages.is_empty() {
            return Vec::new();
        }
        let starts = pages.iter().map(|page_path| async move {
            WORKFLOW_STARTS.click();
            let request = StartRequest {
                page_path,
                workflow_model: model,
            };
            let error = match self
                .client
                .post::<_, Value>("/workflow/start", &request)
                .await
            {
                Ok(_) => None,
                Err(err) => {
                    WORKFLOW_START_ERRORS.click();
                    tracing::warn!(page_path = %page_path, model, error = %err, "failed to start workflow");
                    Some(err.message().to_string())
                }
            };
            WorkflowStart {
                page_path: page_path.clone(),
                error,
            }
        });
        join_all(starts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn list_falls_back_to_builtin_models() {
        // Nothing listens on this port.
        let client = ApiClient::with_base_url("http://127.0.0.1:9").unwrap();
        let manager = WorkflowManager::new(client);
        let models = manager.list().await;
        assert_eq!(models, WorkflowModel::builtin());
        assert_eq!(manager.models().len(), 5);
    }

    #[tokio::test]
    async fn list_reads_backend_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/workflow/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "workflows": [{"id": "/var/workflow/models/publish", "title": "Publish"}]
            })))
            .mount(&server)
            .await;
        let manager = WorkflowManager::new(ApiClient::with_base_url(server.uri()).unwrap());
        let models = manager.list().await;
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].title, "Publish");
    }

    #[tokio::test]
    async fn list_accepts_path_keyed_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/workflow/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "workflows": [{
                    "path": "/var/workflow/models/custom/publish",
                    "title": "Custom Publish"
                }]
            })))
            .mount(&server)
            .await;
        let manager = WorkflowManager::new(ApiClient::with_base_url(server.uri()).unwrap());
        let models = manager.list().await;
        assert_eq!(
            models,
            vec![WorkflowModel::new(
                "/var/workflow/models/custom/publish",
                "Custom Publish"
            )]
        );
    }

    #[tokio::test]
    async fn start_reports_each_page_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/workflow/start"))
            .and(body_json(json!({"page_path": "/content/a", "workflow_model": "m"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true}))
                    .set_delay(std::time::Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/workflow/start"))
            .and(body_json(json!({"page_path": "/content/b", "workflow_model": "m"})))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "locked"})))
            .expect(1)
            .mount(&server)
            .await;

        let manager = WorkflowManager::new(ApiClient::with_base_url(server.uri()).unwrap());
        let pages = vec!["/content/a".to_string(), "/content/b".to_string()];
        let starts = manager.start("m", &pages).await;
        assert_eq!(
            starts,
            vec![
                WorkflowStart {
                    page_path: "/content/a".to_string(),
                    error: None
                },
                WorkflowStart {
                    page_path: "/content/b".to_string(),
                    error: Some("locked".to_string())
                },
            ]
        );
    }

    #[tokio::test]
    async fn start_without_model_or_pages_sends_nothing() {
        let server = MockServer::start().await;
        let manager = WorkflowManager::new(ApiClient::with_base_url(server.uri()).unwrap());
        assert!(manager.start("", &["/content/a".to_string()]).await.is_empty());
        assert!(manager.start("m", &[]).await.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
