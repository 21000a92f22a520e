//! Tag listing and creation within one namespace.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::{Error, Result};
use crate::render::Renderer;
use crate::types::Tag;
use crate::utils::lock;

pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    namespace: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    namespace: &'a str,
    tag_id: &'a str,
    title: &'a str,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    tags: Option<Vec<Tag>>,
}

/// Lists and creates tags in a namespace.
#[derive(Clone)]
pub struct TagManager {
    client: ApiClient,
    renderer: Arc<dyn Renderer>,
    namespace: String,
    tags: Arc<Mutex<Vec<Tag>>>,
}

impl TagManager {
    pub fn new(client: ApiClient, renderer: Arc<dyn Renderer>) -> Self {
        Self::with_namespace(client, renderer, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(
        client: ApiClient,
        renderer: Arc<dyn Renderer>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            client,
            renderer,
            namespace: namespace.into(),
            tags: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn tags(&self) -> Vec<Tag> {
        lock(&self.tags).clone()
    }

    /// Reloads the tag list.  Failures are logged and keep the old list.
    pub async fn list(&self) -> bool {
        let request = ListRequest {
            namespace: &self.namespace,
        };
        match self
            .client
            .post::<_, ListResponse>("/tags/list", &request)
            .await
        {
            Ok(response) if response.success => {
                *lock(&self.tags) = response.tags.unwrap_or_default();
                true
            }
            Ok(_) => false,
            Err(err) => {
                tracing::warn!(namespace = %self.namespace, error = %err, "failed to load tags");
                false
            }
        }
    }

    /// Creates a tag and reloads the list.
    ///
    /// An empty id is rejected before any request.  A failed create alerts
    /// and returns `Ok(false)`.
    pub async fn create(&self, id: &str, title: &str, description: &str) -> Result<bool> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::validation(
                "tag id must not be empty",
                Some("tag_id".to_string()),
            ));
        }
        let request = CreateRequest {
            namespace: &self.namespace,
            tag_id: id,
            title,
            description,
        };
        if let Err(err) = self
            .client
            .post::<_, Value>("/tags/create", &request)
            .await
        {
            tracing::warn!(tag_id = id, error = %err, "failed to create tag");
            self.renderer.print_error("Failed to create tag");
            return Ok(false);
        }
        self.list().await;
        Ok(true)
    }
}
