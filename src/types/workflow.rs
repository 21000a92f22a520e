use serde::{Deserialize, Serialize};

/// A workflow model that can be started on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowModel {
    /// Model path, e.g. `/var/workflow/models/dam/update_asset`.
    #[serde(alias = "path")]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

impl WorkflowModel {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// The models every AEM author instance ships with.
    pub fn builtin() -> Vec<WorkflowModel> {
        vec![
            Self::new("/var/workflow/models/dam/update_asset", "DAM Update Asset"),
            Self::new("/var/workflow/models/dam/dam-autotag-assets", "Auto-tag Assets"),
            Self::new(
                "/etc/workflow/models/request_for_activation",
                "Request for Activation",
            ),
            Self::new(
                "/etc/workflow/models/request_for_deactivation",
                "Request for Deactivation",
            ),
            Self::new(
                "/etc/workflow/models/wcm-translation/create_language_copy",
                "Create Language Copy",
            ),
        ]
    }
}

/// Outcome of starting a workflow on one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStart {
    pub page_path: String,
    /// `None` when the start request succeeded.
    pub error: Option<String>,
}

impl WorkflowStart {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_models() {
        let models = WorkflowModel::builtin();
        assert_eq!(models.len(), 5);
        assert_eq!(models[0].title, "DAM Update Asset");
        assert_eq!(
            models[4].id,
            "/etc/workflow/models/wcm-translation/create_language_copy"
        );
    }

    #[test]
    fn accepts_path_key() {
        let model: WorkflowModel =
            serde_json::from_str(r#"{"path":"/var/workflow/models/publish","title":"Publish"}"#)
                .unwrap();
        assert_eq!(model.id, "/var/workflow/models/publish");
        assert_eq!(model.title, "Publish");
    }
}
