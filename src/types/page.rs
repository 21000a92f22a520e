use serde::{Deserialize, Serialize};

/// A page returned by an AEM query.  `path` is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Repository path, e.g. `/content/site/en/home`.
    pub path: String,
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Page type reported by the backend.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
    /// Template path, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Last modification timestamp as reported by AEM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl Page {
    /// Creates a page with a path and title.
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            page_type: None,
            template: None,
            last_modified: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialization_ignores_unknown_fields() {
        let json = r#"{"path":"/content/site/en","title":"English","type":"cq:Page","depth":2}"#;
        let page: Page = serde_json::from_str(json).unwrap();
        assert_eq!(page.path, "/content/site/en");
        assert_eq!(page.title, "English");
        assert_eq!(page.page_type.as_deref(), Some("cq:Page"));
        assert!(page.template.is_none());
    }

    #[test]
    fn serialization_skips_missing_fields() {
        let json = serde_json::to_string(&Page::new("/content/a", "A")).unwrap();
        assert_eq!(json, r#"{"path":"/content/a","title":"A"}"#);
    }
}
