use serde::{Deserialize, Serialize};

/// A stored version of a page or asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Version name, e.g. `1.0`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl Version {
    /// The label if present, the name otherwise.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Content of one side of a version comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionContent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
}

/// Two versions of the same page, side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub page_path: String,
    pub version1: VersionContent,
    pub version2: VersionContent,
}
