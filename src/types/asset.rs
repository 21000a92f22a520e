use serde::{Deserialize, Serialize};

/// A DAM asset returned by a browse or search call.  `path` is the unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Repository path, e.g. `/content/dam/site/hero.jpg`.
    pub path: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Coarse kind: `image`, `video`, `document` or `folder`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    /// MIME type or file format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Thumbnail rendition path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Asset {
    /// Creates an asset with a path and title.
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            asset_type: None,
            format: None,
            thumbnail: None,
            size: None,
        }
    }

    /// Returns true if the asset is a folder (or has no declared type).
    pub fn is_folder(&self) -> bool {
        matches!(self.asset_type.as_deref(), None | Some("folder"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialization() {
        let json = r#"{"path":"/content/dam/hero.jpg","title":"Hero","type":"image","format":"image/jpeg","thumbnail":"/content/dam/hero.jpg/_jcr_content/renditions/thumb.png","size":2048}"#;
        let asset: Asset = serde_json::from_str(json).unwrap();
        assert_eq!(asset.asset_type.as_deref(), Some("image"));
        assert_eq!(asset.size, Some(2048));
        assert!(!asset.is_folder());
    }

    #[test]
    fn untyped_asset_is_folder() {
        assert!(Asset::new("/content/dam/site", "site").is_folder());
    }
}
