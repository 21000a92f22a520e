use serde::{Deserialize, Serialize};

/// A tag in an AEM tag namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag id, e.g. `default:products/shoes`.  Listings may key tags by
    /// their repository path instead.
    #[serde(alias = "tag_id", alias = "path")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Tag {
    /// Label shown in listings: the title if set, the id otherwise.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_tag_id_alias() {
        let tag: Tag = serde_json::from_str(r#"{"tag_id":"default:news"}"#).unwrap();
        assert_eq!(tag.id, "default:news");
        assert_eq!(tag.label(), "default:news");
    }

    #[test]
    fn accepts_path_key() {
        let tag: Tag =
            serde_json::from_str(r#"{"path":"/content/cq:tags/default/news","title":"News"}"#)
                .unwrap();
        assert_eq!(tag.id, "/content/cq:tags/default/news");
        assert_eq!(tag.label(), "News");
    }
}
