//! DAM asset browsing and search.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::config::SettingsHandle;
use crate::types::Asset;
use crate::utils::{Release, lock};

/// Folder the browser starts in.
pub const DEFAULT_ASSET_ROOT: &str = "/content/dam";
/// Maximum number of assets requested per browse call.
pub const BROWSE_LIMIT: u32 = 100;
/// Rendition used as the thumbnail of images that list none.
pub const THUMBNAIL_RENDITION: &str = "/_jcr_content/renditions/cq5dam.thumbnail.140.100.png";

#[derive(Debug, Serialize)]
struct BrowseRequest<'a> {
    path: &'a str,
    depth: u32,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    keyword: &'a str,
    path: &'a str,
}

#[derive(Debug, Deserialize)]
struct AssetListResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, alias = "results")]
    assets: Option<Vec<Asset>>,
}

/// An asset chosen for preview, with every link resolved against the AEM host.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedAsset {
    /// The asset as listed, with its repository path.
    pub asset: Asset,
    /// Absolute URL of the asset.
    pub url: String,
    /// Absolute URL of the thumbnail.  Images without a listed thumbnail get
    /// the standard [`THUMBNAIL_RENDITION`].
    pub thumbnail_url: Option<String>,
    /// Absolute download URL.
    pub download_url: String,
}

impl SelectedAsset {
    /// Resolves the asset's links against `aem_host`.  Paths that are already
    /// absolute `http(s)` URLs are kept as they are.
    pub fn resolve(asset: Asset, aem_host: &str) -> Self {
        let host = aem_host.trim_end_matches('/');
        let absolute = |path: &str| {
            if path.starts_with("http://") || path.starts_with("https://") {
                path.to_string()
            } else {
                format!("{host}{path}")
            }
        };
        let url = absolute(&asset.path);
        let thumbnail_url = match (&asset.thumbnail, asset.asset_type.as_deref()) {
            (Some(thumbnail), _) => Some(absolute(thumbnail.as_str())),
            (None, Some("image")) => Some(format!("{url}{THUMBNAIL_RENDITION}")),
            (None, _) => None,
        };
        Self {
            download_url: url.clone(),
            url,
            thumbnail_url,
            asset,
        }
    }

    /// File name offered when downloading.
    pub fn download_name(&self) -> &str {
        if self.asset.title.is_empty() {
            "asset"
        } else {
            &self.asset.title
        }
    }
}

#[derive(Debug)]
struct AssetState {
    assets: Vec<Asset>,
    current_path: String,
    pending: usize,
    has_searched: bool,
}

/// Lists and searches DAM assets under a current folder.
#[derive(Debug, Clone)]
pub struct AssetBrowser {
    client: ApiClient,
    settings: SettingsHandle,
    state: Arc<Mutex<AssetState>>,
}

impl AssetBrowser {
    /// Creates a browser rooted at [`DEFAULT_ASSET_ROOT`].  Nothing is loaded
    /// until the first browse or search.
    pub fn new(client: ApiClient, settings: SettingsHandle) -> Self {
        Self {
            client,
            settings,
            state: Arc::new(Mutex::new(AssetState {
                assets: Vec::new(),
                current_path: DEFAULT_ASSET_ROOT.to_string(),
                pending: 0,
                has_searched: false,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, AssetState> {
        lock(&self.state)
    }

    pub fn assets(&self) -> Vec<Asset> {
        self.state().assets.clone()
    }

    pub fn current_path(&self) -> String {
        self.state().current_path.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().pending > 0
    }

    /// Whether a browse or search has been attempted.
    pub fn has_searched(&self) -> bool {
        self.state().has_searched
    }

    /// Lists assets one level below `path`.  On success the list is replaced
    /// and `path` becomes the current folder; failures are only logged.
    pub async fn browse(&self, path: &str) -> bool {
        self.begin();
        let _loading = Release::new(&self.state, |state: &mut AssetState| state.pending -= 1);

        let request = BrowseRequest {
            path,
            depth: 1,
            limit: BROWSE_LIMIT,
        };
        match self
            .client
            .post::<_, AssetListResponse>("/aem/assets/browse", &request)
            .await
        {
            Ok(response) if response.success => {
                let mut state = self.state();
                state.assets = response.assets.unwrap_or_default();
                state.current_path = path.to_string();
                true
            }
            Ok(_) => {
                tracing::warn!(path, "asset browse was not successful");
                false
            }
            Err(err) => {
                tracing::warn!(path, error = %err, "failed to load assets");
                false
            }
        }
    }

    /// Searches the current folder for `keyword`.  A blank keyword browses
    /// the current folder instead.
    pub async fn search(&self, keyword: &str) -> bool {
        let current_path = self.current_path();
        if keyword.trim().is_empty() {
            return self.browse(&current_path).await;
        }
        self.begin();
        let _loading = Release::new(&self.state, |state: &mut AssetState| state.pending -= 1);

        let request = SearchRequest {
            keyword,
            path: &current_path,
        };
        match self
            .client
            .post::<_, AssetListResponse>("/aem/assets/search", &request)
            .await
        {
            Ok(response) if response.success => {
                self.state().assets = response.assets.unwrap_or_default();
                true
            }
            Ok(_) => {
                tracing::warn!(keyword, "asset search was not successful");
                false
            }
            Err(err) => {
                tracing::warn!(keyword, error = %err, "search failed");
                false
            }
        }
    }

    /// Resolves `asset` against the configured AEM host.
    pub fn select(&self, asset: Asset) -> SelectedAsset {
        SelectedAsset::resolve(asset, &self.settings.get().aem_host)
    }

    /// Finds a listed asset by path.
    pub fn find(&self, path: &str) -> Option<Asset> {
        self.state().assets.iter().find(|a| a.path == path).cloned()
    }

    fn begin(&self) {
        let mut state = self.state();
        state.pending += 1;
        state.has_searched = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn browser_for(base_url: &str) -> AssetBrowser {
        let settings = Settings::new()
            .with_api_url(base_url)
            .with_aem_host("http://author:4502/");
        let client = ApiClient::new(&settings).unwrap();
        AssetBrowser::new(client, SettingsHandle::new(settings))
    }

    #[test]
    fn resolve_relative_and_absolute_paths() {
        let mut asset = Asset::new("/content/dam/hero.jpg", "Hero");
        asset.thumbnail = Some("/content/dam/hero.jpg/thumb.png".to_string());
        let selected = SelectedAsset::resolve(asset, "http://author:4502/");
        assert_eq!(selected.url, "http://author:4502/content/dam/hero.jpg");
        assert_eq!(selected.download_url, selected.url);
        assert_eq!(
            selected.thumbnail_url.as_deref(),
            Some("http://author:4502/content/dam/hero.jpg/thumb.png")
        );

        let external = Asset::new("https://cdn.example.com/a.png", "");
        let selected = SelectedAsset::resolve(external, "http://author:4502");
        assert_eq!(selected.url, "https://cdn.example.com/a.png");
        assert!(selected.thumbnail_url.is_none());
        assert_eq!(selected.download_name(), "asset");
    }

    #[test]
    fn image_without_thumbnail_uses_rendition() {
        let mut asset = Asset::new("/content/dam/hero.jpg", "Hero");
        asset.asset_type = Some("image".to_string());
        let selected = SelectedAsset::resolve(asset, "http://author:4502");
        assert_eq!(
            selected.thumbnail_url.as_deref(),
            Some(
                "http://author:4502/content/dam/hero.jpg/_jcr_content/renditions/cq5dam.thumbnail.140.100.png"
            )
        );

        let mut document = Asset::new("/content/dam/terms.pdf", "Terms");
        document.asset_type = Some("document".to_string());
        assert!(SelectedAsset::resolve(document, "http://author:4502").thumbnail_url.is_none());
    }

    #[tokio::test]
    async fn browse_replaces_assets_and_moves_folder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/aem/assets/browse"))
            .and(body_json(json!({"path": "/content/dam/site", "depth": 1, "limit": 100})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "assets": [{"path": "/content/dam/site/a.jpg", "title": "A", "type": "image"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let browser = browser_for(&server.uri());
        assert!(!browser.has_searched());
        assert!(browser.browse("/content/dam/site").await);
        assert_eq!(browser.assets().len(), 1);
        assert_eq!(browser.current_path(), "/content/dam/site");
        assert!(browser.has_searched());
        assert!(!browser.is_loading());
    }

    #[tokio::test]
    async fn search_reads_results_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/aem/assets/search"))
            .and(body_json(json!({"keyword": "logo", "path": "/content/dam"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "results": [{"path": "/content/dam/logo.svg", "title": "Logo"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let browser = browser_for(&server.uri());
        assert!(browser.search("logo").await);
        assert_eq!(browser.find("/content/dam/logo.svg").unwrap().title, "Logo");
        let selected = browser.select(browser.assets()[0].clone());
        assert_eq!(selected.url, "http://author:4502/content/dam/logo.svg");
    }

    #[tokio::test]
    async fn blank_search_browses_current_folder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/aem/assets/browse"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "assets": []})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/aem/assets/search"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let browser = browser_for(&server.uri());
        assert!(browser.search("  ").await);
    }

    #[tokio::test]
    async fn failed_browse_keeps_assets() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/aem/assets/browse"))
            .and(body_json(json!({"path": "/content/dam", "depth": 1, "limit": 100})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "assets": [{"path": "/content/dam/a.jpg", "title": "A"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/aem/assets/browse"))
            .and(body_json(json!({"path": "/content/dam/missing", "depth": 1, "limit": 100})))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "no such folder"})))
            .mount(&server)
            .await;

        let browser = browser_for(&server.uri());
        assert!(browser.browse("/content/dam").await);
        assert!(!browser.browse("/content/dam/missing").await);
        assert_eq!(browser.assets().len(), 1);
        assert_eq!(browser.current_path(), "/content/dam");
    }
}
