//! Live preview links for pages and assets on the AEM author instance.

/// Strips scheme and host from `path` when it is an absolute URL.
fn repository_path(path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        match url::Url::parse(path) {
            Ok(url) => url.path().to_string(),
            Err(_) => path.to_string(),
        }
    } else {
        path.to_string()
    }
}

/// URL that renders `path` directly.  `None` for an empty path.
pub fn preview_url(aem_host: &str, path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    let host = aem_host.trim_end_matches('/');
    Some(format!("{host}{}", repository_path(path)))
}

/// URL of the asset details console for `path`.  `None` for an empty path.
pub fn open_url(aem_host: &str, path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    let host = aem_host.trim_end_matches('/');
    Some(format!(
        "{host}/assetdetails.html{}?wcmmode=disabled",
        repository_path(path)
    ))
}
