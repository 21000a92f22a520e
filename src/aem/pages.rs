//! Page query, multi-select, and batch compliance checks.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::config::SettingsHandle;
use crate::observability::{
    COMPLIANCE_CHECKS, COMPLIANCE_PAGES, PAGE_QUERIES, PAGE_SELECTIONS_PRUNED,
};
use crate::render::Renderer;
use crate::types::{ComplianceResult, Page};
use crate::utils::{self, Release, lock};

/// Root queried when no path is given.
pub const DEFAULT_QUERY_PATH: &str = "/content";
/// Depth queried when no depth is given.
pub const DEFAULT_QUERY_DEPTH: u32 = 3;

/// Alert shown when a batch action is requested with nothing selected.
pub const EMPTY_SELECTION_ALERT: &str = "Please select at least one page";

////////////////////////////////////////// SelectionSet //////////////////////////////////////////

/// Insertion-ordered set of selected paths.
///
/// [`SelectionSet::toggle`] adds an absent path and removes a present one, so
/// toggling the same path twice restores the original set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    paths: Vec<String>,
}

impl SelectionSet {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles membership of `path`.  Returns true if it is now selected.
    pub fn toggle(&mut self, path: &str) -> bool {
        if let Some(idx) = self.paths.iter().position(|p| p == path) {
            self.paths.remove(idx);
            false
        } else {
            self.paths.push(path.to_string());
            true
        }
    }

    /// Whether `path` is selected.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Selected paths in selection order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Removes every path.
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Keeps only the paths for which `keep` returns true.  Returns how many
    /// paths were dropped.
    pub fn retain<F: FnMut(&str) -> bool>(&mut self, mut keep: F) -> usize {
        let before = self.paths.len();
        self.paths.retain(|p| keep(p));
        before - self.paths.len()
    }
}

///////////////////////////////////////////// Wire /////////////////////////////////////////////

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    path: &'a str,
    depth: u32,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    pages: Option<Vec<Page>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ComplianceRequest<'a> {
    page_paths: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    categories: Option<&'a [String]>,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct ComplianceResponse {
    #[serde(default)]
    results: Vec<ComplianceResult>,
}

#[derive(Debug, Serialize)]
struct ExportRequest<'a> {
    format: &'a str,
    results: &'a [ComplianceResult],
    include_details: bool,
}

///////////////////////////////////////////// PageSelection ////////////////////////////////////////

#[derive(Debug, Default)]
struct PageState {
    pages: Vec<Page>,
    selection: SelectionSet,
    pending_queries: usize,
    pending_checks: usize,
    results: Option<Vec<ComplianceResult>>,
}

/// Owns the queried page list, the selection set, and the last compliance
/// results.
///
/// Cloning yields another handle to the same state.  Queries and compliance
/// checks may overlap; each response is applied when it arrives, so the last
/// response to complete wins.
#[derive(Clone)]
pub struct PageSelection {
    client: ApiClient,
    settings: SettingsHandle,
    renderer: Arc<dyn Renderer>,
    state: Arc<Mutex<PageState>>,
}

impl PageSelection {
    /// Creates an empty page selection.
    pub fn new(client: ApiClient, settings: SettingsHandle, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            client,
            settings,
            renderer,
            state: Arc::new(Mutex::new(PageState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        lock(&self.state)
    }

    /// The most recently queried pages.
    pub fn pages(&self) -> Vec<Page> {
        self.state().pages.clone()
    }

    /// The current selection.
    pub fn selection(&self) -> SelectionSet {
        self.state().selection.clone()
    }

    /// Selected paths in selection order.
    pub fn selected_paths(&self) -> Vec<String> {
        self.state().selection.paths().to_vec()
    }

    /// The last compliance results, if a check has succeeded since the last
    /// clear.
    pub fn compliance_results(&self) -> Option<Vec<ComplianceResult>> {
        self.state().results.clone()
    }

    /// Whether compliance results are present.
    pub fn has_results(&self) -> bool {
        self.state().results.is_some()
    }

    /// Whether a page query is in flight.
    pub fn loading_pages(&self) -> bool {
        self.state().pending_queries > 0
    }

    /// Whether a compliance check is in flight.
    pub fn loading_compliance(&self) -> bool {
        self.state().pending_checks > 0
    }

    /// Lists pages under `path` down to `depth` levels.
    ///
    /// A successful response replaces the page list and prunes selected paths
    /// that are no longer listed.  A failure leaves everything untouched and
    /// is only logged.  Returns true if the list was replaced.
    pub async fn query_pages(&self, path: &str, depth: u32) -> bool {
        self.state().pending_queries += 1;
        let _loading = Release::new(&self.state, |state: &mut PageState| {
            state.pending_queries -= 1
        });
        PAGE_QUERIES.click();

        let request = QueryRequest { path, depth };
        let response = match self
            .client
            .post::<_, QueryResponse>("/aem/query", &request)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(path, error = %err, "error querying pages");
                return false;
            }
        };
        if !response.success {
            tracing::warn!(
                path,
                error = response.error.as_deref().unwrap_or("unknown"),
                "failed to query pages"
            );
            return false;
        }

        let pages = response.pages.unwrap_or_default();
        let mut state = self.state();
        let pruned = state
            .selection
            .retain(|selected| pages.iter().any(|page| page.path == selected));
        if pruned > 0 {
            PAGE_SELECTIONS_PRUNED.click();
            tracing::debug!(pruned, "dropped selections missing from refreshed pages");
        }
        state.pages = pages;
        true
    }

    /// Lists pages with the default root and depth.
    pub async fn query_default(&self) -> bool {
        self.query_pages(DEFAULT_QUERY_PATH, DEFAULT_QUERY_DEPTH)
            .await
    }

    /// Toggles selection of `path`.  Returns true if it is now selected.
    pub fn toggle_select(&self, path: &str) -> bool {
        self.state().selection.toggle(path)
    }

    /// Runs the compliance checker over every selected page.
    ///
    /// With nothing selected this alerts and returns without a request.  A
    /// successful response replaces the previous results wholesale; the
    /// selection is kept.  Returns true if results were replaced.
    pub async fn run_compliance_check(&self, categories: Option<&[String]>) -> bool {
        let page_paths = {
            let mut state = self.state();
            if state.selection.is_empty() {
                drop(state);
                self.renderer.print_error(EMPTY_SELECTION_ALERT);
                return false;
            }
            state.pending_checks += 1;
            state.selection.paths().to_vec()
        };
        let _loading = Release::new(&self.state, |state: &mut PageState| {
            state.pending_checks -= 1
        });
        COMPLIANCE_CHECKS.click();
        COMPLIANCE_PAGES.add(page_paths.len() as f64);

        let settings = self.settings.get();
        let request = ComplianceRequest {
            page_paths: &page_paths,
            categories,
            model: &settings.model,
        };
        match self
            .client
            .post::<_, ComplianceResponse>("/aem/compliance/check", &request)
            .await
        {
            Ok(response) => {
                self.state().results = Some(response.results);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "error running compliance check");
                self.renderer.print_error("Failed to run compliance check");
                false
            }
        }
    }

    /// Downloads the current results as `compliance-report.<format>` into
    /// `dir`.
    ///
    /// Does nothing when there are no results.  The payload is staged in a
    /// temporary file that is removed if saving fails.
    pub async fn export_results(&self, format: &str, dir: &Path) -> Option<PathBuf> {
        let results = self.state().results.clone()?;
        let request = ExportRequest {
            format,
            results: &results,
            include_details: true,
        };
        let saved = match self
            .client
            .post_blob("/aem/compliance/export", &request)
            .await
        {
            Ok(bytes) => utils::write_download(dir, &report_file_name(format), &bytes),
            Err(err) => Err(err),
        };
        match saved {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(format, error = %err, "error exporting results");
                self.renderer.print_error("Failed to export results");
                None
            }
        }
    }

    /// Drops the compliance results and the selection together.
    pub fn clear(&self) {
        let mut state = self.state();
        state.results = None;
        state.selection.clear();
    }
}

/// File name of an exported report.
pub fn report_file_name(format: &str) -> String {
    format!("compliance-report.{format}")
}
