//! The AEM workspace managers.

mod assets;
mod pages;
mod tags;
mod versions;
mod workflows;

pub use assets::{AssetBrowser, BROWSE_LIMIT, DEFAULT_ASSET_ROOT, SelectedAsset};
pub use pages::{
    DEFAULT_QUERY_DEPTH, DEFAULT_QUERY_PATH, EMPTY_SELECTION_ALERT, PageSelection, SelectionSet,
    report_file_name,
};
pub use tags::{DEFAULT_NAMESPACE, TagManager};
pub use versions::{COMPARISON_FAILED_ALERT, VersionComparison};
pub use workflows::WorkflowManager;
