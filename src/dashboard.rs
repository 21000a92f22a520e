//! The mode controller.
//!
//! [`Dashboard`] owns one instance of every manager and the active [`View`].
//! Exactly one view is active at a time.  Two transitions have side effects:
//!
//! - Switching to any mode other than `aem` while compliance results exist
//!   clears the results and the page selection together.
//! - A chat response that suggests a different mode switches to it once.

use std::sync::Arc;

use crate::aem::{
    AssetBrowser, PageSelection, SelectedAsset, TagManager, VersionComparison, WorkflowManager,
};
use crate::chat::{ChatResponse, ChatSession};
use crate::client::ApiClient;
use crate::config::{Settings, SettingsHandle};
use crate::error::Result;
use crate::file::FileUpload;
use crate::image::ImageGenerator;
use crate::observability::{MODE_SUGGESTIONS, MODE_SWITCHES};
use crate::preview;
use crate::render::Renderer;
use crate::types::{Asset, Mode};

///////////////////////////////////////// AemWorkspace ////////////////////////////////////////////

/// View-local state of the AEM workspace: the asset being previewed and the
/// version comparison for it.
#[derive(Clone, Default)]
pub struct AemWorkspace {
    selected: Option<SelectedAsset>,
    versions: Option<VersionComparison>,
}

impl AemWorkspace {
    pub fn selected_asset(&self) -> Option<&SelectedAsset> {
        self.selected.as_ref()
    }

    pub fn versions(&self) -> Option<&VersionComparison> {
        self.versions.as_ref()
    }

    /// Preview and open URLs for the selected asset.
    pub fn preview_links(&self, aem_host: &str) -> Option<(String, String)> {
        let path = &self.selected.as_ref()?.asset.path;
        Some((
            preview::preview_url(aem_host, path)?,
            preview::open_url(aem_host, path)?,
        ))
    }
}

///////////////////////////////////////////// View ///////////////////////////////////////////////

/// The active feature view and its view-local state.
#[derive(Clone)]
pub enum View {
    Chat,
    FileUpload(FileUpload),
    WebSearch,
    AemWorkspace(AemWorkspace),
}

impl View {
    pub fn mode(&self) -> Mode {
        match self {
            View::Chat => Mode::Chat,
            View::FileUpload(_) => Mode::File,
            View::WebSearch => Mode::Web,
            View::AemWorkspace(_) => Mode::Aem,
        }
    }
}

/////////////////////////////////////////// Dashboard ////////////////////////////////////////////

pub struct Dashboard {
    settings: SettingsHandle,
    client: ApiClient,
    renderer: Arc<dyn Renderer>,
    chat: ChatSession,
    pages: PageSelection,
    assets: AssetBrowser,
    tags: TagManager,
    workflows: WorkflowManager,
    images: ImageGenerator,
    view: View,
}

impl Dashboard {
    /// Builds every manager against the API configured in `settings` and
    /// starts in chat mode.
    pub fn new(settings: Settings, renderer: Arc<dyn Renderer>) -> Result<Self> {
        settings.validate()?;
        let client = ApiClient::new(&settings)?;
        let settings = SettingsHandle::new(settings);
        Ok(Self {
            chat: ChatSession::new(client.clone(), settings.clone()),
            pages: PageSelection::new(client.clone(), settings.clone(), Arc::clone(&renderer)),
            assets: AssetBrowser::new(client.clone(), settings.clone()),
            tags: TagManager::new(client.clone(), Arc::clone(&renderer)),
            workflows: WorkflowManager::new(client.clone()),
            images: ImageGenerator::new(client.clone()),
            view: View::Chat,
            settings,
            client,
            renderer,
        })
    }

    pub fn mode(&self) -> Mode {
        self.view.mode()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn pages(&self) -> &PageSelection {
        &self.pages
    }

    pub fn assets(&self) -> &AssetBrowser {
        &self.assets
    }

    pub fn tags(&self) -> &TagManager {
        &self.tags
    }

    pub fn workflows(&self) -> &WorkflowManager {
        &self.workflows
    }

    pub fn images(&self) -> &ImageGenerator {
        &self.images
    }

    /// The file analysis state, when the file view is active.
    pub fn file_upload(&self) -> Option<&FileUpload> {
        match &self.view {
            View::FileUpload(upload) => Some(upload),
            _ => None,
        }
    }

    /// The AEM workspace state, when the AEM view is active.
    pub fn workspace(&self) -> Option<&AemWorkspace> {
        match &self.view {
            View::AemWorkspace(workspace) => Some(workspace),
            _ => None,
        }
    }

    /// Activates `mode`.
    ///
    /// Switching to anything but `aem` while compliance results exist clears
    /// them.  Re-selecting the active mode keeps its view state.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != Mode::Aem && self.pages.has_results() {
            tracing::debug!(%mode, "clearing compliance results on mode change");
            self.pages.clear();
        }
        if mode == self.mode() {
            return;
        }
        MODE_SWITCHES.click();
        tracing::info!(from = %self.mode(), to = %mode, "switching mode");
        self.view = match mode {
            Mode::Chat => View::Chat,
            Mode::File => {
                View::FileUpload(FileUpload::new(self.client.clone(), self.settings.clone()))
            }
            Mode::Web => View::WebSearch,
            Mode::Aem => View::AemWorkspace(AemWorkspace::default()),
        };
    }

    /// Sends `text` in the current mode and follows the backend's mode
    /// suggestion, at most once per response.
    pub async fn send_message(&mut self, text: &str) -> Option<ChatResponse> {
        let mode = self.mode();
        let response = self.chat.send_message(text, mode).await?;
        if let Some(suggested) = response.suggested_mode.as_deref() {
            match suggested.parse::<Mode>() {
                Ok(next) if next != mode => {
                    MODE_SUGGESTIONS.click();
                    self.set_mode(next);
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(suggested, error = %err, "ignoring suggested mode"),
            }
        }
        Some(response)
    }

    /// Selects `asset` in the AEM workspace and loads its versions.
    ///
    /// Returns `None` outside the AEM view.
    pub async fn select_asset(&mut self, asset: Asset) -> Option<SelectedAsset> {
        if self.mode() != Mode::Aem {
            return None;
        }
        let selected = self.assets.select(asset);
        let versions = VersionComparison::new(
            self.client.clone(),
            Arc::clone(&self.renderer),
            selected.asset.path.clone(),
        );
        versions.list().await;
        if let View::AemWorkspace(workspace) = &mut self.view {
            workspace.selected = Some(selected.clone());
            workspace.versions = Some(versions);
        }
        Some(selected)
    }
}
