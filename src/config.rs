//! Dashboard settings and command-line arguments.
//!
//! Settings are resolved in layers: built-in defaults, an optional YAML file,
//! `AEMASSIST_*` environment variables, and finally command-line flags.  The
//! resolved [`Settings`] are wrapped in a [`SettingsHandle`] and handed to
//! every manager at construction time.

use std::env;
use std::path::Path;
use std::sync::{Arc, RwLock};

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default model used for chat, compliance checks and file analysis.
pub const DEFAULT_MODEL: &str = "gemma3";
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default AEM author instance.
pub const DEFAULT_AEM_HOST: &str = "http://localhost:4502";
/// Default base URL of the assistant API.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Command-line arguments for the aemassist-dash tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct DashboardArgs {
    /// YAML settings file.
    #[arrrg(optional, "Settings file (YAML)", "PATH")]
    pub config: Option<String>,

    /// Model to use.
    #[arrrg(optional, "Model to use (default: gemma3)", "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature 0.0-1.0 (default: 0.7)", "TEMP")]
    pub temperature: Option<String>,

    /// AEM host used to resolve asset and preview URLs.
    #[arrrg(optional, "AEM host (default: http://localhost:4502)", "URL")]
    pub aem_host: Option<String>,

    /// Base URL of the assistant API.
    #[arrrg(optional, "API base URL (default: http://localhost:8000/api)", "URL")]
    pub api_url: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Settings shared by every manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Model name forwarded to the backend.
    pub model: String,
    /// Sampling temperature forwarded with chat requests.
    pub temperature: f32,
    /// AEM host used for asset links and live previews.
    pub aem_host: String,
    /// Base URL every API path is appended to.
    pub api_url: String,
}

impl Settings {
    /// Creates settings with the built-in defaults.
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            aem_host: DEFAULT_AEM_HOST.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the AEM host.
    pub fn with_aem_host(mut self, aem_host: impl Into<String>) -> Self {
        self.aem_host = aem_host.into();
        self
    }

    /// Sets the API base URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Loads settings from a YAML file.  Missing keys keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::io(
                format!("failed to read settings file {}", path.display()),
                err,
            )
        })?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Applies overrides from a variable lookup.
    ///
    /// Recognized keys are `AEMASSIST_MODEL`, `AEMASSIST_TEMPERATURE`,
    /// `AEMASSIST_AEM_HOST` and `AEMASSIST_API_URL`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("AEMASSIST_MODEL") {
            self.model = model;
        }
        if let Some(temperature) = lookup("AEMASSIST_TEMPERATURE") {
            self.temperature = parse_temperature(&temperature)?;
        }
        if let Some(aem_host) = lookup("AEMASSIST_AEM_HOST") {
            self.aem_host = aem_host;
        }
        if let Some(api_url) = lookup("AEMASSIST_API_URL") {
            self.api_url = api_url;
        }
        Ok(self)
    }

    /// Applies overrides from the process environment.
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Resolves settings from command-line arguments and the environment.
    pub fn resolve(args: &DashboardArgs) -> Result<Self> {
        let base = match &args.config {
            Some(path) => Settings::from_yaml_file(path)?,
            None => Settings::new(),
        };
        base.with_env()?.with_args(args)
    }

    /// Applies command-line flags on top of these settings.
    pub fn with_args(mut self, args: &DashboardArgs) -> Result<Self> {
        if let Some(model) = &args.model {
            self.model = model.clone();
        }
        if let Some(temperature) = &args.temperature {
            self.temperature = parse_temperature(temperature)?;
        }
        if let Some(aem_host) = &args.aem_host {
            self.aem_host = aem_host.clone();
        }
        if let Some(api_url) = &args.api_url {
            self.api_url = api_url.clone();
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks the invariants the backend relies on.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(Error::validation(
                format!(
                    "temperature must be between 0.0 and 1.0, got {}",
                    self.temperature
                ),
                Some("temperature".to_string()),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(Error::validation(
                "model must not be empty",
                Some("model".to_string()),
            ));
        }
        url::Url::parse(&self.api_url)?;
        url::Url::parse(&self.aem_host)?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_temperature(value: &str) -> Result<f32> {
    let parsed: f32 = value.trim().parse().map_err(|_| {
        Error::config(format!(
            "temperature expects a value between 0.0 and 1.0, got {value:?}"
        ))
    })?;
    if parsed.is_finite() && (0.0..=1.0).contains(&parsed) {
        Ok(parsed)
    } else {
        Err(Error::config(format!(
            "temperature expects a value between 0.0 and 1.0, got {value:?}"
        )))
    }
}

/// Shared, updatable view of the dashboard settings.
///
/// Managers read a snapshot per request, so a change made through
/// [`SettingsHandle::update`] applies to the next request of every manager.
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<Settings>>,
}

impl SettingsHandle {
    /// Wraps settings in a shareable handle.
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Returns a snapshot of the current settings.
    pub fn get(&self) -> Settings {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Applies `f` to the settings.  The result must still validate.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Settings),
    {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut candidate = guard.clone();
        f(&mut candidate);
        candidate.validate()?;
        *guard = candidate;
        Ok(())
    }
}

impl From<Settings> for SettingsHandle {
    fn from(settings: Settings) -> Self {
        Self::new(settings)
    }
}
