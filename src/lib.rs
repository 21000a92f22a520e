// Public modules
pub mod aem;
pub mod chat;
pub mod client;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod file;
pub mod image;
pub mod observability;
pub mod preview;
pub mod render;
pub mod types;
pub mod utils;

// Re-exports
pub use client::ApiClient;
pub use config::{Settings, SettingsHandle};
pub use dashboard::{AemWorkspace, Dashboard, View};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use types::*;
