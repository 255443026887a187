//! Build configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How matched component chains are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Markup a client bundle will rehydrate; the serialized state
    /// snapshot is embedded in each document.
    #[default]
    Hydrated,

    /// Plain static markup with no rehydration payload.
    StaticMarkup,
}

/// Configuration for one site build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Fallback page title for routes that declare none.
    #[serde(default)]
    pub initial_title: String,

    /// Location a failing guard reroutes to.
    #[serde(default = "default_redirect_fallback")]
    pub redirect_fallback_path: String,

    /// Render mode for every document in the build.
    #[serde(default)]
    pub render_mode: RenderMode,

    /// Whether error-class diagnostics fail the build as a whole.
    #[serde(default = "default_true")]
    pub fail_on_error: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            initial_title: String::new(),
            redirect_fallback_path: default_redirect_fallback(),
            render_mode: RenderMode::default(),
            fail_on_error: true,
        }
    }
}

impl BuildConfig {
    /// Parse a configuration fragment supplied by the host build tool.
    pub fn from_toml(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)?;
        if !config.redirect_fallback_path.starts_with('/') {
            tracing::warn!("redirect_fallback_path should be an absolute path");
        }
        Ok(config)
    }
}

// Default value functions
fn default_redirect_fallback() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}
