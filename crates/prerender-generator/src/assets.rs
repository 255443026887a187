//! Asset keys and the asset manifest.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Given a URL path, return the HTML filename its document is written to.
///
/// Ex: `/` -> `index.html`
/// Ex: `/about` -> `about.html`
/// Ex: `/about/team/` -> `about/team/index.html`
/// Ex: `/*` -> `404.html` (the conventional not-found route)
///
/// The key never carries a leading slash: output sinks want
/// `path/to/file.html`, not `/path/to/file.html`. Total over any string
/// input; the degenerate cases all land on `index.html`.
#[must_use]
pub fn asset_key(path: &str) -> String {
    if let Some(stripped) = path.strip_suffix('/') {
        let dirname = stripped.trim_start_matches('/');
        return if dirname.is_empty() {
            "index.html".to_string()
        } else {
            format!("{dirname}/index.html")
        };
    }

    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return "index.html".to_string();
    }

    let (dirname, basename) = match trimmed.rsplit_once('/') {
        Some((dirname, basename)) => (dirname, basename),
        None => ("", trimmed),
    };
    let filename = if basename == "*" {
        "404.html".to_string()
    } else {
        format!("{basename}.html")
    };

    if dirname.is_empty() {
        filename
    } else {
        format!("{dirname}/{filename}")
    }
}

/// Mapping from logical asset name to the actual (possibly content-hashed)
/// filename emitted by the host build tool.
///
/// Templates reference assets by logical name; the manifest substitutes the
/// hashed filename so documents point at the right bundle and stylesheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetManifest {
    assets: HashMap<String, String>,
}

impl AssetManifest {
    /// Create a new empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset to the manifest.
    pub fn add(&mut self, logical: impl Into<String>, actual: impl Into<String>) {
        self.assets.insert(logical.into(), actual.into());
    }

    /// Get the actual filename for a logical asset name.
    #[must_use]
    pub fn get(&self, logical: &str) -> Option<&str> {
        self.assets.get(logical).map(String::as_str)
    }

    /// Resolve a logical name, falling back to the name itself when the
    /// manifest has no entry (identity mapping).
    #[must_use]
    pub fn resolve<'a>(&'a self, logical: &'a str) -> &'a str {
        self.get(logical).unwrap_or(logical)
    }

    /// Number of entries in the manifest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the manifest has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
