//! Prerender Generator Library
//!
//! Static document generation pipeline: flattens a compiled route tree
//! into concrete URL paths, matches and renders each path, and converges
//! the results into an asset-key → document mapping.
//!
//! # Modules
//!
//! - [`flatten`] - Route tree flattening into concrete URL paths
//! - [`assets`] - Asset key mapping and the asset manifest
//! - [`matcher`] - Path resolution against the route tree
//! - [`render`] - Document rendering through the template function
//! - [`template`] - Template function type and built-in default
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod flatten;
pub mod matcher;
pub mod render;
pub mod template;

pub use assets::{AssetManifest, asset_key};
pub use build::{BuildError, BuildOutput, BuildStats, Diagnostic, DiagnosticKind, SiteBuilder};
pub use flatten::flatten;
pub use matcher::{ChainEntry, MatchResult, match_path};
pub use render::{Document, DocumentRenderer, RenderOptions, RenderOutcome, TemplateFailure};
pub use template::{TemplateError, TemplateFn, default_template};
