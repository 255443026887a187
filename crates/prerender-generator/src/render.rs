//! Document rendering.
//!
//! Turns one path's match outcome into a finished HTML document by folding
//! the matched component chain to markup and handing the assembled options
//! to the template function.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use prerender_core::{BuildConfig, RenderContext, RenderMode, Renderable};

use crate::assets::AssetManifest;
use crate::build::DiagnosticKind;
use crate::matcher::MatchResult;
use crate::template::TemplateFn;

/// Error raised when the template function fails for a path. A broken
/// template affects every page, so this is fatal for the whole build.
#[derive(Debug, Error)]
#[error("template failed for '{path}': {message}")]
pub struct TemplateFailure {
    /// Path whose document the template was producing.
    pub path: String,
    /// Underlying failure message.
    pub message: String,
}

/// Configuration bag handed to the template function for one document.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Page title.
    pub title: String,
    /// Rendered body markup; empty for redirect and error documents.
    pub body: String,
    /// Stylesheet href, already resolved through the manifest.
    pub stylesheet: Option<String>,
    /// Favicon href, already resolved through the manifest.
    pub favicon: Option<String>,
    /// Bundle script href, already resolved through the manifest.
    pub bundle: Option<String>,
    /// Serialized state snapshot for client-side rehydration.
    pub initial_state: Option<String>,
    /// Where the document reroutes to, for redirect documents.
    pub redirect_target: Option<String>,
}

/// A finished HTML document, keyed by its asset key in the build output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    html: String,
}

impl Document {
    fn new(html: String) -> Self {
        Self { html }
    }

    /// Document contents.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.html
    }

    /// Content length in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.html.len()
    }
}

/// Per-path outcome of rendering.
#[derive(Debug)]
pub enum RenderOutcome {
    /// A finished document, possibly with a non-fatal diagnostic attached
    /// (redirect encountered, or a component failure that emptied the
    /// body).
    Document {
        /// The document to write.
        document: Document,
        /// Diagnostic recorded alongside the document, if any.
        diagnostic: Option<DiagnosticKind>,
    },

    /// No document for this path; only a diagnostic.
    Skipped {
        /// Why the path produced nothing.
        diagnostic: DiagnosticKind,
    },

    /// The template function failed. Fatal for the whole build.
    TemplateFailure(TemplateFailure),
}

/// Renders matched chains into documents. Created once per build and
/// shared read-only across every concurrent per-path task.
pub struct DocumentRenderer {
    template: TemplateFn,
    config: BuildConfig,
    manifest: AssetManifest,
    stylesheet: Option<String>,
    favicon: Option<String>,
    bundle: Option<String>,
    state: Option<Value>,
    state_json: Option<String>,
}

impl DocumentRenderer {
    /// Create a renderer for one build.
    #[must_use]
    pub fn new(template: TemplateFn, config: BuildConfig) -> Self {
        Self {
            template,
            config,
            manifest: AssetManifest::new(),
            stylesheet: None,
            favicon: None,
            bundle: None,
            state: None,
            state_json: None,
        }
    }

    /// Set the asset manifest used to resolve hrefs.
    #[must_use]
    pub fn with_manifest(mut self, manifest: AssetManifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Set the logical stylesheet name.
    #[must_use]
    pub fn with_stylesheet(mut self, href: impl Into<String>) -> Self {
        self.stylesheet = Some(href.into());
        self
    }

    /// Set the logical favicon name.
    #[must_use]
    pub fn with_favicon(mut self, href: impl Into<String>) -> Self {
        self.favicon = Some(href.into());
        self
    }

    /// Set the logical bundle script name.
    #[must_use]
    pub fn with_bundle(mut self, href: impl Into<String>) -> Self {
        self.bundle = Some(href.into());
        self
    }

    /// Attach the shared state snapshot taken at build start.
    #[must_use]
    pub fn with_state(mut self, snapshot: Value) -> Self {
        // Serializing a `Value` has no failure mode: object keys are
        // always strings.
        self.state_json = serde_json::to_string(&snapshot).ok();
        self.state = Some(snapshot);
        self
    }

    /// Render the outcome of matching `path` into a per-path outcome.
    #[must_use]
    pub fn render(&self, result: MatchResult, path: &str) -> RenderOutcome {
        match result {
            MatchResult::Rendered { chain, title } => {
                let title = title.unwrap_or_else(|| self.config.initial_title.clone());
                let mut ctx = RenderContext::new(path, self.config.render_mode);
                if let Some(state) = &self.state {
                    ctx = ctx.with_state(state);
                }

                // Fold leaf-outward so ancestors wrap their descendants'
                // markup, mirroring the tree's nesting.
                let mut body = String::new();
                let mut failure = None;
                for entry in chain.iter().rev() {
                    match entry.component.render(&ctx, &body) {
                        Ok(markup) => body = markup,
                        Err(err) => {
                            warn!(path, error = %err, "component render failed");
                            failure = Some(err.to_string());
                            body = String::new();
                            break;
                        }
                    }
                }

                let options = self.options(title, body, None);
                match self.apply_template(&options, path) {
                    Ok(document) => RenderOutcome::Document {
                        document,
                        diagnostic: failure.map(|message| DiagnosticKind::RenderError { message }),
                    },
                    Err(failure) => RenderOutcome::TemplateFailure(failure),
                }
            }

            MatchResult::Redirected { target } => {
                debug!(path, target = %target, "emitting redirect document");
                let options = self.options(
                    self.config.initial_title.clone(),
                    String::new(),
                    Some(target.clone()),
                );
                match self.apply_template(&options, path) {
                    Ok(document) => RenderOutcome::Document {
                        document,
                        diagnostic: Some(DiagnosticKind::Redirect { target }),
                    },
                    Err(failure) => RenderOutcome::TemplateFailure(failure),
                }
            }

            MatchResult::NotFound => RenderOutcome::Skipped {
                diagnostic: DiagnosticKind::NotFound,
            },

            MatchResult::Error { cause } => RenderOutcome::Skipped {
                diagnostic: DiagnosticKind::MatchError {
                    message: cause.to_string(),
                },
            },
        }
    }

    /// Render a bare component outside any route tree (single-document
    /// mode). The title comes from the component's static title, then the
    /// configured default.
    pub fn render_single(
        &self,
        component: &dyn Renderable,
    ) -> Result<(Document, Option<DiagnosticKind>), TemplateFailure> {
        let title = component
            .title()
            .map(str::to_string)
            .unwrap_or_else(|| self.config.initial_title.clone());

        let mut ctx = RenderContext::new("/", self.config.render_mode);
        if let Some(state) = &self.state {
            ctx = ctx.with_state(state);
        }

        let (body, failure) = match component.render(&ctx, "") {
            Ok(markup) => (markup, None),
            Err(err) => {
                warn!(error = %err, "single component render failed");
                (String::new(), Some(err.to_string()))
            }
        };

        let options = self.options(title, body, None);
        let document = self.apply_template(&options, "/")?;
        Ok((
            document,
            failure.map(|message| DiagnosticKind::RenderError { message }),
        ))
    }

    fn options(
        &self,
        title: String,
        body: String,
        redirect_target: Option<String>,
    ) -> RenderOptions {
        let resolve = |href: &Option<String>| {
            href.as_deref()
                .map(|logical| self.manifest.resolve(logical).to_string())
        };

        // Static markup carries no rehydration payload.
        let initial_state = match self.config.render_mode {
            RenderMode::Hydrated => self.state_json.clone(),
            RenderMode::StaticMarkup => None,
        };

        RenderOptions {
            title,
            body,
            stylesheet: resolve(&self.stylesheet),
            favicon: resolve(&self.favicon),
            bundle: resolve(&self.bundle),
            initial_state,
            redirect_target,
        }
    }

    fn apply_template(
        &self,
        options: &RenderOptions,
        path: &str,
    ) -> Result<Document, TemplateFailure> {
        (self.template)(options)
            .map(Document::new)
            .map_err(|err| TemplateFailure {
                path: path.to_string(),
                message: err.to_string(),
            })
    }
}
