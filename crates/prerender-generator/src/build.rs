//! Build orchestration.
//!
//! Ties the flattener, matcher and renderer together for one site build:
//! flatten once, fan out every path concurrently, converge into the
//! asset-key → document mapping plus an ordered diagnostics list.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use prerender_core::{BuildConfig, CoreError, Renderable, RouteModule, StateStore};

use crate::assets::{AssetManifest, asset_key};
use crate::flatten::flatten;
use crate::matcher::match_path;
use crate::render::{Document, DocumentRenderer, RenderOutcome, TemplateFailure};
use crate::template::TemplateFn;

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid build input, reported before any path is processed.
    #[error(transparent)]
    Construction(#[from] CoreError),

    /// The template function failed. A broken template affects every page,
    /// so the build aborts instead of skipping.
    #[error(transparent)]
    Template(#[from] TemplateFailure),

    /// Error-class diagnostics under zero-tolerance configuration.
    #[error("build failed with {errors} error diagnostic(s)")]
    Failed {
        /// Number of error-class diagnostics.
        errors: usize,
        /// All per-path diagnostics, in flatten order.
        diagnostics: Vec<Diagnostic>,
    },
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Why a path produced no ordinary document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The path rerouted; a redirect document was emitted instead.
    Redirect {
        /// Absolute location the path reroutes to.
        target: String,
    },

    /// No route matched the path.
    NotFound,

    /// Guard evaluation or route resolution failed.
    MatchError {
        /// Underlying failure message.
        message: String,
    },

    /// Component rendering failed; the document body defaulted to empty.
    RenderError {
        /// Underlying failure message.
        message: String,
    },

    /// Skipped after fail-fast cancellation.
    Cancelled,
}

impl DiagnosticKind {
    /// Whether this diagnostic counts against `fail_on_error`.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::MatchError { .. } | Self::RenderError { .. })
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redirect { target } => write!(f, "redirected to {target}"),
            Self::NotFound => f.write_str("no matching route"),
            Self::MatchError { message } => write!(f, "match error: {message}"),
            Self::RenderError { message } => write!(f, "render error: {message}"),
            Self::Cancelled => f.write_str("cancelled after earlier failure"),
        }
    }
}

/// Per-path record enumerated in the build output, in flatten order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The path this record is about.
    pub path: String,
    /// What happened.
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// Whether this diagnostic counts against `fail_on_error`.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind.is_error()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of paths the flattener produced.
    pub paths: usize,

    /// Number of documents in the output mapping.
    pub documents: usize,

    /// Number of redirect documents among them.
    pub redirects: usize,

    /// Number of paths with no matching route.
    pub not_found: usize,

    /// Number of error-class diagnostics.
    pub errors: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Result of one site build.
#[derive(Debug, Default)]
pub struct BuildOutput {
    /// Asset key → finished document. A pure map: completion order of the
    /// per-path tasks never changes its content.
    pub assets: BTreeMap<String, Document>,

    /// Per-path diagnostics, in flatten order.
    pub diagnostics: Vec<Diagnostic>,

    /// Statistics for the build.
    pub stats: BuildStats,
}

/// Site build orchestrator.
///
/// Owns the compiled inputs for one build: the route module, the template
/// function (callable by construction), the optional state store and asset
/// manifest, and the build configuration. The route tree and state
/// snapshot are shared read-only across every per-path task; mutating the
/// store while a build runs leaves the output in an unspecified mix of old
/// and new state.
pub struct SiteBuilder {
    module: Arc<RouteModule>,
    template: TemplateFn,
    config: BuildConfig,
    manifest: AssetManifest,
    store: Option<Arc<dyn StateStore>>,
    stylesheet: Option<String>,
    favicon: Option<String>,
    bundle: Option<String>,
}

impl SiteBuilder {
    /// Create a builder for one site build.
    #[must_use]
    pub fn new(module: RouteModule, template: TemplateFn) -> Self {
        Self {
            module: Arc::new(module),
            template,
            config: BuildConfig::default(),
            manifest: AssetManifest::new(),
            store: None,
            stylesheet: None,
            favicon: None,
            bundle: None,
        }
    }

    /// Set the build configuration.
    #[must_use]
    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the asset manifest used to resolve hrefs.
    #[must_use]
    pub fn with_manifest(mut self, manifest: AssetManifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Attach the shared state store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
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

    /// Execute the build.
    ///
    /// Per path: `Pending → Matching → {Rendering | Skipped(NotFound) |
    /// Skipped(Redirected)} → Done`, with every path independent of its
    /// siblings. One path's failure never cancels work already in flight;
    /// under `fail_on_error` it stops paths that have not started yet.
    pub async fn build(&self) -> Result<BuildOutput> {
        let start = Instant::now();
        self.module.validate()?;

        let renderer = Arc::new(self.renderer());

        let mut output = match self.module.as_ref() {
            RouteModule::Single(component) => {
                info!("no route tree supplied, rendering as single document");
                self.build_single(component.as_ref(), &renderer)?
            }
            RouteModule::Tree(roots) => {
                let paths = flatten(roots);
                info!(paths = paths.len(), "starting build");
                self.build_tree(paths, &renderer).await?
            }
        };

        output.stats.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            documents = output.stats.documents,
            redirects = output.stats.redirects,
            not_found = output.stats.not_found,
            errors = output.stats.errors,
            duration_ms = output.stats.duration_ms,
            "build complete"
        );

        if self.config.fail_on_error && output.stats.errors > 0 {
            return Err(BuildError::Failed {
                errors: output.stats.errors,
                diagnostics: output.diagnostics,
            });
        }
        Ok(output)
    }

    fn renderer(&self) -> DocumentRenderer {
        let mut renderer = DocumentRenderer::new(self.template.clone(), self.config.clone())
            .with_manifest(self.manifest.clone());
        if let Some(stylesheet) = &self.stylesheet {
            renderer = renderer.with_stylesheet(stylesheet.clone());
        }
        if let Some(favicon) = &self.favicon {
            renderer = renderer.with_favicon(favicon.clone());
        }
        if let Some(bundle) = &self.bundle {
            renderer = renderer.with_bundle(bundle.clone());
        }
        if let Some(store) = &self.store {
            renderer = renderer.with_state(store.snapshot());
        }
        renderer
    }

    fn build_single(
        &self,
        component: &dyn Renderable,
        renderer: &DocumentRenderer,
    ) -> Result<BuildOutput> {
        let mut output = BuildOutput::default();
        output.stats.paths = 1;

        let (document, diagnostic) = renderer.render_single(component)?;
        output.stats.documents = 1;
        if let Some(kind) = diagnostic {
            warn!(path = "/", %kind, "diagnostic");
            output.stats.errors += usize::from(kind.is_error());
            output.diagnostics.push(Diagnostic {
                path: "/".to_string(),
                kind,
            });
        }
        output.assets.insert("index.html".to_string(), document);
        Ok(output)
    }

    async fn build_tree(
        &self,
        paths: Vec<String>,
        renderer: &Arc<DocumentRenderer>,
    ) -> Result<BuildOutput> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut set: JoinSet<(usize, RenderOutcome)> = JoinSet::new();
        let mut task_index = HashMap::new();

        for (idx, path) in paths.iter().enumerate() {
            let module = Arc::clone(&self.module);
            let renderer = Arc::clone(renderer);
            let cancelled = Arc::clone(&cancelled);
            let fallback = self.config.redirect_fallback_path.clone();
            let path = path.clone();

            let handle = set.spawn(async move {
                if cancelled.load(Ordering::Relaxed) {
                    return (
                        idx,
                        RenderOutcome::Skipped {
                            diagnostic: DiagnosticKind::Cancelled,
                        },
                    );
                }
                let result = match_path(module.routes(), &path, &fallback).await;
                (idx, renderer.render(result, &path))
            });
            task_index.insert(handle.id(), idx);
        }

        let mut slots: Vec<Option<RenderOutcome>> = Vec::with_capacity(paths.len());
        slots.resize_with(paths.len(), || None);

        while let Some(joined) = set.join_next_with_id().await {
            match joined {
                Ok((_, (idx, outcome))) => {
                    if outcome_is_fatal(&outcome)
                        || (self.config.fail_on_error && outcome_is_error(&outcome))
                    {
                        cancelled.store(true, Ordering::Relaxed);
                    }
                    slots[idx] = Some(outcome);
                }
                Err(join_error) => {
                    // A panicking guard or component takes down its own
                    // task only; record it like any other per-path error.
                    if self.config.fail_on_error {
                        cancelled.store(true, Ordering::Relaxed);
                    }
                    if let Some(&idx) = task_index.get(&join_error.id()) {
                        slots[idx] = Some(RenderOutcome::Skipped {
                            diagnostic: DiagnosticKind::MatchError {
                                message: join_error.to_string(),
                            },
                        });
                    }
                }
            }
        }

        self.collect(paths, slots)
    }

    /// Converge per-path outcomes, in flatten order, into the final
    /// mapping. Ordered so logs and diagnostics are deterministic no
    /// matter how completion interleaved.
    fn collect(&self, paths: Vec<String>, slots: Vec<Option<RenderOutcome>>) -> Result<BuildOutput> {
        let mut output = BuildOutput::default();
        output.stats.paths = paths.len();
        let mut fatal: Option<TemplateFailure> = None;

        for (path, slot) in paths.into_iter().zip(slots) {
            let Some(outcome) = slot else { continue };
            match outcome {
                RenderOutcome::TemplateFailure(failure) => {
                    if fatal.is_none() {
                        fatal = Some(failure);
                    }
                }
                RenderOutcome::Document {
                    document,
                    diagnostic,
                } => {
                    let key = asset_key(&path);
                    debug!(path = %path, key = %key, size = document.size(), "document ready");
                    output.stats.documents += 1;
                    if let Some(kind) = diagnostic {
                        warn!(path = %path, %kind, "diagnostic");
                        output.stats.redirects +=
                            usize::from(matches!(kind, DiagnosticKind::Redirect { .. }));
                        output.stats.errors += usize::from(kind.is_error());
                        output.diagnostics.push(Diagnostic { path, kind });
                    }
                    output.assets.insert(key, document);
                }
                RenderOutcome::Skipped { diagnostic } => {
                    warn!(path = %path, kind = %diagnostic, "skipped path");
                    output.stats.not_found +=
                        usize::from(matches!(diagnostic, DiagnosticKind::NotFound));
                    output.stats.errors += usize::from(diagnostic.is_error());
                    output.diagnostics.push(Diagnostic {
                        path,
                        kind: diagnostic,
                    });
                }
            }
        }

        match fatal {
            Some(failure) => Err(failure.into()),
            None => Ok(output),
        }
    }
}

fn outcome_is_fatal(outcome: &RenderOutcome) -> bool {
    matches!(outcome, RenderOutcome::TemplateFailure(_))
}

fn outcome_is_error(outcome: &RenderOutcome) -> bool {
    match outcome {
        RenderOutcome::Document { diagnostic, .. } => {
            diagnostic.as_ref().is_some_and(DiagnosticKind::is_error)
        }
        RenderOutcome::Skipped { diagnostic } => diagnostic.is_error(),
        RenderOutcome::TemplateFailure(_) => true,
    }
}
