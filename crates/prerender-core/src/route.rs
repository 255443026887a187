//! Route tree model.
//!
//! A route tree is the compiled, evaluated declaration of the site's URL
//! structure. It is constructed once at build start, validated, and then
//! shared read-only across every per-path task for the duration of one
//! build.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::component::Renderable;
use crate::error::{CoreError, Result};

/// Error raised by a guard's `allow` implementation.
pub type GuardError = Box<dyn std::error::Error + Send + Sync>;

/// Async predicate attached to a route.
///
/// A guard that resolves to `false` reroutes the path to the configured
/// fallback location instead of rendering; a guard error is recorded as a
/// per-path diagnostic. Guards enforce their own timeouts if they need one.
#[async_trait]
pub trait Guard: Send + Sync {
    /// Decide whether `path` may render.
    async fn allow(&self, path: &str) -> std::result::Result<bool, GuardError>;
}

/// A node in the route tree.
///
/// The variant tags make the node's role explicit; exactly one of
/// {renderable component, redirect target} exists per node by construction.
pub enum Route {
    /// A non-index node that renders a page of its own and wraps its
    /// children.
    Branch {
        /// Path segment contributed to descendant paths.
        path: String,
        /// Declared page title.
        title: Option<String>,
        /// Component wrapping this subtree's rendered markup.
        component: Arc<dyn Renderable>,
        /// Optional gate evaluated before anything below renders.
        guard: Option<Arc<dyn Guard>>,
        /// Child routes, in declaration order.
        children: Vec<Route>,
    },

    /// A terminal page node.
    Leaf {
        /// Path segment contributed to the full path.
        path: String,
        /// Declared page title.
        title: Option<String>,
        /// Component rendered for this page.
        component: Arc<dyn Renderable>,
        /// Optional gate evaluated before rendering.
        guard: Option<Arc<dyn Guard>>,
    },

    /// An index route: no path segment of its own, matching the parent
    /// path exactly. Never contributes a distinct path.
    Index {
        /// Declared page title.
        title: Option<String>,
        /// Component rendered at the parent's path.
        component: Arc<dyn Renderable>,
    },

    /// Reroutes a path to another location instead of rendering.
    Redirect {
        /// Path segment this redirect answers for; `None` makes it an
        /// index redirect matching the parent path exactly.
        from: Option<String>,
        /// Target location, absolute (`/about`) or relative to the parent
        /// prefix (`about`).
        to: String,
    },
}

impl Route {
    /// Create a branch node wrapping `children`.
    #[must_use]
    pub fn branch(
        path: impl Into<String>,
        component: Arc<dyn Renderable>,
        children: Vec<Route>,
    ) -> Self {
        Self::Branch {
            path: path.into(),
            title: None,
            component,
            guard: None,
            children,
        }
    }

    /// Create a terminal page node.
    #[must_use]
    pub fn leaf(path: impl Into<String>, component: Arc<dyn Renderable>) -> Self {
        Self::Leaf {
            path: path.into(),
            title: None,
            component,
            guard: None,
        }
    }

    /// Create an index route rendered at the parent's path.
    #[must_use]
    pub fn index(component: Arc<dyn Renderable>) -> Self {
        Self::Index {
            title: None,
            component,
        }
    }

    /// Create a redirect answering for `from` under the parent prefix.
    #[must_use]
    pub fn redirect(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Redirect {
            from: Some(from.into()),
            to: to.into(),
        }
    }

    /// Create an index redirect matching the parent path exactly.
    #[must_use]
    pub fn index_redirect(to: impl Into<String>) -> Self {
        Self::Redirect {
            from: None,
            to: to.into(),
        }
    }

    /// Set the declared title. No effect on redirect nodes, which never
    /// render.
    #[must_use]
    pub fn with_title(mut self, new_title: impl Into<String>) -> Self {
        match &mut self {
            Self::Branch { title, .. } | Self::Leaf { title, .. } | Self::Index { title, .. } => {
                *title = Some(new_title.into());
            }
            Self::Redirect { .. } => {}
        }
        self
    }

    /// Attach a guard. No effect on index and redirect nodes; gate the
    /// enclosing branch instead.
    #[must_use]
    pub fn with_guard(mut self, new_guard: Arc<dyn Guard>) -> Self {
        match &mut self {
            Self::Branch { guard, .. } | Self::Leaf { guard, .. } => {
                *guard = Some(new_guard);
            }
            Self::Index { .. } | Self::Redirect { .. } => {}
        }
        self
    }

    /// Whether this node is an index route.
    #[must_use]
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index { .. })
    }

    /// Whether this node reroutes instead of rendering.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }

    /// Path segment, if the node contributes one.
    #[must_use]
    pub fn path_segment(&self) -> Option<&str> {
        match self {
            Self::Branch { path, .. } | Self::Leaf { path, .. } => Some(path),
            Self::Redirect { from, .. } => from.as_deref(),
            Self::Index { .. } => None,
        }
    }

    /// Declared title, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Branch { title, .. } | Self::Leaf { title, .. } | Self::Index { title, .. } => {
                title.as_deref()
            }
            Self::Redirect { .. } => None,
        }
    }

    fn validate(&self, at: &str) -> Result<()> {
        match self {
            Self::Branch { path, children, .. } => {
                if path.is_empty() {
                    return Err(CoreError::invalid_route(at, "empty path segment"));
                }
                let here = format!("{at}/{path}");
                for child in children {
                    child.validate(&here)?;
                }
                Ok(())
            }
            Self::Leaf { path, .. } => {
                if path.is_empty() {
                    return Err(CoreError::invalid_route(at, "empty path segment"));
                }
                Ok(())
            }
            Self::Index { .. } => Ok(()),
            Self::Redirect { from, to } => {
                if to.is_empty() {
                    return Err(CoreError::invalid_route(at, "redirect with empty target"));
                }
                if matches!(from.as_deref(), Some("")) {
                    return Err(CoreError::invalid_route(at, "redirect with empty source"));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch {
                path,
                title,
                children,
                ..
            } => f
                .debug_struct("Branch")
                .field("path", path)
                .field("title", title)
                .field("children", children)
                .finish_non_exhaustive(),
            Self::Leaf { path, title, .. } => f
                .debug_struct("Leaf")
                .field("path", path)
                .field("title", title)
                .finish_non_exhaustive(),
            Self::Index { title, .. } => f
                .debug_struct("Index")
                .field("title", title)
                .finish_non_exhaustive(),
            Self::Redirect { from, to } => f
                .debug_struct("Redirect")
                .field("from", from)
                .field("to", to)
                .finish(),
        }
    }
}

/// Compiled route input handed to the build by the host tool.
pub enum RouteModule {
    /// A route tree with one or more roots; sibling roots share the same
    /// path prefix.
    Tree(Vec<Route>),

    /// A single renderable component with no routing. The build falls back
    /// to single-document mode: exactly one output at `index.html`.
    Single(Arc<dyn Renderable>),
}

impl RouteModule {
    /// Wrap a route tree.
    #[must_use]
    pub fn tree(roots: Vec<Route>) -> Self {
        Self::Tree(roots)
    }

    /// Wrap a single root route.
    #[must_use]
    pub fn root(root: Route) -> Self {
        Self::Tree(vec![root])
    }

    /// Wrap a bare component.
    #[must_use]
    pub fn single(component: Arc<dyn Renderable>) -> Self {
        Self::Single(component)
    }

    /// Route roots; empty for a single-component module.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        match self {
            Self::Tree(roots) => roots,
            Self::Single(_) => &[],
        }
    }

    /// Check the tree for malformed nodes. Runs before flattening so a bad
    /// declaration surfaces as one construction error rather than a pile of
    /// per-path failures.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Tree(roots) => {
                for root in roots {
                    root.validate("")?;
                }
                Ok(())
            }
            Self::Single(_) => Ok(()),
        }
    }
}

impl fmt::Debug for RouteModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree(roots) => f.debug_tuple("Tree").field(roots).finish(),
            Self::Single(_) => f.write_str("Single(..)"),
        }
    }
}
