//! Renderable components and shared application state.
//!
//! Components are opaque, already-compiled units handed to the build by the
//! host tool. Rendering is static markup only: a pure function of the
//! component tree to a string, with no client-side event wiring.

use serde_json::Value;

use crate::config::RenderMode;

/// Error raised by a component's render implementation.
pub type ComponentError = Box<dyn std::error::Error + Send + Sync>;

/// Per-render context handed to every component.
///
/// Gives descendant components read access to the shared state snapshot and
/// the active render mode. The snapshot is read-only for the whole build;
/// mutating the underlying store while a build is running leaves the output
/// documents in an unspecified mix of old and new state.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    path: &'a str,
    mode: RenderMode,
    state: Option<&'a Value>,
}

impl<'a> RenderContext<'a> {
    /// Create a context for rendering `path`.
    #[must_use]
    pub fn new(path: &'a str, mode: RenderMode) -> Self {
        Self {
            path,
            mode,
            state: None,
        }
    }

    /// Attach the shared state snapshot.
    #[must_use]
    pub fn with_state(mut self, state: &'a Value) -> Self {
        self.state = Some(state);
        self
    }

    /// The URL path being rendered.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path
    }

    /// The active render mode.
    #[must_use]
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Shared state snapshot, if a store was supplied to the build.
    #[must_use]
    pub fn state(&self) -> Option<&Value> {
        self.state
    }
}

/// A renderable unit associated with a route.
pub trait Renderable: Send + Sync {
    /// Render this component to markup.
    ///
    /// `children` holds the already-rendered markup of descendant routes;
    /// leaf components receive the empty string. Ancestors are expected to
    /// embed `children` somewhere in their own markup so the rendered
    /// document mirrors the route tree's nesting.
    fn render(
        &self,
        ctx: &RenderContext<'_>,
        children: &str,
    ) -> std::result::Result<String, ComponentError>;

    /// Static title, used when the component is rendered outside a route
    /// tree (single-document mode).
    fn title(&self) -> Option<&str> {
        None
    }
}

/// Adapter turning a plain closure into a [`Renderable`].
pub struct FnComponent<F> {
    render: F,
    title: Option<String>,
}

impl<F> FnComponent<F>
where
    F: Fn(&RenderContext<'_>, &str) -> std::result::Result<String, ComponentError> + Send + Sync,
{
    /// Wrap a render closure.
    #[must_use]
    pub fn new(render: F) -> Self {
        Self {
            render,
            title: None,
        }
    }

    /// Set the static title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl<F> Renderable for FnComponent<F>
where
    F: Fn(&RenderContext<'_>, &str) -> std::result::Result<String, ComponentError> + Send + Sync,
{
    fn render(
        &self,
        ctx: &RenderContext<'_>,
        children: &str,
    ) -> std::result::Result<String, ComponentError> {
        (self.render)(ctx, children)
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// Shared application state supplied by the host build tool.
///
/// The orchestrator takes one snapshot at build start and exposes it
/// read-only to every concurrent render.
pub trait StateStore: Send + Sync {
    /// Current state snapshot.
    fn snapshot(&self) -> Value;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_fn_component_renders_children() {
        let component = FnComponent::new(|_ctx, children| {
            Ok(format!("<main>{children}</main>"))
        });
        let ctx = RenderContext::new("/", RenderMode::StaticMarkup);

        let markup = component.render(&ctx, "<p>inner</p>").unwrap();
        assert_eq!(markup, "<main><p>inner</p></main>");
    }

    #[test]
    fn test_fn_component_title() {
        let component = FnComponent::new(|_ctx, _children| Ok(String::new()));
        assert!(component.title().is_none());

        let titled = FnComponent::new(|_ctx, _children| Ok(String::new()))
            .with_title("Landing");
        assert_eq!(titled.title(), Some("Landing"));
    }

    #[test]
    fn test_render_context_state_access() {
        let state = json!({ "count": 3 });
        let ctx = RenderContext::new("/counter", RenderMode::Hydrated).with_state(&state);

        assert_eq!(ctx.path(), "/counter");
        assert_eq!(ctx.mode(), RenderMode::Hydrated);
        assert_eq!(ctx.state().unwrap()["count"], 3);
    }

    #[test]
    fn test_render_context_without_state() {
        let ctx = RenderContext::new("/", RenderMode::Hydrated);
        assert!(ctx.state().is_none());
    }
}
