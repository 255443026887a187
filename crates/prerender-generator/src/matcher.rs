//! Route matching.
//!
//! Resolves one concrete URL path against the route tree. Paths are
//! compared by exact string equality on the accumulated prefix, using the
//! same prefixing rule as the flattener. The two definitions of "valid
//! path" must stay in lockstep: whatever the flattener produces the
//! matcher can re-resolve.

use std::fmt;
use std::sync::Arc;

use prerender_core::{Guard, GuardError, Renderable, Route};
use tracing::debug;

/// One resolved link in a matched route chain, root first.
#[derive(Clone)]
pub struct ChainEntry {
    /// Declared title of the route.
    pub title: Option<String>,
    /// Component rendered for this link.
    pub component: Arc<dyn Renderable>,
    /// Guard gating this link and everything below it.
    pub guard: Option<Arc<dyn Guard>>,
}

impl ChainEntry {
    fn new(
        title: Option<&String>,
        component: &Arc<dyn Renderable>,
        guard: Option<&Arc<dyn Guard>>,
    ) -> Self {
        Self {
            title: title.cloned(),
            component: Arc::clone(component),
            guard: guard.map(Arc::clone),
        }
    }
}

impl fmt::Debug for ChainEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainEntry")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

/// Outcome of resolving one concrete path against the route tree.
#[derive(Debug)]
pub enum MatchResult {
    /// The path resolved to a chain of routes. The page title is the
    /// leaf's own declared title; the last element in the chain wins.
    Rendered {
        /// Matched routes, root to leaf.
        chain: Vec<ChainEntry>,
        /// Leaf title, absent when the leaf declares none.
        title: Option<String>,
    },

    /// A redirect node or a failing guard rerouted the path.
    Redirected {
        /// Absolute location the path reroutes to.
        target: String,
    },

    /// No route's accumulated path equals the requested path.
    NotFound,

    /// Guard evaluation failed while matching.
    Error {
        /// The underlying guard failure.
        cause: GuardError,
    },
}

/// Resolve `path` against the route tree.
///
/// Chain resolution itself is a pure tree walk; guards on the resolved
/// chain are then evaluated root to leaf, so a failing gate high in the
/// tree short-circuits before any descendant guard runs. `fallback` is the
/// location a failing guard reroutes to.
pub async fn match_path(roots: &[Route], path: &str, fallback: &str) -> MatchResult {
    let mut chain = Vec::new();
    match resolve_level(roots, "", path, &mut chain) {
        None => {
            debug!(path, "no route matched");
            MatchResult::NotFound
        }
        Some(Resolution::Redirect(target)) => {
            debug!(path, target = %target, "matched redirect");
            MatchResult::Redirected { target }
        }
        Some(Resolution::Chain(chain)) => {
            for entry in &chain {
                let Some(guard) = &entry.guard else { continue };
                match guard.allow(path).await {
                    Ok(true) => {}
                    Ok(false) => {
                        debug!(path, fallback, "guard rejected path");
                        return MatchResult::Redirected {
                            target: fallback.to_string(),
                        };
                    }
                    Err(cause) => return MatchResult::Error { cause },
                }
            }
            let title = chain.last().and_then(|entry| entry.title.clone());
            MatchResult::Rendered { chain, title }
        }
    }
}

enum Resolution {
    Chain(Vec<ChainEntry>),
    Redirect(String),
}

/// Resolve a redirect target: absolute targets pass through, relative ones
/// resolve against the prefix of the level the redirect is declared at.
fn absolutize(to: &str, prefix: &str) -> String {
    if to.starts_with('/') {
        to.to_string()
    } else {
        format!("{prefix}{to}")
    }
}

fn resolve_level(
    routes: &[Route],
    prefix: &str,
    target: &str,
    chain: &mut Vec<ChainEntry>,
) -> Option<Resolution> {
    for route in routes {
        match route {
            // Index routes and index redirects answer for the enclosing
            // branch's own path; the branch arm below consults them.
            Route::Index { .. } | Route::Redirect { from: None, .. } => {}

            Route::Redirect {
                from: Some(segment),
                to,
            } => {
                if format!("{prefix}{segment}") == target {
                    return Some(Resolution::Redirect(absolutize(to, prefix)));
                }
            }

            Route::Leaf {
                path,
                title,
                component,
                guard,
            } => {
                if format!("{prefix}{path}") == target {
                    chain.push(ChainEntry::new(title.as_ref(), component, guard.as_ref()));
                    return Some(Resolution::Chain(chain.clone()));
                }
            }

            Route::Branch {
                path,
                title,
                component,
                guard,
                children,
            } => {
                let full = format!("{prefix}{path}");
                let next_prefix = if full == "/" {
                    full.clone()
                } else {
                    format!("{full}/")
                };
                chain.push(ChainEntry::new(title.as_ref(), component, guard.as_ref()));

                if full == target {
                    // The branch's own path: the first index child (or
                    // index redirect) declared wins; otherwise the branch
                    // itself is the leaf of the chain.
                    for child in children {
                        match child {
                            Route::Redirect { from: None, to } => {
                                return Some(Resolution::Redirect(absolutize(to, &next_prefix)));
                            }
                            Route::Index { title, component } => {
                                chain.push(ChainEntry::new(title.as_ref(), component, None));
                                return Some(Resolution::Chain(chain.clone()));
                            }
                            _ => {}
                        }
                    }
                    return Some(Resolution::Chain(chain.clone()));
                }

                if let Some(resolution) = resolve_level(children, &next_prefix, target, chain) {
                    return Some(resolution);
                }
                chain.pop();
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use prerender_core::FnComponent;

    use super::*;

    fn component(tag: &str) -> Arc<dyn Renderable> {
        let tag = tag.to_string();
        Arc::new(FnComponent::new(move |_ctx, children| {
            Ok(format!("<{tag}>{children}</{tag}>"))
        }))
    }

    struct StaticGuard(bool);

    #[async_trait]
    impl Guard for StaticGuard {
        async fn allow(&self, _path: &str) -> Result<bool, GuardError> {
            Ok(self.0)
        }
    }

    struct FailingGuard;

    #[async_trait]
    impl Guard for FailingGuard {
        async fn allow(&self, _path: &str) -> Result<bool, GuardError> {
            Err("token service unavailable".into())
        }
    }

    /// Guard that counts evaluations, for short-circuit assertions.
    struct CountingGuard {
        calls: Arc<AtomicUsize>,
        verdict: bool,
    }

    #[async_trait]
    impl Guard for CountingGuard {
        async fn allow(&self, _path: &str) -> Result<bool, GuardError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.verdict)
        }
    }

    fn sample_tree() -> Vec<Route> {
        vec![Route::branch(
            "/",
            component("layout"),
            vec![
                Route::index(component("home")).with_title("Home"),
                Route::leaf("about", component("about")).with_title("About"),
                Route::branch(
                    "products",
                    component("products"),
                    vec![Route::leaf("zephyr", component("zephyr")).with_title("Zephyr")],
                )
                .with_title("Products"),
            ],
        )
        .with_title("App")]
    }

    #[tokio::test]
    async fn test_match_nested_leaf() {
        let result = match_path(&sample_tree(), "/products/zephyr", "/").await;
        let MatchResult::Rendered { chain, title } = result else {
            panic!("expected Rendered");
        };
        assert_eq!(chain.len(), 3);
        assert_eq!(title.as_deref(), Some("Zephyr"));
        assert_eq!(chain[0].title.as_deref(), Some("App"));
    }

    #[tokio::test]
    async fn test_match_branch_path_completes_with_index_child() {
        let result = match_path(&sample_tree(), "/", "/").await;
        let MatchResult::Rendered { chain, title } = result else {
            panic!("expected Rendered");
        };
        // Layout wraps the index component.
        assert_eq!(chain.len(), 2);
        assert_eq!(title.as_deref(), Some("Home"));
    }

    #[tokio::test]
    async fn test_match_branch_path_without_index_child() {
        let result = match_path(&sample_tree(), "/products", "/").await;
        let MatchResult::Rendered { chain, title } = result else {
            panic!("expected Rendered");
        };
        assert_eq!(chain.len(), 2);
        assert_eq!(title.as_deref(), Some("Products"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let result = match_path(&sample_tree(), "/nope", "/").await;
        assert!(matches!(result, MatchResult::NotFound));
    }

    #[tokio::test]
    async fn test_redirect_node_with_relative_target() {
        let roots = vec![Route::branch(
            "/",
            component("layout"),
            vec![
                Route::redirect("abt", "about"),
                Route::leaf("about", component("about")),
            ],
        )];

        let result = match_path(&roots, "/abt", "/").await;
        let MatchResult::Redirected { target } = result else {
            panic!("expected Redirected");
        };
        assert_eq!(target, "/about");
    }

    #[tokio::test]
    async fn test_index_redirect_answers_for_branch_path() {
        let roots = vec![Route::branch(
            "/",
            component("layout"),
            vec![
                Route::index_redirect("about"),
                Route::leaf("about", component("about")),
            ],
        )];

        let result = match_path(&roots, "/", "/").await;
        let MatchResult::Redirected { target } = result else {
            panic!("expected Redirected");
        };
        assert_eq!(target, "/about");
    }

    #[tokio::test]
    async fn test_failing_guard_redirects_to_fallback() {
        let roots = vec![Route::branch(
            "/",
            component("layout"),
            vec![
                Route::leaf("private", component("private"))
                    .with_guard(Arc::new(StaticGuard(false))),
            ],
        )];

        let result = match_path(&roots, "/private", "/login").await;
        let MatchResult::Redirected { target } = result else {
            panic!("expected Redirected");
        };
        assert_eq!(target, "/login");
    }

    #[tokio::test]
    async fn test_passing_guard_renders() {
        let roots = vec![Route::branch(
            "/",
            component("layout"),
            vec![
                Route::leaf("private", component("private"))
                    .with_guard(Arc::new(StaticGuard(true))),
            ],
        )];

        let result = match_path(&roots, "/private", "/login").await;
        assert!(matches!(result, MatchResult::Rendered { .. }));
    }

    #[tokio::test]
    async fn test_guard_error_is_reported() {
        let roots = vec![Route::branch(
            "/",
            component("layout"),
            vec![Route::leaf("private", component("private")).with_guard(Arc::new(FailingGuard))],
        )];

        let result = match_path(&roots, "/private", "/login").await;
        let MatchResult::Error { cause } = result else {
            panic!("expected Error");
        };
        assert!(cause.to_string().contains("token service"));
    }

    #[tokio::test]
    async fn test_ancestor_guard_short_circuits_descendants() {
        let leaf_calls = Arc::new(AtomicUsize::new(0));
        let roots = vec![Route::branch(
            "/",
            component("layout"),
            vec![Route::branch(
                "members",
                component("members"),
                vec![
                    Route::leaf("profile", component("profile")).with_guard(Arc::new(
                        CountingGuard {
                            calls: Arc::clone(&leaf_calls),
                            verdict: true,
                        },
                    )),
                ],
            )
            .with_guard(Arc::new(StaticGuard(false)))],
        )];

        let result = match_path(&roots, "/members/profile", "/login").await;
        assert!(matches!(result, MatchResult::Redirected { .. }));
        assert_eq!(leaf_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wildcard_path_matches_itself() {
        let roots = vec![Route::branch(
            "/",
            component("layout"),
            vec![Route::leaf("*", component("missing")).with_title("404: Not Found")],
        )];

        let result = match_path(&roots, "/*", "/").await;
        let MatchResult::Rendered { title, .. } = result else {
            panic!("expected Rendered");
        };
        assert_eq!(title.as_deref(), Some("404: Not Found"));
    }
}
