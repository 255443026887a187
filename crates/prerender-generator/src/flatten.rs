//! Route tree flattening.
//!
//! Produces the ordered list of concrete URL paths a route tree declares.

use prerender_core::Route;
use tracing::debug;

/// Flatten sibling route roots into the ordered list of absolute URL paths
/// they declare.
///
/// The walk is pre-order: parents before children, children in declaration
/// order. Index routes match the parent path and contribute no entry of
/// their own; redirects are discovered by the matcher when their path is
/// visited and contribute none either. Duplicate declarations are preserved
/// as-is so the caller can see them.
#[must_use]
pub fn flatten(roots: &[Route]) -> Vec<String> {
    let mut paths = Vec::new();
    for route in roots {
        flatten_into(route, "", &mut paths);
    }
    debug!(count = paths.len(), "flattened route tree");
    paths
}

fn flatten_into(route: &Route, prefix: &str, out: &mut Vec<String>) {
    match route {
        Route::Index { .. } | Route::Redirect { .. } => {}
        Route::Leaf { path, .. } => out.push(format!("{prefix}{path}")),
        Route::Branch { path, children, .. } => {
            let full = format!("{prefix}{path}");
            let next_prefix = if full == "/" {
                full.clone()
            } else {
                format!("{full}/")
            };
            out.push(full);
            for child in children {
                flatten_into(child, &next_prefix, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use prerender_core::{FnComponent, Renderable};

    use super::*;

    fn component() -> Arc<dyn Renderable> {
        Arc::new(FnComponent::new(|_ctx, children| Ok(children.to_string())))
    }

    #[test]
    fn test_flatten_nested_tree_in_declaration_order() {
        let roots = vec![Route::branch(
            "/",
            component(),
            vec![
                Route::leaf("about", component()),
                Route::branch(
                    "products",
                    component(),
                    vec![
                        Route::leaf("zephyr", component()),
                        Route::leaf("sparkles", component()),
                    ],
                ),
            ],
        )];

        assert_eq!(
            flatten(&roots),
            vec![
                "/",
                "/about",
                "/products",
                "/products/zephyr",
                "/products/sparkles",
            ],
        );
    }

    #[test]
    fn test_index_route_contributes_no_path() {
        let roots = vec![Route::branch(
            "/",
            component(),
            vec![
                Route::index(component()),
                Route::leaf("about", component()),
            ],
        )];

        assert_eq!(flatten(&roots), vec!["/", "/about"]);
    }

    #[test]
    fn test_redirects_contribute_no_path() {
        let roots = vec![Route::branch(
            "/",
            component(),
            vec![
                Route::index_redirect("about"),
                Route::redirect("abt", "about"),
                Route::leaf("about", component()),
            ],
        )];

        assert_eq!(flatten(&roots), vec!["/", "/about"]);
    }

    #[test]
    fn test_wildcard_leaf_is_flattened() {
        let roots = vec![Route::branch(
            "/",
            component(),
            vec![Route::leaf("*", component())],
        )];

        assert_eq!(flatten(&roots), vec!["/", "/*"]);
    }

    #[test]
    fn test_sibling_roots_share_prefix() {
        let roots = vec![
            Route::leaf("/", component()),
            Route::leaf("/standalone", component()),
        ];

        assert_eq!(flatten(&roots), vec!["/", "/standalone"]);
    }

    #[test]
    fn test_duplicates_are_preserved() {
        let roots = vec![Route::branch(
            "/",
            component(),
            vec![
                Route::leaf("about", component()),
                Route::leaf("about", component()),
            ],
        )];

        assert_eq!(flatten(&roots), vec!["/", "/about", "/about"]);
    }

    #[test]
    fn test_empty_tree_yields_empty_list() {
        assert!(flatten(&[]).is_empty());
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let roots = vec![Route::branch(
            "/",
            component(),
            vec![Route::leaf("about", component())],
        )];

        assert_eq!(flatten(&roots), flatten(&roots));
    }
}
