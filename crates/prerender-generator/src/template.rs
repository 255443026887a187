//! Template function layer.
//!
//! A template is an opaque, synchronous function from assembled
//! [`RenderOptions`] to a complete HTML document string. Hosts hand in
//! their own compiled template; [`default_template`] is used when they
//! don't. The default builds its document by plain string assembly rather
//! than a template engine.

use std::fmt::Write as _;
use std::sync::Arc;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::render::RenderOptions;

/// Error raised by a template function.
pub type TemplateError = Box<dyn std::error::Error + Send + Sync>;

/// Compiled template function supplied by the host build tool.
///
/// Contract: a pure, synchronous function from options to a full HTML
/// document string. Must not suspend; the build invokes it inline once
/// per path.
pub type TemplateFn =
    Arc<dyn Fn(&RenderOptions) -> Result<String, TemplateError> + Send + Sync>;

/// Built-in document template.
///
/// Emits a doctype, standard metas, the title, conditional favicon and
/// stylesheet links, a `#root` element wrapping the rendered body, and the
/// bundle script tag. When a serialized state snapshot is present it is
/// embedded as `window.__INITIAL_STATE__` for client-side rehydration.
/// When a redirect target is present the document carries a meta refresh
/// plus a human-readable link instead of a body.
#[must_use]
pub fn default_template() -> TemplateFn {
    Arc::new(|options: &RenderOptions| {
        let mut doc = String::with_capacity(512 + options.body.len());

        doc.push_str("<!doctype html><html lang=\"en\"><head>");
        doc.push_str("<meta charset=\"utf-8\">");
        doc.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, minimum-scale=1.0\">",
        );
        let _ = write!(doc, "<title>{}</title>", encode_text(&options.title));

        if let Some(favicon) = &options.favicon {
            let _ = write!(
                doc,
                "<link rel=\"shortcut icon\" href=\"{}\">",
                encode_double_quoted_attribute(favicon)
            );
        }
        if let Some(stylesheet) = &options.stylesheet {
            let _ = write!(
                doc,
                "<link rel=\"stylesheet\" href=\"{}\">",
                encode_double_quoted_attribute(stylesheet)
            );
        }
        if let Some(target) = &options.redirect_target {
            let _ = write!(
                doc,
                "<meta http-equiv=\"refresh\" content=\"0; url={}\">",
                encode_double_quoted_attribute(target)
            );
        }
        if let Some(state) = &options.initial_state {
            // A literal "</script>" inside the payload would terminate the
            // tag early.
            let state = state.replace('<', "\\u003c");
            let _ = write!(doc, "<script>window.__INITIAL_STATE__ = {state}</script>");
        }

        doc.push_str("</head><body>");
        if let Some(target) = &options.redirect_target {
            let _ = write!(
                doc,
                "<p>Redirecting to <a href=\"{}\">{}</a></p>",
                encode_double_quoted_attribute(target),
                encode_text(target)
            );
        } else {
            let _ = write!(doc, "<div id=\"root\">{}</div>", options.body);
        }
        if let Some(bundle) = &options.bundle {
            let _ = write!(
                doc,
                "<script src=\"{}\"></script>",
                encode_double_quoted_attribute(bundle)
            );
        }
        doc.push_str("</body></html>");

        Ok(doc)
    })
}
