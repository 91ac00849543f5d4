//! Shared template fragments and placeholder substitution.
//!
//! `AssetCache` holds the fragments that template-expanding directives
//! inline into generated pages: the shared stylesheet and script plus the
//! challenge and homepage shells. Fragments are embedded at compile time
//! from `src/embed/`, so the cache is built once, passed by reference into
//! the builder, homepage generator and dev server, and read-only afterwards.

use crate::error::CompileError;
use regex::Regex;
use std::sync::LazyLock;

const SHARED_CSS: &str = include_str!("embed/shared.css");
const SHARED_JS: &str = include_str!("embed/shared.js");
const CHALLENGE_TEMPLATE: &str = include_str!("embed/challenge.html");
const HOMEPAGE_TEMPLATE: &str = include_str!("embed/homepage.html");

/// Any `{{UPPER_SNAKE}}` token left after substitution is an error.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[A-Z][A-Z0-9_]*\}\}").unwrap());

#[derive(Debug, Clone)]
pub struct AssetCache {
    shared_css: String,
    shared_js: String,
    challenge_template: String,
    homepage_template: String,
}

impl AssetCache {
    /// Build the cache from the fragments embedded in the binary.
    pub fn embedded() -> Self {
        Self {
            shared_css: SHARED_CSS.to_owned(),
            shared_js: SHARED_JS.to_owned(),
            challenge_template: CHALLENGE_TEMPLATE.to_owned(),
            homepage_template: HOMEPAGE_TEMPLATE.to_owned(),
        }
    }

    pub fn shared_css(&self) -> &str {
        &self.shared_css
    }

    pub fn shared_js(&self) -> &str {
        &self.shared_js
    }

    pub fn challenge_template(&self) -> &str {
        &self.challenge_template
    }

    pub fn homepage_template(&self) -> &str {
        &self.homepage_template
    }
}

/// Substitute placeholder tokens into a template, in order, then fail on
/// any token that survived. Substitution is literal text replacement, not
/// a templating language.
pub fn render(
    template_name: &'static str,
    template: &str,
    substitutions: &[(&str, &str)],
) -> Result<String, CompileError> {
    let mut out = template.to_owned();
    for (token, value) in substitutions {
        out = out.replace(token, value);
    }

    if let Some(m) = PLACEHOLDER_RE.find(&out) {
        return Err(CompileError::UnresolvedPlaceholder {
            template: template_name,
            token: m.as_str().to_owned(),
        });
    }

    Ok(out)
}

/// Minimal HTML escaping for metadata text inserted into templates.
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
