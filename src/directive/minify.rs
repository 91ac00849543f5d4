//! `html_minify` and `json_minify` directives.

use super::strip_marker_line;
use crate::error::CompileError;
use std::path::Path;

/// Minify HTML content using the `minify_html` crate.
///
/// Comments are dropped and inter-tag whitespace collapses, but JS and CSS
/// minification stay off so the interior text of `<script>`, `<style>`,
/// `<pre>` and `<textarea>` elements ships byte-for-byte unchanged.
pub(super) fn html(content: &str) -> Vec<u8> {
    let body = strip_marker_line(content);

    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = false;
    cfg.minify_js = false;
    minify_html::minify(body.as_bytes(), &cfg)
}

/// Re-serialize JSON in the most compact form.
///
/// Key order and numeric/string fidelity are preserved, so re-parsing the
/// output yields a value deep-equal to the input.
pub(super) fn json(content: &str, path: &Path) -> Result<Vec<u8>, CompileError> {
    let body = strip_marker_line(content);

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|err| CompileError::MalformedInput {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    let mut out = serde_json::to_string(&value).map_err(|err| CompileError::MalformedInput {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    out.push('\n');
    Ok(out.into_bytes())
}
