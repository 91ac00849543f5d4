//! Directive detection and dispatch.
//!
//! A directive is a single-line marker on the very first line of a source
//! file that selects a build-time transformation:
//!
//! ```text
//! <!-- COMPILER: directory_listing -->
//! <!-- COMPILER: html_minify -->
//! <!-- COMPILER: challenge_page -->
//! // COMPILER: json_minify
//! // COMPILER: no_include
//! // COMPILER: base64_bundle <file>
//! ```
//!
//! Detection reads only the first line, so both the full-rebuild builder
//! and the per-request dev server can afford to call it for every file.
//! Unrecognized or malformed markers mean "plain copy", never an error.
//! Both call sites share [`apply`], so transformation semantics are
//! identical between a compiled tree and a live-served one.

mod bundle;
mod listing;
mod minify;
mod page;

use crate::{assets::AssetCache, error::CompileError};
use regex::Regex;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::LazyLock,
};

static HTML_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*<!--\s*COMPILER:\s*(\w+)\s*-->").unwrap());
static LINE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*//\s*COMPILER:\s*(\w+)(?:[ \t]+(\S+))?").unwrap());

// ============================================================================
// Types
// ============================================================================

/// The closed set of build-time transformations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    DirectoryListing,
    HtmlMinify,
    JsonMinify,
    NoInclude,
    Base64Bundle { reference: String },
    ChallengePage,
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DirectoryListing => "directory_listing",
            Self::HtmlMinify => "html_minify",
            Self::JsonMinify => "json_minify",
            Self::NoInclude => "no_include",
            Self::Base64Bundle { .. } => "base64_bundle",
            Self::ChallengePage => "challenge_page",
        }
    }
}

/// Result of applying a directive to a file.
#[derive(Debug)]
pub enum Output {
    /// Replace the file content with these bytes.
    Bytes(Vec<u8>),
    /// The file must not appear in output (404 in the dev server).
    Exclude,
    /// Copy the file unchanged.
    Passthrough,
}

/// Everything a directive handler may need beyond the file content.
pub struct Context<'a> {
    /// Source path of the file being transformed.
    pub path: &'a Path,
    /// Root of the challenge source tree (metadata lookup stops here).
    pub source_root: &'a Path,
    /// URL path of the file's directory, with trailing `/`.
    pub url_prefix: &'a str,
    pub assets: &'a AssetCache,
}

// ============================================================================
// Detection
// ============================================================================

/// Detect a directive by reading the first line of `path`.
///
/// Unreadable files and non-UTF-8 first lines count as "no directive".
pub fn detect(path: &Path) -> Option<Directive> {
    let file = File::open(path).ok()?;
    let mut first_line = String::new();
    BufReader::new(file).read_line(&mut first_line).ok()?;
    detect_in_line(&first_line)
}

/// Detect a directive in an already-read first line.
pub fn detect_in_line(line: &str) -> Option<Directive> {
    let (token, arg) = if let Some(caps) = HTML_MARKER_RE.captures(line) {
        (caps[1].to_ascii_lowercase(), None)
    } else if let Some(caps) = LINE_MARKER_RE.captures(line) {
        let arg = caps.get(2).map(|m| m.as_str().to_owned());
        (caps[1].to_ascii_lowercase(), arg)
    } else {
        return None;
    };

    match token.as_str() {
        "directory_listing" => Some(Directive::DirectoryListing),
        "html_minify" => Some(Directive::HtmlMinify),
        "json_minify" => Some(Directive::JsonMinify),
        "no_include" => Some(Directive::NoInclude),
        "challenge_page" => Some(Directive::ChallengePage),
        // A bundle marker without a filename argument is malformed and
        // treated as absent.
        "base64_bundle" => arg.map(|reference| Directive::Base64Bundle { reference }),
        _ => None,
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Apply a directive to file content, producing the output bytes, an
/// exclusion, or a passthrough. Pure with respect to its inputs: the same
/// (directive, content, context) always yields the same output.
pub fn apply(
    directive: Option<&Directive>,
    content: &str,
    ctx: &Context,
) -> Result<Output, CompileError> {
    let Some(directive) = directive else {
        return Ok(Output::Passthrough);
    };

    match directive {
        Directive::DirectoryListing => listing::apply(ctx).map(Output::Bytes),
        Directive::HtmlMinify => Ok(Output::Bytes(minify::html(content))),
        Directive::JsonMinify => minify::json(content, ctx.path).map(Output::Bytes),
        Directive::NoInclude => Ok(Output::Exclude),
        Directive::Base64Bundle { reference } => {
            bundle::apply(content, reference, ctx).map(Output::Bytes)
        }
        Directive::ChallengePage => page::apply(content, ctx).map(Output::Bytes),
    }
}

/// Everything after the first (marker) line.
pub(crate) fn strip_marker_line(content: &str) -> &str {
    content.split_once('\n').map_or("", |(_, rest)| rest)
}

/// URL path of a file's directory, derived from its source-relative path.
pub(crate) fn url_prefix_for(rel: &Path) -> String {
    let parent = rel
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    if parent.is_empty() {
        "/".to_owned()
    } else {
        format!("/{parent}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_detect_html_markers() {
        assert_eq!(
            detect_in_line("<!-- COMPILER: directory_listing -->"),
            Some(Directive::DirectoryListing)
        );
        assert_eq!(
            detect_in_line("<!-- COMPILER: html_minify -->"),
            Some(Directive::HtmlMinify)
        );
        assert_eq!(
            detect_in_line("  <!--COMPILER:challenge_page-->"),
            Some(Directive::ChallengePage)
        );
    }

    #[test]
    fn test_detect_line_markers() {
        assert_eq!(
            detect_in_line("// COMPILER: json_minify"),
            Some(Directive::JsonMinify)
        );
        assert_eq!(
            detect_in_line("// COMPILER: no_include"),
            Some(Directive::NoInclude)
        );
        assert_eq!(
            detect_in_line("// COMPILER: base64_bundle payload.js"),
            Some(Directive::Base64Bundle {
                reference: "payload.js".to_owned()
            })
        );
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(
            detect_in_line("<!-- compiler: HTML_MINIFY -->"),
            Some(Directive::HtmlMinify)
        );
    }

    #[test]
    fn test_detect_rejects_unknown_and_malformed() {
        assert_eq!(detect_in_line("<!-- COMPILER: gzip -->"), None);
        assert_eq!(detect_in_line("// COMPILER: base64_bundle"), None);
        assert_eq!(detect_in_line("<!-- not a marker -->"), None);
        assert_eq!(detect_in_line("plain first line"), None);
        assert_eq!(detect_in_line(""), None);
    }

    #[test]
    fn test_detect_reads_only_first_line() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("page.html");
        fs::write(&path, "<html>\n<!-- COMPILER: html_minify -->\n</html>").unwrap();
        assert_eq!(detect(&path), None);

        let path = tmp.path().join("data.json");
        fs::write(&path, "// COMPILER: json_minify\n{}").unwrap();
        assert_eq!(detect(&path), Some(Directive::JsonMinify));
    }

    #[test]
    fn test_detect_binary_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("blob.bin");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x42]).unwrap();
        assert_eq!(detect(&path), None);
    }

    #[test]
    fn test_strip_marker_line() {
        assert_eq!(strip_marker_line("// marker\nbody"), "body");
        assert_eq!(strip_marker_line("// marker"), "");
        assert_eq!(strip_marker_line("// marker\n"), "");
    }

    #[test]
    fn test_url_prefix_for() {
        assert_eq!(url_prefix_for(Path::new("index.html")), "/");
        assert_eq!(url_prefix_for(Path::new("files/index.html")), "/files/");
        assert_eq!(url_prefix_for(Path::new("a/b/c.html")), "/a/b/");
    }

    #[test]
    fn test_apply_without_directive_is_passthrough() {
        let assets = crate::assets::AssetCache::embedded();
        let ctx = Context {
            path: Path::new("x.html"),
            source_root: Path::new("."),
            url_prefix: "/",
            assets: &assets,
        };
        assert!(matches!(
            apply(None, "anything", &ctx).unwrap(),
            Output::Passthrough
        ));
    }

    #[test]
    fn test_apply_no_include_is_exclude() {
        let assets = crate::assets::AssetCache::embedded();
        let ctx = Context {
            path: Path::new("x.js"),
            source_root: Path::new("."),
            url_prefix: "/",
            assets: &assets,
        };
        assert!(matches!(
            apply(Some(&Directive::NoInclude), "// COMPILER: no_include\nsecret", &ctx).unwrap(),
            Output::Exclude
        ));
    }
}
