//! `challenge_page` - wrap body content in the challenge page shell.

use super::{Context, strip_marker_line};
use crate::{
    assets::{html_escape, render},
    error::CompileError,
    meta::{self, ChallengeMeta},
};
use std::path::Path;

/// Render the tagged file's remaining content as the body of the shared
/// challenge template, filled with the challenge's metadata.
///
/// `.challenge.json` is looked up in the file's own directory first, then
/// in ancestors up to the challenge source root (body files usually live
/// one level below the challenge root).
pub(super) fn apply(content: &str, ctx: &Context) -> Result<Vec<u8>, CompileError> {
    let body = strip_marker_line(content).trim();

    let (challenge_dir, challenge_meta) = find_metadata(ctx)?;
    let slug = challenge_meta.slug.clone().unwrap_or_else(|| {
        challenge_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let title = challenge_meta.title_for(&slug);

    let html = render(
        "challenge",
        ctx.assets.challenge_template(),
        &[
            ("{{TITLE}}", &html_escape(&title)),
            ("{{DIFFICULTY}}", &html_escape(&challenge_meta.difficulty)),
            ("{{DIFF_COLOR}}", challenge_meta.color()),
            ("{{SLUG}}", &html_escape(&slug)),
            ("{{FLAG_HASH}}", &challenge_meta.flag_hash),
            ("{{SHARED_CSS}}", ctx.assets.shared_css()),
            ("{{SHARED_JS}}", ctx.assets.shared_js()),
            ("{{BODY}}", body),
        ],
    )?;
    Ok(html.into_bytes())
}

fn find_metadata<'a>(ctx: &Context<'a>) -> Result<(&'a Path, ChallengeMeta), CompileError> {
    let mut dir = ctx.path.parent();
    while let Some(candidate) = dir {
        if candidate.join(meta::CHALLENGE_META).is_file() {
            return Ok((candidate, ChallengeMeta::load(candidate)?));
        }
        if candidate == ctx.source_root {
            break;
        }
        dir = candidate.parent();
    }

    Err(CompileError::MissingDependency {
        path: ctx.path.to_path_buf(),
        missing: ctx.source_root.join(meta::CHALLENGE_META),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetCache;
    use std::fs;

    fn render_page(body_file: &Path, source_root: &Path) -> Result<String, CompileError> {
        let assets = AssetCache::embedded();
        let content = fs::read_to_string(body_file).unwrap();
        let ctx = Context {
            path: body_file,
            source_root,
            url_prefix: "/challenge/",
            assets: &assets,
        };
        apply(&content, &ctx).map(|bytes| String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn test_page_substitutes_all_placeholders() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(
            root.join(".challenge.json"),
            r#"{"title": "Pipeline", "difficulty": "medium", "slug": "pipeline", "flag_hash": "f0263abc"}"#,
        )
        .unwrap();
        let body_dir = root.join("challenge");
        fs::create_dir_all(&body_dir).unwrap();
        let body_file = body_dir.join("index.html");
        fs::write(
            &body_file,
            "<!-- COMPILER: challenge_page -->\n<p>Hello</p>\n",
        )
        .unwrap();

        let html = render_page(&body_file, root).unwrap();

        assert!(html.contains("Pipeline"));
        assert!(html.contains("medium"));
        assert!(html.contains("pipeline"));
        assert!(html.contains("f0263abc"));
        assert!(html.contains("<p>Hello</p>"));
        assert!(html.contains("#e05a33"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_page_missing_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let body_file = tmp.path().join("index.html");
        fs::write(&body_file, "<!-- COMPILER: challenge_page -->\n<p>x</p>").unwrap();

        let err = render_page(&body_file, tmp.path()).unwrap_err();
        assert!(matches!(err, CompileError::MissingDependency { .. }));
    }

    #[test]
    fn test_page_metadata_in_same_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join(".challenge.json"), r#"{"title": "Local"}"#).unwrap();
        let body_file = root.join("index.html");
        fs::write(&body_file, "<!-- COMPILER: challenge_page -->\nbody").unwrap();

        let html = render_page(&body_file, root).unwrap();
        assert!(html.contains("Local"));
    }

    #[test]
    fn test_page_escapes_metadata_text() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(
            root.join(".challenge.json"),
            r#"{"title": "<XSS & Co>", "difficulty": "easy"}"#,
        )
        .unwrap();
        let body_file = root.join("index.html");
        fs::write(&body_file, "<!-- COMPILER: challenge_page -->\nbody").unwrap();

        let html = render_page(&body_file, root).unwrap();
        assert!(html.contains("&lt;XSS &amp; Co&gt;"));
        assert!(!html.contains("<XSS"));
    }

    #[test]
    fn test_page_malformed_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join(".challenge.json"), "{broken").unwrap();
        let body_file = root.join("index.html");
        fs::write(&body_file, "<!-- COMPILER: challenge_page -->\nbody").unwrap();

        let err = render_page(&body_file, root).unwrap_err();
        assert!(matches!(err, CompileError::MalformedInput { .. }));
    }
}
