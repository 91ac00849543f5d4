//! `base64_bundle` - embed a sibling file as an `eval(atob(...))` payload.
//!
//! The bundle file keeps everything after its marker line (usually a
//! decoy comment block) and gains a trailing line that decodes and
//! executes the referenced file at runtime. The referenced file carries
//! its own `no_include` marker so only the encoded form ever ships.

use super::{Context, Directive, detect_in_line, strip_marker_line};
use crate::error::CompileError;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::{fs, path::Path};

pub(super) fn apply(
    content: &str,
    reference: &str,
    ctx: &Context,
) -> Result<Vec<u8>, CompileError> {
    let directory = ctx.path.parent().unwrap_or(Path::new("."));
    let ref_path = directory.join(reference);
    if !ref_path.is_file() {
        return Err(CompileError::MissingDependency {
            path: ctx.path.to_path_buf(),
            missing: ref_path,
        });
    }

    let payload =
        fs::read_to_string(&ref_path).map_err(|err| CompileError::io(&ref_path, err))?;

    // Strip the payload's own no_include marker so the decoded source
    // matches what the author wrote below it.
    let first_line = payload.lines().next().unwrap_or_default();
    let payload = if detect_in_line(first_line) == Some(Directive::NoInclude) {
        strip_marker_line(&payload)
    } else {
        payload.as_str()
    };

    let encoded = STANDARD.encode(payload.as_bytes());
    let rest = strip_marker_line(content);

    let mut out = String::with_capacity(rest.len() + encoded.len() + 16);
    out.push_str(rest);
    out.push_str("eval(atob(\"");
    out.push_str(&encoded);
    out.push_str("\"));\n");
    Ok(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetCache;
    use std::fs;

    fn apply_bundle(dir: &Path, reference: &str) -> Result<String, CompileError> {
        let assets = AssetCache::embedded();
        let loader_path = dir.join("loader.js");
        let content = fs::read_to_string(&loader_path).unwrap();
        let ctx = Context {
            path: &loader_path,
            source_root: dir,
            url_prefix: "/",
            assets: &assets,
        };
        apply(&content, reference, &ctx).map(|bytes| String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn test_bundle_encodes_payload_without_marker() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("loader.js"),
            "// COMPILER: base64_bundle payload.js\n/* obfuscated loader */\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("payload.js"),
            "// COMPILER: no_include\nconsole.log(\"hi\");\n",
        )
        .unwrap();

        let out = apply_bundle(tmp.path(), "payload.js").unwrap();

        assert!(out.starts_with("/* obfuscated loader */\n"));
        assert!(!out.contains("console.log"));

        let encoded = out
            .split("eval(atob(\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        assert_eq!(decoded, b"console.log(\"hi\");\n");
        assert!(out.ends_with("\"));\n"));
    }

    #[test]
    fn test_bundle_payload_without_no_include_is_encoded_whole() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("loader.js"),
            "// COMPILER: base64_bundle raw.js\n",
        )
        .unwrap();
        fs::write(tmp.path().join("raw.js"), "alert(1);\n").unwrap();

        let out = apply_bundle(tmp.path(), "raw.js").unwrap();
        let encoded = out
            .split("eval(atob(\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), b"alert(1);\n");
    }

    #[test]
    fn test_bundle_missing_reference() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("loader.js"),
            "// COMPILER: base64_bundle gone.js\n",
        )
        .unwrap();

        let err = apply_bundle(tmp.path(), "gone.js").unwrap_err();
        match err {
            CompileError::MissingDependency { missing, .. } => {
                assert!(missing.ends_with("gone.js"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
