//! Full-regeneration compile of a single challenge tree.
//!
//! The output directory is wiped before every build so the result is
//! always a faithful snapshot of the source with directives applied.
//! Walks are sorted by file name, so compiling an unchanged tree twice
//! yields byte-identical output.

use crate::{
    assets::AssetCache,
    directive::{self, Context, Directive, Output},
    log, meta,
};
use anyhow::{Context as _, Result};
use std::{fs, path::Path};
use walkdir::WalkDir;

/// Per-challenge compile counters, for the summary log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompileStats {
    pub copied: usize,
    pub transformed: usize,
    pub skipped: usize,
}

/// Build one challenge from `source` into `dest`.
///
/// Metadata files and hidden markdown are excluded unconditionally;
/// `no_include` files are excluded by directive; everything else is
/// either plain-copied or transformed. Output directories are created
/// lazily, so a directory whose entries were all excluded never appears.
pub fn compile_challenge(source: &Path, dest: &Path, assets: &AssetCache) -> Result<CompileStats> {
    if dest.exists() {
        fs::remove_dir_all(dest)
            .with_context(|| format!("Failed to clear output directory: {}", dest.display()))?;
    }
    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create output directory: {}", dest.display()))?;

    let mut stats = CompileStats::default();

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(source)?;
        let name = entry.file_name().to_string_lossy();

        if meta::is_metadata_file(&name) || meta::is_hidden_markdown(&name) {
            stats.skipped += 1;
            continue;
        }

        let detected = directive::detect(entry.path());
        if detected == Some(Directive::NoInclude) {
            log!("skip"; "{}", rel.display());
            stats.skipped += 1;
            continue;
        }

        let dst = dest.join(rel);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        match &detected {
            None => {
                fs::copy(entry.path(), &dst)
                    .with_context(|| format!("Failed to copy {}", rel.display()))?;
                stats.copied += 1;
            }
            Some(d) => {
                let content = fs::read_to_string(entry.path())
                    .with_context(|| format!("Failed to read {}", rel.display()))?;
                let url_prefix = directive::url_prefix_for(rel);
                let ctx = Context {
                    path: entry.path(),
                    source_root: source,
                    url_prefix: &url_prefix,
                    assets,
                };
                match directive::apply(Some(d), &content, &ctx)? {
                    Output::Bytes(bytes) => {
                        fs::write(&dst, bytes)
                            .with_context(|| format!("Failed to write {}", dst.display()))?;
                        log!("compile"; "{:<18} {}", d.name(), rel.display());
                        stats.transformed += 1;
                    }
                    Output::Passthrough => {
                        fs::copy(entry.path(), &dst)
                            .with_context(|| format!("Failed to copy {}", rel.display()))?;
                        stats.copied += 1;
                    }
                    Output::Exclude => {
                        stats.skipped += 1;
                    }
                }
            }
        }
    }

    Ok(stats)
}
