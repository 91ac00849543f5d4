//! `directory_listing` - nginx-style directory index generation.

use super::Context;
use crate::{error::CompileError, meta};
use chrono::{DateTime, Utc};
use std::{fs, path::Path, time::SystemTime};

struct Entry {
    name: String,
    is_dir: bool,
    mtime: SystemTime,
    size: u64,
}

/// Generate an index page for the directory containing the tagged file.
///
/// Entries come from the live filesystem at apply time, so the dev server
/// always reflects the current directory contents. Sorting is
/// case-insensitive by name with directories first, making the output
/// deterministic for a given directory state.
pub(super) fn apply(ctx: &Context) -> Result<Vec<u8>, CompileError> {
    let directory = ctx.path.parent().unwrap_or(Path::new("."));
    let own_name = ctx
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut entries = collect_entries(directory, &own_name)?;
    entries.sort_by_key(|entry| entry.name.to_lowercase());
    let (dirs, files): (Vec<Entry>, Vec<Entry>) =
        entries.into_iter().partition(|entry| entry.is_dir);

    let mut lines = vec![r#"<a href="../">../</a>"#.to_owned()];
    for entry in dirs.iter().chain(files.iter()) {
        let display = if entry.is_dir {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };
        let padded = format!("{display:<50}");
        let padding = " ".repeat(51usize.saturating_sub(display.len()).max(1));
        let date = format_mtime(entry.mtime);
        let size = if entry.is_dir {
            "   -".to_owned()
        } else {
            format!("{:>7}", entry.size)
        };
        lines.push(format!(
            r#"<a href="{display}">{padded}</a>{padding}{date} {size}"#
        ));
    }
    let pre_block = lines.join("\n");

    let url_prefix = if ctx.url_prefix.ends_with('/') {
        ctx.url_prefix.to_owned()
    } else {
        format!("{}/", ctx.url_prefix)
    };

    let html = format!(
        "<!doctype html>\n\
         <html>\n\
         \x20 <head>\n\
         \x20   <title>Index of {url_prefix}</title>\n\
         \x20 </head>\n\
         \x20 <body>\n\
         \x20   <h1>Index of {url_prefix}</h1>\n\
         \x20   <hr />\n\
         \x20   <pre>{pre_block}\n\
         </pre>\n\
         \x20   <hr />\n\
         \x20   <address>nginx/1.25.3</address>\n\
         \x20 </body>\n\
         </html>\n"
    );
    Ok(html.into_bytes())
}

/// Collect listable entries, skipping the index file itself and hidden
/// markdown.
fn collect_entries(directory: &Path, own_name: &str) -> Result<Vec<Entry>, CompileError> {
    let mut entries = Vec::new();
    let read_dir = fs::read_dir(directory).map_err(|err| CompileError::io(directory, err))?;
    for child in read_dir {
        let child = child.map_err(|err| CompileError::io(directory, err))?;
        let name = child.file_name().to_string_lossy().into_owned();
        if name == own_name || meta::is_hidden_markdown(&name) {
            continue;
        }
        let stat = child
            .metadata()
            .map_err(|err| CompileError::io(&child.path(), err))?;
        entries.push(Entry {
            name,
            is_dir: stat.is_dir(),
            mtime: stat.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            size: stat.len(),
        });
    }
    Ok(entries)
}

/// `dd-Mon-yyyy HH:MM` in UTC, the nginx autoindex date format.
fn format_mtime(mtime: SystemTime) -> String {
    let datetime: DateTime<Utc> = mtime.into();
    datetime.format("%d-%b-%Y %H:%M").to_string()
}
