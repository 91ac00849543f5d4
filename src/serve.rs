//! Development server with live directive processing.
//!
//! Serves a challenge's source tree over HTTP, applying the same
//! directive engine the builder uses, per request, so you always see the
//! latest version without an explicit build step. Nothing is cached
//! across requests: every request re-reads the source and re-applies the
//! directive, trading throughput for correctness under concurrent edits.
//! Acceptable for a local development tool.

use crate::{
    assets::AssetCache,
    config::CompilerConfig,
    directive::{self, Context, Directive, Output},
    log, meta,
};
use anyhow::{Context as _, Result};
use std::{
    fs,
    io::Cursor,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the dev server rooted at `source`. Blocks until Ctrl+C.
pub fn serve_challenge(source: &Path, config: &CompilerConfig, assets: &AssetCache) -> Result<()> {
    let interface: std::net::IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid interface: {}", config.serve.interface))?;

    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "serving {} at http://{addr}", source.display());

    for request in server.incoming_requests() {
        if let Err(err) = handle_request(request, source, assets) {
            log!("serve"; "request error: {err}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: std::net::IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {base_port} in use, using {port} instead");
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < max_retries => {
                continue;
            }
            Err(err) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {max_retries} attempts (ports {base_port}-{port}): {err}"
                ));
            }
        }
    }
    unreachable!()
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
///
/// Resolution order:
/// 1. Directory without trailing slash -> 301 redirect adding one
/// 2. Directory -> its `index.html`, or 404
/// 3. Metadata files, hidden markdown, `no_include` files -> 404
/// 4. Directive-tagged file -> transformed bytes (500 on failure)
/// 5. Plain file -> served as-is
fn handle_request(request: Request, source_root: &Path, assets: &AssetCache) -> Result<()> {
    // Decode URL-encoded characters and drop the query string
    let url_path = urlencoding::decode(request.url())
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();
    let path_part = url_path.split('?').next().unwrap_or(&url_path).to_owned();

    let Some(mut local_path) = resolve_path(source_root, &path_part) else {
        return serve_not_found(request);
    };

    if local_path.is_dir() {
        if !path_part.ends_with('/') {
            // Trailing slash keeps relative links in listings working
            return serve_redirect(request, &format!("{path_part}/"));
        }
        local_path = local_path.join("index.html");
    }

    if !local_path.is_file() {
        return serve_not_found(request);
    }

    let name = local_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if meta::is_metadata_file(&name) || meta::is_hidden_markdown(&name) {
        return serve_not_found(request);
    }

    match directive::detect(&local_path) {
        Some(Directive::NoInclude) => serve_not_found(request),
        None => serve_file(request, &local_path),
        Some(detected) => {
            let content = match fs::read_to_string(&local_path) {
                Ok(content) => content,
                Err(err) => return serve_error(request, &err.to_string()),
            };
            let rel = local_path.strip_prefix(source_root).unwrap_or(&local_path);
            let url_prefix = directive::url_prefix_for(rel);
            let ctx = Context {
                path: &local_path,
                source_root,
                url_prefix: &url_prefix,
                assets,
            };

            match directive::apply(Some(&detected), &content, &ctx) {
                Ok(Output::Bytes(bytes)) => {
                    serve_bytes(request, bytes, guess_content_type(&local_path))
                }
                Ok(Output::Passthrough) => serve_file(request, &local_path),
                Ok(Output::Exclude) => serve_not_found(request),
                Err(err) => serve_error(request, &format!("Directive error: {err}")),
            }
        }
    }
}

/// Resolve a URL path under the source root, refusing traversal.
fn resolve_path(source_root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut resolved = source_root.to_path_buf();
    for part in url_path.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return None;
        }
        resolved.push(part);
    }
    Some(resolved)
}

// ============================================================================
// Response Helpers
// ============================================================================

fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serve_bytes(request, content, guess_content_type(path))
}

fn serve_bytes(request: Request, bytes: Vec<u8>, content_type: &'static str) -> Result<()> {
    let response = Response::from_data(bytes)
        .with_header(Header::from_bytes("Content-Type", content_type).unwrap())
        .with_header(Header::from_bytes("Cache-Control", "no-cache").unwrap());
    request.respond(response)?;
    Ok(())
}

fn serve_redirect(request: Request, location: &str) -> Result<()> {
    let response = Response::new_empty(StatusCode(301))
        .with_header(Header::from_bytes("Location", location).unwrap());
    request.respond(response)?;
    Ok(())
}

fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::new(
        StatusCode(404),
        vec![Header::from_bytes("Content-Type", "text/plain").unwrap()],
        Cursor::new("404 Not Found"),
        Some(13),
        None,
    );
    request.respond(response)?;
    Ok(())
}

fn serve_error(request: Request, message: &str) -> Result<()> {
    let body = format!("500 Internal Server Error\n{message}");
    let response = Response::from_string(body)
        .with_status_code(StatusCode(500))
        .with_header(Header::from_bytes("Content-Type", "text/plain").unwrap());
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}
