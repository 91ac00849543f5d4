//! Compile-time error types.
//!
//! A per-file error aborts one challenge; batch compilation catches these
//! at the challenge boundary.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while compiling challenge sources.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Input file existed but could not be parsed / was not well-formed.
    #[error("malformed input `{path}`: {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    /// A required file referenced by the build was not present.
    #[error("missing dependency for `{path}`: `{missing}` not found")]
    MissingDependency { path: PathBuf, missing: PathBuf },

    /// A template still contained an unresolved `{{TOKEN}}` placeholder.
    #[error("unresolved placeholder `{token}` in template `{template}`")]
    UnresolvedPlaceholder {
        template: &'static str,
        token: String,
    },

    /// An IO error reading or writing a file.
    #[error("IO error when accessing `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    /// Build an [`CompileError::Io`] tagged with the offending path.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
