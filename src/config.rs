//! Compiler configuration for `flagforge.toml`.
//!
//! # Sections
//!
//! | Section   | Purpose                                   |
//! |-----------|-------------------------------------------|
//! | `[build]` | Output root for compiled challenges       |
//! | `[serve]` | Development server (port, interface)      |
//!
//! The config file is optional; defaults cover the common case and CLI
//! arguments override file values.
//!
//! # Example
//!
//! ```toml
//! [build]
//! output = "dist"
//!
//! [serve]
//! interface = "127.0.0.1"
//! port = 8000
//! ```

use crate::cli::{Cli, Commands};
use anyhow::Result;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),
}

mod defaults {
    use std::path::PathBuf;

    pub fn output() -> PathBuf {
        PathBuf::from("dist")
    }

    pub fn interface() -> String {
        "127.0.0.1".to_owned()
    }

    pub fn port() -> u16 {
        8000
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing flagforge.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

/// `[build]` section - output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Output root directory; each challenge compiles into
    /// `<output>/<slug>/`.
    #[serde(default = "defaults::output")]
    pub output: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: defaults::output(),
        }
    }
}

/// `[serve]` section - development server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    #[serde(default = "defaults::interface")]
    pub interface: String,

    /// HTTP port number (default: 8000).
    #[serde(default = "defaults::port")]
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: defaults::interface(),
            port: defaults::port(),
        }
    }
}

impl CompilerConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: CompilerConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Compile { output, .. } | Commands::CompileAll { output } => {
                if let Some(output) = output {
                    self.build.output = output.clone();
                }
            }
            Commands::Serve {
                port, interface, ..
            } => {
                if let Some(port) = port {
                    self.serve.port = *port;
                }
                if let Some(interface) = interface {
                    self.serve.interface = interface.clone();
                }
            }
        }
    }
}
