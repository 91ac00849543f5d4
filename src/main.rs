//! flagforge - compile and serve CTF challenge sites with inline build
//! directives.

mod assets;
mod builder;
mod cli;
mod config;
mod directive;
mod error;
mod homepage;
mod logger;
mod meta;
mod serve;

use anyhow::{Context as _, Result, bail};
use assets::AssetCache;
use clap::Parser;
use cli::{Cli, Commands};
use config::CompilerConfig;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| PathBuf::from("./"));

    let mut config = CompilerConfig::load(&root.join(&cli.config))?;
    config.update_with_cli(&cli);

    let assets = AssetCache::embedded();

    match &cli.command {
        Commands::Compile { source, .. } => {
            let dest = config.build.output.join(challenge_slug(source)?);
            log!("compile"; "{} -> {}", source.display(), dest.display());
            let stats = builder::compile_challenge(source, &dest, &assets)?;
            log!("compile"; "done ({} copied, {} transformed, {} skipped)",
                stats.copied, stats.transformed, stats.skipped);
            Ok(())
        }
        Commands::CompileAll { .. } => {
            let stats = homepage::compile_homepage(&root, &config.build.output, &assets)?;
            if stats.failures > 0 {
                bail!("{} challenge(s) failed to compile", stats.failures);
            }
            log!("compile"; "done ({} challenge(s) in {} group(s))",
                stats.challenges, stats.groups);
            Ok(())
        }
        Commands::Serve { source, .. } => {
            if !source.is_dir() {
                bail!("source directory {} does not exist", source.display());
            }
            serve::serve_challenge(source, &config, &assets)
        }
    }
}

/// Output subdirectory name for a challenge, from its directory name.
fn challenge_slug(source: &Path) -> Result<String> {
    let canonical = source
        .canonicalize()
        .with_context(|| format!("source directory {} does not exist", source.display()))?;
    canonical
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("cannot derive a challenge name from {}", source.display()))
}
