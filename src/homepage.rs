//! Homepage generation and batch compilation.
//!
//! Discovers every group and challenge at the source root, compiles each
//! challenge into its own subdirectory of the output root, and renders a
//! landing page with collapsible grouped challenge cards. Flags are
//! verified client-side against the slug -> hash map baked into the page;
//! the flag values themselves never ship.

use crate::{
    assets::{AssetCache, html_escape, render},
    builder, log,
    meta::{self, ChallengeGroup, ChallengeMeta},
};
use anyhow::{Context as _, Result, bail};
use std::{
    fmt::Write as _,
    fs,
    path::Path,
};

/// Batch compile counters; `failures` drives the process exit status.
#[derive(Debug, Default, Clone, Copy)]
pub struct HomepageStats {
    pub challenges: usize,
    pub groups: usize,
    pub failures: usize,
}

/// Compile every discovered challenge plus the root `index.html`.
///
/// A failing challenge is logged and counted but never stops the batch;
/// each challenge writes into its own isolated output subdirectory.
pub fn compile_homepage(root: &Path, output: &Path, assets: &AssetCache) -> Result<HomepageStats> {
    let groups = meta::discover_groups(root)?;
    if groups.is_empty() {
        bail!("no challenge directories found under {}", root.display());
    }

    let mut stats = HomepageStats {
        groups: groups.len(),
        ..HomepageStats::default()
    };
    let mut sections = Vec::new();
    let mut hash_entries = Vec::new();

    for group in &groups {
        let mut cards = Vec::new();
        for challenge_dir in &group.challenges {
            stats.challenges += 1;
            match compile_one(challenge_dir, output, assets) {
                Ok((card, hash_entry)) => {
                    cards.push(card);
                    hash_entries.extend(hash_entry);
                }
                Err(err) => {
                    let slug = dir_name(challenge_dir);
                    log!("error"; "{slug}: {err:#}");
                    stats.failures += 1;
                }
            }
        }
        sections.push(group_section(group, &cards));
    }

    let html = render(
        "homepage",
        assets.homepage_template(),
        &[
            ("{{GROUPS}}", &sections.join("\n\n")),
            ("{{HASHES}}", &hash_entries.join(",\n")),
            ("{{COUNT}}", &stats.challenges.to_string()),
            ("{{GROUP_MAP}}", &group_map_js(&groups)),
            ("{{SHARED_CSS}}", assets.shared_css()),
            ("{{SHARED_JS}}", assets.shared_js()),
        ],
    )?;

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    fs::write(output.join("index.html"), html)
        .with_context(|| format!("Failed to write {}", output.join("index.html").display()))?;
    log!("homepage"; "index.html ({} challenge(s) in {} group(s))", stats.challenges, stats.groups);

    Ok(stats)
}

/// Compile a single challenge and build its homepage card.
fn compile_one(
    challenge_dir: &Path,
    output: &Path,
    assets: &AssetCache,
) -> Result<(String, Option<String>)> {
    let slug = dir_name(challenge_dir);
    let challenge_meta = ChallengeMeta::load(challenge_dir)?;

    let dest = output.join(&slug);
    log!("compile"; "{slug}/ -> {}", dest.display());
    let compiled = builder::compile_challenge(challenge_dir, &dest, assets)?;
    log!("compile"; "{slug}: {} copied, {} transformed, {} skipped",
        compiled.copied, compiled.transformed, compiled.skipped);

    let hash_entry = (!challenge_meta.flag_hash.is_empty())
        .then(|| format!("    \"{slug}\": \"{}\"", challenge_meta.flag_hash));
    Ok((card_html(&slug, &challenge_meta), hash_entry))
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ============================================================================
// HTML fragments
// ============================================================================

fn card_html(slug: &str, challenge_meta: &ChallengeMeta) -> String {
    let title = html_escape(&challenge_meta.title_for(slug));
    let difficulty = html_escape(&challenge_meta.difficulty);
    let color = challenge_meta.color();
    let summary = html_escape(&challenge_meta.summary);

    let mut card = String::new();
    let _ = writeln!(card, r#"          <div class="challenge-card" data-slug="{slug}">"#);
    let _ = writeln!(card, r#"            <div class="card-header">"#);
    let _ = writeln!(
        card,
        r#"              <span class="difficulty" style="color:{color};background:{color}22">{difficulty}</span>"#
    );
    let _ = writeln!(
        card,
        r#"              <a class="card-title" href="./{slug}/challenge/">{title}</a>"#
    );
    let _ = writeln!(card, "            </div>");
    let _ = writeln!(card, r#"            <p class="card-summary">{summary}</p>"#);
    let _ = writeln!(card, r#"            <div class="card-footer">"#);
    let _ = writeln!(
        card,
        r#"              <a class="card-link" href="./{slug}/challenge/" target="_blank">Open challenge &rarr;</a>"#
    );
    let _ = writeln!(
        card,
        r#"              <form class="flag-form" data-slug="{slug}" onsubmit="return _checkFlag(event)">"#
    );
    let _ = writeln!(
        card,
        r#"                <input type="text" class="flag-input" placeholder="flag{{...}}" autocomplete="off" spellcheck="false" />"#
    );
    let _ = writeln!(card, r#"                <button type="submit" class="flag-btn">Submit</button>"#);
    let _ = writeln!(card, "              </form>");
    let _ = writeln!(card, r#"              <div class="flag-result" data-result="{slug}"></div>"#);
    let _ = writeln!(card, "            </div>");
    let _ = write!(card, "          </div>");
    card
}

fn group_section(group: &ChallengeGroup, cards: &[String]) -> String {
    let name = html_escape(&group.name);
    let slug = html_escape(&group.slug);
    let count = group.challenges.len();
    let description = if group.description.is_empty() {
        String::new()
    } else {
        format!(
            "\n          <p class=\"group-description\">{}</p>",
            html_escape(&group.description)
        )
    };
    let cards_block = cards.join("\n");

    format!(
        r#"        <div class="group" data-group="{slug}">
          <div class="group-header" onclick="_toggleGroup(this)">
            <div class="group-header-left">
              <span class="group-chevron">&#9662;</span>
              <h2 class="group-title">{name}</h2>
              <span class="group-count">{count}</span>
            </div>
            <span class="group-progress" data-group-progress="{slug}"></span>
          </div>{description}
          <div class="group-body">
{cards_block}
          </div>
        </div>"#
    )
}

/// `{ "group-slug": ["member", ...] }` entries consumed by the shared
/// script for per-group progress rendering.
fn group_map_js(groups: &[ChallengeGroup]) -> String {
    groups
        .iter()
        .map(|group| {
            let members = group
                .challenges
                .iter()
                .map(|c| format!("\"{}\"", dir_name(c)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("    \"{}\": [{members}]", html_escape(&group.slug))
        })
        .collect::<Vec<_>>()
        .join(",\n")
}
