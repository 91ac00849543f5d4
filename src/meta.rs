//! Challenge and group metadata plus source-root discovery.
//!
//! A **challenge** is a directory carrying a `.challenge.json` record; a
//! **group** is a directory carrying `.group.json` whose challenge
//! subdirectories are its members. Challenges at the source root outside
//! any group land in an implicit trailing "Ungrouped" bucket.

use crate::error::CompileError;
use anyhow::{Context as _, Result};
use regex::Regex;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

pub const CHALLENGE_META: &str = ".challenge.json";
pub const GROUP_META: &str = ".group.json";

/// Directories at the source root that are never challenge or group sources.
const IGNORED_DIRS: &[&str] = &["dist", "node_modules", "target"];

/// Hidden markdown files (e.g. `.solving-guide.md`) are author-only
/// documentation and never ship.
static HIDDEN_MD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\..+\.md$").unwrap());

pub fn is_hidden_markdown(name: &str) -> bool {
    HIDDEN_MD_RE.is_match(name)
}

pub fn is_metadata_file(name: &str) -> bool {
    name == CHALLENGE_META || name == GROUP_META
}

// ============================================================================
// Metadata Records
// ============================================================================

/// Parsed `.challenge.json`.
///
/// Every field is optional in the source file; the flag hash is a hex
/// digest of the correct flag, never the flag itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChallengeMeta {
    pub title: Option<String>,
    pub difficulty: String,
    pub summary: String,
    pub slug: Option<String>,
    pub flag_hash: String,
}

impl Default for ChallengeMeta {
    fn default() -> Self {
        Self {
            title: None,
            difficulty: "Unknown".to_owned(),
            summary: String::new(),
            slug: None,
            flag_hash: String::new(),
        }
    }
}

impl ChallengeMeta {
    /// Load `.challenge.json` from a challenge directory.
    pub fn load(challenge_dir: &Path) -> Result<Self, CompileError> {
        let path = challenge_dir.join(CHALLENGE_META);
        if !path.is_file() {
            return Err(CompileError::MissingDependency {
                path: challenge_dir.to_path_buf(),
                missing: path,
            });
        }
        let raw = fs::read_to_string(&path).map_err(|err| CompileError::io(&path, err))?;
        serde_json::from_str(&raw).map_err(|err| CompileError::MalformedInput {
            path,
            reason: err.to_string(),
        })
    }

    /// Display title, derived from the slug when the record has none.
    pub fn title_for(&self, slug: &str) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| title_from_slug(slug))
    }

    pub fn color(&self) -> &'static str {
        difficulty_color(&self.difficulty)
    }
}

/// Parsed `.group.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupMeta {
    pub name: Option<String>,
    pub description: String,
}

impl GroupMeta {
    pub fn load(group_dir: &Path) -> Result<Self, CompileError> {
        let path = group_dir.join(GROUP_META);
        if !path.is_file() {
            return Err(CompileError::MissingDependency {
                path: group_dir.to_path_buf(),
                missing: path,
            });
        }
        let raw = fs::read_to_string(&path).map_err(|err| CompileError::io(&path, err))?;
        serde_json::from_str(&raw).map_err(|err| CompileError::MalformedInput {
            path,
            reason: err.to_string(),
        })
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// A named bucket of challenges for homepage display.
#[derive(Debug, Clone)]
pub struct ChallengeGroup {
    pub name: String,
    pub description: String,
    pub slug: String,
    pub challenges: Vec<PathBuf>,
}

/// Discover groups and challenges at the source root, in name order.
///
/// Ungrouped challenges are appended as a final implicit group, so the
/// result is stable across repeated runs of an unchanged tree.
pub fn discover_groups(root: &Path) -> Result<Vec<ChallengeGroup>> {
    let mut groups = Vec::new();
    let mut ungrouped = Vec::new();

    for dir in sorted_subdirs(root)? {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.starts_with('.') || IGNORED_DIRS.contains(&name.as_str()) {
            continue;
        }

        if dir.join(GROUP_META).is_file() {
            let meta = GroupMeta::load(&dir)?;
            let members: Vec<PathBuf> = sorted_subdirs(&dir)?
                .into_iter()
                .filter(|p| {
                    let member = p.file_name().map(|n| n.to_string_lossy().into_owned());
                    member.is_some_and(|n| !n.starts_with('.')) && p.join(CHALLENGE_META).is_file()
                })
                .collect();
            if !members.is_empty() {
                groups.push(ChallengeGroup {
                    name: meta.name.unwrap_or_else(|| title_from_slug(&name)),
                    description: meta.description,
                    slug: name,
                    challenges: members,
                });
            }
        } else if dir.join(CHALLENGE_META).is_file() {
            ungrouped.push(dir);
        }
    }

    if !ungrouped.is_empty() {
        groups.push(ChallengeGroup {
            name: "Ungrouped".to_owned(),
            description: String::new(),
            slug: "_ungrouped".to_owned(),
            challenges: ungrouped,
        });
    }

    Ok(groups)
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut subdirs: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();
    Ok(subdirs)
}

// ============================================================================
// Derivations
// ============================================================================

pub fn difficulty_color(difficulty: &str) -> &'static str {
    match difficulty.to_ascii_lowercase().as_str() {
        "easy" => "#22c55e",
        "medium" => "#e05a33",
        "hard" => "#ef4444",
        "insane" => "#a855f7",
        _ => "#6b7280",
    }
}

/// Derive a display title from a slug: `-`/`_` become spaces, words are
/// title-cased.
pub fn title_from_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_challenge(dir: &Path, slug: &str, json: &str) {
        let cdir = dir.join(slug);
        fs::create_dir_all(&cdir).unwrap();
        fs::write(cdir.join(CHALLENGE_META), json).unwrap();
    }

    #[test]
    fn test_title_from_slug() {
        assert_eq!(title_from_slug("pipeline"), "Pipeline");
        assert_eq!(title_from_slug("broken-build"), "Broken Build");
        assert_eq!(title_from_slug("sql_INJECTION"), "Sql Injection");
        assert_eq!(title_from_slug("a--b"), "A B");
    }

    #[test]
    fn test_difficulty_color() {
        assert_eq!(difficulty_color("easy"), "#22c55e");
        assert_eq!(difficulty_color("Medium"), "#e05a33");
        assert_eq!(difficulty_color("HARD"), "#ef4444");
        assert_eq!(difficulty_color("insane"), "#a855f7");
        assert_eq!(difficulty_color("whatever"), "#6b7280");
    }

    #[test]
    fn test_hidden_markdown_matching() {
        assert!(is_hidden_markdown(".solving-guide.md"));
        assert!(is_hidden_markdown(".NOTES.MD"));
        assert!(!is_hidden_markdown("README.md"));
        assert!(!is_hidden_markdown(".gitignore"));
    }

    #[test]
    fn test_challenge_meta_defaults() {
        let meta: ChallengeMeta = serde_json::from_str("{}").unwrap();
        assert_eq!(meta.difficulty, "Unknown");
        assert_eq!(meta.title_for("lost-flag"), "Lost Flag");
        assert!(meta.flag_hash.is_empty());
    }

    #[test]
    fn test_challenge_meta_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ChallengeMeta::load(tmp.path()).unwrap_err();
        assert!(matches!(err, CompileError::MissingDependency { .. }));
    }

    #[test]
    fn test_challenge_meta_malformed_json() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(CHALLENGE_META), "{not json").unwrap();
        let err = ChallengeMeta::load(tmp.path()).unwrap_err();
        assert!(matches!(err, CompileError::MalformedInput { .. }));
    }

    #[test]
    fn test_discover_groups_and_ungrouped() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();

        // Group A with two challenges, group B with one, plus ungrouped c1
        let a = root.join("a-group");
        fs::create_dir_all(&a).unwrap();
        fs::write(a.join(GROUP_META), r#"{"name": "Group A"}"#).unwrap();
        write_challenge(&a, "a1", "{}");
        write_challenge(&a, "a2", "{}");

        let b = root.join("b-group");
        fs::create_dir_all(&b).unwrap();
        fs::write(b.join(GROUP_META), "{}").unwrap();
        write_challenge(&b, "b1", "{}");

        write_challenge(root, "c1", "{}");

        // Noise that must be ignored
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("dist")).unwrap();
        fs::create_dir_all(root.join("not-a-challenge")).unwrap();

        let groups = discover_groups(root).unwrap();
        assert_eq!(groups.len(), 3);

        assert_eq!(groups[0].name, "Group A");
        assert_eq!(groups[0].slug, "a-group");
        assert_eq!(groups[0].challenges.len(), 2);

        assert_eq!(groups[1].name, "B Group"); // derived from slug
        assert_eq!(groups[1].challenges.len(), 1);

        assert_eq!(groups[2].slug, "_ungrouped");
        assert_eq!(groups[2].challenges.len(), 1);

        let total: usize = groups.iter().map(|g| g.challenges.len()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_discover_is_deterministic() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write_challenge(root, "zeta", "{}");
        write_challenge(root, "alpha", "{}");

        let first = discover_groups(root).unwrap();
        let second = discover_groups(root).unwrap();
        let names =
            |groups: &[ChallengeGroup]| -> Vec<PathBuf> { groups[0].challenges.clone() };
        assert_eq!(names(&first), names(&second));
        assert!(first[0].challenges[0].ends_with("alpha"));
    }

    #[test]
    fn test_group_without_member_challenges_is_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let g = root.join("empty-group");
        fs::create_dir_all(g.join("no-meta-here")).unwrap();
        fs::write(g.join(GROUP_META), "{}").unwrap();

        assert!(discover_groups(root).unwrap().is_empty());
    }
}
