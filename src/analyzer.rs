//! Local codebase analysis: languages, dependencies, recent commits.
//!
//! Analysis is purely local and read-only. The directory walk runs on the
//! blocking pool so protocol loops never stall on filesystem latency; the
//! commit lookup shells out to `git` and degrades to an empty list when
//! the directory is not a repository.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::errors::{AppError, Result};

/// Directory names never descended into during the walk. Hidden
/// directories (leading dot) are skipped as well.
const SKIP_DIRS: &[&str] = &["node_modules", "target", "dist", "vendor", "build"];

/// Number of commit subjects fetched from `git log`.
const COMMIT_LIMIT: usize = 5;

/// Aggregated view of one codebase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodebaseReport {
    /// Project name from a manifest, falling back to the directory name.
    #[serde(rename = "projectName")]
    pub project_name: String,
    /// Absolute path of the scanned directory.
    pub path: String,
    /// Languages by file count, descending.
    pub languages: Vec<LanguageStat>,
    /// Dependency names declared in recognized manifests, sorted and
    /// deduplicated.
    pub dependencies: Vec<String>,
    /// Most recent commit subjects, newest first.
    #[serde(rename = "recentCommits")]
    pub recent_commits: Vec<CommitInfo>,
}

/// File count for one detected language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageStat {
    /// Language display name.
    pub language: String,
    /// Number of files attributed to it.
    pub files: usize,
}

/// One recent commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Abbreviated commit hash.
    pub hash: String,
    /// Commit subject line.
    pub subject: String,
}

/// Scan `dir` and build a [`CodebaseReport`].
///
/// # Errors
///
/// Returns [`AppError::Tool`] when `dir` does not exist or its top level
/// cannot be read. Unreadable subdirectories are skipped, not fatal.
pub async fn scan_codebase(dir: &Path) -> Result<CodebaseReport> {
    let root = dir
        .canonicalize()
        .map_err(|err| AppError::Tool(format!("cannot analyze {}: {err}", dir.display())))?;

    let walk_root = root.clone();
    let (languages, dependencies, manifest_name) =
        tokio::task::spawn_blocking(move || walk(&walk_root))
            .await
            .map_err(|err| AppError::Tool(format!("analysis task panicked: {err}")))??;

    let recent_commits = recent_commits(&root).await;

    let project_name = manifest_name.unwrap_or_else(|| {
        root.file_name().map_or_else(
            || "unknown".to_owned(),
            |name| name.to_string_lossy().into_owned(),
        )
    });

    Ok(CodebaseReport {
        project_name,
        path: root.to_string_lossy().into_owned(),
        languages,
        dependencies,
        recent_commits,
    })
}

type WalkOutput = (Vec<LanguageStat>, Vec<String>, Option<String>);

/// Synchronous directory walk; runs on the blocking pool.
fn walk(root: &Path) -> Result<WalkOutput> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    count_files(root, &mut counts)?;

    let mut languages: Vec<LanguageStat> = counts
        .into_iter()
        .map(|(language, files)| LanguageStat { language, files })
        .collect();
    languages.sort_by(|a, b| {
        b.files
            .cmp(&a.files)
            .then_with(|| a.language.cmp(&b.language))
    });

    let (dependencies, manifest_name) = read_manifests(root);

    Ok((languages, dependencies, manifest_name))
}

/// Recursively tally language file counts under `dir`.
///
/// Only the caller's own `read_dir` failure is fatal; unreadable nested
/// directories are logged and skipped.
fn count_files(dir: &Path, counts: &mut HashMap<String, usize>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .map_err(|err| AppError::Tool(format!("cannot read {}: {err}", dir.display())))?;

    for entry in entries {
        let Ok(entry) = entry else { continue };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();

        if file_type.is_dir() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') || SKIP_DIRS.contains(&name.as_ref()) {
                continue;
            }
            if let Err(err) = count_files(&path, counts) {
                debug!(%err, "skipping unreadable directory");
            }
        } else if file_type.is_file() {
            if let Some(language) = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(language_for)
            {
                *counts.entry(language.to_owned()).or_insert(0) += 1;
            }
        }
    }

    Ok(())
}

/// Map a file extension to a language display name.
fn language_for(extension: &str) -> Option<&'static str> {
    let language = match extension {
        "rs" => "Rust",
        "ts" | "tsx" => "TypeScript",
        "js" | "jsx" | "mjs" | "cjs" => "JavaScript",
        "py" => "Python",
        "go" => "Go",
        "java" => "Java",
        "rb" => "Ruby",
        "c" | "h" => "C",
        "cpp" | "cc" | "cxx" | "hpp" => "C++",
        "cs" => "C#",
        "php" => "PHP",
        "swift" => "Swift",
        "kt" | "kts" => "Kotlin",
        "scala" => "Scala",
        "sh" | "bash" => "Shell",
        "html" => "HTML",
        "css" | "scss" => "CSS",
        "sql" => "SQL",
        "md" => "Markdown",
        "yml" | "yaml" => "YAML",
        "toml" => "TOML",
        "json" => "JSON",
        _ => return None,
    };
    Some(language)
}

/// Collect dependency names and a project name from recognized manifests.
///
/// Name precedence follows lookup order: `package.json`, `Cargo.toml`,
/// then the `go.mod` module path.
fn read_manifests(root: &Path) -> (Vec<String>, Option<String>) {
    let mut dependencies = Vec::new();
    let mut name = None;

    if let Ok(raw) = fs::read_to_string(root.join("package.json")) {
        if let Ok(pkg) = serde_json::from_str::<PackageJson>(&raw) {
            if name.is_none() {
                name = pkg.name;
            }
            dependencies.extend(pkg.dependencies.into_keys());
            dependencies.extend(pkg.dev_dependencies.into_keys());
        }
    }

    if let Ok(raw) = fs::read_to_string(root.join("Cargo.toml")) {
        if let Ok(manifest) = toml::from_str::<CargoManifest>(&raw) {
            if name.is_none() {
                name = manifest.package.and_then(|package| package.name);
            }
            dependencies.extend(manifest.dependencies.into_keys());
        }
    }

    if let Ok(raw) = fs::read_to_string(root.join("requirements.txt")) {
        dependencies.extend(parse_requirements(&raw));
    }

    if let Ok(raw) = fs::read_to_string(root.join("go.mod")) {
        let (module, deps) = parse_go_mod(&raw);
        if name.is_none() {
            name = module;
        }
        dependencies.extend(deps);
    }

    dependencies.sort();
    dependencies.dedup();
    (dependencies, name)
}

/// Parse `requirements.txt`: one package per line, with comments, pip
/// flags, version pins, and extras stripped.
fn parse_requirements(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(|line| {
            let package = line
                .split(|c: char| matches!(c, '=' | '<' | '>' | '~' | '!' | '[' | ';' | ' '))
                .next()
                .unwrap_or_default()
                .trim();
            (!package.is_empty()).then(|| package.to_owned())
        })
        .collect()
}

/// Parse `go.mod`: the module path plus require entries.
fn parse_go_mod(raw: &str) -> (Option<String>, Vec<String>) {
    let mut module = None;
    let mut deps = Vec::new();
    let mut in_require_block = false;

    for line in raw.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("module ") {
            module = Some(rest.trim().to_owned());
        } else if line.starts_with("require (") {
            in_require_block = true;
        } else if in_require_block && line == ")" {
            in_require_block = false;
        } else if in_require_block {
            if let Some(name) = line.split_whitespace().next() {
                if !name.starts_with("//") {
                    deps.push(name.to_owned());
                }
            }
        } else if let Some(rest) = line.strip_prefix("require ") {
            if let Some(name) = rest.split_whitespace().next() {
                deps.push(name.to_owned());
            }
        }
    }

    (module, deps)
}

/// Fetch the latest commit subjects via `git log`.
///
/// A directory that is not a git repository, or a machine without `git`,
/// yields an empty list rather than an error.
async fn recent_commits(root: &Path) -> Vec<CommitInfo> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["log", "-n"])
        .arg(COMMIT_LIMIT.to_string())
        .arg("--pretty=format:%h%x09%s")
        .output()
        .await;

    let output = match output {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            debug!(status = %output.status, "git log unavailable");
            return Vec::new();
        }
        Err(err) => {
            debug!(%err, "git not runnable");
            return Vec::new();
        }
    };

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| {
            let (hash, subject) = line.split_once('\t')?;
            Some(CommitInfo {
                hash: hash.to_owned(),
                subject: subject.trim().to_owned(),
            })
        })
        .take(COMMIT_LIMIT)
        .collect()
}

// ── Manifest wire types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PackageJson {
    name: Option<String>,
    #[serde(default)]
    dependencies: HashMap<String, Value>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CargoManifest {
    package: Option<CargoPackage>,
    #[serde(default)]
    dependencies: HashMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
struct CargoPackage {
    name: Option<String>,
}
