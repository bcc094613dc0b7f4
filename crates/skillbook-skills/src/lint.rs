//! Corpus lint
//!
//! Walks a tree of skills and agents and reports structural problems:
//! missing or incomplete frontmatter, invalid or duplicated names, script
//! references that do not exist and relative links that do not resolve.

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Result, SkillError};
use crate::frontmatter::{parse_frontmatter, split_frontmatter};
use crate::skill::{validate_name, SkillFrontmatter, SKILL_FILE};

const SKIPPED_DIRS: [&str; 3] = [".git", "node_modules", "target"];

/// A single lint problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintFinding {
    pub path: PathBuf,
    /// 1-based line, when the problem is tied to one
    pub line: Option<usize>,
    pub rule: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LintReport {
    pub root: PathBuf,
    pub files_checked: usize,
    pub findings: Vec<LintFinding>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FileKind {
    Skill,
    Agent,
}

struct Patterns {
    script: Regex,
    link: Regex,
    inline_code: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        Ok(Self {
            script: Regex::new(r#"(?:^|[\s`'"(\[=])scripts/([\w./-]*\w)"#)?,
            link: Regex::new(r#"\[[^\]]*\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#)?,
            inline_code: Regex::new(r"`[^`]*`")?,
        })
    }
}

/// Lint every skill and agent file under `root`
pub fn lint_tree(root: &Path) -> Result<LintReport> {
    if !root.is_dir() {
        return Err(SkillError::NotFound(root.display().to_string()));
    }

    let patterns = Patterns::new()?;
    let mut findings = Vec::new();
    let mut files_checked = 0;
    // (kind, scope directory, name) -> first file that used it
    let mut seen: HashMap<(FileKind, PathBuf, String), PathBuf> = HashMap::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(kind) = classify(entry.path()) else {
            continue;
        };

        let path = entry.path();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Skipping unreadable file {}: {}", path.display(), e);
                continue;
            }
        };
        files_checked += 1;

        if let Some(name) = lint_frontmatter(path, &content, &mut findings) {
            let scope = match kind {
                FileKind::Skill => path.parent().and_then(Path::parent),
                FileKind::Agent => path.parent(),
            }
            .map(Path::to_path_buf)
            .unwrap_or_default();

            if let Some(first) = seen.get(&(kind, scope.clone(), name.clone())) {
                findings.push(LintFinding {
                    path: path.to_path_buf(),
                    line: field_line(&content, "name"),
                    rule: "duplicate-name",
                    message: format!("name '{}' is already used by {}", name, first.display()),
                });
            } else {
                seen.insert((kind, scope, name), path.to_path_buf());
            }
        }

        if kind == FileKind::Skill {
            lint_scripts(path, &content, &patterns, &mut findings);
        }
        lint_links(path, &content, &patterns, &mut findings);
    }

    info!(
        "Linted {} file(s) under {}: {} finding(s)",
        files_checked,
        root.display(),
        findings.len()
    );

    Ok(LintReport {
        root: root.to_path_buf(),
        files_checked,
        findings,
    })
}

fn is_skipped(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    SKIPPED_DIRS.contains(&&*name) || (name.starts_with('.') && name != ".claude")
}

fn classify(path: &Path) -> Option<FileKind> {
    if path.file_name().is_some_and(|n| n == SKILL_FILE) {
        return Some(FileKind::Skill);
    }
    let in_agents_dir = path
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|n| n == "agents");
    let is_markdown = path.extension().is_some_and(|ext| ext == "md");
    (in_agents_dir && is_markdown).then_some(FileKind::Agent)
}

/// Check frontmatter fields and return the declared name when there is one
fn lint_frontmatter(path: &Path, content: &str, findings: &mut Vec<LintFinding>) -> Option<String> {
    let finding = |line, rule, message: String| LintFinding {
        path: path.to_path_buf(),
        line,
        rule,
        message,
    };

    if split_frontmatter(content).is_none() {
        findings.push(finding(
            Some(1),
            "missing-frontmatter",
            "file does not start with a --- delimited YAML block".to_string(),
        ));
        return None;
    }

    let frontmatter = match parse_frontmatter::<SkillFrontmatter>(content, path) {
        Ok((frontmatter, _)) => frontmatter,
        Err(e) => {
            findings.push(finding(Some(1), "missing-frontmatter", e.to_string()));
            return None;
        }
    };

    if frontmatter.description().is_none() {
        findings.push(finding(
            None,
            "missing-description",
            "frontmatter has no description".to_string(),
        ));
    }

    let Some(name) = frontmatter.name() else {
        findings.push(finding(
            None,
            "missing-name",
            "frontmatter has no name".to_string(),
        ));
        return None;
    };

    if let Err(e) = validate_name(name) {
        findings.push(finding(field_line(content, "name"), "invalid-name", e.to_string()));
    }

    Some(name.to_string())
}

fn lint_scripts(path: &Path, content: &str, patterns: &Patterns, findings: &mut Vec<LintFinding>) {
    let Some(skill_dir) = path.parent() else {
        return;
    };

    for (index, line) in content.lines().enumerate() {
        for captures in patterns.script.captures_iter(line) {
            let Some(script) = captures.get(1) else {
                continue;
            };
            if !skill_dir.join("scripts").join(script.as_str()).exists() {
                findings.push(LintFinding {
                    path: path.to_path_buf(),
                    line: Some(index + 1),
                    rule: "missing-script",
                    message: format!("scripts/{} does not exist", script.as_str()),
                });
            }
        }
    }
}

fn lint_links(path: &Path, content: &str, patterns: &Patterns, findings: &mut Vec<LintFinding>) {
    let Some(base) = path.parent() else {
        return;
    };

    let mut fence: Option<(char, usize)> = None;
    for (index, line) in content.lines().enumerate() {
        let marker = fence_marker(line);
        match (fence, marker) {
            (None, Some(open)) => {
                fence = Some(open);
                continue;
            }
            (Some((ch, len)), Some((close_ch, close_len)))
                if close_ch == ch && close_len >= len && is_bare_fence(line) =>
            {
                fence = None;
                continue;
            }
            (Some(_), _) => continue,
            (None, None) => {}
        }

        let line = patterns.inline_code.replace_all(line, "");
        for captures in patterns.link.captures_iter(&line) {
            let Some(target) = captures.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if is_external(target) {
                continue;
            }
            let file = target.split('#').next().unwrap_or(target).replace("%20", " ");
            if file.is_empty() || base.join(&file).exists() {
                continue;
            }
            findings.push(LintFinding {
                path: path.to_path_buf(),
                line: Some(index + 1),
                rule: "broken-link",
                message: format!("link target '{}' does not exist", target),
            });
        }
    }
}

/// Fence character and run length when `line` opens or closes a code fence
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    (len >= 3).then_some((ch, len))
}

/// A closing fence carries no info string
fn is_bare_fence(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.chars().all(|c| c == '`') || trimmed.chars().all(|c| c == '~')
}

fn is_external(target: &str) -> bool {
    target.starts_with('#')
        || target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with("mailto:")
}

/// 1-based line of a top-level frontmatter field
fn field_line(content: &str, field: &str) -> Option<usize> {
    let prefix = format!("{}:", field);
    content
        .lines()
        .enumerate()
        .skip(1)
        .take_while(|(_, line)| line.trim_end() != "---")
        .find(|(_, line)| line.starts_with(&prefix))
        .map(|(index, _)| index + 1)
}
