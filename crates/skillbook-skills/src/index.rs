//! Skills index builder
//!
//! Produces a `skills-index.json` style manifest describing every skill
//! package in a directory. Frontmatter is read leniently here: a missing
//! name falls back to the directory name and a missing description is
//! recorded as empty, so the index reflects the corpus as it is.

use chrono::Utc;
use serde::Serialize;
use skillbook_types::Platform;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, SkillError};
use crate::frontmatter::{extract_keywords, extract_title, parse_frontmatter, split_frontmatter};
use crate::fsutil::{directory_size, format_size, list_files};
use crate::registry::is_hidden;
use crate::skill::{detect_platforms, SkillFrontmatter, SKILL_FILE};

/// Format version of the generated index
pub const INDEX_VERSION: &str = "1.0.0";

/// One skill in the index
#[derive(Debug, Clone, Serialize)]
pub struct IndexEntry {
    pub name: String,
    pub title: String,
    pub description: String,
    pub version: String,
    pub license: String,
    pub category: String,
    pub domain: String,
    pub keywords: Vec<String>,
    pub tools: Vec<String>,
    pub tools_count: usize,
    pub references: Vec<String>,
    pub references_count: usize,
    pub assets: Vec<String>,
    pub assets_count: usize,
    pub platforms: Vec<Platform>,
    pub size_bytes: u64,
    pub size_human: String,
    pub path: String,
}

/// Aggregate statistics over all indexed skills
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexSummary {
    pub total_tools: usize,
    pub total_references: usize,
    pub total_size: String,
    pub total_size_bytes: u64,
    pub categories: BTreeMap<String, usize>,
    pub domains: BTreeMap<String, usize>,
    pub platforms: BTreeMap<Platform, usize>,
}

/// The complete index
#[derive(Debug, Clone, Serialize)]
pub struct SkillsIndex {
    pub version: String,
    pub generated_at: String,
    pub source_directory: PathBuf,
    pub skills_count: usize,
    pub summary: IndexSummary,
    pub skills: Vec<IndexEntry>,
}

/// Build an index of the skill packages directly under `dir`
pub fn build_index(dir: &Path, category: Option<&str>) -> Result<SkillsIndex> {
    let source = dir.canonicalize().map_err(|e| SkillError::io(dir, e))?;
    if !source.is_dir() {
        return Err(SkillError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(&source)
        .map_err(|e| SkillError::io(&source, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && !is_hidden(path))
        .collect();
    paths.sort();

    let mut skills = Vec::new();
    for path in paths {
        let Some(entry) = scan_skill(&path) else {
            continue;
        };

        if let Some(wanted) = category {
            if !entry.category.eq_ignore_ascii_case(wanted) {
                continue;
            }
        }

        skills.push(entry);
    }

    let summary = summarize(&skills);
    info!("Indexed {} skills from {:?}", skills.len(), source);

    Ok(SkillsIndex {
        version: INDEX_VERSION.to_string(),
        generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        source_directory: source,
        skills_count: skills.len(),
        summary,
        skills,
    })
}

/// Scan one skill directory. Returns `None` when it has no readable SKILL.md.
pub fn scan_skill(skill_dir: &Path) -> Option<IndexEntry> {
    let skill_file = skill_dir.join(SKILL_FILE);
    if !skill_file.is_file() {
        return None;
    }

    let content = match fs::read_to_string(&skill_file) {
        Ok(content) => content,
        Err(e) => {
            debug!("Skipping {:?}: {}", skill_file, e);
            return None;
        }
    };

    let frontmatter: SkillFrontmatter = match parse_frontmatter(&content, &skill_file) {
        Ok((frontmatter, _)) => frontmatter,
        Err(e) => {
            debug!("Unreadable frontmatter in {:?}: {}", skill_file, e);
            SkillFrontmatter::default()
        }
    };
    let body = split_frontmatter(&content).map_or(content.as_str(), |(_, body)| body);

    let dir_name = skill_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = frontmatter.name().unwrap_or(&dir_name).to_string();

    let tools = list_files(&skill_dir.join("scripts"), Some("py"));
    let references = list_files(&skill_dir.join("references"), Some("md"));
    let assets = list_files(&skill_dir.join("assets"), None);
    let size_bytes = directory_size(skill_dir);

    Some(IndexEntry {
        title: extract_title(body).unwrap_or_else(|| name.clone()),
        description: frontmatter.description().unwrap_or_default().to_string(),
        version: frontmatter.version().unwrap_or("0.0.0").to_string(),
        license: frontmatter.license.clone().unwrap_or_default(),
        category: frontmatter.category().unwrap_or_default().to_string(),
        domain: frontmatter.domain().unwrap_or_default().to_string(),
        keywords: extract_keywords(body),
        tools_count: tools.len(),
        tools,
        references_count: references.len(),
        references,
        assets_count: assets.len(),
        assets,
        platforms: detect_platforms(skill_dir),
        size_bytes,
        size_human: format_size(size_bytes),
        path: dir_name,
        name,
    })
}

fn summarize(skills: &[IndexEntry]) -> IndexSummary {
    let mut summary = IndexSummary::default();

    for skill in skills {
        summary.total_tools += skill.tools_count;
        summary.total_references += skill.references_count;
        summary.total_size_bytes += skill.size_bytes;

        let category = non_empty_or(&skill.category, "uncategorized");
        *summary.categories.entry(category).or_insert(0) += 1;

        let domain = non_empty_or(&skill.domain, "unspecified");
        *summary.domains.entry(domain).or_insert(0) += 1;

        for platform in &skill.platforms {
            *summary.platforms.entry(*platform).or_insert(0) += 1;
        }
    }

    summary.total_size = format_size(summary.total_size_bytes);
    summary
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Render the index as a human-readable report
pub fn format_human(index: &SkillsIndex) -> String {
    let mut out = String::new();
    let rule = "-".repeat(60);

    let _ = writeln!(out, "Skills Index");
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "Source:    {}", index.source_directory.display());
    let _ = writeln!(out, "Generated: {}", index.generated_at);
    let _ = writeln!(out, "Skills:    {}", index.skills_count);
    let _ = writeln!(out);

    let summary = &index.summary;
    let _ = writeln!(out, "Total Tools:      {}", summary.total_tools);
    let _ = writeln!(out, "Total References: {}", summary.total_references);
    let _ = writeln!(out, "Total Size:       {}", summary.total_size);
    let _ = writeln!(out);

    if !summary.categories.is_empty() {
        let _ = writeln!(out, "Categories:");
        for (category, count) in &summary.categories {
            let _ = writeln!(out, "  {}: {}", category, count);
        }
        let _ = writeln!(out);
    }

    if !summary.platforms.is_empty() {
        let _ = writeln!(out, "Platform Support:");
        for (platform, count) in &summary.platforms {
            let _ = writeln!(out, "  {}: {} skill(s)", platform, count);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{:<30} {:<10} {:<8} Platforms", "Name", "Version", "Tools");
    let _ = writeln!(out, "{}", rule);

    for skill in &index.skills {
        let name = truncate_name(&skill.name);
        let platforms: Vec<&str> = skill.platforms.iter().map(Platform::as_str).collect();
        let _ = writeln!(
            out,
            "{:<30} {:<10} {:<8} {}",
            name,
            skill.version,
            skill.tools_count,
            platforms.join(", ")
        );
    }

    let _ = writeln!(out, "{}", rule);
    let _ = write!(out, "Total: {} skills", index.skills_count);
    out
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() > 28 {
        let head: String = name.chars().take(25).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}
