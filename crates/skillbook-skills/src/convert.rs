//! SKILL.md to Codex converter
//!
//! Generates `agents/openai.yaml` for an existing skill so that it can be
//! consumed by Codex-style runtimes, optionally copying the package to a new
//! output directory.

use regex::Regex;
use serde::Serialize;
use skillbook_types::AgentTool;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::agent::OPENAI_YAML;
use crate::error::{Result, SkillError};
use crate::frontmatter::{extract_title, parse_frontmatter, split_frontmatter};
use crate::fsutil::{copy_dir, list_files};
use crate::skill::{SkillFrontmatter, SKILL_FILE};

const DEFAULT_VERSION: &str = "1.0.0";
const MAX_WORKFLOWS: usize = 5;
const MAX_BEST_PRACTICES: usize = 8;
const COPIED_DIRS: [&str; 3] = ["scripts", "references", "assets"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Success,
    Error,
}

/// Outcome of [`convert_skill`]. Failures are reported here rather than as
/// an `Err` so callers can print warnings gathered before the failure.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub status: ConversionStatus,
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub files_generated: Vec<PathBuf>,
    pub files_copied: Vec<PathBuf>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConversionReport {
    fn new(source: &Path) -> Self {
        Self {
            status: ConversionStatus::Success,
            source: source.to_path_buf(),
            output_dir: PathBuf::new(),
            files_generated: Vec::new(),
            files_copied: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = ConversionStatus::Error;
        self.errors.push(error.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ConversionStatus::Success
    }
}

#[derive(Debug, Serialize)]
struct OpenAiConfig<'a> {
    name: &'a str,
    description: &'a str,
    instructions: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AgentTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    version: &'a str,
}

/// Workflow headings and best practices pulled from a skill body
#[derive(Debug, Default, PartialEq, Eq)]
pub struct KeySections {
    pub workflows: Vec<String>,
    pub best_practices: Vec<String>,
}

/// Convert the skill at `skill_md`, writing into `output_dir` (defaults to
/// the skill's own directory)
pub fn convert_skill(skill_md: &Path, output_dir: Option<&Path>) -> ConversionReport {
    let mut report = ConversionReport::new(skill_md);

    let skill_md = match skill_md.canonicalize() {
        Ok(path) if path.is_file() => path,
        _ => return report.fail(format!("File not found: {}", skill_md.display())),
    };

    report.source = skill_md.clone();
    match convert_inner(&skill_md, output_dir, &mut report) {
        Ok(()) => {
            info!(
                "Converted {} into {}",
                skill_md.display(),
                report.output_dir.display()
            );
            report
        }
        Err(e) => report.fail(e.to_string()),
    }
}

fn convert_inner(skill_md: &Path, output_dir: Option<&Path>, report: &mut ConversionReport) -> Result<()> {
    if skill_md.file_name().is_some_and(|n| n != SKILL_FILE) {
        report.warnings.push(format!(
            "Expected filename 'SKILL.md', got '{}'. Proceeding anyway.",
            skill_md
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));
    }

    let skill_dir = skill_md
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let out_path = match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| SkillError::io(dir, e))?;
            dir.canonicalize().map_err(|e| SkillError::io(dir, e))?
        }
        None => skill_dir.clone(),
    };
    report.output_dir = out_path.clone();

    let content = fs::read_to_string(skill_md).map_err(|e| SkillError::io(skill_md, e))?;
    let (frontmatter, body) = match parse_frontmatter::<SkillFrontmatter>(&content, skill_md) {
        Ok(parsed) => parsed,
        Err(SkillError::MissingFrontmatter(_)) => {
            report
                .warnings
                .push("No YAML frontmatter found. Using defaults.".to_string());
            (SkillFrontmatter::default(), content.as_str())
        }
        Err(e) => {
            report
                .warnings
                .push(format!("Invalid YAML frontmatter ({}). Using defaults.", e));
            let body = split_frontmatter(&content).map_or(content.as_str(), |(_, body)| body);
            (SkillFrontmatter::default(), body)
        }
    };

    let dir_name = skill_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = frontmatter.name().unwrap_or(&dir_name).to_string();
    let title = extract_title(body).unwrap_or_else(|| name.clone());

    let description = match frontmatter.description() {
        Some(description) => description.to_string(),
        None => {
            report
                .warnings
                .push("No description in frontmatter. Generated a default.".to_string());
            format!("Expert guidance for {}.", title)
        }
    };

    let tools = extract_tools(&skill_dir)?;
    let instructions = build_instructions(frontmatter.description(), body, &title)?;
    let version = frontmatter
        .metadata
        .as_ref()
        .and_then(|m| m.version.as_deref())
        .unwrap_or(DEFAULT_VERSION);
    let model = frontmatter.codex.as_ref().and_then(|c| c.model.as_deref());

    let config = OpenAiConfig {
        name: &name,
        description: &description,
        instructions: &instructions,
        tools,
        model,
        version,
    };
    let yaml = serde_yaml::to_string(&config).map_err(|source| SkillError::Yaml {
        path: skill_md.to_path_buf(),
        source,
    })?;

    let yaml_path = out_path.join(OPENAI_YAML);
    if out_path == skill_dir && yaml_path.is_file() {
        warn!("Overwriting {}", yaml_path.display());
        report.warnings.push(
            "Overwrote existing agents/openai.yaml. Previous version not backed up.".to_string(),
        );
    }
    if let Some(agents_dir) = yaml_path.parent() {
        fs::create_dir_all(agents_dir).map_err(|e| SkillError::io(agents_dir, e))?;
    }
    fs::write(&yaml_path, yaml).map_err(|e| SkillError::io(&yaml_path, e))?;
    report.files_generated.push(yaml_path);

    if out_path != skill_dir {
        copy_package(skill_md, &skill_dir, &out_path, report);
    }

    Ok(())
}

fn copy_package(skill_md: &Path, skill_dir: &Path, out_path: &Path, report: &mut ConversionReport) {
    for subdir in COPIED_DIRS {
        let src = skill_dir.join(subdir);
        if !src.is_dir() {
            continue;
        }
        let dst = out_path.join(subdir);
        match copy_dir(&src, &dst, |_| false) {
            Ok(()) => report.files_copied.push(dst),
            Err(e) => report
                .warnings
                .push(format!("Could not copy {}/: {}", subdir, e)),
        }
    }

    let dst_skill = out_path.join(SKILL_FILE);
    match fs::copy(skill_md, &dst_skill) {
        Ok(_) => report.files_copied.push(dst_skill),
        Err(e) => report
            .warnings
            .push(format!("Could not copy SKILL.md: {}", e)),
    }
}

/// One tool per `scripts/*.py`, described by the first docstring line
pub fn extract_tools(skill_dir: &Path) -> Result<Vec<AgentTool>> {
    let scripts_dir = skill_dir.join("scripts");
    if !scripts_dir.is_dir() {
        return Ok(Vec::new());
    }

    let docstrings = [
        Regex::new(r#"(?s)\A(?:#[^\n]*\n|\s)*"""(.*?)""""#)?,
        Regex::new(r"(?s)\A(?:#[^\n]*\n|\s)*'''(.*?)'''")?,
    ];

    let mut tools = Vec::new();
    for file in list_files(&scripts_dir, Some("py")) {
        let path = scripts_dir.join(&file);
        let stem = Path::new(&file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.clone());

        let docstring = fs::read_to_string(&path).ok().and_then(|source| {
            docstrings
                .iter()
                .find_map(|re| re.captures(&source))
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().trim().lines().next().map(str::trim))
                .filter(|line| !line.is_empty())
                .map(str::to_string)
        });
        debug!("Tool {} from {}", stem, path.display());

        tools.push(AgentTool {
            name: stem,
            description: docstring.unwrap_or_else(|| format!("Runs {}", file)),
            command: format!("python scripts/{}", file),
        });
    }

    Ok(tools)
}

/// Collect `###` workflow headings and items under a "Best Practices" heading
pub fn extract_key_sections(body: &str) -> Result<KeySections> {
    let workflow_re = Regex::new(r"^###\s+(?:Workflow\s+\d+[:.]\s*)?(.+)")?;
    let best_practices_re = Regex::new(r"^#{1,3}\s+[Bb]est\s+[Pp]ractices")?;
    let heading_re = Regex::new(r"^#{1,3}\s+")?;
    let numbered_re = Regex::new(r"^\d+[.)]\s+\*\*(.+?)\*\*")?;

    let mut sections = KeySections::default();
    let mut in_best_practices = false;

    for line in body.lines() {
        let stripped = line.trim();

        if stripped.to_lowercase().contains("workflow") {
            if let Some(title) = workflow_re.captures(stripped).and_then(|c| c.get(1)) {
                sections.workflows.push(title.as_str().trim().to_string());
            }
        }

        if best_practices_re.is_match(stripped) {
            in_best_practices = true;
            continue;
        }
        if in_best_practices && heading_re.is_match(stripped) {
            in_best_practices = false;
            continue;
        }
        if !in_best_practices {
            continue;
        }

        if let Some(item) = numbered_re.captures(stripped).and_then(|c| c.get(1)) {
            sections.best_practices.push(item.as_str().trim().to_string());
        } else if stripped.starts_with("- ") || stripped.starts_with("* ") {
            let text = stripped.trim_start_matches(['-', '*', ' ']).trim();
            if !text.is_empty() && !text.starts_with("```") {
                sections.best_practices.push(text.to_string());
            }
        }
    }

    Ok(sections)
}

/// Compose Codex instructions from a skill's description and body
pub fn build_instructions(description: Option<&str>, body: &str, title: &str) -> Result<String> {
    let mut lines = vec![
        format!("You are an expert {} specialist.", title.to_lowercase()),
        String::new(),
    ];

    if let Some(description) = description {
        lines.push("## Purpose".to_string());
        lines.push(description.to_string());
        lines.push(String::new());
    }

    let sections = extract_key_sections(body)?;
    if !sections.workflows.is_empty() {
        lines.push("## Key Workflows".to_string());
        lines.extend(
            sections
                .workflows
                .iter()
                .take(MAX_WORKFLOWS)
                .map(|w| format!("- {}", w)),
        );
        lines.push(String::new());
    }

    if !sections.best_practices.is_empty() {
        lines.push("## Best Practices".to_string());
        lines.extend(
            sections
                .best_practices
                .iter()
                .take(MAX_BEST_PRACTICES)
                .map(|b| format!("- {}", b)),
        );
        lines.push(String::new());
    }

    lines.extend(
        [
            "## Output Standards",
            "- Provide clear, actionable guidance",
            "- Show concrete examples when possible",
            "- Reference available tools when relevant",
            "- Use the scripts in the scripts/ directory for automation",
        ]
        .map(str::to_string),
    );

    Ok(lines.join("\n"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::agent::OpenAiAgentFile;
    use tempfile::TempDir;

    const SKILL: &str = r#"---
name: release-manager
description: This skill should be used when preparing releases.
metadata:
  version: 2.1.0
codex:
  model: o4-mini
---

# Release Manager

### Workflow 1: Cut a Release
Steps.

### Workflow 2: Hotfix Workflow
Steps.

### Notes

## Best Practices

1. **Tag every release** so history stays searchable
- Keep changelogs short
* Automate version bumps

## Appendix
- not a practice
"#;

    fn skill_dir(root: &Path) -> PathBuf {
        let dir = root.join("release-manager");
        fs::create_dir_all(dir.join("scripts")).unwrap();
        fs::create_dir_all(dir.join("references")).unwrap();
        fs::write(dir.join(SKILL_FILE), SKILL).unwrap();
        fs::write(
            dir.join("scripts/bump.py"),
            "#!/usr/bin/env python3\n\"\"\"Bump the project version.\n\nMore text.\n\"\"\"\n",
        )
        .unwrap();
        fs::write(dir.join("scripts/notes.py"), "print('no docstring')\n").unwrap();
        fs::write(dir.join("references/guide.md"), "# Guide").unwrap();
        dir
    }

    #[test]
    fn test_key_sections() {
        let sections = extract_key_sections(SKILL).unwrap();
        assert_eq!(sections.workflows, vec!["Cut a Release", "Hotfix Workflow"]);
        assert_eq!(
            sections.best_practices,
            vec![
                "Tag every release",
                "Keep changelogs short",
                "Automate version bumps"
            ]
        );
    }

    #[test]
    fn test_convert_in_place() {
        let temp = TempDir::new().unwrap();
        let dir = skill_dir(temp.path());

        let report = convert_skill(&dir.join(SKILL_FILE), None);
        assert!(report.is_success(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
        assert!(report.files_copied.is_empty());

        let yaml = OpenAiAgentFile::read(&dir.join(OPENAI_YAML)).unwrap();
        assert_eq!(yaml.name.as_deref(), Some("release-manager"));
        assert_eq!(yaml.model.as_deref(), Some("o4-mini"));
        assert_eq!(yaml.version.as_deref(), Some("2.1.0"));
        let instructions = yaml.instructions.unwrap();
        assert!(instructions.starts_with("You are an expert release manager specialist."));
        assert!(instructions.contains("## Key Workflows\n- Cut a Release"));
        assert!(instructions.contains("## Output Standards"));

        assert_eq!(yaml.tools.len(), 2);
        assert_eq!(yaml.tools[0].name, "bump");
        assert_eq!(yaml.tools[0].description, "Bump the project version.");
        assert_eq!(yaml.tools[1].description, "Runs notes.py");
        assert_eq!(yaml.tools[1].command, "python scripts/notes.py");

        let again = convert_skill(&dir.join(SKILL_FILE), None);
        assert!(again.is_success());
        assert_eq!(again.warnings.len(), 1);
        assert!(again.warnings[0].contains("Overwrote"));
    }

    #[test]
    fn test_convert_to_output_dir_copies_package() {
        let temp = TempDir::new().unwrap();
        let dir = skill_dir(temp.path());
        let out = temp.path().join("converted");

        let report = convert_skill(&dir.join(SKILL_FILE), Some(&out));
        assert!(report.is_success(), "{:?}", report.errors);
        assert!(out.join(OPENAI_YAML).is_file());
        assert!(out.join("scripts/bump.py").is_file());
        assert!(out.join("references/guide.md").is_file());
        assert!(out.join(SKILL_FILE).is_file());
        assert_eq!(report.files_copied.len(), 3);
        assert!(!dir.join(OPENAI_YAML).exists());
    }

    #[test]
    fn test_defaults_without_frontmatter() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("plain-skill");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("README.md"), "# Plain Skill\n\nBody.\n").unwrap();

        let report = convert_skill(&dir.join("README.md"), None);
        assert!(report.is_success());
        assert_eq!(report.warnings.len(), 3);

        let yaml = OpenAiAgentFile::read(&dir.join(OPENAI_YAML)).unwrap();
        assert_eq!(yaml.name.as_deref(), Some("plain-skill"));
        assert_eq!(
            yaml.description.as_deref(),
            Some("Expert guidance for Plain Skill.")
        );
        assert_eq!(yaml.version.as_deref(), Some("1.0.0"));
        assert!(yaml.model.is_none());
    }

    #[test]
    fn test_missing_file_is_error_report() {
        let temp = TempDir::new().unwrap();
        let report = convert_skill(&temp.path().join("SKILL.md"), None);
        assert_eq!(report.status, ConversionStatus::Error);
        assert!(report.errors[0].starts_with("File not found"));
    }
}
