//! Cross-platform skill validator
//!
//! Checks that a skill directory works for both SKILL.md consumers and
//! Codex-style consumers reading `agents/openai.yaml`.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use skillbook_types::{CheckResult, CheckScope, CheckSummary, Severity};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::agent::{OpenAiAgentFile, OPENAI_YAML};
use crate::error::Result;
use crate::frontmatter::parse_frontmatter;
use crate::fsutil::{directory_size, list_files};
use crate::skill::{SkillFrontmatter, SKILL_FILE};

/// Phrases that make a description easy for a runtime to match against
const DISCOVERY_PATTERNS: [&str; 8] = [
    "this skill",
    "should be used when",
    "use for",
    "use when",
    "analyzes",
    "generates",
    "provides",
    "automates",
];

/// Instructions at or below this length are flagged as too short
const MIN_INSTRUCTIONS_LENGTH: usize = 50;
/// Skills at or above this size are flagged
const MAX_SKILL_SIZE: u64 = 1024 * 1024;

/// Result of validating one skill directory
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub skill_name: String,
    pub skill_path: PathBuf,
    pub compatible: bool,
    pub summary: CheckSummary,
    pub checks: Vec<CheckResult>,
}

/// Validate `skill_dir`. In strict mode warnings also make it incompatible.
pub fn validate_skill(skill_dir: &Path, strict: bool) -> Result<ValidationReport> {
    let path = skill_dir
        .canonicalize()
        .unwrap_or_else(|_| skill_dir.to_path_buf());
    let mut checks = Vec::new();
    let mut skill_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let frontmatter = check_skill_md(&path, &mut checks);

    match frontmatter.as_ref().and_then(SkillFrontmatter::name) {
        Some(name) => {
            checks.push(CheckResult::pass(
                "name_field",
                CheckScope::ClaudeCode,
                format!("Name field present: {}", name),
            ));
            skill_name = name.to_string();
        }
        None => checks.push(CheckResult::fail(
            "name_field",
            CheckScope::ClaudeCode,
            "Name field missing in frontmatter",
            Severity::Error,
        )),
    }

    check_description(
        frontmatter.as_ref().and_then(SkillFrontmatter::description),
        &mut checks,
    )?;

    match frontmatter.as_ref().and_then(|f| f.license.as_deref()) {
        Some(license) if !license.trim().is_empty() => checks.push(CheckResult::pass(
            "license_field",
            CheckScope::ClaudeCode,
            format!("License: {}", license),
        )),
        _ => checks.push(CheckResult::fail(
            "license_field",
            CheckScope::ClaudeCode,
            "License field missing (recommended for distribution)",
            Severity::Warning,
        )),
    }

    check_layout(&path, &mut checks);
    check_openai_yaml(&path, &skill_name, &mut checks)?;
    check_encoding(&path, &mut checks);
    check_size(&path, &mut checks);

    let summary = CheckSummary::from_checks(&checks);
    let compatible = if strict {
        summary.errors == 0 && summary.warnings == 0
    } else {
        summary.errors == 0
    };

    Ok(ValidationReport {
        skill_name,
        skill_path: path,
        compatible,
        summary,
        checks,
    })
}

fn check_skill_md(path: &Path, checks: &mut Vec<CheckResult>) -> Option<SkillFrontmatter> {
    let skill_md = path.join(SKILL_FILE);
    if !skill_md.is_file() {
        checks.push(CheckResult::fail(
            "skill_md_exists",
            CheckScope::ClaudeCode,
            "SKILL.md not found - required for Claude Code",
            Severity::Error,
        ));
        return None;
    }
    checks.push(CheckResult::pass(
        "skill_md_exists",
        CheckScope::ClaudeCode,
        "SKILL.md exists",
    ));

    let content = match fs::read_to_string(&skill_md) {
        Ok(content) => content,
        Err(e) => {
            checks.push(CheckResult::fail(
                "valid_frontmatter",
                CheckScope::ClaudeCode,
                format!("Cannot read SKILL.md: {}", e),
                Severity::Error,
            ));
            return None;
        }
    };

    match parse_frontmatter::<SkillFrontmatter>(&content, &skill_md) {
        Ok((frontmatter, _)) => {
            checks.push(CheckResult::pass(
                "valid_frontmatter",
                CheckScope::ClaudeCode,
                "Valid YAML frontmatter found",
            ));
            Some(frontmatter)
        }
        Err(e) => {
            checks.push(CheckResult::fail(
                "valid_frontmatter",
                CheckScope::ClaudeCode,
                format!(
                    "No valid YAML frontmatter (must start with --- and end with ---): {}",
                    e
                ),
                Severity::Error,
            ));
            None
        }
    }
}

fn check_description(description: Option<&str>, checks: &mut Vec<CheckResult>) -> Result<()> {
    let Some(description) = description else {
        checks.push(CheckResult::fail(
            "description_exists",
            CheckScope::ClaudeCode,
            "Description field missing in frontmatter",
            Severity::Error,
        ));
        return Ok(());
    };

    checks.push(CheckResult::pass(
        "description_exists",
        CheckScope::ClaudeCode,
        "Description field present",
    ));

    if is_discovery_friendly(description)? {
        checks.push(CheckResult::pass(
            "description_format",
            CheckScope::ClaudeCode,
            "Description uses discovery-friendly format",
        ));
    } else {
        checks.push(CheckResult::fail(
            "description_format",
            CheckScope::ClaudeCode,
            "Description should use third-person, discovery-friendly format \
             (e.g., 'This skill should be used when...')",
            Severity::Warning,
        ));
    }

    Ok(())
}

/// Whether a description uses one of the discovery phrases
pub fn is_discovery_friendly(description: &str) -> Result<bool> {
    let pattern = DISCOVERY_PATTERNS
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    let re = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
    Ok(re.is_match(description))
}

fn check_layout(path: &Path, checks: &mut Vec<CheckResult>) {
    let scripts_dir = path.join("scripts");
    if scripts_dir.is_dir() {
        let scripts = list_files(&scripts_dir, Some("py"));
        if scripts.is_empty() {
            checks.push(CheckResult::fail(
                "scripts_dir",
                CheckScope::ClaudeCode,
                "scripts/ directory exists but contains no Python files",
                Severity::Warning,
            ));
        } else {
            checks.push(CheckResult::pass(
                "scripts_dir",
                CheckScope::ClaudeCode,
                format!("scripts/ directory found ({} Python tool(s))", scripts.len()),
            ));
        }
    } else {
        checks.push(CheckResult::fail(
            "scripts_dir",
            CheckScope::ClaudeCode,
            "scripts/ directory not found (optional but recommended)",
            Severity::Warning,
        ));
    }

    let refs_dir = path.join("references");
    if refs_dir.is_dir() {
        checks.push(CheckResult::pass(
            "references_dir",
            CheckScope::ClaudeCode,
            format!(
                "references/ directory found ({} file(s))",
                list_files(&refs_dir, Some("md")).len()
            ),
        ));
    } else {
        checks.push(CheckResult::fail(
            "references_dir",
            CheckScope::ClaudeCode,
            "references/ directory not found (optional)",
            Severity::Info,
        ));
    }

    let assets_dir = path.join("assets");
    if assets_dir.is_dir() {
        checks.push(CheckResult::pass(
            "assets_dir",
            CheckScope::ClaudeCode,
            format!(
                "assets/ directory found ({} file(s))",
                list_files(&assets_dir, None).len()
            ),
        ));
    } else {
        checks.push(CheckResult::fail(
            "assets_dir",
            CheckScope::ClaudeCode,
            "assets/ directory not found (optional)",
            Severity::Info,
        ));
    }

    let requirements = path.join("requirements.txt");
    if requirements.is_file() {
        let deps = fs::read_to_string(&requirements)
            .map(|text| {
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .count()
            })
            .unwrap_or(0);
        if deps > 0 {
            checks.push(CheckResult::fail(
                "no_heavy_deps",
                CheckScope::ClaudeCode,
                format!(
                    "requirements.txt found with {} dependencies (skills should use standard library only)",
                    deps
                ),
                Severity::Warning,
            ));
        }
    } else {
        checks.push(CheckResult::pass(
            "no_heavy_deps",
            CheckScope::ClaudeCode,
            "No requirements.txt (standard library only - good)",
        ));
    }
}

fn check_openai_yaml(path: &Path, skill_name: &str, checks: &mut Vec<CheckResult>) -> Result<()> {
    let yaml_path = path.join(OPENAI_YAML);
    if !yaml_path.is_file() {
        checks.push(CheckResult::fail(
            "openai_yaml_exists",
            CheckScope::CodexCli,
            "agents/openai.yaml not found - required for Codex CLI",
            Severity::Error,
        ));
        return Ok(());
    }
    checks.push(CheckResult::pass(
        "openai_yaml_exists",
        CheckScope::CodexCli,
        "agents/openai.yaml exists",
    ));

    let file = match OpenAiAgentFile::read(&yaml_path) {
        Ok(file) if file.name.is_some() || file.description.is_some() || file.instructions.is_some() => {
            checks.push(CheckResult::pass(
                "openai_yaml_valid",
                CheckScope::CodexCli,
                "agents/openai.yaml has valid structure",
            ));
            file
        }
        Ok(file) => {
            checks.push(CheckResult::fail(
                "openai_yaml_valid",
                CheckScope::CodexCli,
                "agents/openai.yaml appears empty or invalid",
                Severity::Error,
            ));
            file
        }
        Err(e) => {
            checks.push(CheckResult::fail(
                "openai_yaml_valid",
                CheckScope::CodexCli,
                format!("Cannot read agents/openai.yaml: {}", e),
                Severity::Error,
            ));
            OpenAiAgentFile::default()
        }
    };

    match file.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => {
            checks.push(CheckResult::pass(
                "yaml_name",
                CheckScope::CodexCli,
                format!("Name field present: {}", name),
            ));
            if !skill_name.is_empty() && name != skill_name {
                checks.push(CheckResult::fail(
                    "name_match",
                    CheckScope::CrossPlatform,
                    format!(
                        "Name mismatch: SKILL.md has '{}', openai.yaml has '{}'",
                        skill_name, name
                    ),
                    Severity::Warning,
                ));
            } else {
                checks.push(CheckResult::pass(
                    "name_match",
                    CheckScope::CrossPlatform,
                    "Skill name matches across platforms",
                ));
            }
        }
        None => checks.push(CheckResult::fail(
            "yaml_name",
            CheckScope::CodexCli,
            "Name field missing in agents/openai.yaml",
            Severity::Error,
        )),
    }

    if file.description.as_deref().is_some_and(|d| !d.trim().is_empty()) {
        checks.push(CheckResult::pass(
            "yaml_description",
            CheckScope::CodexCli,
            "Description field present in openai.yaml",
        ));
    } else {
        checks.push(CheckResult::fail(
            "yaml_description",
            CheckScope::CodexCli,
            "Description field missing in agents/openai.yaml",
            Severity::Error,
        ));
    }

    match file.instructions.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
        Some(instructions) => {
            let len = instructions.chars().count();
            if len > MIN_INSTRUCTIONS_LENGTH {
                checks.push(CheckResult::pass(
                    "yaml_instructions",
                    CheckScope::CodexCli,
                    format!("Instructions field present ({} chars)", len),
                ));
            } else {
                checks.push(CheckResult::fail(
                    "yaml_instructions",
                    CheckScope::CodexCli,
                    format!(
                        "Instructions field is very short ({} chars) - consider adding more detail",
                        len
                    ),
                    Severity::Warning,
                ));
            }
        }
        None => checks.push(CheckResult::fail(
            "yaml_instructions",
            CheckScope::CodexCli,
            "Instructions field missing in agents/openai.yaml",
            Severity::Warning,
        )),
    }

    let script_re = Regex::new(r"scripts/(\S+)")?;
    for tool in &file.tools {
        let Some(script) = script_re.captures(&tool.command).and_then(|c| c.get(1)) else {
            continue;
        };
        let check = format!("tool_script_{}", tool.name);
        if path.join("scripts").join(script.as_str()).is_file() {
            checks.push(CheckResult::pass(
                check,
                CheckScope::CodexCli,
                format!("Tool '{}' references existing script", tool.name),
            ));
        } else {
            checks.push(CheckResult::fail(
                check,
                CheckScope::CodexCli,
                format!(
                    "Tool '{}' references missing script: {}",
                    tool.name,
                    script.as_str()
                ),
                Severity::Error,
            ));
        }
    }

    Ok(())
}

fn check_encoding(path: &Path, checks: &mut Vec<CheckResult>) {
    const TEXT_EXTENSIONS: [&str; 4] = ["md", "yaml", "yml", "py"];

    let text_files = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| TEXT_EXTENSIONS.iter().any(|t| ext == *t))
        });

    for entry in text_files {
        let is_utf8 = fs::read(entry.path())
            .map(|bytes| std::str::from_utf8(&bytes).is_ok())
            .unwrap_or(true);
        if !is_utf8 {
            let relative = entry.path().strip_prefix(path).unwrap_or(entry.path());
            checks.push(CheckResult::fail(
                "utf8_encoding",
                CheckScope::CrossPlatform,
                format!("File not UTF-8 encoded: {}", relative.display()),
                Severity::Error,
            ));
            return;
        }
    }

    checks.push(CheckResult::pass(
        "utf8_encoding",
        CheckScope::CrossPlatform,
        "All text files are UTF-8 encoded",
    ));
}

fn check_size(path: &Path, checks: &mut Vec<CheckResult>) {
    let size = directory_size(path);
    let size_kb = size as f64 / 1024.0;
    if size < MAX_SKILL_SIZE {
        checks.push(CheckResult::pass(
            "skill_size",
            CheckScope::CrossPlatform,
            format!("Skill size: {:.1} KB (under 1 MB - good)", size_kb),
        ));
    } else {
        checks.push(CheckResult::fail(
            "skill_size",
            CheckScope::CrossPlatform,
            format!("Skill size: {:.1} KB (over 1 MB - consider reducing)", size_kb),
            Severity::Warning,
        ));
    }
}

/// Render a report grouped by scope
pub fn format_human(report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Cross-Platform Skill Validator");
    let _ = writeln!(out, "{}", "=".repeat(40));
    let _ = writeln!(out, "Skill: {}", report.skill_name);
    let _ = writeln!(out, "Path:  {}", report.skill_path.display());
    let _ = writeln!(out);

    for scope in CheckScope::ALL {
        let checks: Vec<&CheckResult> = report
            .checks
            .iter()
            .filter(|c| c.platform == scope)
            .collect();
        if checks.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}:", scope.label());
        for check in checks {
            let _ = writeln!(out, "  {} {}", check.status_tag(), check.message);
        }
        let _ = writeln!(out);
    }

    let summary = &report.summary;
    let mut details = Vec::new();
    if summary.errors > 0 {
        details.push(format!("{} error(s)", summary.errors));
    }
    if summary.warnings > 0 {
        details.push(format!("{} warning(s)", summary.warnings));
    }
    let detail = if details.is_empty() {
        String::new()
    } else {
        format!(" ({})", details.join(", "))
    };
    let verdict = if report.compatible {
        "COMPATIBLE"
    } else {
        "NOT COMPATIBLE"
    };

    let _ = writeln!(out, "Overall: {}{}", verdict, detail);
    let _ = write!(out, "Checks: {}/{} passed", summary.passed, summary.total_checks);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SKILL_MD: &str = "---\nname: code-reviewer\ndescription: This skill should be used when reviewing code.\nlicense: MIT\n---\n\n# Code Reviewer\n";

    const OPENAI: &str = "name: code-reviewer\ndescription: Reviews code\ninstructions: |\n  You are an expert code reviewer. Review diffs for correctness, style and security.\ntools:\n  - name: checker\n    description: Checks code\n    command: python scripts/checker.py --json\n";

    fn complete_skill(root: &Path) -> PathBuf {
        let dir = root.join("code-reviewer");
        fs::create_dir_all(dir.join("scripts")).unwrap();
        fs::create_dir_all(dir.join("references")).unwrap();
        fs::create_dir_all(dir.join("assets")).unwrap();
        fs::create_dir_all(dir.join("agents")).unwrap();
        fs::write(dir.join(SKILL_FILE), SKILL_MD).unwrap();
        fs::write(dir.join("scripts/checker.py"), "print('ok')").unwrap();
        fs::write(dir.join("references/guide.md"), "# Guide").unwrap();
        fs::write(dir.join(OPENAI_YAML), OPENAI).unwrap();
        dir
    }

    fn find<'a>(report: &'a ValidationReport, check: &str) -> &'a CheckResult {
        report.checks.iter().find(|c| c.check == check).unwrap()
    }

    #[test]
    fn test_complete_skill_is_compatible_even_strict() {
        let temp = TempDir::new().unwrap();
        let dir = complete_skill(temp.path());

        let report = validate_skill(&dir, true).unwrap();
        assert!(report.compatible, "{}", format_human(&report));
        assert_eq!(report.skill_name, "code-reviewer");
        assert_eq!(report.summary.errors, 0);
        assert_eq!(report.summary.warnings, 0);
        assert!(find(&report, "tool_script_checker").passed);
    }

    #[test]
    fn test_missing_openai_yaml_is_error() {
        let temp = TempDir::new().unwrap();
        let dir = complete_skill(temp.path());
        fs::remove_file(dir.join(OPENAI_YAML)).unwrap();

        let report = validate_skill(&dir, false).unwrap();
        assert!(!report.compatible);
        let check = find(&report, "openai_yaml_exists");
        assert!(!check.passed);
        assert_eq!(check.severity, Severity::Error);
    }

    #[test]
    fn test_warnings_only_fail_in_strict_mode() {
        let temp = TempDir::new().unwrap();
        let dir = complete_skill(temp.path());
        fs::write(
            dir.join(SKILL_FILE),
            "---\nname: code-reviewer\ndescription: Code review helper\n---\n",
        )
        .unwrap();

        let lenient = validate_skill(&dir, false).unwrap();
        assert!(lenient.compatible);
        assert!(!find(&lenient, "description_format").passed);
        assert!(!find(&lenient, "license_field").passed);

        let strict = validate_skill(&dir, true).unwrap();
        assert!(!strict.compatible);
    }

    #[test]
    fn test_missing_tool_script_and_name_mismatch() {
        let temp = TempDir::new().unwrap();
        let dir = complete_skill(temp.path());
        fs::remove_file(dir.join("scripts/checker.py")).unwrap();
        fs::write(
            dir.join(OPENAI_YAML),
            OPENAI.replacen("name: code-reviewer", "name: other-name", 1),
        )
        .unwrap();

        let report = validate_skill(&dir, false).unwrap();
        assert!(!report.compatible);
        assert!(!find(&report, "tool_script_checker").passed);
        let mismatch = find(&report, "name_match");
        assert!(!mismatch.passed);
        assert_eq!(mismatch.severity, Severity::Warning);
    }

    #[test]
    fn test_non_utf8_file_is_error() {
        let temp = TempDir::new().unwrap();
        let dir = complete_skill(temp.path());
        fs::write(dir.join("references/latin1.md"), [0x66u8, 0x6f, 0xe9, 0xff]).unwrap();

        let report = validate_skill(&dir, false).unwrap();
        assert!(!find(&report, "utf8_encoding").passed);
        assert!(!report.compatible);
    }

    #[test]
    fn test_empty_directory() {
        let temp = TempDir::new().unwrap();
        let report = validate_skill(temp.path(), false).unwrap();
        assert!(!report.compatible);
        assert!(!find(&report, "skill_md_exists").passed);
        assert!(!find(&report, "name_field").passed);
        assert!(format_human(&report).contains("Overall: NOT COMPATIBLE"));
    }

    #[test]
    fn test_discovery_patterns() {
        assert!(is_discovery_friendly("Generates release notes").unwrap());
        assert!(is_discovery_friendly("USE WHEN planning sprints").unwrap());
        assert!(!is_discovery_friendly("Release notes").unwrap());
    }
}
