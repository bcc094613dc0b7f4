//! Skill definition and parsing
//!
//! Each skill is a folder containing SKILL.md with YAML frontmatter

use regex::Regex;
use serde::Deserialize;
use skillbook_types::{Platform, SkillDescriptor};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Result, SkillError};
use crate::frontmatter::{parse_frontmatter, scalar_string, split_frontmatter, string_or_list};

/// Maximum recommended name length
pub const MAX_NAME_LENGTH: usize = 64;
/// Maximum recommended description length
pub const MAX_DESCRIPTION_LENGTH: usize = 1024;

/// Canonical skill manifest file name
pub const SKILL_FILE: &str = "SKILL.md";

/// Raw `SKILL.md` frontmatter. Every field is optional here so that lenient
/// readers (index, validator) can inspect incomplete files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SkillFrontmatter {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,
    pub license: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub tags: Vec<String>,
    #[serde(default, alias = "allowed_tools", deserialize_with = "string_or_list")]
    pub allowed_tools: Vec<String>,
    #[serde(default)]
    pub metadata: Option<SkillMetadataBlock>,
    #[serde(default)]
    pub codex: Option<CodexHints>,
}

/// Nested `metadata:` block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillMetadataBlock {
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,
    pub category: Option<String>,
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub tags: Vec<String>,
}

/// Nested `codex:` block with hints for the Codex converter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodexHints {
    pub model: Option<String>,
}

impl SkillFrontmatter {
    /// Version from the top level, falling back to `metadata.version`
    pub fn version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.metadata.as_ref().and_then(|m| m.version.as_deref()))
    }

    pub fn category(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.category.as_deref())
    }

    pub fn domain(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.domain.as_deref())
    }

    /// Trimmed, non-empty name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Trimmed, non-empty description
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Build a validated descriptor
    pub fn into_descriptor(self, path: &Path) -> Result<SkillDescriptor> {
        let name = self
            .name()
            .ok_or_else(|| SkillError::MissingField {
                path: path.into(),
                field: "name",
            })?
            .to_string();
        validate_name(&name)?;

        let description = self
            .description
            .as_deref()
            .ok_or_else(|| SkillError::MissingField {
                path: path.into(),
                field: "description",
            })?;
        let description = validate_description(&name, description)?;

        let version = self.version().map(str::to_string);
        let category = self.category().map(str::to_string);
        let domain = self.domain().map(str::to_string);
        let mut tags = self.tags;
        if tags.is_empty() {
            tags = self.metadata.map(|m| m.tags).unwrap_or_default();
        }

        Ok(SkillDescriptor {
            name,
            description,
            version,
            tags,
            allowed_tools: self.allowed_tools,
            license: self.license,
            category,
            domain,
        })
    }
}

/// A skill with its descriptor and (once activated) its full content
#[derive(Debug, Clone)]
pub struct Skill {
    /// Validated frontmatter
    pub descriptor: SkillDescriptor,
    /// Full path to skill directory
    pub path: PathBuf,
    /// Full SKILL.md content (loaded on demand)
    pub content: Option<String>,
}

impl Skill {
    /// Load skill from a directory, keeping the full content
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let (descriptor, content) = read_skill(dir)?;
        Ok(Self {
            descriptor,
            path: dir.to_path_buf(),
            content: Some(content),
        })
    }

    /// Load only metadata from a directory (discovery)
    pub fn metadata_from_dir(dir: &Path) -> Result<Self> {
        let (descriptor, _) = read_skill(dir)?;
        Ok(Self {
            descriptor,
            path: dir.to_path_buf(),
            content: None,
        })
    }

    /// Load full content if not already loaded (activation)
    pub fn load_content(&mut self) -> Result<()> {
        if self.content.is_some() {
            return Ok(());
        }

        let skill_file = self.skill_file();
        let content = fs::read_to_string(&skill_file).map_err(|e| SkillError::io(&skill_file, e))?;

        self.content = Some(content);
        Ok(())
    }

    /// Path of the manifest file backing this skill
    pub fn skill_file(&self) -> PathBuf {
        find_skill_file(&self.path).unwrap_or_else(|| self.path.join(SKILL_FILE))
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn description(&self) -> &str {
        &self.descriptor.description
    }

    /// Markdown body after the frontmatter, if content is loaded
    pub fn body(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(|c| split_frontmatter(c).map_or(c, |(_, body)| body))
    }

    /// Runtimes this skill ships configuration for
    pub fn platforms(&self) -> Vec<Platform> {
        detect_platforms(&self.path)
    }

    /// Generate a concise summary for LLM system prompt
    /// Format: "- {name}: {description}"
    pub fn to_summary(&self) -> String {
        format!("- {}: {}", self.descriptor.name, self.descriptor.description)
    }
}

/// `SKILL.md`, or the lowercase `skill.md` some packages use
pub fn find_skill_file(dir: &Path) -> Option<PathBuf> {
    [SKILL_FILE, "skill.md"]
        .into_iter()
        .map(|file| dir.join(file))
        .find(|path| path.is_file())
}

/// Platforms whose marker file exists in `dir`
pub fn detect_platforms(dir: &Path) -> Vec<Platform> {
    Platform::ALL
        .into_iter()
        .filter(|p| dir.join(p.marker()).is_file())
        .collect()
}

/// Parse a skill file's content into a validated descriptor
pub fn parse_skill(content: &str, path: &Path) -> Result<SkillDescriptor> {
    let (frontmatter, _): (SkillFrontmatter, _) = parse_frontmatter(content, path)?;
    frontmatter.into_descriptor(path)
}

fn read_skill(dir: &Path) -> Result<(SkillDescriptor, String)> {
    let skill_file = find_skill_file(dir).ok_or_else(|| SkillError::MissingSkillFile(dir.into()))?;

    let content = fs::read_to_string(&skill_file).map_err(|e| SkillError::io(&skill_file, e))?;
    let descriptor = parse_skill(&content, &skill_file)?;

    Ok((descriptor, content))
}

/// Validate a skill or agent name: lowercase letters, digits and single
/// hyphens, not starting or ending with a hyphen.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SkillError::InvalidName {
            name: name.to_string(),
            reason: "name cannot be empty",
        });
    }

    if name.len() > MAX_NAME_LENGTH {
        warn!(
            "Name '{}' exceeds {} characters (was {}), may be truncated",
            name,
            MAX_NAME_LENGTH,
            name.len()
        );
    }

    let name_re = Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$")?;
    if !name_re.is_match(name) {
        let reason = if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
            "hyphens must separate words (no leading, trailing or doubled hyphens)"
        } else {
            "must contain only lowercase letters, numbers, and hyphens"
        };
        return Err(SkillError::InvalidName {
            name: name.to_string(),
            reason,
        });
    }

    Ok(())
}

/// Validate and trim a description
pub fn validate_description(name: &str, description: &str) -> Result<String> {
    let description = description.trim();
    if description.is_empty() {
        return Err(SkillError::EmptyDescription(name.to_string()));
    }

    if description.len() > MAX_DESCRIPTION_LENGTH {
        warn!(
            "'{}' description exceeds {} characters (was {}), may be truncated",
            name,
            MAX_DESCRIPTION_LENGTH,
            description.len()
        );
    }

    Ok(description.to_string())
}
