//! Skillbook Types - Core types shared across the skillbook crates
//!
//! This module defines the descriptor records read from skill and agent
//! files, plus the check results produced when validating them.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod check;

pub use check::{CheckResult, CheckScope, CheckSummary, Severity};

/// Metadata of a skill package, read from `SKILL.md` frontmatter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// File convention an agent definition was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentFormat {
    /// Markdown with YAML frontmatter (`.claude/agents/*.md`)
    Markdown,
    /// `agents/openai.yaml` inside a skill package
    OpenAiYaml,
}

/// A tool entry declared in `agents/openai.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
}

/// A specialised assistant persona
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_tools: Vec<String>,
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<u32>,
    pub format: AgentFormat,
}

/// Agent runtimes a skill package can be consumed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    ClaudeCode,
    CodexCli,
    Cursor,
    GithubCopilot,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::ClaudeCode,
        Platform::CodexCli,
        Platform::Cursor,
        Platform::GithubCopilot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::ClaudeCode => "claude-code",
            Platform::CodexCli => "codex-cli",
            Platform::Cursor => "cursor",
            Platform::GithubCopilot => "github-copilot",
        }
    }

    /// Marker file, relative to the skill directory, that signals support
    pub fn marker(&self) -> &'static str {
        match self {
            Platform::ClaudeCode => "SKILL.md",
            Platform::CodexCli => "agents/openai.yaml",
            Platform::Cursor => ".cursorrules",
            Platform::GithubCopilot => ".github/copilot-instructions.md",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
