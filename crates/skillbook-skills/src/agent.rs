//! Agent definitions
//!
//! Two conventions are understood:
//! - `.claude/agents/<name>.md`: YAML frontmatter (`name`, `description`,
//!   `tools`, `allowed-tools`, `model`, `maxTurns`) followed by the system
//!   prompt as Markdown body.
//! - `<skill>/agents/openai.yaml`: plain YAML with `name`, `description`,
//!   `instructions` and a `tools` list.

use serde::Deserialize;
use skillbook_types::{AgentDescriptor, AgentFormat, AgentTool};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Result, SkillError};
use crate::frontmatter::{parse_frontmatter, scalar_string, string_or_list};
use crate::registry::{is_hidden, DiscoveryIssue};
use crate::skill::{validate_description, validate_name};

/// Location of the Codex agent config inside a skill package
pub const OPENAI_YAML: &str = "agents/openai.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentFrontmatter {
    name: Option<String>,
    description: Option<String>,
    model: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    tools: Vec<String>,
    #[serde(default, rename = "allowed-tools", deserialize_with = "string_or_list")]
    allowed_tools: Vec<String>,
    max_turns: Option<u32>,
}

/// Parsed `agents/openai.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiAgentFile {
    pub name: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    #[serde(default)]
    pub tools: Vec<AgentTool>,
    pub model: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,
}

impl OpenAiAgentFile {
    /// Read and parse without validating required fields
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SkillError::io(path, e))?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| SkillError::Yaml {
            path: path.into(),
            source,
        })
    }
}

/// An agent definition and the file it came from
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    pub descriptor: AgentDescriptor,
    pub path: PathBuf,
    /// Tools with commands, for `agents/openai.yaml` definitions
    pub tools: Vec<AgentTool>,
}

impl AgentDefinition {
    /// Parse a Markdown agent file
    pub fn from_markdown_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SkillError::io(path, e))?;
        Self::parse_markdown(&content, path)
    }

    pub fn parse_markdown(content: &str, path: &Path) -> Result<Self> {
        let (frontmatter, body): (AgentFrontmatter, _) = parse_frontmatter(content, path)?;

        let name = frontmatter
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .ok_or_else(|| SkillError::MissingField {
                path: path.into(),
                field: "name",
            })?;
        validate_name(&name)?;

        let description = frontmatter
            .description
            .as_deref()
            .ok_or_else(|| SkillError::MissingField {
                path: path.into(),
                field: "description",
            })?;
        let description = validate_description(&name, description)?;

        let mut allowed_tools: Vec<String> = Vec::new();
        for tool in frontmatter.tools.into_iter().chain(frontmatter.allowed_tools) {
            if !allowed_tools.contains(&tool) {
                allowed_tools.push(tool);
            }
        }

        Ok(Self {
            descriptor: AgentDescriptor {
                name,
                description,
                model: frontmatter.model,
                allowed_tools,
                instructions: body.trim().to_string(),
                max_turns: frontmatter.max_turns,
                format: AgentFormat::Markdown,
            },
            path: path.to_path_buf(),
            tools: Vec::new(),
        })
    }

    /// Parse an `agents/openai.yaml` file
    pub fn from_openai_yaml(path: &Path) -> Result<Self> {
        let file = OpenAiAgentFile::read(path)?;

        let name = file
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| SkillError::MissingField {
                path: path.into(),
                field: "name",
            })?
            .to_string();
        validate_name(&name)?;

        let description = file
            .description
            .as_deref()
            .ok_or_else(|| SkillError::MissingField {
                path: path.into(),
                field: "description",
            })?;
        let description = validate_description(&name, description)?;

        Ok(Self {
            descriptor: AgentDescriptor {
                name,
                description,
                model: file.model,
                allowed_tools: file.tools.iter().map(|t| t.name.clone()).collect(),
                instructions: file.instructions.unwrap_or_default().trim().to_string(),
                max_turns: None,
                format: AgentFormat::OpenAiYaml,
            },
            path: path.to_path_buf(),
            tools: file.tools,
        })
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn description(&self) -> &str {
        &self.descriptor.description
    }
}

/// Registry of agent definitions discovered in one or more directories.
///
/// Each directory is scanned for `*.md` agent files and for subdirectories
/// carrying `agents/openai.yaml`.
#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<String, AgentDefinition>,
    directories: Vec<PathBuf>,
    issues: Vec<DiscoveryIssue>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agents directory to scan
    pub fn add_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directories.push(dir.into());
        self
    }

    pub fn discover(&mut self) -> Result<()> {
        self.agents.clear();
        self.issues.clear();
        let directories = self.directories.clone();

        for dir in &directories {
            if !dir.is_dir() {
                debug!("Agents directory does not exist: {:?}", dir);
                continue;
            }
            self.scan_directory(dir)?;
        }

        info!("Discovered {} agents", self.agents.len());
        Ok(())
    }

    fn scan_directory(&mut self, dir: &Path) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|e| SkillError::io(dir, e))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| !is_hidden(path))
            .collect();
        paths.sort();

        let mut scope: HashMap<String, PathBuf> = HashMap::new();

        for path in paths {
            let loaded = if path.is_file() && path.extension().is_some_and(|e| e == "md") {
                AgentDefinition::from_markdown_file(&path)
            } else if path.join(OPENAI_YAML).is_file() {
                AgentDefinition::from_openai_yaml(&path.join(OPENAI_YAML))
            } else {
                continue;
            };

            match loaded {
                Ok(agent) => {
                    let name = agent.name().to_string();
                    if let Some(first) = scope.get(&name) {
                        warn!("Duplicate agent name '{}' in {:?}", name, dir);
                        self.issues.push(DiscoveryIssue {
                            path,
                            reason: format!(
                                "duplicate agent name '{}' (already defined by {:?})",
                                name, first
                            ),
                        });
                        continue;
                    }
                    debug!("Discovered agent: {} at {:?}", name, agent.path);
                    scope.insert(name.clone(), agent.path.clone());
                    self.agents.insert(name, agent);
                }
                Err(e) => {
                    debug!("Skipping {:?}: {}", path, e);
                    self.issues.push(DiscoveryIssue {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AgentDefinition> {
        self.agents.get(name)
    }

    /// All agents, sorted by name
    pub fn agents(&self) -> Vec<&AgentDefinition> {
        let mut agents: Vec<&AgentDefinition> = self.agents.values().collect();
        agents.sort_by(|a, b| a.name().cmp(b.name()));
        agents
    }

    pub fn issues(&self) -> &[DiscoveryIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
