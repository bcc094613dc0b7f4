//! Skills registry for managing multiple skills
//!
//! Implements progressive disclosure:
//! - Discovery: scan directories and load metadata only
//! - Activation: load full skill content on demand
//!
//! Directories are scanned in the order they were added. A name may appear
//! only once per directory; a later directory overrides an earlier one.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Result, SkillError};
use crate::skill::Skill;

/// Personal skills directory, relative to the home directory
pub const PERSONAL_SKILLS_DIR: &str = ".skillbook/skills";
/// Project skills directory, relative to the working directory
pub const PROJECT_SKILLS_DIR: &str = ".skillbook/skills";

/// A directory entry that could not be registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryIssue {
    pub path: PathBuf,
    pub reason: String,
}

/// Skills registry managing all available skills
pub struct SkillsRegistry {
    /// All discovered skills (metadata only initially)
    skills: HashMap<String, Skill>,
    /// Skills directories to scan
    directories: Vec<PathBuf>,
    /// Entries skipped during the last discovery
    issues: Vec<DiscoveryIssue>,
}

impl SkillsRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            skills: HashMap::new(),
            directories: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Add a skills directory to scan
    pub fn add_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directories.push(dir.into());
        self
    }

    /// Add personal skills directory: ~/.skillbook/skills/
    pub fn with_personal_skills(self) -> Self {
        if let Some(home) = dirs::home_dir() {
            self.add_directory(home.join(PERSONAL_SKILLS_DIR))
        } else {
            warn!("Could not find home directory for personal skills");
            self
        }
    }

    /// Add project skills directory: ./.skillbook/skills/
    pub fn with_project_skills(self) -> Self {
        self.add_directory(PathBuf::from(PROJECT_SKILLS_DIR))
    }

    /// Configured directories, in scan order
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Scan all configured directories and discover skills
    pub fn discover(&mut self) -> Result<()> {
        info!(
            "Starting skills discovery in {} directories",
            self.directories.len()
        );

        self.skills.clear();
        self.issues.clear();
        let directories = self.directories.clone();

        for dir in &directories {
            if !dir.exists() {
                debug!("Skills directory does not exist: {:?}", dir);
                continue;
            }

            if !dir.is_dir() {
                warn!("Skills path is not a directory: {:?}", dir);
                continue;
            }

            self.scan_directory(dir)?;
        }

        info!("Discovered {} skills", self.skills.len());
        Ok(())
    }

    /// Scan a single directory scope for skills
    fn scan_directory(&mut self, dir: &Path) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|e| SkillError::io(dir, e))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && !is_hidden(path))
            .collect();
        paths.sort();

        // Names seen in this scope, to enforce per-directory uniqueness
        let mut scope: HashMap<String, PathBuf> = HashMap::new();

        for path in paths {
            match Skill::metadata_from_dir(&path) {
                Ok(skill) => {
                    let name = skill.name().to_string();

                    if let Some(first) = scope.get(&name) {
                        warn!("Duplicate skill name '{}' in {:?}", name, dir);
                        self.issues.push(DiscoveryIssue {
                            path,
                            reason: format!(
                                "duplicate skill name '{}' (already defined by {:?})",
                                name, first
                            ),
                        });
                        continue;
                    }

                    if let Some(previous) = self.skills.get(&name) {
                        debug!(
                            "Skill '{}' at {:?} overridden by {:?}",
                            name, previous.path, path
                        );
                    }

                    debug!("Discovered skill: {} at {:?}", name, path);
                    scope.insert(name.clone(), path);
                    self.skills.insert(name, skill);
                }
                Err(SkillError::MissingSkillFile(_)) => {
                    debug!("Skipping {:?}: no SKILL.md", path);
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

    /// Get a skill by name (returns metadata only if not yet loaded)
    pub fn get(&self, name: &str) -> Option<&Skill> {
        self.skills.get(name)
    }

    /// Get a mutable skill by name (can load content)
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Skill> {
        self.skills.get_mut(name)
    }

    /// Load full content for a specific skill (activation)
    pub fn load_skill(&mut self, name: &str) -> Result<&Skill> {
        let skill = self
            .skills
            .get_mut(name)
            .ok_or_else(|| SkillError::NotFound(name.to_string()))?;

        skill.load_content()?;
        Ok(skill)
    }

    /// All skill names, sorted
    pub fn skill_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.skills.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All skills, sorted by name
    pub fn skills(&self) -> Vec<&Skill> {
        let mut skills: Vec<&Skill> = self.skills.values().collect();
        skills.sort_by_key(|s| s.name());
        skills
    }

    /// Skills whose `metadata.category` matches, ignoring case
    pub fn filter_by_category(&self, category: &str) -> Vec<&Skill> {
        self.skills()
            .into_iter()
            .filter(|s| {
                s.descriptor
                    .category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(category))
            })
            .collect()
    }

    /// Names containing `name` (case-insensitive), for "did you mean" hints
    pub fn suggest(&self, name: &str) -> Vec<&str> {
        let needle = name.to_lowercase();
        self.skill_names()
            .into_iter()
            .filter(|candidate| candidate.to_lowercase().contains(&needle))
            .take(5)
            .collect()
    }

    /// Entries skipped during the last discovery
    pub fn issues(&self) -> &[DiscoveryIssue] {
        &self.issues
    }

    /// Get number of skills
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Skill count per category ("uncategorized" when absent)
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for skill in self.skills.values() {
            let category = skill
                .descriptor
                .category
                .clone()
                .unwrap_or_else(|| "uncategorized".to_string());
            *counts.entry(category).or_insert(0) += 1;
        }
        counts
    }

    /// Generate skills list for LLM system prompt
    /// Format:
    /// Available skills (use /{skill-name} to activate):
    /// - skill-name: Description of what this skill does and when to use it
    /// - another-skill: Another description...
    pub fn generate_system_prompt(&self) -> String {
        if self.skills.is_empty() {
            return String::new();
        }

        let mut prompt = String::from("\n\nAvailable skills (use /{skill-name} to activate):\n");

        for skill in self.skills() {
            prompt.push_str(&skill.to_summary());
            prompt.push('\n');
        }

        prompt
    }

    /// Generate a concise skills list for embedding in tool descriptions
    pub fn generate_skills_list(&self) -> String {
        if self.skills.is_empty() {
            return "No skills available".to_string();
        }

        self.skills()
            .iter()
            .map(|skill| format!("{}: {}", skill.name(), skill.description()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for SkillsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_skill_dir(parent: &Path, dir_name: &str, name: &str, description: &str) -> PathBuf {
        let skill_dir = parent.join(dir_name);
        fs::create_dir_all(&skill_dir).unwrap();
        let content = format!(
            "---\nname: {}\ndescription: {}\nmetadata:\n  category: engineering\n---\n\n# {}\n\nSkill body.",
            name, description, name
        );
        fs::write(skill_dir.join("SKILL.md"), content).unwrap();
        skill_dir
    }

    #[test]
    fn test_registry_new() {
        let registry = SkillsRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_generate_system_prompt_empty() {
        let registry = SkillsRegistry::new();
        let prompt = registry.generate_system_prompt();
        assert!(prompt.is_empty());
    }

    #[test]
    fn test_generate_skills_list_empty() {
        let registry = SkillsRegistry::new();
        let list = registry.generate_skills_list();
        assert_eq!(list, "No skills available");
    }

    #[test]
    fn test_discover_and_activate() {
        let temp = TempDir::new().unwrap();
        create_skill_dir(temp.path(), "b", "beta-skill", "Use when testing beta");
        create_skill_dir(temp.path(), "a", "alpha-skill", "Use when testing alpha");

        let mut registry = SkillsRegistry::new().add_directory(temp.path());
        registry.discover().unwrap();

        assert_eq!(registry.skill_names(), vec!["alpha-skill", "beta-skill"]);
        assert!(registry.get("alpha-skill").unwrap().content.is_none());

        let skill = registry.load_skill("alpha-skill").unwrap();
        assert!(skill.body().unwrap().contains("Skill body."));

        assert_eq!(
            registry.generate_skills_list(),
            "alpha-skill: Use when testing alpha, beta-skill: Use when testing beta"
        );
        assert!(registry
            .generate_system_prompt()
            .contains("- beta-skill: Use when testing beta\n"));
    }

    #[test]
    fn test_load_unknown_skill() {
        let mut registry = SkillsRegistry::new();
        assert!(matches!(
            registry.load_skill("nope"),
            Err(SkillError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_name_in_one_scope_is_reported() {
        let temp = TempDir::new().unwrap();
        create_skill_dir(temp.path(), "first", "shared", "First copy");
        create_skill_dir(temp.path(), "second", "shared", "Second copy");

        let mut registry = SkillsRegistry::new().add_directory(temp.path());
        registry.discover().unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("shared").unwrap().description(), "First copy");
        assert_eq!(registry.issues().len(), 1);
        assert!(registry.issues()[0].reason.contains("duplicate"));
    }

    #[test]
    fn test_later_directory_overrides() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global");
        let project = temp.path().join("project");
        create_skill_dir(&global, "shared", "shared", "Global version");
        create_skill_dir(&project, "shared", "shared", "Project version");

        let mut registry = SkillsRegistry::new()
            .add_directory(&global)
            .add_directory(&project);
        registry.discover().unwrap();

        assert_eq!(registry.get("shared").unwrap().description(), "Project version");
        assert!(registry.issues().is_empty());
    }

    #[test]
    fn test_invalid_and_hidden_entries() {
        let temp = TempDir::new().unwrap();
        create_skill_dir(temp.path(), "valid", "valid-skill", "Valid");
        create_skill_dir(temp.path(), ".hidden", "hidden-skill", "Hidden");
        let invalid = temp.path().join("invalid");
        fs::create_dir_all(&invalid).unwrap();
        fs::write(invalid.join("SKILL.md"), "---\nname: invalid\n---\n").unwrap();
        fs::create_dir_all(temp.path().join("not-a-skill")).unwrap();

        let mut registry = SkillsRegistry::new()
            .add_directory(temp.path())
            .add_directory(temp.path().join("missing"));
        registry.discover().unwrap();

        assert_eq!(registry.skill_names(), vec!["valid-skill"]);
        assert_eq!(registry.issues().len(), 1);
        assert_eq!(registry.issues()[0].path, invalid);
    }

    #[test]
    fn test_suggest_and_category() {
        let temp = TempDir::new().unwrap();
        create_skill_dir(temp.path(), "a", "senior-backend", "Backend");
        create_skill_dir(temp.path(), "b", "senior-frontend", "Frontend");
        create_skill_dir(temp.path(), "c", "seo-audit", "SEO");

        let mut registry = SkillsRegistry::new().add_directory(temp.path());
        registry.discover().unwrap();

        assert_eq!(
            registry.suggest("SENIOR"),
            vec!["senior-backend", "senior-frontend"]
        );
        assert_eq!(registry.filter_by_category("Engineering").len(), 3);
        assert!(registry.filter_by_category("marketing").is_empty());
        assert_eq!(registry.category_counts().get("engineering"), Some(&3));
    }
}
