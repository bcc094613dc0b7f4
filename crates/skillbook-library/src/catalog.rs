//! Browsing a grouped skills library laid out as `<group>/<skill>/SKILL.md`

use serde::Serialize;
use skillbook_skills::frontmatter::parse_frontmatter;
use skillbook_skills::skill::{SkillFrontmatter, SKILL_FILE};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{LibraryError, Result};

const SKIPPED_DIRS: [&str; 3] = ["assets", "node_modules", ".git"];
const DESCRIPTION_PREVIEW: usize = 120;
const MAX_SUGGESTIONS: usize = 5;

/// A skill available for installation
#[derive(Debug, Clone, Serialize)]
pub struct LibrarySkill {
    pub name: String,
    pub group: String,
    /// Path relative to the library root
    pub path: PathBuf,
    pub description: String,
    pub has_scripts: bool,
    pub has_references: bool,
    pub has_assets: bool,
}

/// Skills of a library, grouped by domain directory
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
    groups: BTreeMap<String, BTreeMap<String, LibrarySkill>>,
}

impl Library {
    /// Scan `root` for `<group>/<skill>/SKILL.md`
    pub fn discover(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(LibraryError::MissingRoot(root));
        }

        let mut groups: BTreeMap<String, BTreeMap<String, LibrarySkill>> = BTreeMap::new();
        let walker = WalkDir::new(&root)
            .max_depth(3)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !SKIPPED_DIRS.contains(&&*entry.file_name().to_string_lossy())
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.depth() == 3 && entry.file_name() == SKILL_FILE);

        for entry in walker {
            let Some(skill_dir) = entry.path().parent() else {
                continue;
            };
            let Ok(relative) = skill_dir.strip_prefix(&root) else {
                continue;
            };
            let mut parts = relative.iter().map(|p| p.to_string_lossy().into_owned());
            let (Some(group), Some(name)) = (parts.next(), parts.next()) else {
                continue;
            };

            debug!("Found library skill {}/{}", group, name);
            let skill = LibrarySkill {
                description: description_preview(entry.path()),
                has_scripts: has_file(&skill_dir.join("scripts"), |p| {
                    p.extension().is_some_and(|ext| ext == "py")
                }),
                has_references: has_file(&skill_dir.join("references"), |p| {
                    p.extension().is_some_and(|ext| ext == "md")
                }),
                has_assets: has_file(&skill_dir.join("assets"), |p| {
                    p.file_name().is_some_and(|n| n != ".gitkeep")
                }),
                path: relative.to_path_buf(),
                group: group.clone(),
                name: name.clone(),
            };
            groups.entry(group).or_default().insert(name, skill);
        }

        let library = Self { root, groups };
        info!(
            "Discovered {} skills in {} groups under {}",
            library.len(),
            library.groups.len(),
            library.root.display()
        );
        Ok(library)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn groups(&self) -> &BTreeMap<String, BTreeMap<String, LibrarySkill>> {
        &self.groups
    }

    /// Skills in group order, then name order
    pub fn skills(&self) -> impl Iterator<Item = &LibrarySkill> {
        self.groups.values().flat_map(|skills| skills.values())
    }

    /// First skill with this name, in group order
    pub fn find(&self, name: &str) -> Option<&LibrarySkill> {
        self.groups.values().find_map(|skills| skills.get(name))
    }

    /// Names containing `query`, case-insensitively
    pub fn suggest(&self, query: &str) -> Vec<String> {
        let query = query.to_lowercase();
        self.skills()
            .filter(|skill| skill.name.to_lowercase().contains(&query))
            .map(|skill| skill.name.clone())
            .take(MAX_SUGGESTIONS)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn description_preview(skill_md: &Path) -> String {
    let Ok(content) = fs::read_to_string(skill_md) else {
        return String::new();
    };
    parse_frontmatter::<SkillFrontmatter>(&content, skill_md)
        .ok()
        .and_then(|(frontmatter, _)| {
            frontmatter
                .description()
                .map(|d| d.chars().take(DESCRIPTION_PREVIEW).collect())
        })
        .unwrap_or_default()
}

fn has_file(dir: &Path, matches: impl Fn(&Path) -> bool) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .any(|entry| matches(&entry.path()))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_skill(root: &Path, group: &str, name: &str, description: &str) -> PathBuf {
        let dir = root.join(group).join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(SKILL_FILE),
            format!("---\nname: {}\ndescription: {}\n---\n# {}\n", name, description, name),
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_discover_groups_and_flags() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let reviewer = write_skill(root, "engineering-team", "code-reviewer", &"x".repeat(200));
        fs::create_dir_all(reviewer.join("scripts")).unwrap();
        fs::write(reviewer.join("scripts/check.py"), "").unwrap();
        fs::create_dir_all(reviewer.join("assets")).unwrap();
        fs::write(reviewer.join("assets/.gitkeep"), "").unwrap();
        write_skill(root, "marketing", "seo-auditor", "Audits pages");
        write_skill(root, "assets", "sample-skill", "Ignored");
        write_skill(&root.join("node_modules"), "pkg", "dep", "Ignored");

        let library = Library::discover(root).unwrap();
        assert_eq!(library.len(), 2);
        assert_eq!(
            library.groups().keys().collect::<Vec<_>>(),
            vec!["engineering-team", "marketing"]
        );

        let skill = library.find("code-reviewer").unwrap();
        assert_eq!(skill.group, "engineering-team");
        assert_eq!(skill.path, PathBuf::from("engineering-team/code-reviewer"));
        assert_eq!(skill.description.chars().count(), 120);
        assert!(skill.has_scripts);
        assert!(!skill.has_references);
        assert!(!skill.has_assets);
    }

    #[test]
    fn test_suggest() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "eng", "code-reviewer", "d");
        write_skill(temp.path(), "eng", "pr-reviewer", "d");
        write_skill(temp.path(), "ops", "deployer", "d");

        let library = Library::discover(temp.path()).unwrap();
        assert_eq!(library.suggest("REVIEW"), vec!["code-reviewer", "pr-reviewer"]);
        assert!(library.suggest("zzz").is_empty());
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            Library::discover(temp.path().join("nope")),
            Err(LibraryError::MissingRoot(_))
        ));
    }
}
