//! Installing library skills into an agent's skills directory

use chrono::Utc;
use serde::Serialize;
use skillbook_skills::fsutil::copy_dir;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::catalog::Library;
use crate::error::{LibraryError, Result};
use crate::manifest::{InstalledSkill, Manifest};

const IGNORED_NAMES: [&str; 2] = ["__pycache__", ".DS_Store"];

/// Outcome of a successful install
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutcome {
    pub skill: String,
    pub group: String,
    pub target: PathBuf,
    pub auto_update: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateOutcome {
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
    /// Skill name to the error that stopped its re-copy
    pub failed: BTreeMap<String, String>,
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Installs skills from a [`Library`] into one target directory and keeps
/// its manifest
pub struct Installer {
    library: Library,
    target_dir: PathBuf,
}

impl Installer {
    pub fn new(library: Library, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            library,
            target_dir: target_dir.into(),
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Copy a skill into the target. Only one skill per group may be
    /// installed unless `force` is set.
    pub fn install(&self, name: &str, force: bool, auto_update: bool) -> Result<InstallOutcome> {
        let skill = self
            .library
            .find(name)
            .ok_or_else(|| LibraryError::NotFound {
                name: name.to_string(),
                suggestions: self.library.suggest(name),
            })?;

        let mut manifest = Manifest::load(&self.target_dir);
        if let Some(installed) = manifest.group_member(&skill.group, name) {
            if !force {
                return Err(LibraryError::GroupConflict {
                    group: skill.group.clone(),
                    installed: installed.to_string(),
                });
            }
            warn!(
                "Installing '{}' alongside '{}' from group '{}'",
                name, installed, skill.group
            );
        }

        let target = self.copy_skill(&skill.path)?;

        let now = Utc::now();
        manifest.installed.insert(
            name.to_string(),
            InstalledSkill {
                group: skill.group.clone(),
                path: skill.path.clone(),
                installed_at: now,
                updated_at: now,
                auto_update,
            },
        );
        if auto_update {
            manifest.auto_update = true;
        }
        manifest.source = self.library.root().display().to_string();
        manifest.save(&self.target_dir)?;

        info!("Installed '{}' from {} into {}", name, skill.group, target.display());
        Ok(InstallOutcome {
            skill: name.to_string(),
            group: skill.group.clone(),
            target,
            auto_update,
        })
    }

    /// Re-copy installed skills. Without a name only skills installed with
    /// auto-update are refreshed. A failed copy is recorded in the outcome
    /// and the manifest still keeps the stamps of the skills that succeeded.
    pub fn update(&self, name: Option<&str>) -> Result<UpdateOutcome> {
        let mut manifest = Manifest::load(&self.target_dir);
        if manifest.installed.is_empty() {
            return Err(LibraryError::NothingInstalled);
        }
        if let Some(name) = name {
            if !manifest.installed.contains_key(name) {
                return Err(LibraryError::NotInstalled(name.to_string()));
            }
        }

        let mut outcome = UpdateOutcome::default();
        for (skill_name, info) in manifest.installed.iter_mut() {
            match name {
                Some(name) if name != skill_name.as_str() => continue,
                None if !info.auto_update => {
                    outcome.skipped.push(skill_name.clone());
                    continue;
                }
                _ => {}
            }

            if !self.library.root().join(&info.path).is_dir() {
                warn!("Source for '{}' is gone: {}", skill_name, info.path.display());
                outcome.skipped.push(skill_name.clone());
                continue;
            }

            match self.copy_skill(&info.path) {
                Ok(_) => {
                    info.updated_at = Utc::now();
                    outcome.updated.push(skill_name.clone());
                }
                Err(e) => {
                    warn!("Failed to update '{}': {}", skill_name, e);
                    outcome.failed.insert(skill_name.clone(), e.to_string());
                }
            }
        }

        manifest.save(&self.target_dir)?;
        info!(
            "Updated {} skill(s), skipped {}, failed {}",
            outcome.updated.len(),
            outcome.skipped.len(),
            outcome.failed.len()
        );
        Ok(outcome)
    }

    /// Current manifest of the target
    pub fn status(&self) -> Manifest {
        Manifest::load(&self.target_dir)
    }

    /// Remove an installed skill and return the removed directory
    pub fn uninstall(&self, name: &str) -> Result<PathBuf> {
        let mut manifest = Manifest::load(&self.target_dir);
        if manifest.installed.remove(name).is_none() {
            return Err(LibraryError::NotInstalled(name.to_string()));
        }

        let dest = self.target_dir.join(name);
        if dest.exists() {
            fs::remove_dir_all(&dest).map_err(|e| LibraryError::io(&dest, e))?;
        }
        manifest.save(&self.target_dir)?;

        info!("Uninstalled '{}' from {}", name, self.target_dir.display());
        Ok(dest)
    }

    fn copy_skill(&self, relative: &Path) -> Result<PathBuf> {
        let src = self.library.root().join(relative);
        let name = relative
            .file_name()
            .ok_or_else(|| LibraryError::NotFound {
                name: relative.display().to_string(),
                suggestions: Vec::new(),
            })?;
        let dest = self.target_dir.join(name);

        fs::create_dir_all(&self.target_dir).map_err(|e| LibraryError::io(&self.target_dir, e))?;
        copy_dir(&src, &dest, is_ignored)?;
        Ok(dest)
    }
}

fn is_ignored(name: &str) -> bool {
    IGNORED_NAMES.contains(&name) || name.ends_with(".pyc")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_FILE;
    use tempfile::TempDir;

    fn write_skill(root: &Path, group: &str, name: &str) {
        let dir = root.join(group).join(name);
        fs::create_dir_all(dir.join("scripts/__pycache__")).unwrap();
        fs::write(
            dir.join("SKILL.md"),
            format!("---\nname: {}\ndescription: Test skill\n---\n", name),
        )
        .unwrap();
        fs::write(dir.join("scripts/tool.py"), "print()").unwrap();
        fs::write(dir.join("scripts/tool.pyc"), "").unwrap();
        fs::write(dir.join("scripts/__pycache__/tool.cpython.pyc"), "").unwrap();
    }

    fn setup() -> (TempDir, Installer) {
        let temp = TempDir::new().unwrap();
        let library_root = temp.path().join("library");
        write_skill(&library_root, "engineering", "code-reviewer");
        write_skill(&library_root, "engineering", "test-writer");
        write_skill(&library_root, "marketing", "seo-auditor");

        let library = Library::discover(&library_root).unwrap();
        let installer = Installer::new(library, temp.path().join("target"));
        (temp, installer)
    }

    #[test]
    fn test_install_copies_and_records() {
        let (_temp, installer) = setup();

        let outcome = installer.install("code-reviewer", false, true).unwrap();
        assert_eq!(outcome.group, "engineering");

        let dest = installer.target_dir().join("code-reviewer");
        assert!(dest.join("SKILL.md").is_file());
        assert!(dest.join("scripts/tool.py").is_file());
        assert!(!dest.join("scripts/tool.pyc").exists());
        assert!(!dest.join("scripts/__pycache__").exists());
        assert!(installer.target_dir().join(MANIFEST_FILE).is_file());

        let manifest = installer.status();
        assert!(manifest.auto_update);
        assert!(manifest.installed["code-reviewer"].auto_update);
    }

    #[test]
    fn test_one_skill_per_group() {
        let (_temp, installer) = setup();
        installer.install("code-reviewer", false, false).unwrap();

        assert!(matches!(
            installer.install("test-writer", false, false),
            Err(LibraryError::GroupConflict { .. })
        ));
        installer.install("seo-auditor", false, false).unwrap();
        installer.install("code-reviewer", false, false).unwrap();
        installer.install("test-writer", true, false).unwrap();
        assert_eq!(installer.status().installed.len(), 3);
    }

    #[test]
    fn test_unknown_skill_suggests() {
        let (_temp, installer) = setup();
        match installer.install("reviewer", false, false) {
            Err(LibraryError::NotFound { suggestions, .. }) => {
                assert_eq!(suggestions, vec!["code-reviewer"]);
            }
            other => panic!("unexpected result: {:?}", other.map(|o| o.skill)),
        }
    }

    #[test]
    fn test_update_respects_auto_update() {
        let (_temp, installer) = setup();
        assert!(matches!(
            installer.update(None),
            Err(LibraryError::NothingInstalled)
        ));

        installer.install("code-reviewer", false, true).unwrap();
        installer.install("seo-auditor", false, false).unwrap();

        let outcome = installer.update(None).unwrap();
        assert_eq!(outcome.updated, vec!["code-reviewer"]);
        assert_eq!(outcome.skipped, vec!["seo-auditor"]);

        let outcome = installer.update(Some("seo-auditor")).unwrap();
        assert_eq!(outcome.updated, vec!["seo-auditor"]);
        assert!(outcome.skipped.is_empty());

        assert!(matches!(
            installer.update(Some("missing")),
            Err(LibraryError::NotInstalled(_))
        ));
    }

    #[test]
    fn test_update_failure_keeps_other_stamps() {
        let (_temp, installer) = setup();
        installer.install("code-reviewer", false, true).unwrap();
        installer.install("seo-auditor", false, true).unwrap();

        let stale = "2000-01-01T00:00:00Z".parse::<chrono::DateTime<Utc>>().unwrap();
        let mut manifest = installer.status();
        for info in manifest.installed.values_mut() {
            info.updated_at = stale;
        }
        manifest.save(installer.target_dir()).unwrap();

        // A plain file where the skill directory was makes the re-copy fail
        let blocked = installer.target_dir().join("seo-auditor");
        fs::remove_dir_all(&blocked).unwrap();
        fs::write(&blocked, "not a directory").unwrap();

        let outcome = installer.update(None).unwrap();
        assert_eq!(outcome.updated, vec!["code-reviewer"]);
        assert!(outcome.failed.contains_key("seo-auditor"));
        assert!(!outcome.is_success());

        let manifest = installer.status();
        assert!(manifest.installed["code-reviewer"].updated_at > stale);
        assert_eq!(manifest.installed["seo-auditor"].updated_at, stale);
    }

    #[test]
    fn test_uninstall() {
        let (_temp, installer) = setup();
        installer.install("code-reviewer", false, false).unwrap();

        let removed = installer.uninstall("code-reviewer").unwrap();
        assert!(!removed.exists());
        assert!(installer.status().installed.is_empty());
        assert!(matches!(
            installer.uninstall("code-reviewer"),
            Err(LibraryError::NotInstalled(_))
        ));
    }
}
