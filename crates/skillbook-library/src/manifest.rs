//! Installed-skills manifest kept next to the installed copies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{LibraryError, Result};

pub const MANIFEST_FILE: &str = ".skillbook-manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledSkill {
    pub group: String,
    /// Path relative to the library root
    pub path: PathBuf,
    pub installed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub auto_update: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub installed: BTreeMap<String, InstalledSkill>,
    #[serde(default)]
    pub auto_update: bool,
    #[serde(default)]
    pub source: String,
}

impl Manifest {
    pub fn path(target_dir: &Path) -> PathBuf {
        target_dir.join(MANIFEST_FILE)
    }

    /// Load the manifest in `target_dir`. A missing or unreadable manifest
    /// yields a fresh one.
    pub fn load(target_dir: &Path) -> Self {
        let path = Self::path(target_dir);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No manifest at {}: {}", path.display(), e);
                return Self::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring unreadable manifest {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn save(&self, target_dir: &Path) -> Result<()> {
        fs::create_dir_all(target_dir).map_err(|e| LibraryError::io(target_dir, e))?;
        let path = Self::path(target_dir);
        let json = serde_json::to_string_pretty(self).map_err(|source| LibraryError::Manifest {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json + "\n").map_err(|e| LibraryError::io(&path, e))
    }

    /// Another installed skill from `group`, other than `name`
    pub fn group_member(&self, group: &str, name: &str) -> Option<&str> {
        self.installed
            .iter()
            .find(|(installed, info)| info.group == group && installed.as_str() != name)
            .map(|(installed, _)| installed.as_str())
    }
}
