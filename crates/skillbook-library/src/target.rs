use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{LibraryError, Result};

/// Where installed skills are copied, one directory per agent runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallTarget {
    Claude,
    Cursor,
    Vscode,
    Copilot,
    Codex,
    Goose,
    #[default]
    Project,
}

impl InstallTarget {
    pub const ALL: [InstallTarget; 7] = [
        InstallTarget::Claude,
        InstallTarget::Cursor,
        InstallTarget::Vscode,
        InstallTarget::Copilot,
        InstallTarget::Codex,
        InstallTarget::Goose,
        InstallTarget::Project,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstallTarget::Claude => "claude",
            InstallTarget::Cursor => "cursor",
            InstallTarget::Vscode => "vscode",
            InstallTarget::Copilot => "copilot",
            InstallTarget::Codex => "codex",
            InstallTarget::Goose => "goose",
            InstallTarget::Project => "project",
        }
    }

    /// Path relative to the home directory, for per-user targets
    fn home_relative(&self) -> Option<&'static str> {
        match self {
            InstallTarget::Claude => Some(".claude/skills"),
            InstallTarget::Codex => Some(".codex/skills"),
            InstallTarget::Goose => Some(".config/goose/skills"),
            _ => None,
        }
    }

    /// Install directory. Project-level targets are relative to the working
    /// directory.
    pub fn dir(&self) -> Result<PathBuf> {
        if let Some(relative) = self.home_relative() {
            let home = dirs::home_dir().ok_or(LibraryError::NoHomeDir)?;
            return Ok(home.join(relative));
        }

        Ok(PathBuf::from(match self {
            InstallTarget::Cursor => ".cursor/skills",
            InstallTarget::Vscode | InstallTarget::Copilot => ".github/skills",
            _ => ".skills",
        }))
    }
}

impl fmt::Display for InstallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallTarget {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|target| target.as_str() == s)
            .ok_or(LibraryError::UnknownTarget(s))
    }
}
