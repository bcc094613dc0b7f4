use skillbook_skills::SkillError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from browsing a skills library and managing installs
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest {path:?}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Library root {0:?} is not a directory")]
    MissingRoot(PathBuf),

    #[error("Skill '{name}' not found.{}", did_you_mean(.suggestions))]
    NotFound {
        name: String,
        suggestions: Vec<String>,
    },

    #[error(
        "Group '{group}' already has '{installed}' installed. \
         Use --force to install multiple skills from the same group, or uninstall '{installed}' first."
    )]
    GroupConflict { group: String, installed: String },

    #[error("Skill '{0}' is not installed")]
    NotInstalled(String),

    #[error("No skills installed. Use 'install' first.")]
    NothingInstalled,

    #[error("Unknown install target '{0}' (expected one of: claude, cursor, vscode, copilot, codex, goose, project)")]
    UnknownTarget(String),

    #[error("Could not determine the home directory")]
    NoHomeDir,

    #[error(transparent)]
    Skill(#[from] SkillError),
}

impl LibraryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" Did you mean: {}?", suggestions.join(", "))
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_lists_suggestions() {
        let err = LibraryError::NotFound {
            name: "review".to_string(),
            suggestions: vec!["code-review".to_string(), "review-bot".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Skill 'review' not found. Did you mean: code-review, review-bot?"
        );

        let err = LibraryError::NotFound {
            name: "zzz".to_string(),
            suggestions: Vec::new(),
        };
        assert_eq!(err.to_string(), "Skill 'zzz' not found.");
    }
}
