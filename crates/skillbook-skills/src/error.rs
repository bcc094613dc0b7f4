//! Error types for skill and agent loading

use std::path::PathBuf;
use thiserror::Error;

/// Skill and agent loading errors
#[derive(Debug, Error)]
pub enum SkillError {
    /// Filesystem error while reading or writing a path
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// No SKILL.md in a skill directory
    #[error("SKILL.md not found in {0:?}")]
    MissingSkillFile(PathBuf),

    /// File has no `---` delimited frontmatter block
    #[error("No valid YAML frontmatter found in {0:?}")]
    MissingFrontmatter(PathBuf),

    /// Frontmatter or YAML file is not valid YAML for the expected shape
    #[error("Failed to parse YAML in {path:?}: {source}")]
    Yaml {
        /// File being parsed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_yaml::Error,
    },

    /// A required field is absent
    #[error("Missing required '{field}' field in {path:?}")]
    MissingField {
        /// File being parsed
        path: PathBuf,
        /// Field name
        field: &'static str,
    },

    /// Name does not follow the naming rule
    #[error("Invalid name '{name}': {reason}")]
    InvalidName {
        /// Offending name
        name: String,
        /// Rule that was broken
        reason: &'static str,
    },

    /// Description is empty or whitespace
    #[error("Description of '{0}' cannot be empty")]
    EmptyDescription(String),

    /// Lookup by name failed
    #[error("'{0}' not found")]
    NotFound(String),

    /// Target already exists and would be overwritten
    #[error("{0:?} already exists")]
    AlreadyExists(PathBuf),

    /// Regex compilation error
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Directory walk failed
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl SkillError {
    /// Wrap an I/O error with the path that caused it
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SkillError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, SkillError>;
