use anyhow::Context;
use serde::{Deserialize, Serialize};
use skillbook_library::InstallTarget;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config template created when no config exists
const DEFAULT_CONFIG: &str = r#"
[skills]
# Scanned in order; a skill in a later directory overrides one with the same name
directories = ["~/.skillbook/skills", ".skillbook/skills"]

[agents]
directories = ["~/.claude/agents", ".claude/agents"]

[library]
# root = "~/src/skills-library"  # Or set SKILLBOOK_LIBRARY
target = "project"  # claude, cursor, vscode, copilot, codex, goose, project

[logging]
level = "info"  # trace, debug, info, warn, error
format = "text"  # text or json
"#;

const CONFIG_NAME: &str = "skillbook";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillsConfig {
    #[serde(default)]
    pub directories: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentsConfig {
    #[serde(default)]
    pub directories: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub target: InstallTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_format() -> String {
    "text".to_string()
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Get the global config path: ~/.skillbook/skillbook.toml
    fn global_config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".skillbook").join("skillbook.toml"))
    }

    /// Ensure global config directory and file exist, creating defaults if needed
    fn ensure_global_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::global_config_path()?;

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).with_context(|| {
                    format!("Failed to create config directory {}", config_dir.display())
                })?;
                eprintln!("Created config directory: {}", config_dir.display());
            }
        }

        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG.trim())
                .with_context(|| format!("Failed to write {}", config_path.display()))?;
            eprintln!("Created default config: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.skillbook/skillbook.toml (auto-created if missing)
    /// 2. Local override: ./skillbook.toml (optional)
    /// 3. Environment variables with the SKILLBOOK__ prefix
    /// 4. SKILLBOOK_LIBRARY and SKILLBOOK_LOG (highest priority)
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file from current directory
        dotenvy::dotenv().ok();

        let global_config_path = Self::ensure_global_config()?;
        Self::load_from(&global_config_path, Path::new(CONFIG_NAME))
    }

    /// Load from an explicit global file and optional local file stem
    pub fn load_from(global: &Path, local: &Path) -> anyhow::Result<Self> {
        let mut config_builder = config::Config::builder()
            .add_source(config::File::from(global))
            .add_source(config::File::from(local).required(false))
            .add_source(
                config::Environment::with_prefix("SKILLBOOK")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("skills.directories")
                    .with_list_parse_key("agents.directories"),
            );

        if let Ok(root) = env::var("SKILLBOOK_LIBRARY") {
            config_builder = config_builder.set_override("library.root", root)?;
        }

        if let Ok(level) = env::var("SKILLBOOK_LOG") {
            config_builder = config_builder.set_override("logging.level", level)?;
        }

        let config = config_builder
            .build()
            .with_context(|| format!("Failed to load configuration from {}", global.display()))?;

        let mut config: Self = config.try_deserialize()?;
        config.expand_paths();
        Ok(config)
    }

    fn expand_paths(&mut self) {
        for dir in self
            .skills
            .directories
            .iter_mut()
            .chain(self.agents.directories.iter_mut())
        {
            *dir = expand_tilde(dir);
        }
        if let Some(root) = self.library.root.as_mut() {
            *root = expand_tilde(root);
        }
    }
}

/// Replace a leading `~` with the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
