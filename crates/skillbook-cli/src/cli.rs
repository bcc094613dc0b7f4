use clap::{Parser, Subcommand, ValueEnum};
use skillbook_library::InstallTarget;
use skillbook_skills::context::{DEFAULT_CONTEXT_WINDOW, DEFAULT_MAX_DEPTH};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "skillbook", version)]
#[command(about = "Discover, validate and package Markdown skills and agents", long_about = None)]
pub struct Cli {
    /// Extra skills directory, scanned after the configured ones (repeatable)
    #[arg(long = "skills-dir", short = 's', global = true, value_name = "DIR")]
    pub skills_dirs: Vec<PathBuf>,

    /// Extra agents directory, scanned after the configured ones (repeatable)
    #[arg(long = "agents-dir", global = true, value_name = "DIR")]
    pub agents_dirs: Vec<PathBuf>,

    /// Log level (overrides [logging] level)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List discovered skills
    List {
        /// Only skills in this category
        #[arg(long, short)]
        category: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Print a skill's metadata and full instructions
    Show {
        name: String,

        #[arg(long)]
        json: bool,
    },

    /// Print the skills summary block for a system prompt
    Prompt,

    /// List discovered agents
    Agents {
        #[arg(long)]
        json: bool,
    },

    /// Build an index of the skill packages in a directory
    Index {
        dir: PathBuf,

        /// Write to this file instead of stdout
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,

        #[arg(long, short, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Only skills in this category
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Check a skill for Claude Code and Codex compatibility
    Validate {
        dir: PathBuf,

        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,

        #[arg(long)]
        json: bool,
    },

    /// Lint every skill and agent under a directory
    Lint {
        #[arg(default_value = ".")]
        root: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Estimate how much of a context window a project's files consume
    Context {
        #[arg(default_value = ".")]
        project: PathBuf,

        /// Deepest directory level to scan
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Context window size in tokens
        #[arg(long, default_value_t = DEFAULT_CONTEXT_WINDOW)]
        context_window: u64,

        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,

    /// Generate agents/openai.yaml for a SKILL.md
    Convert {
        skill_md: PathBuf,

        /// Write the converted package here instead of next to SKILL.md
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Create a new skill package
    Scaffold {
        name: String,

        #[arg(long, short, default_value = "engineering")]
        domain: String,

        /// Frontmatter description (a discovery-friendly default is generated)
        #[arg(long, default_value = "")]
        description: String,

        #[arg(long = "version", default_value = "1.0.0")]
        skill_version: String,

        #[arg(long, default_value = "MIT")]
        license: String,

        /// Metadata category (defaults to the domain)
        #[arg(long, default_value = "")]
        category: String,

        /// Parent directory for the skill folder
        #[arg(long, short, default_value = ".")]
        output: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Browse a skills library and manage installed skills
    Library {
        /// Library root (overrides [library] root)
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Install target (overrides [library] target)
        #[arg(long, short)]
        target: Option<InstallTarget>,

        #[command(subcommand)]
        action: LibraryAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum LibraryAction {
    /// List the skills available in the library
    List {
        #[arg(long, short)]
        group: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Install a skill into the target directory
    Install {
        name: String,

        /// Allow several skills from the same group
        #[arg(long)]
        force: bool,

        /// Refresh this skill on `update` without naming it
        #[arg(long)]
        auto_update: bool,

        #[arg(long)]
        json: bool,
    },

    /// Re-copy installed skills from the library
    Update {
        name: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show installed skills
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Remove an installed skill
    Uninstall {
        name: String,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Human,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_library_install() {
        let cli = Cli::try_parse_from([
            "skillbook",
            "library",
            "--target",
            "cursor",
            "install",
            "code-reviewer",
            "--force",
        ])
        .unwrap();

        match cli.command {
            Commands::Library {
                target,
                action: LibraryAction::Install { name, force, .. },
                ..
            } => {
                assert_eq!(target, Some(InstallTarget::Cursor));
                assert_eq!(name, "code-reviewer");
                assert!(force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_index_defaults() {
        let cli = Cli::try_parse_from(["skillbook", "-s", "extra", "index", "skills"]).unwrap();
        assert_eq!(cli.skills_dirs, vec![PathBuf::from("extra")]);
        match cli.command {
            Commands::Index { format, output, .. } => {
                assert_eq!(format, OutputFormat::Json);
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_context_defaults() {
        let cli = Cli::try_parse_from(["skillbook", "context", "--context-window", "100000"])
            .unwrap();
        match cli.command {
            Commands::Context {
                project,
                max_depth,
                context_window,
                json,
            } => {
                assert_eq!(project, PathBuf::from("."));
                assert_eq!(max_depth, DEFAULT_MAX_DEPTH);
                assert_eq!(context_window, 100_000);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_scaffold_version() {
        let cli = Cli::try_parse_from(["skillbook", "scaffold", "my-skill", "--version", "2.0.0"])
            .unwrap();
        match cli.command {
            Commands::Scaffold { skill_version, domain, .. } => {
                assert_eq!(skill_version, "2.0.0");
                assert_eq!(domain, "engineering");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
