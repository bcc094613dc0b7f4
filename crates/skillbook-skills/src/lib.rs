//! `skillbook` skills and agents
//!
//! Discovery and loading of Markdown skill packages and agent definitions,
//! plus the tooling around them: index building, cross-platform validation,
//! corpus linting, Codex conversion, scaffolding and context budgeting.
//!
//! ## Layout
//!
//! ```text
//! <skills-dir>/<skill-name>/
//!   SKILL.md              required, YAML frontmatter + Markdown body
//!   scripts/              optional tools
//!   references/           optional long-form guides
//!   assets/               optional templates
//!   agents/openai.yaml    optional Codex agent config
//! ```
//!
//! ## Progressive disclosure
//!
//! Discovery reads only the frontmatter (`name`, `description`) of every
//! skill. The full body is loaded on activation through
//! [`SkillsRegistry::load_skill`], and files under `references/` are left
//! for the consumer to open when the body points at them.

#![deny(unsafe_code, unused_imports, unused_variables)]

pub mod agent;
pub mod context;
pub mod convert;
pub mod error;
pub mod frontmatter;
pub mod fsutil;
pub mod index;
pub mod lint;
pub mod registry;
pub mod scaffold;
pub mod skill;
pub mod validate;

pub use agent::{AgentDefinition, AgentRegistry, OpenAiAgentFile};
pub use context::{analyze_context, ContextOptions, ContextReport};
pub use convert::{convert_skill, ConversionReport, ConversionStatus};
pub use error::{Result, SkillError};
pub use index::{build_index, SkillsIndex};
pub use lint::{lint_tree, LintFinding, LintReport};
pub use registry::{DiscoveryIssue, SkillsRegistry};
pub use scaffold::{scaffold_skill, ScaffoldOptions, ScaffoldReport};
pub use skill::{Skill, SkillFrontmatter};
pub use validate::{validate_skill, ValidationReport};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{AgentDefinition, AgentRegistry, Skill, SkillError, SkillsRegistry};
}
