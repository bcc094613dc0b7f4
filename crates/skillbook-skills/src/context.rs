//! Context window budget
//!
//! Estimates how many tokens a project spends on files an agent may pull
//! into its context: `CLAUDE.md` and `.claude/` configuration is loaded
//! automatically, `SKILL.md` files on activation, and `references/` only on
//! demand. Token counts are a size-based estimate, not a tokenizer run.

use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Result, SkillError};
use crate::fsutil::format_size;

/// Approximate characters per token
pub const CHARS_PER_TOKEN: u64 = 4;

pub const DEFAULT_CONTEXT_WINDOW: u64 = 200_000;
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Fixed share reserved for the runtime's own system prompt
pub const SYSTEM_PROMPT_TOKENS: u64 = 3_000;

/// Files larger than this are skipped
pub const MAX_FILE_SIZE: u64 = 1_000_000;

const SKIPPED_DIRS: [&str; 19] = [
    ".git",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    "env",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    "dist",
    "build",
    ".next",
    ".nuxt",
    "coverage",
    ".coverage",
    "target",
    ".terraform",
    ".serverless",
    "vendor",
];

const SKIPPED_FILES: [&str; 9] = [
    ".DS_Store",
    "Thumbs.db",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "Gemfile.lock",
    "Cargo.lock",
    "composer.lock",
];

const SOURCE_EXTENSIONS: [&str; 16] = [
    "py", "js", "ts", "tsx", "jsx", "go", "rs", "java", "rb", "php", "c", "cpp", "h", "cs",
    "swift", "kt",
];

const CONFIG_EXTENSIONS: [&str; 6] = ["json", "yaml", "yml", "toml", "ini", "cfg"];

const CONFIG_NAMES: [&str; 10] = [
    "Makefile",
    "Dockerfile",
    "docker-compose.yml",
    "package.json",
    "tsconfig.json",
    "pyproject.toml",
    "Cargo.toml",
    "go.mod",
    ".gitignore",
    ".env.example",
];

const DOC_EXTENSIONS: [&str; 3] = ["md", "rst", "txt"];

const LARGEST_PER_CATEGORY: usize = 10;
const LARGEST_OVERALL: usize = 20;
const LARGE_SOURCE_TOKENS: u64 = 5_000;
const AUTO_LOADED_CEILING: u64 = 8_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextCategory {
    ClaudeConfig,
    SkillFiles,
    ReferenceDocs,
    SourceCode,
    ConfigFiles,
    Documentation,
    Other,
}

impl ContextCategory {
    pub const ALL: [ContextCategory; 7] = [
        ContextCategory::ClaudeConfig,
        ContextCategory::SkillFiles,
        ContextCategory::ReferenceDocs,
        ContextCategory::SourceCode,
        ContextCategory::ConfigFiles,
        ContextCategory::Documentation,
        ContextCategory::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ContextCategory::ClaudeConfig => "Claude Configuration",
            ContextCategory::SkillFiles => "Skill Definitions",
            ContextCategory::ReferenceDocs => "Reference Documents",
            ContextCategory::SourceCode => "Source Code",
            ContextCategory::ConfigFiles => "Config & Build",
            ContextCategory::Documentation => "Documentation",
            ContextCategory::Other => "Other",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ContextCategory::ClaudeConfig => {
                "CLAUDE.md files and .claude/ configuration (loaded automatically)"
            }
            ContextCategory::SkillFiles => "Skill master documents (loaded when skills are triggered)",
            ContextCategory::ReferenceDocs => "Deep-dive reference guides (loaded on demand)",
            ContextCategory::SourceCode => "Source files read during work",
            ContextCategory::ConfigFiles => "Configuration and build files",
            ContextCategory::Documentation => "Markdown and text documentation",
            ContextCategory::Other => "",
        }
    }

    /// Classify a file by its path relative to the project root
    pub fn classify(relative: &Path) -> Self {
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if name.eq_ignore_ascii_case("CLAUDE.md")
            || relative.parent().is_some_and(|p| has_component(p, ".claude"))
        {
            return ContextCategory::ClaudeConfig;
        }
        if name.eq_ignore_ascii_case("SKILL.md") {
            return ContextCategory::SkillFiles;
        }
        if relative.parent().is_some_and(|p| has_component(p, "references")) {
            return ContextCategory::ReferenceDocs;
        }

        let extension = relative
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if SOURCE_EXTENSIONS.contains(&extension.as_str()) {
            ContextCategory::SourceCode
        } else if CONFIG_EXTENSIONS.contains(&extension.as_str())
            || CONFIG_NAMES.contains(&name.as_str())
        {
            ContextCategory::ConfigFiles
        } else if DOC_EXTENSIONS.contains(&extension.as_str()) {
            ContextCategory::Documentation
        } else {
            ContextCategory::Other
        }
    }
}

fn has_component(path: &Path, wanted: &str) -> bool {
    path.components().any(|c| c.as_os_str() == wanted)
}

/// Scan settings
#[derive(Debug, Clone, Copy)]
pub struct ContextOptions {
    /// Deepest directory level whose files are counted (root is 0)
    pub max_depth: usize,
    /// Context window size in tokens
    pub context_window: u64,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileEstimate {
    pub path: String,
    pub size_bytes: u64,
    pub token_estimate: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: ContextCategory,
    pub label: &'static str,
    pub description: &'static str,
    pub file_count: usize,
    pub total_tokens: u64,
    pub percentage_of_window: f64,
    pub largest_files: Vec<FileEstimate>,
}

/// One line of the budget breakdown
#[derive(Debug, Clone, Serialize)]
pub struct BudgetLine {
    pub key: &'static str,
    pub label: &'static str,
    pub tokens: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContextSummary {
    pub total_files_scanned: usize,
    pub files_skipped: usize,
    pub total_project_tokens: u64,
    pub auto_loaded_tokens: u64,
    pub project_as_percentage_of_window: f64,
}

/// Context usage of one project
#[derive(Debug, Clone, Serialize)]
pub struct ContextReport {
    pub project_path: PathBuf,
    pub context_window: u64,
    pub summary: ContextSummary,
    pub categories: Vec<CategorySummary>,
    pub budget: Vec<BudgetLine>,
    pub largest_files: Vec<FileEstimate>,
    /// Sorted by priority, highest first
    pub recommendations: Vec<Recommendation>,
}

impl ContextReport {
    pub fn category(&self, category: ContextCategory) -> Option<&CategorySummary> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// Tokens left for source reads, conversation and reasoning
    pub fn available_tokens(&self) -> i64 {
        self.budget
            .iter()
            .find(|line| line.key == "available_for_work")
            .map_or(0, |line| line.tokens)
    }
}

pub fn estimate_tokens(size_bytes: u64) -> u64 {
    size_bytes / CHARS_PER_TOKEN
}

/// Walk `root` and estimate the context cost of every file
pub fn analyze_context(root: &Path, options: &ContextOptions) -> Result<ContextReport> {
    if !root.is_dir() {
        return Err(SkillError::NotFound(root.display().to_string()));
    }
    let root = root.canonicalize().map_err(|e| SkillError::io(root, e))?;

    let mut files: Vec<(ContextCategory, FileEstimate)> = Vec::new();
    let mut skipped = 0;

    // A file sits one level below the directory that holds it
    let walker = WalkDir::new(&root)
        .max_depth(options.max_depth + 1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                skipped += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if SKIPPED_FILES.contains(&&*name) {
            skipped += 1;
            continue;
        }

        let size_bytes = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                debug!("Skipping {}: {}", entry.path().display(), e);
                skipped += 1;
                continue;
            }
        };
        if size_bytes > MAX_FILE_SIZE {
            skipped += 1;
            continue;
        }
        if size_bytes == 0 {
            continue;
        }

        let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
        files.push((
            ContextCategory::classify(relative),
            FileEstimate {
                path: relative.display().to_string(),
                size_bytes,
                token_estimate: estimate_tokens(size_bytes),
            },
        ));
    }

    let report = build_report(root, files, skipped, options.context_window);
    info!(
        "Analyzed {} file(s) in {}: ~{} tokens",
        report.summary.total_files_scanned,
        report.project_path.display(),
        report.summary.total_project_tokens
    );
    Ok(report)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && SKIPPED_DIRS.contains(&&*entry.file_name().to_string_lossy())
}

fn build_report(
    project_path: PathBuf,
    files: Vec<(ContextCategory, FileEstimate)>,
    files_skipped: usize,
    window: u64,
) -> ContextReport {
    let total_files_scanned = files.len();

    let categories: Vec<CategorySummary> = ContextCategory::ALL
        .iter()
        .map(|&category| {
            let mut members: Vec<FileEstimate> = files
                .iter()
                .filter(|(c, _)| *c == category)
                .map(|(_, f)| f.clone())
                .collect();
            let total_tokens = members.iter().map(|f| f.token_estimate).sum();
            let file_count = members.len();
            sort_largest(&mut members);
            members.truncate(LARGEST_PER_CATEGORY);

            CategorySummary {
                category,
                label: category.label(),
                description: category.description(),
                file_count,
                total_tokens,
                percentage_of_window: percentage(total_tokens, window),
                largest_files: members,
            }
        })
        .collect();

    let tokens_of = |category: ContextCategory| {
        categories
            .iter()
            .find(|c| c.category == category)
            .map_or(0, |c| c.total_tokens)
    };
    let total_project_tokens: u64 = categories.iter().map(|c| c.total_tokens).sum();
    let auto_loaded = tokens_of(ContextCategory::ClaudeConfig);
    let skill_tokens = tokens_of(ContextCategory::SkillFiles);
    let available = window as i64 - SYSTEM_PROMPT_TOKENS as i64 - auto_loaded as i64;

    let budget = vec![
        BudgetLine {
            key: "system_prompt",
            label: "System Prompt (fixed)",
            tokens: SYSTEM_PROMPT_TOKENS as i64,
        },
        BudgetLine {
            key: "claude_config",
            label: "CLAUDE.md Configuration (auto-loaded)",
            tokens: auto_loaded as i64,
        },
        BudgetLine {
            key: "active_skills",
            label: "Skill Definitions (on trigger)",
            tokens: skill_tokens as i64,
        },
        BudgetLine {
            key: "available_for_work",
            label: "Available for Source Code + Conversation + Reasoning",
            tokens: available,
        },
    ];

    let mut largest_files: Vec<FileEstimate> = files.iter().map(|(_, f)| f.clone()).collect();
    sort_largest(&mut largest_files);
    largest_files.truncate(LARGEST_OVERALL);

    let large_sources = files
        .iter()
        .filter(|(c, f)| *c == ContextCategory::SourceCode && f.token_estimate > LARGE_SOURCE_TOKENS)
        .count();
    let config_files = categories
        .iter()
        .find(|c| c.category == ContextCategory::ClaudeConfig)
        .map_or(0, |c| c.file_count);

    let recommendations = recommend(
        window,
        auto_loaded,
        skill_tokens,
        large_sources,
        available,
        config_files,
    );

    ContextReport {
        project_path,
        context_window: window,
        summary: ContextSummary {
            total_files_scanned,
            files_skipped,
            total_project_tokens,
            auto_loaded_tokens: auto_loaded,
            project_as_percentage_of_window: percentage(total_project_tokens, window),
        },
        categories,
        budget,
        largest_files,
        recommendations,
    }
}

fn recommend(
    window: u64,
    auto_loaded: u64,
    skill_tokens: u64,
    large_sources: usize,
    available: i64,
    config_files: usize,
) -> Vec<Recommendation> {
    let mut out = Vec::new();
    let mut push = |priority, message: String| out.push(Recommendation { priority, message });
    let window_f = window as f64;

    if auto_loaded as f64 > window_f * 0.1 {
        push(
            Priority::High,
            format!(
                "CLAUDE.md configuration uses {} tokens ({}% of context window). Target under 10%. Use hierarchical loading.",
                auto_loaded,
                percentage(auto_loaded, window)
            ),
        );
    }
    if auto_loaded > AUTO_LOADED_CEILING {
        push(
            Priority::High,
            "Root CLAUDE.md files exceed 8K tokens total. Move domain-specific instructions to subdirectory CLAUDE.md files."
                .to_string(),
        );
    }
    if skill_tokens as f64 > window_f * 0.15 {
        push(
            Priority::Medium,
            format!(
                "Skill definitions total {} tokens. Consider splitting large skills or using progressive disclosure.",
                skill_tokens
            ),
        );
    }
    if large_sources > 0 {
        push(
            Priority::Medium,
            format!(
                "{} source files exceed 5K tokens. When reading these files, use line ranges instead of full reads.",
                large_sources
            ),
        );
    }
    if (available as f64) < window_f * 0.5 {
        let share = if window > 0 {
            (available as f64 / window_f * 1000.0).round() / 10.0
        } else {
            0.0
        };
        push(
            Priority::High,
            format!(
                "Only {} tokens ({}%) available for actual work. Reduce configuration overhead.",
                available, share
            ),
        );
    }
    if config_files == 0 {
        push(
            Priority::Medium,
            "No CLAUDE.md found. Create one to give the agent project-specific context."
                .to_string(),
        );
    }

    out.sort_by_key(|rec| rec.priority);
    out
}

fn sort_largest(files: &mut [FileEstimate]) {
    files.sort_by(|a, b| {
        b.token_estimate
            .cmp(&a.token_estimate)
            .then_with(|| a.path.cmp(&b.path))
    });
}

/// Share of the window, rounded to one decimal
fn percentage(tokens: u64, window: u64) -> f64 {
    if window == 0 {
        return 0.0;
    }
    (tokens as f64 / window as f64 * 1000.0).round() / 10.0
}

/// `950`, `1.2K`
pub fn format_tokens(tokens: i64) -> String {
    if tokens >= 1000 {
        format!("{:.1}K", tokens as f64 / 1000.0)
    } else {
        tokens.to_string()
    }
}

/// Render the report for a terminal
pub fn format_human(report: &ContextReport) -> String {
    let mut out = String::new();
    let summary = &report.summary;
    let window = report.context_window;

    let _ = writeln!(out, "{}", "=".repeat(64));
    let _ = writeln!(out, "  Context Window Analysis");
    let _ = writeln!(out, "{}", "=".repeat(64));
    let _ = writeln!(out, "  Project:           {}", report.project_path.display());
    let _ = writeln!(out, "  Context window:    {} tokens", format_tokens(window as i64));
    let _ = writeln!(
        out,
        "  Files scanned:     {} ({} skipped)",
        summary.total_files_scanned, summary.files_skipped
    );
    let _ = writeln!(
        out,
        "  Total project:     ~{} tokens ({}% of window)",
        format_tokens(summary.total_project_tokens as i64),
        summary.project_as_percentage_of_window
    );
    let _ = writeln!(
        out,
        "  Auto-loaded:       ~{} tokens (CLAUDE.md config)",
        format_tokens(summary.auto_loaded_tokens as i64)
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Context Budget Breakdown ---");
    for line in &report.budget {
        let pct = if window > 0 {
            (line.tokens as f64 / window as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
        let filled = ((pct / 2.0).max(0.0) as usize).min(50);
        let bar = format!("{}{}", "#".repeat(filled), ".".repeat(50 - filled));
        let _ = writeln!(out, "  {}", line.label);
        let _ = writeln!(
            out,
            "    {:>8} tokens ({:>5.1}%)  [{}]",
            format_tokens(line.tokens),
            pct,
            bar
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Category Breakdown ---");
    for category in report.categories.iter().filter(|c| c.file_count > 0) {
        let _ = writeln!(out, "  {} ({} files)", category.label, category.file_count);
        let _ = writeln!(
            out,
            "    ~{} tokens ({}% of window)",
            format_tokens(category.total_tokens as i64),
            category.percentage_of_window
        );
        for file in category.largest_files.iter().take(5) {
            let _ = writeln!(
                out,
                "      {}  (~{} tokens, {})",
                file.path,
                format_tokens(file.token_estimate as i64),
                format_size(file.size_bytes)
            );
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "--- Largest Files (Top {}) ---", LARGEST_OVERALL);
    for (i, file) in report.largest_files.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {}  (~{} tokens)",
            i + 1,
            file.path,
            format_tokens(file.token_estimate as i64)
        );
    }

    if !report.recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "--- Recommendations ---");
        for rec in &report.recommendations {
            let tag = match rec.priority {
                Priority::High => "HIGH",
                Priority::Medium => "MEDIUM",
            };
            let _ = writeln!(out, "  [{}] {}", tag, rec.message);
        }
    }

    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, bytes: usize) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x".repeat(bytes)).unwrap();
    }

    #[test]
    fn test_classify() {
        let cases = [
            ("CLAUDE.md", ContextCategory::ClaudeConfig),
            ("docs/claude.md", ContextCategory::ClaudeConfig),
            (".claude/agents/reviewer.md", ContextCategory::ClaudeConfig),
            ("skills/a/SKILL.md", ContextCategory::SkillFiles),
            ("skills/a/references/guide.md", ContextCategory::ReferenceDocs),
            ("skills/a/scripts/tool.py", ContextCategory::SourceCode),
            ("src/Main.RS", ContextCategory::SourceCode),
            ("Makefile", ContextCategory::ConfigFiles),
            ("config/app.yaml", ContextCategory::ConfigFiles),
            ("README.md", ContextCategory::Documentation),
            ("logo.png", ContextCategory::Other),
        ];
        for (path, expected) in cases {
            assert_eq!(ContextCategory::classify(Path::new(path)), expected, "{}", path);
        }
    }

    #[test]
    fn test_budget_and_categories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "CLAUDE.md", 4_000);
        write(root, "skills/reviewer/SKILL.md", 2_400);
        write(root, "skills/reviewer/references/guide.md", 8_000);
        write(root, "src/main.rs", 400);
        write(root, "Cargo.lock", 400);
        write(root, "node_modules/pkg/index.js", 400);
        write(root, "empty.txt", 0);

        let report = analyze_context(root, &ContextOptions::default()).unwrap();

        assert_eq!(report.summary.total_files_scanned, 4);
        assert_eq!(report.summary.files_skipped, 1);
        assert_eq!(report.summary.auto_loaded_tokens, 1_000);
        assert_eq!(report.summary.total_project_tokens, 3_700);

        let skills = report.category(ContextCategory::SkillFiles).unwrap();
        assert_eq!(skills.file_count, 1);
        assert_eq!(skills.total_tokens, 600);
        assert_eq!(skills.percentage_of_window, 0.3);

        assert_eq!(report.available_tokens(), 200_000 - 3_000 - 1_000);
        assert_eq!(report.largest_files[0].path, "skills/reviewer/references/guide.md");
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_max_depth_limits_walk() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "CLAUDE.md", 40);
        write(root, "a/b/deep.md", 40);

        let options = ContextOptions {
            max_depth: 1,
            ..ContextOptions::default()
        };
        let report = analyze_context(root, &options).unwrap();
        assert_eq!(report.summary.total_files_scanned, 1);

        let report = analyze_context(root, &ContextOptions::default()).unwrap();
        assert_eq!(report.summary.total_files_scanned, 2);
    }

    #[test]
    fn test_recommendations_for_heavy_config() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "CLAUDE.md", 40_000);
        write(root, "src/huge.py", 24_000);

        let options = ContextOptions {
            context_window: 50_000,
            ..ContextOptions::default()
        };
        let report = analyze_context(root, &options).unwrap();

        let priorities: Vec<Priority> = report.recommendations.iter().map(|r| r.priority).collect();
        assert_eq!(
            priorities,
            vec![Priority::High, Priority::High, Priority::Medium]
        );
        assert!(report.recommendations[0].message.contains("10000 tokens (20%"));
        assert!(report.recommendations[2].message.starts_with("1 source files"));
    }

    #[test]
    fn test_missing_claude_md_and_low_budget() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "notes.txt", 40);

        let options = ContextOptions {
            context_window: 5_000,
            ..ContextOptions::default()
        };
        let report = analyze_context(temp.path(), &options).unwrap();
        assert_eq!(report.available_tokens(), 2_000);

        let messages: Vec<&str> = report
            .recommendations
            .iter()
            .map(|r| r.message.as_str())
            .collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Only 2000 tokens (40%)"));
        assert!(messages[1].starts_with("No CLAUDE.md found"));
    }

    #[test]
    fn test_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            analyze_context(&temp.path().join("absent"), &ContextOptions::default()),
            Err(SkillError::NotFound(_))
        ));
    }

    #[test]
    fn test_format_tokens_and_human() {
        assert_eq!(format_tokens(950), "950");
        assert_eq!(format_tokens(1_250), "1.2K");

        let temp = TempDir::new().unwrap();
        write(temp.path(), "CLAUDE.md", 400);
        let report = analyze_context(temp.path(), &ContextOptions::default()).unwrap();
        let text = format_human(&report);
        assert!(text.contains("Context Window Analysis"));
        assert!(text.contains("Claude Configuration (1 files)"));
        assert!(text.contains("CLAUDE.md  (~100 tokens)"));
    }
}
