use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::json;
use skillbook_library::{Installer, Library, Manifest};
use skillbook_skills::context::{self, analyze_context, ContextOptions};
use skillbook_skills::convert::ConversionReport;
use skillbook_skills::index::{self, build_index};
use skillbook_skills::lint::LintReport;
use skillbook_skills::scaffold::ScaffoldReport;
use skillbook_skills::validate;
use skillbook_skills::{
    convert_skill, lint_tree, scaffold_skill, validate_skill, AgentRegistry, ScaffoldOptions, Skill,
    SkillsRegistry,
};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

use crate::cli::{Cli, Commands, LibraryAction, OutputFormat};
use crate::config::{expand_tilde, Config};

/// Dispatch a parsed command line
pub fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    let Cli {
        skills_dirs,
        agents_dirs,
        command,
        ..
    } = cli;

    match command {
        Commands::List { category, json } => {
            let registry = discover_skills(&config, &skills_dirs)?;
            let skills = match category.as_deref() {
                Some(category) => registry.filter_by_category(category),
                None => registry.skills(),
            };
            if json {
                let descriptors: Vec<_> = skills.iter().map(|s| &s.descriptor).collect();
                print_json(&descriptors)?;
            } else {
                print!("{}", render_skill_list(&registry, &skills));
            }
        }
        Commands::Show { name, json } => {
            let mut registry = discover_skills(&config, &skills_dirs)?;
            if registry.get(&name).is_none() {
                let suggestions = registry.suggest(&name);
                if suggestions.is_empty() {
                    bail!("Skill '{}' not found", name);
                }
                bail!(
                    "Skill '{}' not found. Did you mean: {}?",
                    name,
                    suggestions.join(", ")
                );
            }
            let skill = registry.load_skill(&name)?;
            if json {
                print_json(&json!({
                    "descriptor": skill.descriptor,
                    "path": skill.path,
                    "platforms": skill.platforms(),
                    "content": skill.content,
                }))?;
            } else {
                println!("{} ({})", skill.name(), skill.path.display());
                println!("{}", skill.description());
                println!();
                println!("{}", skill.body().unwrap_or_default().trim());
            }
        }
        Commands::Prompt => {
            let registry = discover_skills(&config, &skills_dirs)?;
            print!("{}", registry.generate_system_prompt());
        }
        Commands::Agents { json } => {
            let mut registry = config
                .agents
                .directories
                .iter()
                .chain(&agents_dirs)
                .fold(AgentRegistry::new(), |registry, dir| {
                    registry.add_directory(expand_tilde(dir))
                });
            registry.discover()?;
            for issue in registry.issues() {
                warn!("Skipped {}: {}", issue.path.display(), issue.reason);
            }

            let agents = registry.agents();
            if json {
                let descriptors: Vec<_> = agents.iter().map(|a| &a.descriptor).collect();
                print_json(&descriptors)?;
            } else if agents.is_empty() {
                println!("No agents found");
            } else {
                for agent in agents {
                    println!("- {}: {}", agent.name(), agent.description());
                }
            }
        }
        Commands::Index {
            dir,
            output,
            format,
            category,
        } => {
            let index = build_index(&dir, category.as_deref())?;
            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&index)?,
                OutputFormat::Human => index::format_human(&index),
            };
            match output {
                Some(path) => {
                    fs::write(&path, rendered + "\n")
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Index written to {}", path.display());
                }
                None => println!("{}", rendered),
            }
        }
        Commands::Validate { dir, strict, json } => {
            let report = validate_skill(&dir, strict)?;
            if json {
                print_json(&report)?;
            } else {
                println!("{}", validate::format_human(&report));
            }
            return Ok(exit_code(report.compatible));
        }
        Commands::Lint { root, json } => {
            let report = lint_tree(&root)?;
            if json {
                print_json(&report)?;
            } else {
                print!("{}", render_lint(&report));
            }
            return Ok(exit_code(report.is_clean()));
        }
        Commands::Context {
            project,
            max_depth,
            context_window,
            json,
        } => {
            let options = ContextOptions {
                max_depth,
                context_window,
            };
            let report = analyze_context(&project, &options)?;
            if json {
                print_json(&report)?;
            } else {
                print!("{}", context::format_human(&report));
            }
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Convert {
            skill_md,
            output_dir,
            json,
        } => {
            let report = convert_skill(&skill_md, output_dir.as_deref());
            if json {
                print_json(&report)?;
            } else {
                print!("{}", render_conversion(&report));
            }
            return Ok(exit_code(report.is_success()));
        }
        Commands::Scaffold {
            name,
            domain,
            description,
            skill_version,
            license,
            category,
            output,
            json,
        } => {
            let report = scaffold_skill(&ScaffoldOptions {
                name,
                domain,
                description,
                version: skill_version,
                license,
                category,
                output_dir: output,
            })?;
            if json {
                print_json(&report)?;
            } else {
                print!("{}", render_scaffold(&report));
            }
        }
        Commands::Library {
            root,
            target,
            action,
        } => return run_library(&config, root, target, action),
    }

    Ok(ExitCode::SUCCESS)
}

fn run_library(
    config: &Config,
    root: Option<PathBuf>,
    target: Option<skillbook_library::InstallTarget>,
    action: LibraryAction,
) -> Result<ExitCode> {
    let root = root
        .map(|root| expand_tilde(&root))
        .or_else(|| config.library.root.clone())
        .context("No library root configured. Set [library] root, SKILLBOOK_LIBRARY or --root")?;
    let target = target.unwrap_or(config.library.target);
    let library = Library::discover(root)?;
    let installer = Installer::new(library, target.dir()?);

    match action {
        LibraryAction::List { group, json } => {
            let library = installer.library();
            if json {
                match group.as_deref() {
                    Some(group) => print_json(&library.groups().get(group))?,
                    None => print_json(library.groups())?,
                }
                return Ok(ExitCode::SUCCESS);
            }
            for (name, skills) in library.groups() {
                if group.as_deref().is_some_and(|g| g != name) {
                    continue;
                }
                println!("{} ({})", name, skills.len());
                for skill in skills.values() {
                    println!("  {:<32} {}", skill.name, skill.description);
                }
            }
        }
        LibraryAction::Install {
            name,
            force,
            auto_update,
            json,
        } => {
            let outcome = installer.install(&name, force, auto_update)?;
            if json {
                print_json(&outcome)?;
            } else {
                println!("Installed '{}' from {}", outcome.skill, outcome.group);
                println!("  Target:      {}", outcome.target.display());
                println!(
                    "  Auto-update: {}",
                    if outcome.auto_update { "enabled" } else { "disabled" }
                );
            }
        }
        LibraryAction::Update { name, json } => {
            let outcome = installer.update(name.as_deref())?;
            if json {
                print_json(&outcome)?;
            } else {
                for name in &outcome.updated {
                    println!("updated  {}", name);
                }
                for name in &outcome.skipped {
                    println!("skipped  {}", name);
                }
                for (name, error) in &outcome.failed {
                    println!("failed   {}: {}", name, error);
                }
            }
            return Ok(exit_code(outcome.is_success()));
        }
        LibraryAction::Status { json } => {
            let manifest = installer.status();
            if json {
                print_json(&manifest)?;
            } else {
                print!("{}", render_status(&manifest, target.as_str()));
            }
        }
        LibraryAction::Uninstall { name, json } => {
            let removed = installer.uninstall(&name)?;
            if json {
                print_json(&json!({ "success": true, "uninstalled": name }))?;
            } else {
                println!("Uninstalled '{}' ({})", name, removed.display());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Configured skills directories followed by the command-line ones
fn discover_skills(config: &Config, extra: &[PathBuf]) -> Result<SkillsRegistry> {
    let mut registry = config
        .skills
        .directories
        .iter()
        .chain(extra)
        .fold(SkillsRegistry::new(), |registry, dir| {
            registry.add_directory(expand_tilde(dir))
        });
    registry.discover()?;

    for issue in registry.issues() {
        warn!("Skipped {}: {}", issue.path.display(), issue.reason);
    }
    Ok(registry)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn render_skill_list(registry: &SkillsRegistry, skills: &[&Skill]) -> String {
    let mut out = String::new();
    if skills.is_empty() {
        let searched: Vec<String> = registry
            .directories()
            .iter()
            .map(|dir| dir.display().to_string())
            .collect();
        let _ = writeln!(out, "No skills found in: {}", searched.join(", "));
        return out;
    }

    for skill in skills {
        let _ = writeln!(out, "{}", skill.to_summary());
    }

    let counts: Vec<String> = registry
        .category_counts()
        .iter()
        .map(|(category, count)| format!("{} ({})", category, count))
        .collect();
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} of {} skill(s). Categories: {}",
        skills.len(),
        registry.len(),
        counts.join(", ")
    );
    out
}

fn render_lint(report: &LintReport) -> String {
    let mut out = String::new();
    for finding in &report.findings {
        let location = match finding.line {
            Some(line) => format!("{}:{}", finding.path.display(), line),
            None => finding.path.display().to_string(),
        };
        let _ = writeln!(out, "{}: [{}] {}", location, finding.rule, finding.message);
    }
    let _ = writeln!(
        out,
        "{} file(s) checked, {} finding(s)",
        report.files_checked,
        report.findings.len()
    );
    out
}

fn render_conversion(report: &ConversionReport) -> String {
    let mut out = String::new();
    let status = if report.is_success() { "OK" } else { "FAILED" };
    let _ = writeln!(out, "Conversion {}: {}", status, report.source.display());
    let _ = writeln!(out, "  Output: {}", report.output_dir.display());
    for path in &report.files_generated {
        let _ = writeln!(out, "  generated {}", path.display());
    }
    for path in &report.files_copied {
        let _ = writeln!(out, "  copied    {}", path.display());
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "  warning: {}", warning);
    }
    for error in &report.errors {
        let _ = writeln!(out, "  error: {}", error);
    }
    out
}

fn render_scaffold(report: &ScaffoldReport) -> String {
    let mut out = String::new();
    for warning in &report.warnings {
        let _ = writeln!(out, "Warning: {}", warning);
    }
    let script = format!("{}_tool.py", report.name.replace('-', "_"));
    let _ = writeln!(out, "Skill scaffolded successfully!");
    let _ = writeln!(out);
    let _ = writeln!(out, "  Name:      {}", report.name);
    let _ = writeln!(out, "  Domain:    {}", report.domain);
    let _ = writeln!(out, "  Version:   {}", report.version);
    let _ = writeln!(out, "  Location:  {}", report.path.display());
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}/", report.name);
    let _ = writeln!(out, "  ├── SKILL.md");
    let _ = writeln!(out, "  ├── scripts/");
    let _ = writeln!(out, "  │   └── {}", script);
    let _ = writeln!(out, "  ├── references/");
    let _ = writeln!(out, "  │   └── guide.md");
    let _ = writeln!(out, "  └── assets/");
    let _ = writeln!(out, "      └── .gitkeep");
    out
}

fn render_status(manifest: &Manifest, target: &str) -> String {
    let mut out = String::new();
    if manifest.installed.is_empty() {
        let _ = writeln!(out, "No skills installed ({})", target);
        return out;
    }

    let _ = writeln!(out, "Installed Skills ({})", manifest.installed.len());
    let _ = writeln!(out, "{:<30} {:<20} Auto-Update", "Skill", "Group");
    for (name, info) in &manifest.installed {
        let auto = if info.auto_update { "yes" } else { "no" };
        let _ = writeln!(out, "{:<30} {:<20} {}", name, info.group, auto);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Target: {}", target);
    if !manifest.source.is_empty() {
        let _ = writeln!(out, "Source: {}", manifest.source);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillbook_skills::lint::LintFinding;

    fn manifest() -> Manifest {
        serde_json::from_str(
            r#"{
                "installed": {
                    "code-reviewer": {
                        "group": "engineering",
                        "path": "engineering/code-reviewer",
                        "installed_at": "2025-01-01T00:00:00Z",
                        "updated_at": "2025-01-01T00:00:00Z",
                        "auto_update": true
                    }
                },
                "auto_update": true,
                "source": "/srv/library"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_render_lint() {
        let report = LintReport {
            root: PathBuf::from("."),
            files_checked: 2,
            findings: vec![LintFinding {
                path: PathBuf::from("a/SKILL.md"),
                line: Some(3),
                rule: "invalid-name",
                message: "bad".to_string(),
            }],
        };
        let rendered = render_lint(&report);
        assert!(rendered.contains("a/SKILL.md:3: [invalid-name] bad"));
        assert!(rendered.ends_with("2 file(s) checked, 1 finding(s)\n"));
    }

    #[test]
    fn test_render_status() {
        let rendered = render_status(&manifest(), "project");
        assert!(rendered.contains("Installed Skills (1)"));
        assert!(rendered.contains("code-reviewer"));
        assert!(rendered.contains("Source: /srv/library"));

        let empty = render_status(&Manifest::default(), "cursor");
        assert_eq!(empty, "No skills installed (cursor)\n");
    }

    #[test]
    fn test_discover_skills_adds_extra_directories() {
        let temp = tempfile::TempDir::new().unwrap();
        let skill = temp.path().join("planner");
        fs::create_dir_all(&skill).unwrap();
        fs::write(
            skill.join("SKILL.md"),
            "---\nname: planner\ndescription: Plans sprints\n---\n# Planner\n",
        )
        .unwrap();

        let config: Config = toml::from_str("[logging]\nlevel = \"info\"\n").unwrap();
        let registry = discover_skills(&config, &[temp.path().to_path_buf()]).unwrap();
        assert_eq!(registry.skill_names(), vec!["planner"]);
    }

    #[test]
    fn test_render_skill_list_with_categories() {
        let temp = tempfile::TempDir::new().unwrap();
        for (name, category) in [("planner", "product"), ("reviewer", "engineering")] {
            let dir = temp.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(
                dir.join("SKILL.md"),
                format!(
                    "---\nname: {}\ndescription: Does {} work\nmetadata:\n  category: {}\n---\n",
                    name, category, category
                ),
            )
            .unwrap();
        }

        let config: Config = toml::from_str("[logging]\nlevel = \"info\"\n").unwrap();
        let registry = discover_skills(&config, &[temp.path().to_path_buf()]).unwrap();

        let rendered = render_skill_list(&registry, &registry.skills());
        assert!(rendered.starts_with("- planner: Does product work\n"));
        assert!(rendered.ends_with("2 of 2 skill(s). Categories: engineering (1), product (1)\n"));

        let filtered = registry.filter_by_category("nothing");
        let rendered = render_skill_list(&registry, &filtered);
        assert!(rendered.starts_with("No skills found in: "));
        assert!(rendered.contains(&temp.path().display().to_string()));
    }
}
