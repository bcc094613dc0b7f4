//! End-to-end: scaffold a skill, discover it, convert it for Codex and check
//! that validator, index and lint all agree on the result

#![allow(clippy::unwrap_used, clippy::expect_used)]

use skillbook_skills::index::build_index;
use skillbook_skills::prelude::*;
use skillbook_skills::{convert_skill, lint_tree, scaffold_skill, validate_skill, ScaffoldOptions};
use skillbook_types::Platform;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_scaffold_discover_convert_validate() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    let report = scaffold_skill(&ScaffoldOptions {
        output_dir: root.to_path_buf(),
        ..ScaffoldOptions::new("api-analyzer")
    })
    .unwrap();
    let skill_dir = report.path;

    let mut registry = SkillsRegistry::new().add_directory(root);
    registry.discover().unwrap();
    assert_eq!(registry.skill_names(), vec!["api-analyzer"]);
    assert!(registry.get("api-analyzer").unwrap().content.is_none());

    let skill = registry.load_skill("api-analyzer").unwrap();
    assert!(skill.body().unwrap().contains("# Api Analyzer"));

    let before = validate_skill(&skill_dir, false).unwrap();
    assert!(!before.compatible);

    let conversion = convert_skill(&skill_dir.join("SKILL.md"), None);
    assert!(conversion.is_success(), "{:?}", conversion.errors);

    let after = validate_skill(&skill_dir, true).unwrap();
    assert!(
        after.compatible,
        "{}",
        skillbook_skills::validate::format_human(&after)
    );

    let index = build_index(root, None).unwrap();
    assert_eq!(index.skills_count, 1);
    let entry = &index.skills[0];
    assert_eq!(entry.tools, vec!["api_analyzer_tool.py"]);
    assert!(entry.platforms.contains(&Platform::ClaudeCode));
    assert!(entry.platforms.contains(&Platform::CodexCli));

    let lint = lint_tree(root).unwrap();
    assert!(lint.is_clean(), "{:?}", lint.findings);
}

#[test]
fn test_agents_next_to_skills() {
    let temp = TempDir::new().unwrap();
    let agents_dir = temp.path().join(".claude/agents");
    fs::create_dir_all(&agents_dir).unwrap();
    fs::write(
        agents_dir.join("reviewer.md"),
        "---\nname: reviewer\ndescription: Reviews pull requests\ntools: Read, Grep\nmodel: sonnet\n---\n\nYou review pull requests.\n",
    )
    .unwrap();

    let mut agents = AgentRegistry::new().add_directory(&agents_dir);
    agents.discover().unwrap();

    let reviewer = agents.get("reviewer").unwrap();
    assert_eq!(reviewer.descriptor.allowed_tools, vec!["Read", "Grep"]);
    assert_eq!(reviewer.descriptor.instructions, "You review pull requests.");
    assert!(lint_tree(temp.path()).unwrap().is_clean());
}
