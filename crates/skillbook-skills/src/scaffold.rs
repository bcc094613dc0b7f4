//! Skill package scaffolding

use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Result, SkillError};
use crate::skill::{validate_name, SKILL_FILE};

/// Domains used to group skills in the library
pub const STANDARD_DOMAINS: [&str; 10] = [
    "engineering",
    "marketing",
    "product",
    "project-management",
    "c-level",
    "ra-qm",
    "business-growth",
    "finance",
    "standards",
    "development-tools",
];

#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    pub name: String,
    pub domain: String,
    /// Empty means generate a discovery-friendly default
    pub description: String,
    pub version: String,
    pub license: String,
    /// Empty means same as `domain`
    pub category: String,
    /// Parent directory; must exist
    pub output_dir: PathBuf,
}

impl ScaffoldOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: "engineering".to_string(),
            description: String::new(),
            version: "1.0.0".to_string(),
            license: "MIT".to_string(),
            category: String::new(),
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScaffoldReport {
    pub path: PathBuf,
    pub name: String,
    pub domain: String,
    pub version: String,
    pub directories_created: Vec<PathBuf>,
    pub files_created: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Create `<output_dir>/<name>/` with a starter skill package
pub fn scaffold_skill(options: &ScaffoldOptions) -> Result<ScaffoldReport> {
    validate_name(&options.name)?;

    if !options.output_dir.is_dir() {
        return Err(SkillError::NotFound(format!(
            "output directory {}",
            options.output_dir.display()
        )));
    }

    let skill_path = options.output_dir.join(&options.name);
    if skill_path.exists() {
        return Err(SkillError::AlreadyExists(skill_path));
    }

    let mut warnings = Vec::new();
    if !STANDARD_DOMAINS.contains(&options.domain.as_str()) {
        warn!("'{}' is not a standard domain", options.domain);
        warnings.push(format!(
            "'{}' is not a standard domain. Standard domains: {}",
            options.domain,
            STANDARD_DOMAINS.join(", ")
        ));
    }

    let title = title_case(&options.name);
    let description = match options.description.trim() {
        "" => default_description(&title),
        description => description.to_string(),
    };
    let category = match options.category.trim() {
        "" => options.domain.as_str(),
        category => category,
    };
    let today = Local::now().format("%B %Y").to_string();
    let script_name = format!("{}_tool.py", options.name.replace('-', "_"));

    let mut directories_created = Vec::new();
    for dir in ["scripts", "references", "assets"] {
        let dir = skill_path.join(dir);
        fs::create_dir_all(&dir).map_err(|e| SkillError::io(&dir, e))?;
        directories_created.push(dir);
    }

    let skill_md = skill_md_template(&SkillTemplate {
        name: &options.name,
        title: &title,
        description: &description,
        license: &options.license,
        version: &options.version,
        category,
        domain: &options.domain,
        script_name: &script_name,
        date: &today,
    });
    let script = script_template(
        &format!("{} Tool", title),
        &format!("Automation tool for {}", title.to_lowercase()),
        &script_name,
    );
    let guide = reference_template(&title, &today);

    let files = [
        (skill_path.join(SKILL_FILE), skill_md),
        (skill_path.join("scripts").join(&script_name), script),
        (skill_path.join("references/guide.md"), guide),
        (skill_path.join("assets/.gitkeep"), String::new()),
    ];

    let mut files_created = Vec::new();
    for (path, content) in files {
        fs::write(&path, content).map_err(|e| SkillError::io(&path, e))?;
        files_created.push(path);
    }
    make_executable(&skill_path.join("scripts").join(&script_name))?;

    let path = skill_path.canonicalize().unwrap_or(skill_path);
    info!("Scaffolded skill '{}' at {}", options.name, path.display());

    Ok(ScaffoldReport {
        path,
        name: options.name.clone(),
        domain: options.domain.clone(),
        version: options.version.clone(),
        directories_created,
        files_created,
        warnings,
    })
}

/// `my-new-skill` -> `My New Skill`
pub fn title_case(name: &str) -> String {
    name.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn default_description(title: &str) -> String {
    let topic = title.to_lowercase();
    format!(
        "This skill should be used when the user asks about {topic}. \
         Use for {topic} workflows, analysis, and automation."
    )
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| SkillError::io(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

struct SkillTemplate<'a> {
    name: &'a str,
    title: &'a str,
    description: &'a str,
    license: &'a str,
    version: &'a str,
    category: &'a str,
    domain: &'a str,
    script_name: &'a str,
    date: &'a str,
}

fn skill_md_template(t: &SkillTemplate<'_>) -> String {
    let keywords = t
        .name
        .split('-')
        .chain([t.domain, t.category])
        .collect::<Vec<_>>()
        .join(", ");
    let description = t.description.replace('\n', "\n  ");

    format!(
        r#"---
name: {name}
description: >-
  {description}
license: {license}
metadata:
  version: {version}
  category: {category}
  domain: {domain}
---

# {title}

{title} skill with automation tools and reference guides.

## Keywords

{keywords}

---

## Table of Contents

- [Quick Start](#quick-start)
- [Tools Overview](#tools-overview)
- [Workflows](#workflows)
- [Reference Documentation](#reference-documentation)

---

## Quick Start

```bash
python scripts/{script} --help
```

---

## Tools Overview

### 1. {title} Tool

Description of what this tool does.

```bash
python scripts/{script} input --json
```

| Parameter | Description |
|-----------|-------------|
| `input` | Description of input parameter |
| `--json` | Output in JSON format |

---

## Workflows

### Workflow 1: Primary Workflow

**Step 1: Description**

**Step 2: Description**

---

## Reference Documentation

| Document | Path | Description |
|----------|------|-------------|
| {title} Guide | [references/guide.md](references/guide.md) | Concepts and best practices |

---

**Last Updated:** {date}
**Version:** {version}
"#,
        name = t.name,
        description = description,
        license = t.license,
        version = t.version,
        category = t.category,
        domain = t.domain,
        title = t.title,
        keywords = keywords,
        script = t.script_name,
        date = t.date,
    )
}

fn script_template(title: &str, description: &str, filename: &str) -> String {
    format!(
        r#"#!/usr/bin/env python3
"""
{title} - {description}

Usage:
    python {filename} input_arg
    python {filename} input_arg --json
"""

import argparse
import json


def main():
    parser = argparse.ArgumentParser(description="{description}")
    parser.add_argument("input", help="Input to process")
    parser.add_argument("--json", action="store_true", help="Output in JSON format")
    args = parser.parse_args()

    result = {{"input": args.input, "status": "success"}}

    if args.json:
        print(json.dumps(result, indent=2))
    else:
        print(f"Input: {{result['input']}}")
        print(f"Status: {{result['status']}}")


if __name__ == "__main__":
    main()
"#
    )
}

fn reference_template(title: &str, date: &str) -> String {
    let topic = title.to_lowercase();
    format!(
        r#"# {title} Guide

## Overview

This reference guide covers {topic}.

## Key Concepts

### Concept 1

Description and details.

## Best Practices

1. **Practice 1** -- Explanation
2. **Practice 2** -- Explanation

---

**Last Updated:** {date}
"#
    )
}
