//! YAML frontmatter handling for Markdown descriptor files
//!
//! A frontmatter block starts on the very first line with `---` and ends at
//! the next line that is exactly `---`. Everything after the closing line is
//! the Markdown body.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use std::path::Path;

use crate::error::{Result, SkillError};

/// Split `content` into `(yaml, body)`.
///
/// Returns `None` when the file does not open with `---` or the block is
/// never closed. A leading byte-order mark and CRLF line endings are accepted.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == "---" {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }

    None
}

/// Deserialize the frontmatter of `content` into `T`.
///
/// An empty block (or one holding only comments) yields `T::default()`.
pub fn parse_frontmatter<'a, T>(content: &'a str, path: &Path) -> Result<(T, &'a str)>
where
    T: DeserializeOwned + Default,
{
    let (yaml, body) =
        split_frontmatter(content).ok_or_else(|| SkillError::MissingFrontmatter(path.into()))?;

    if is_blank_yaml(yaml) {
        return Ok((T::default(), body));
    }

    let value = serde_yaml::from_str(yaml).map_err(|source| SkillError::Yaml {
        path: path.into(),
        source,
    })?;

    Ok((value, body))
}

fn is_blank_yaml(yaml: &str) -> bool {
    yaml.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

/// First `# ` heading of a Markdown body
pub fn extract_title(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Comma-separated keywords listed under a `## Keywords` heading
pub fn extract_keywords(body: &str) -> Vec<String> {
    let mut lines = body.lines().skip_while(|line| {
        let line = line.trim();
        !(line.starts_with("##") && line.trim_start_matches('#').trim() == "Keywords")
    });

    if lines.next().is_none() {
        return Vec::new();
    }

    let text: Vec<&str> = lines
        .map(str::trim)
        .skip_while(|line| line.is_empty())
        .take_while(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    split_list(&text.join(" "))
}

/// Split a comma-separated list, dropping blanks
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accept either a YAML sequence or a comma-separated string.
///
/// Scalar list items are kept as strings (`[ml, 2024]` → `["ml", "2024"]`).
pub fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(Vec::new()),
        Some(serde_yaml::Value::Sequence(items)) => Ok(items
            .into_iter()
            .filter_map(value_to_string)
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()),
        Some(value) => match value_to_string(value) {
            Some(text) => Ok(split_list(&text)),
            None => Err(D::Error::custom("expected a string or a list")),
        },
    }
}

/// Accept any YAML scalar and keep it as a string (`version: 2` → `"2"`)
pub fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(value) => value_to_string(value)
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected a scalar value")),
    }
}

fn value_to_string(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct Sample {
        name: Option<String>,
        #[serde(default, deserialize_with = "string_or_list")]
        tools: Vec<String>,
        #[serde(default, deserialize_with = "scalar_string")]
        version: Option<String>,
    }

    #[test]
    fn test_split_frontmatter() {
        let content = "---\nname: a\n---\n\n# Title\n";
        let (yaml, body) = split_frontmatter(content).unwrap();
        assert_eq!(yaml, "name: a\n");
        assert_eq!(body, "\n# Title\n");
    }

    #[test]
    fn test_split_frontmatter_crlf_and_bom() {
        let content = "\u{feff}---\r\nname: a\r\n---\r\nbody";
        let (yaml, body) = split_frontmatter(content).unwrap();
        assert_eq!(yaml, "name: a\r\n");
        assert_eq!(body, "body");
    }

    #[test]
    fn test_split_frontmatter_without_trailing_newline() {
        let (yaml, body) = split_frontmatter("---\nname: a\n---").unwrap();
        assert_eq!(yaml, "name: a\n");
        assert_eq!(body, "");
    }

    #[test]
    fn test_split_frontmatter_missing() {
        assert!(split_frontmatter("# Just markdown\n").is_none());
        assert!(split_frontmatter("---\nname: a\nno closing line\n").is_none());
        assert!(split_frontmatter("text\n---\nname: a\n---\n").is_none());
    }

    #[test]
    fn test_empty_block_is_default() {
        let (sample, body): (Sample, _) =
            parse_frontmatter("---\n# only a comment\n---\nbody", Path::new("x.md")).unwrap();
        assert!(sample.name.is_none());
        assert_eq!(body, "body");
    }

    #[test]
    fn test_string_or_list_and_scalar() {
        let content = "---\nname: a\ntools: Read, Grep , Glob\nversion: 2\n---\n";
        let (sample, _): (Sample, _) = parse_frontmatter(content, Path::new("x.md")).unwrap();
        assert_eq!(sample.tools, vec!["Read", "Grep", "Glob"]);
        assert_eq!(sample.version.as_deref(), Some("2"));

        let content = "---\ntools:\n  - Read\n  - Bash\n---\n";
        let (sample, _): (Sample, _) = parse_frontmatter(content, Path::new("x.md")).unwrap();
        assert_eq!(sample.tools, vec!["Read", "Bash"]);
    }

    #[test]
    fn test_list_items_of_any_scalar_type() {
        let content = "---\nname: a\ntools: [ml, 2024, true, 1.5]\n---\n";
        let (sample, _): (Sample, _) = parse_frontmatter(content, Path::new("x.md")).unwrap();
        assert_eq!(sample.tools, vec!["ml", "2024", "true", "1.5"]);

        let content = "---\ntools: 42\n---\n";
        let (sample, _): (Sample, _) = parse_frontmatter(content, Path::new("x.md")).unwrap();
        assert_eq!(sample.tools, vec!["42"]);
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let result: Result<(Sample, &str)> =
            parse_frontmatter("---\nname: [unclosed\n---\n", Path::new("x.md"));
        assert!(matches!(result, Err(SkillError::Yaml { .. })));
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title("intro\n\n# Code Reviewer\n## Sub").as_deref(),
            Some("Code Reviewer")
        );
        assert_eq!(extract_title("## Only level two"), None);
    }

    #[test]
    fn test_extract_keywords() {
        let body = "# T\n\n## Keywords\n\nrust, cli,\nparsing\n\n## Next\n";
        assert_eq!(extract_keywords(body), vec!["rust", "cli", "parsing"]);
        assert!(extract_keywords("# T\n\nno keywords").is_empty());
    }
}
