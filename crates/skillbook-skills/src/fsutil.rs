//! Filesystem helpers shared by the index, validator and converter

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{Result, SkillError};

/// Total size in bytes of every regular file under `dir`
pub fn directory_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

/// Sorted names of the regular files directly inside `dir`, optionally
/// restricted to one extension (without the dot)
pub fn list_files(dir: &Path, extension: Option<&str>) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| match extension {
            Some(ext) => path.extension().is_some_and(|e| e == ext),
            None => true,
        })
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}

/// Recursively copy `src` into `dst`, replacing `dst` if it exists. Entries
/// for which `skip` returns true (matched on file name) are not copied.
pub fn copy_dir(src: &Path, dst: &Path, skip: impl Fn(&str) -> bool) -> Result<()> {
    if dst.exists() {
        fs::remove_dir_all(dst).map_err(|e| SkillError::io(dst, e))?;
    }

    let walker = WalkDir::new(src).into_iter().filter_entry(|entry| {
        entry.depth() == 0 || !skip(&entry.file_name().to_string_lossy())
    });

    for entry in walker {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| SkillError::io(&target, e))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| SkillError::io(parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| SkillError::io(entry.path(), e))?;
        }
    }

    Ok(())
}

/// Human-readable byte size: `512 B`, `1.5 KB`, `2.0 MB`
pub fn format_size(size_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if size_bytes < KB {
        format!("{} B", size_bytes)
    } else if size_bytes < MB {
        format!("{:.1} KB", size_bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", size_bytes as f64 / MB as f64)
    }
}
