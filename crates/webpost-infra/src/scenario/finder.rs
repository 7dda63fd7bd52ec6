//! Locate scenario files by id under a root directory.

use std::path::{Path, PathBuf};

/// Extensions tried in order. The first extension with any match wins.
pub const SCENARIO_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Recursive `{id}.{ext}` lookup under `base_dir`.
#[derive(Debug, Clone)]
pub struct ScenarioFileFinder {
    base_dir: PathBuf,
}

impl ScenarioFileFinder {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Find the file for `scenario_id`.
    ///
    /// Directory entries are visited in sorted order so that duplicate ids
    /// in different subdirectories resolve deterministically. Unreadable
    /// directories are skipped.
    pub fn find_by_id(&self, scenario_id: &str) -> Option<PathBuf> {
        if scenario_id.is_empty() || scenario_id.contains(['/', '\\']) || scenario_id == ".." {
            return None;
        }
        SCENARIO_EXTENSIONS.iter().find_map(|ext| {
            let file_name = format!("{scenario_id}.{ext}");
            find_file(&self.base_dir, &file_name)
        })
    }
}

fn find_file(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    let (dirs, files): (Vec<PathBuf>, Vec<PathBuf>) =
        entries.into_iter().partition(|path| path.is_dir());

    if let Some(hit) = files
        .into_iter()
        .find(|path| path.file_name().is_some_and(|name| name == file_name))
    {
        return Some(hit);
    }
    dirs.iter().find_map(|sub| find_file(sub, file_name))
}
