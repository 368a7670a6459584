use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Local;
use glob::Pattern;
use tracing::warn;

use crate::domain::error::EngineError;

pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub fn clock_stamp() -> String {
    Local::now().format("%H%M%S").to_string()
}

/// Replaces path separators and characters no common file system accepts.
pub fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_end_matches('.').to_string();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Hands out per-key output paths inside one directory, never the same twice.
pub struct OutputNamer {
    dir: PathBuf,
    extension: String,
    taken: HashSet<String>,
}

impl OutputNamer {
    /// `extension` includes the leading dot, or is empty.
    pub fn new(dir: &Path, extension: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
            taken: HashSet::new(),
        }
    }

    pub fn path_for(&mut self, key: &str) -> PathBuf {
        let base = sanitize_key(key);
        let mut stem = base.clone();
        let mut n = 2;
        while !self.taken.insert(stem.to_lowercase()) {
            stem = format!("{base}_{n}");
            n += 1;
        }
        if stem != base {
            warn!(key, file = %stem, "output name collides with another key, using suffix");
        }
        self.dir.join(format!("{stem}{}", self.extension))
    }
}

pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

pub fn create_dir(dir: &Path) -> Result<(), EngineError> {
    std::fs::create_dir_all(dir).map_err(|err| EngineError::io(dir, err))
}

/// `<source dir>/<prefix>_<timestamp>`, created.
pub fn create_output_dir(source: &Path, prefix: &str) -> Result<PathBuf, EngineError> {
    let parent = source.parent().unwrap_or_else(|| Path::new("."));
    let dir = parent.join(format!("{prefix}_{}", timestamp()));
    create_dir(&dir)?;
    Ok(dir)
}

pub fn copy_file(from: &Path, to: &Path) -> Result<(), EngineError> {
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|err| EngineError::io(to, err))
}

pub fn remove_dir_quietly(dir: &Path) {
    if let Err(err) = std::fs::remove_dir_all(dir) {
        warn!(dir = %dir.display(), error = %err, "failed to remove scratch directory");
    }
}

pub fn remove_file_quietly(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        warn!(path = %path.display(), error = %err, "failed to remove incomplete output");
    }
}

/// Rules for picking merge candidates out of a folder.
#[derive(Debug, Clone)]
pub struct ListingFilter<'a> {
    pub extensions: &'a [String],
    pub summary_marker: &'a str,
    pub lock_prefix: &'a str,
}

impl ListingFilter<'_> {
    pub fn accepts(&self, file_name: &str) -> bool {
        let excluded = (!self.summary_marker.is_empty() && file_name.contains(self.summary_marker))
            || (!self.lock_prefix.is_empty() && file_name.starts_with(self.lock_prefix));
        !excluded
    }
}

/// Spreadsheet files directly inside `folder`, sorted by name.
pub fn list_spreadsheets(folder: &Path, filter: &ListingFilter<'_>) -> Result<Vec<PathBuf>, EngineError> {
    if !folder.is_dir() {
        return Err(EngineError::InvalidParameters(format!(
            "not a folder: {}",
            folder.display()
        )));
    }
    let escaped = Pattern::escape(&folder.to_string_lossy());
    let mut files = Vec::new();
    for ext in filter.extensions {
        let pattern = format!("{escaped}/*.{}", Pattern::escape(ext));
        let entries = glob::glob(&pattern)
            .map_err(|err| EngineError::InvalidParameters(format!("bad extension {ext:?}: {err}")))?;
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable folder entry");
                    continue;
                }
            };
            let accepted = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| filter.accepts(name));
            if accepted && path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_key_replaces_separators() {
        assert_eq!(sanitize_key("东区/一组"), "东区_一组");
        assert_eq!(sanitize_key(r"a\b:c"), "a_b_c");
        assert_eq!(sanitize_key("  x. "), "x");
        assert_eq!(sanitize_key("/"), "_");
    }

    #[test]
    fn namer_suffixes_colliding_keys() {
        let dir = Path::new("/out");
        let mut namer = OutputNamer::new(dir, ".xlsx");

        assert_eq!(namer.path_for("a/b"), dir.join("a_b.xlsx"));
        assert_eq!(namer.path_for("a_b"), dir.join("a_b_2.xlsx"));
        assert_eq!(namer.path_for("A_B"), dir.join("A_B_3.xlsx"));
        assert_eq!(namer.path_for("c"), dir.join("c.xlsx"));
    }

    #[test]
    fn filter_skips_summaries_and_lock_files() {
        let extensions = vec!["xlsx".to_string()];
        let filter = ListingFilter {
            extensions: &extensions,
            summary_marker: "汇总",
            lock_prefix: "~$",
        };
        assert!(filter.accepts("东区.xlsx"));
        assert!(!filter.accepts("合并汇总表_20240101_120000.xlsx"));
        assert!(!filter.accepts("~$东区.xlsx"));
    }

    #[test]
    fn dotted_extension_keeps_original_case() {
        assert_eq!(dotted_extension(Path::new("/a/b.XLSX")), ".XLSX");
        assert_eq!(dotted_extension(Path::new("/a/noext")), "");
    }
}
