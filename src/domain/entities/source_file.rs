use std::fmt;
use std::path::PathBuf;

/// Physical row count, open-ended once a scan ceiling is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCount {
    Exact(u32),
    AtLeast(u32),
}

impl RowCount {
    pub fn exact(self) -> Option<u32> {
        match self {
            RowCount::Exact(n) => Some(n),
            RowCount::AtLeast(_) => None,
        }
    }
}

impl fmt::Display for RowCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowCount::Exact(n) => write!(f, "{n}"),
            RowCount::AtLeast(n) => write!(f, "{n}+"),
        }
    }
}

/// Per-file statistics gathered by a folder scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub physical_rows: RowCount,
    /// Rows at or after the start row with at least one non-blank cell.
    pub valid_rows: u32,
    /// Physical rows minus valid rows, so header rows are included. Known only
    /// for exact counts.
    pub blank_rows: Option<u32>,
    pub max_columns: u32,
}

impl SourceFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn size_kb(&self) -> f64 {
        (self.size_bytes as f64 / 1024.0 * 10.0).round() / 10.0
    }
}

/// One complete folder scan. Replaced as a whole on re-scan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanSnapshot {
    pub folder: PathBuf,
    pub start_row: u32,
    pub files: Vec<SourceFile>,
}

impl ScanSnapshot {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    pub fn total_valid_rows(&self) -> u64 {
        self.files.iter().map(|f| u64::from(f.valid_rows)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_ended_counts_render_with_plus() {
        assert_eq!(RowCount::AtLeast(30000).to_string(), "30000+");
        assert_eq!(RowCount::Exact(12).to_string(), "12");
        assert_eq!(RowCount::AtLeast(5).exact(), None);
    }

    #[test]
    fn size_is_rounded_to_one_decimal_kb() {
        let file = SourceFile {
            path: PathBuf::from("/data/东区.xlsx"),
            size_bytes: 1536,
            physical_rows: RowCount::Exact(3),
            valid_rows: 2,
            blank_rows: Some(1),
            max_columns: 4,
        };
        assert_eq!(file.size_kb(), 1.5);
        assert_eq!(file.file_name(), "东区.xlsx");
    }
}
