use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::entities::params::{KeyColumn, StartRow};
use crate::domain::entities::source_file::RowCount;
use crate::domain::error::EngineError;
use crate::infra::import::reader::{ReadLimits, TableReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCount {
    pub key: String,
    pub count: usize,
}

/// Preview of how a split would distribute rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyReport {
    pub file: PathBuf,
    pub scanned_rows: RowCount,
    pub keyed_rows: usize,
    /// Most common first, ties in first-appearance order.
    pub counts: Vec<KeyCount>,
}

impl KeyReport {
    pub fn render(&self) -> String {
        let name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut lines = vec![
            format!("文件: {name}"),
            format!("扫描: {}", self.scanned_rows),
            format!("有效: {}", self.keyed_rows),
            "-".repeat(30),
            "【分类预览】".to_string(),
        ];
        lines.extend(self.counts.iter().map(|c| format!("{} : {}", c.key, c.count)));
        lines.join("\n")
    }
}

pub fn analyze(
    path: &Path,
    start_row: StartRow,
    key_column: KeyColumn,
    row_ceiling: u32,
) -> Result<KeyReport, EngineError> {
    info!(file = %path.display(), "analyzing key distribution");
    let reader = TableReader::open_with(path, ReadLimits::rows(row_ceiling.saturating_add(1)))?;

    let mut counts: Vec<KeyCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut seen: u32 = 0;
    let mut last_row: u32 = 0;
    let mut truncated = false;
    for row in reader {
        let row = row?;
        if seen >= row_ceiling {
            truncated = true;
            break;
        }
        seen += 1;
        last_row = row.number;
        if row.number < start_row.get() {
            continue;
        }
        let Some(key) = row.key_at(key_column.get()) else {
            continue;
        };
        match index.get(&key) {
            Some(&idx) => counts[idx].count += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push(KeyCount { key, count: 1 });
            }
        }
    }

    // stable sort keeps first-appearance order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    let keyed_rows = counts.iter().map(|c| c.count).sum();

    Ok(KeyReport {
        file: path.to_path_buf(),
        scanned_rows: if truncated {
            RowCount::AtLeast(row_ceiling)
        } else {
            RowCount::Exact(last_row)
        },
        keyed_rows,
        counts,
    })
}
