use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::domain::entities::params::StartRow;
use crate::domain::entities::source_file::{RowCount, ScanSnapshot, SourceFile};
use crate::domain::error::EngineError;
use crate::infra::fs::{list_spreadsheets, ListingFilter};
use crate::infra::import::reader::{ReadLimits, TableReader};
use crate::infra::workbook::template::{ensure_editable_template, is_editable_template};
use crate::usecase::ports::progress::ProgressReporter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    pub row_ceiling: u32,
    pub summary_marker: String,
    pub lock_prefix: String,
    pub extensions: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            row_ceiling: 30_000,
            summary_marker: "汇总".to_string(),
            lock_prefix: "~$".to_string(),
            extensions: vec!["xlsx".to_string(), "xlsm".to_string(), "xls".to_string()],
        }
    }
}

impl ScanSettings {
    pub fn filter(&self) -> ListingFilter<'_> {
        ListingFilter {
            extensions: &self.extensions,
            summary_marker: &self.summary_marker,
            lock_prefix: &self.lock_prefix,
        }
    }
}

/// Statistics for one file from a single capped pass. Never writes.
pub fn scan_file(path: &Path, start_row: StartRow, row_ceiling: u32) -> Result<SourceFile, EngineError> {
    let size_bytes = std::fs::metadata(path)
        .map_err(|err| EngineError::io(path, err))?
        .len();
    let reader = TableReader::open_with(path, ReadLimits::rows(row_ceiling.saturating_add(1)))?;

    let mut seen: u32 = 0;
    let mut last_row: u32 = 0;
    let mut valid_rows: u32 = 0;
    let mut max_columns: u32 = 0;
    let mut truncated = false;
    for row in reader {
        let row = row?;
        if seen >= row_ceiling {
            truncated = true;
            break;
        }
        seen += 1;
        last_row = row.number;
        max_columns = max_columns.max(row.populated_width());
        if row.number >= start_row.get() && row.is_valid() {
            valid_rows += 1;
        }
    }

    let physical_rows = if truncated {
        RowCount::AtLeast(row_ceiling)
    } else {
        RowCount::Exact(last_row)
    };
    let blank_rows = physical_rows
        .exact()
        .map(|total| total.saturating_sub(valid_rows));

    Ok(SourceFile {
        path: path.to_path_buf(),
        size_bytes,
        physical_rows,
        valid_rows,
        blank_rows,
        max_columns,
    })
}

/// Scans every candidate spreadsheet in `folder`. Unreadable files are
/// logged and left out of the snapshot.
pub fn scan_folder(
    folder: &Path,
    start_row: StartRow,
    settings: &ScanSettings,
    reporter: &dyn ProgressReporter,
) -> Result<ScanSnapshot, EngineError> {
    info!(folder = %folder.display(), "scanning");
    let candidates = list_spreadsheets(folder, &settings.filter())?;
    if candidates.is_empty() {
        warn!(folder = %folder.display(), "no spreadsheet files found");
    }
    info!("found {} files", candidates.len());

    let total = candidates.len();
    reporter.on_start("scan", total);
    let mut files = Vec::with_capacity(total);
    for (idx, path) in candidates.iter().enumerate() {
        let label = display_name(path);
        reporter.on_item(idx + 1, total, &label);
        match scan_file(path, start_row, settings.row_ceiling) {
            Ok(stats) => {
                reporter.on_item_done(&label);
                files.push(stats);
            }
            Err(err) => warn!(file = %path.display(), error = %err, "skipping file"),
        }
    }
    reporter.on_finish("scan", files.len());

    Ok(ScanSnapshot {
        folder: folder.to_path_buf(),
        start_row: start_row.get(),
        files,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Latest scan, swapped as a whole so readers never see a half-built list.
#[derive(Debug, Default)]
pub struct ScanCache {
    current: RwLock<Arc<ScanSnapshot>>,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Arc<ScanSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn replace(&self, snapshot: ScanSnapshot) -> Arc<ScanSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = Arc::clone(&snapshot);
        snapshot
    }

    /// Template by explicit path, by scan index, or the first editable
    /// scanned file.
    pub fn choose_template(
        &self,
        path: Option<&Path>,
        index: Option<usize>,
    ) -> Result<PathBuf, EngineError> {
        choose_template(&self.current(), path, index)
    }
}

pub fn choose_template(
    snapshot: &ScanSnapshot,
    path: Option<&Path>,
    index: Option<usize>,
) -> Result<PathBuf, EngineError> {
    if let Some(path) = path {
        if !path.is_file() {
            return Err(EngineError::InvalidParameters(format!(
                "template not found: {}",
                path.display()
            )));
        }
        ensure_editable_template(path)?;
        return Ok(path.to_path_buf());
    }
    let Some(idx) = index else {
        return snapshot
            .files
            .iter()
            .map(|file| &file.path)
            .find(|path| is_editable_template(path))
            .cloned()
            .ok_or_else(|| {
                EngineError::InvalidParameters(
                    "no .xlsx or .xlsm file can serve as the template".to_string(),
                )
            });
    };
    let file = snapshot.files.get(idx).ok_or_else(|| {
        EngineError::InvalidParameters(format!(
            "template index {} out of range, {} files scanned",
            idx + 1,
            snapshot.files.len()
        ))
    })?;
    ensure_editable_template(&file.path)?;
    Ok(file.path.clone())
}
