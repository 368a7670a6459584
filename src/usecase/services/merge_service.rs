use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::entities::cancel::CancelToken;
use crate::domain::entities::params::StartRow;
use crate::domain::error::EngineError;
use crate::infra::fs::{copy_file, dotted_extension, remove_file_quietly, timestamp};
use crate::infra::import::reader::TableReader;
use crate::infra::workbook::template::{ensure_editable_template, TemplateWorkbook};
use crate::usecase::ports::progress::ProgressReporter;

#[derive(Debug, Clone, Copy)]
pub struct MergeRequest<'a> {
    pub files: &'a [PathBuf],
    pub start_row: StartRow,
    pub template: &'a Path,
    pub output_dir: &'a Path,
    pub output_prefix: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedFile {
    pub path: PathBuf,
    /// `None` when the file could not be read and was skipped.
    pub rows: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub output: PathBuf,
    pub row_count: usize,
    pub stripped_rows: u32,
    pub files: Vec<MergedFile>,
}

pub fn merge_output_path(output_dir: &Path, prefix: &str, template: &Path) -> PathBuf {
    let ext = match dotted_extension(template) {
        ext if ext.is_empty() => ".xlsx".to_string(),
        ext => ext,
    };
    output_dir.join(format!("{prefix}_{}{ext}", timestamp()))
}

/// Consolidates every valid data row of `files` beneath the template header.
///
/// The template's data region is stripped first. A template that is also in
/// `files` contributes its rows again as an ordinary source.
pub fn merge(
    request: MergeRequest<'_>,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<MergeOutcome, EngineError> {
    if request.files.is_empty() {
        return Err(EngineError::InvalidParameters(
            "no files selected for merge".to_string(),
        ));
    }
    ensure_editable_template(request.template)?;
    if request.files.iter().any(|f| f == request.template) {
        warn!(
            template = %request.template.display(),
            "template is also a merge source, its data rows will be appended after stripping"
        );
    }

    let output = merge_output_path(request.output_dir, request.output_prefix, request.template);
    info!(template = %request.template.display(), output = %output.display(), "merging");
    copy_file(request.template, &output)?;

    match merge_into(&output, request, reporter, cancel) {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            remove_file_quietly(&output);
            Err(err)
        }
    }
}

fn merge_into(
    output: &Path,
    request: MergeRequest<'_>,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<MergeOutcome, EngineError> {
    let start_row = request.start_row.get();
    let mut workbook = TemplateWorkbook::open(output)?;
    let stripped_rows = workbook.strip_data_region(start_row)?;
    info!(stripped_rows, "template data region cleared");

    let total = request.files.len();
    reporter.on_start("merge", total);

    let mut row_count = 0;
    let mut files = Vec::with_capacity(total);
    for (idx, path) in request.files.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(done = idx, total, "merge cancelled");
            return Err(EngineError::Cancelled);
        }
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        reporter.on_item(idx + 1, total, &label);
        info!("reading {label}");

        let rows = match append_file(&mut workbook, path, start_row) {
            Ok(rows) => {
                row_count += rows;
                reporter.on_item_done(&label);
                Some(rows)
            }
            Err(err @ EngineError::UnreadableFile { .. }) => {
                warn!(error = %err, "skipping unreadable source");
                None
            }
            Err(err) => return Err(err),
        };
        files.push(MergedFile {
            path: path.clone(),
            rows,
        });
    }

    workbook.save()?;
    reporter.on_finish("merge", row_count);
    info!(rows = row_count, output = %output.display(), "merge complete");

    Ok(MergeOutcome {
        output: output.to_path_buf(),
        row_count,
        stripped_rows,
        files,
    })
}

/// Reads the whole source before writing so a bad file adds no rows.
fn append_file(
    workbook: &mut TemplateWorkbook,
    path: &Path,
    start_row: u32,
) -> Result<usize, EngineError> {
    let mut valid = Vec::new();
    for row in TableReader::open(path)? {
        let row = row?;
        if row.number >= start_row && row.is_valid() {
            valid.push(row);
        }
    }
    for row in &valid {
        workbook.append(row)?;
    }
    Ok(valid.len())
}
