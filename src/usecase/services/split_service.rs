use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::domain::entities::cancel::CancelToken;
use crate::domain::entities::params::{KeyColumn, StartRow};
use crate::domain::entities::partition::OwnershipMap;
use crate::domain::error::EngineError;
use crate::infra::export::xlsx::write_partition;
use crate::infra::fs::{copy_file, dotted_extension, remove_file_quietly, OutputNamer};
use crate::infra::import::reader::TableReader;
use crate::usecase::ports::host::{HostIdentity, HostLauncher, HostSession};
use crate::usecase::ports::progress::ProgressReporter;
use crate::usecase::services::host_service::{delete_rows_batched, launch_with_fallback};
use crate::usecase::services::partition_service::{build_ownership_map, partition_fast};
use crate::usecase::services::sanitize_service::sanitize;

#[derive(Debug, Clone, PartialEq)]
pub struct SplitSettings {
    pub delete_batch_size: usize,
    pub scratch_dir_name: String,
    pub default_row_height: f64,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            delete_batch_size: 50,
            scratch_dir_name: "_temp_repair".to_string(),
            default_row_height: 25.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SplitRequest<'a> {
    pub source: &'a Path,
    pub start_row: StartRow,
    pub key_column: KeyColumn,
    pub output_dir: &'a Path,
}

/// Files written so far, plus the error that stopped the run early, if any.
#[derive(Debug, Default)]
pub struct SplitOutcome {
    pub outputs: Vec<PathBuf>,
    pub aborted: Option<EngineError>,
}

impl SplitOutcome {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Values-only split: one new workbook per key, header block first.
pub fn split_fast(
    request: SplitRequest<'_>,
    settings: &SplitSettings,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<SplitOutcome, EngineError> {
    info!(source = %request.source.display(), "fast split");
    let reader = TableReader::open(request.source)?;
    let partition = partition_fast(reader, request.start_row, request.key_column)?;

    let total = partition.partitions.len();
    info!(
        keys = total,
        header_rows = partition.header.len(),
        data_rows = partition.data_row_count(),
        "partitioned"
    );
    reporter.on_start("split", total);

    let mut namer = OutputNamer::new(request.output_dir, ".xlsx");
    let mut outcome = SplitOutcome::default();
    for (idx, part) in partition.partitions.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(done = idx, total, "split cancelled");
            outcome.aborted = Some(EngineError::Cancelled);
            break;
        }
        reporter.on_item(idx + 1, total, &part.key);
        let target = namer.path_for(&part.key);
        match write_partition(
            &target,
            &partition.header,
            &part.rows,
            settings.default_row_height,
        ) {
            Ok(()) => {
                info!(key = %part.key, rows = part.rows.len(), file = %target.display(), "written");
                reporter.on_item_done(&part.key);
                outcome.outputs.push(target);
            }
            Err(err) => {
                error!(key = %part.key, error = %err, "split aborted");
                outcome.aborted = Some(err);
                break;
            }
        }
    }

    reporter.on_finish("split", outcome.outputs.len());
    Ok(outcome)
}

/// Format-preserving split: each output is a full copy of the source with
/// every foreign-key and keyless row deleted inside the host.
pub fn split_perfect(
    request: SplitRequest<'_>,
    settings: &SplitSettings,
    launcher: &dyn HostLauncher,
    identity: HostIdentity,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<SplitOutcome, EngineError> {
    info!(source = %request.source.display(), %identity, "perfect split");
    let sanitized = sanitize(launcher, identity, request.source, &settings.scratch_dir_name);
    if !sanitized.is_sanitized() {
        warn!("analyzing the unsanitized source, stale formatting may shift the row boundary");
    }
    let result = (|| {
        let reader = TableReader::open(sanitized.path())?;
        let ownership = build_ownership_map(reader, request.start_row, request.key_column)?;
        run_perfect(request, settings, launcher, identity, &ownership, reporter, cancel)
    })();
    sanitized.cleanup();
    result
}

fn run_perfect(
    request: SplitRequest<'_>,
    settings: &SplitSettings,
    launcher: &dyn HostLauncher,
    identity: HostIdentity,
    ownership: &OwnershipMap,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<SplitOutcome, EngineError> {
    let mut outcome = SplitOutcome::default();
    let Some(max_data_row) = ownership.max_data_row() else {
        info!("no keyed data rows, nothing to split");
        reporter.on_finish("split", 0);
        return Ok(outcome);
    };
    let keys = ownership.keys();
    let total = keys.len();
    info!(max_data_row, keys = total, "data ends at row {max_data_row}");
    reporter.on_start("split", total);

    let mut guard = launch_with_fallback(launcher, identity)?;
    let mut namer = OutputNamer::new(request.output_dir, &dotted_extension(request.source));

    for (idx, key) in keys.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(done = idx, total, "split cancelled");
            outcome.aborted = Some(EngineError::Cancelled);
            break;
        }
        let target = namer.path_for(key);
        reporter.on_item(idx + 1, total, key);
        info!("[{}/{}] {}", idx + 1, total, target.display());

        let result = split_one_key(
            guard.session(),
            request.source,
            &target,
            key,
            ownership,
            max_data_row,
            settings.delete_batch_size,
        );
        match result {
            Ok(deleted) => {
                info!(key = %key, deleted, "saved");
                reporter.on_item_done(key);
                outcome.outputs.push(target);
            }
            Err(err) => {
                error!(key = %key, error = %err, "host error, remaining keys skipped");
                if target.exists() {
                    remove_file_quietly(&target);
                }
                outcome.aborted = Some(err);
                break;
            }
        }
    }

    if let Err(err) = guard.finish() {
        warn!(error = %err, "failed to quit host session");
    }
    reporter.on_finish("split", outcome.outputs.len());
    Ok(outcome)
}

fn split_one_key(
    session: &mut dyn HostSession,
    source: &Path,
    target: &Path,
    key: &str,
    ownership: &OwnershipMap,
    max_data_row: u32,
    batch_size: usize,
) -> Result<usize, EngineError> {
    copy_file(source, target)?;
    let doc = session.open(target)?;

    let limit = session.row_limit();
    if max_data_row < limit {
        if let Err(err) = session.delete_row_span(doc, max_data_row + 1, limit) {
            warn!(error = %err, "trailing row cleanup failed");
        }
    }

    let deleted = delete_rows_batched(
        session,
        doc,
        ownership.rows_to_delete_for(key),
        batch_size,
    )?;

    session.save(doc)?;
    session.close(doc)?;
    Ok(deleted)
}
