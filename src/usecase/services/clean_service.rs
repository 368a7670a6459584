use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::error::EngineError;
use crate::infra::fs::{clock_stamp, dotted_extension};
use crate::usecase::ports::host::{HostIdentity, HostLauncher, SaveFormat};
use crate::usecase::services::host_service::{delete_rows_batched, launch_with_fallback};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanOutcome {
    pub output: PathBuf,
    pub rows_removed: usize,
    pub columns_removed: usize,
}

pub fn cleaned_path(source: &Path, marker: &str) -> PathBuf {
    let parent = source.parent().unwrap_or_else(|| Path::new("."));
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    parent.join(format!(
        "{stem}_{marker}_{}{}",
        clock_stamp(),
        dotted_extension(source)
    ))
}

/// Removes every fully blank row and column and saves next to the source.
pub fn clean_and_save(
    launcher: &dyn HostLauncher,
    identity: HostIdentity,
    source: &Path,
    marker: &str,
    batch_size: usize,
) -> Result<CleanOutcome, EngineError> {
    let output = cleaned_path(source, marker);
    info!(source = %source.display(), %identity, "cleaning blank rows and columns");

    let mut guard = launch_with_fallback(launcher, identity)?;
    let session = guard.session();
    let doc = session.open(source)?;

    let occupancy = session.occupancy(doc)?;
    let blank_rows: Vec<u32> = occupancy.blank_rows().rev().collect();
    let blank_columns: Vec<u32> = occupancy.blank_columns().rev().collect();

    let rows_removed = delete_rows_batched(session, doc, blank_rows, batch_size)?;
    session.delete_columns(doc, &blank_columns)?;

    session.save_as(doc, &output, SaveFormat::Workbook)?;
    session.close(doc)?;
    guard.finish()?;

    info!(
        rows_removed,
        columns_removed = blank_columns.len(),
        output = %output.display(),
        "clean complete"
    );
    Ok(CleanOutcome {
        output,
        rows_removed,
        columns_removed: blank_columns.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleaned_name_keeps_stem_and_extension() {
        let path = cleaned_path(Path::new("/data/东区.xlsx"), "清洗");
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        assert!(name.starts_with("东区_清洗_"), "{name}");
        assert!(name.ends_with(".xlsx"), "{name}");
        assert_eq!(path.parent(), Some(Path::new("/data")));
    }
}
