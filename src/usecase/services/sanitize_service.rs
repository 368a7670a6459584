use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::error::EngineError;
use crate::infra::fs::{create_dir, remove_dir_quietly};
use crate::usecase::ports::host::{HostIdentity, HostLauncher, SaveFormat};
use crate::usecase::services::host_service::launch_with_fallback;

/// Whether a host round-trip normalized the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizeOutcome {
    Sanitized { shadow: PathBuf, scratch_dir: PathBuf },
    Unsanitized { original: PathBuf },
}

impl SanitizeOutcome {
    /// The file to analyze next.
    pub fn path(&self) -> &Path {
        match self {
            SanitizeOutcome::Sanitized { shadow, .. } => shadow,
            SanitizeOutcome::Unsanitized { original } => original,
        }
    }

    pub fn is_sanitized(&self) -> bool {
        matches!(self, SanitizeOutcome::Sanitized { .. })
    }

    /// Removes the scratch directory, if one was made.
    pub fn cleanup(&self) {
        if let SanitizeOutcome::Sanitized { scratch_dir, .. } = self {
            remove_dir_quietly(scratch_dir);
        }
    }
}

pub fn shadow_path(source: &Path, scratch_dir_name: &str) -> PathBuf {
    let parent = source.parent().unwrap_or_else(|| Path::new("."));
    let stem = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = stem.split('.').next().unwrap_or_default();
    parent
        .join(scratch_dir_name)
        .join(format!("{stem}_shadow.xlsx"))
}

/// Re-saves `path` through the host into a scratch copy.
///
/// Never fails: any problem is logged and the original path comes back as
/// [`SanitizeOutcome::Unsanitized`].
pub fn sanitize(
    launcher: &dyn HostLauncher,
    identity: HostIdentity,
    path: &Path,
    scratch_dir_name: &str,
) -> SanitizeOutcome {
    let shadow = shadow_path(path, scratch_dir_name);
    let Some(scratch_dir) = shadow.parent().map(Path::to_path_buf) else {
        return SanitizeOutcome::Unsanitized {
            original: path.to_path_buf(),
        };
    };
    let existed = scratch_dir.is_dir();

    info!(source = %path.display(), %identity, "building analysis shadow copy");
    match round_trip(launcher, identity, path, &scratch_dir, &shadow) {
        Ok(()) => SanitizeOutcome::Sanitized {
            shadow,
            scratch_dir,
        },
        Err(err) => {
            warn!(source = %path.display(), error = %err, "sanitize failed, using original file");
            if !existed && scratch_dir.is_dir() {
                remove_dir_quietly(&scratch_dir);
            }
            SanitizeOutcome::Unsanitized {
                original: path.to_path_buf(),
            }
        }
    }
}

fn round_trip(
    launcher: &dyn HostLauncher,
    identity: HostIdentity,
    path: &Path,
    scratch_dir: &Path,
    shadow: &Path,
) -> Result<(), EngineError> {
    create_dir(scratch_dir)?;
    let mut guard = launch_with_fallback(launcher, identity)?;
    let session = guard.session();
    let doc = session.open(path)?;
    session.save_as(doc, shadow, SaveFormat::Workbook)?;
    session.close(doc)?;
    guard.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_lives_in_scratch_dir_next_to_source() {
        let shadow = shadow_path(Path::new("/data/东区.v2.xlsx"), "_temp_repair");
        assert_eq!(shadow, PathBuf::from("/data/_temp_repair/东区_shadow.xlsx"));
    }
}
