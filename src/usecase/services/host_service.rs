use tracing::{info, warn};

use crate::domain::entities::row_union::RowUnion;
use crate::domain::error::EngineError;
use crate::usecase::ports::host::{DocumentHandle, HostIdentity, HostLauncher, HostMode, HostSession};

/// Picks the host identity for `mode`.
pub fn resolve_identity(
    launcher: &dyn HostLauncher,
    mode: HostMode,
) -> Result<HostIdentity, EngineError> {
    let wanted = match mode {
        HostMode::Primary => Some(HostIdentity::Primary),
        HostMode::Alternate => Some(HostIdentity::Alternate),
        HostMode::Auto => None,
    };
    match wanted {
        Some(identity) if launcher.is_available(identity) => Ok(identity),
        Some(_) => Err(EngineError::NoEngineAvailable),
        None => [HostIdentity::Primary, HostIdentity::Alternate]
            .into_iter()
            .find(|identity| launcher.is_available(*identity))
            .ok_or(EngineError::NoEngineAvailable),
    }
}

pub fn probe(launcher: &dyn HostLauncher) -> Vec<(HostIdentity, bool)> {
    [HostIdentity::Primary, HostIdentity::Alternate]
        .into_iter()
        .map(|identity| (identity, launcher.is_available(identity)))
        .collect()
}

/// Launches `identity`, retrying once with the other identity.
pub fn launch_with_fallback(
    launcher: &dyn HostLauncher,
    identity: HostIdentity,
) -> Result<HostSessionGuard, EngineError> {
    match launcher.launch(identity) {
        Ok(session) => Ok(HostSessionGuard::new(session)),
        Err(first) => {
            let fallback = identity.other();
            warn!(%identity, error = %first, %fallback, "host launch failed, trying fallback");
            launcher
                .launch(fallback)
                .map(HostSessionGuard::new)
                .map_err(|_| first)
        }
    }
}

/// Owns a host session and quits it exactly once.
///
/// `finish` quits and reports the result; dropping an unfinished guard (an
/// early return on an error path) quits best-effort.
pub struct HostSessionGuard {
    session: Box<dyn HostSession>,
    quit: bool,
}

impl HostSessionGuard {
    pub fn new(session: Box<dyn HostSession>) -> Self {
        info!(identity = %session.identity(), "host session started");
        Self {
            session,
            quit: false,
        }
    }

    pub fn session(&mut self) -> &mut dyn HostSession {
        self.session.as_mut()
    }

    pub fn finish(mut self) -> Result<(), EngineError> {
        self.quit = true;
        self.session.quit()
    }
}

impl Drop for HostSessionGuard {
    fn drop(&mut self) {
        if self.quit {
            return;
        }
        if let Err(err) = self.session.quit() {
            warn!(error = %err, "failed to quit host session");
        }
    }
}

/// Deletes `rows` through unioned ranges, flushing every `batch_size` rows.
///
/// `rows` must be strictly descending: each flush only shifts rows below the
/// ones still waiting. Returns the number of rows deleted.
pub fn delete_rows_batched<I>(
    session: &mut dyn HostSession,
    doc: DocumentHandle,
    rows: I,
    batch_size: usize,
) -> Result<usize, EngineError>
where
    I: IntoIterator<Item = u32>,
{
    let batch_size = batch_size.max(1);
    let mut union = RowUnion::new();
    let mut deleted = 0;
    let mut previous: Option<u32> = None;

    for row in rows {
        if previous.is_some_and(|prev| row >= prev) {
            return Err(EngineError::InvalidParameters(format!(
                "row deletions must be descending, got {row} after {prev}",
                prev = previous.unwrap_or_default()
            )));
        }
        previous = Some(row);
        union.push(row);
        if union.len() >= batch_size {
            deleted += union.len();
            session.delete_rows(doc, &union.take())?;
        }
    }
    if !union.is_empty() {
        deleted += union.len();
        session.delete_rows(doc, &union)?;
    }
    Ok(deleted)
}
