use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unreadable spreadsheet {}: {reason}", path.display())]
    UnreadableFile { path: PathBuf, reason: String },

    #[error("no automation host available")]
    NoEngineAvailable,

    #[error("host operation `{operation}` failed: {reason}")]
    HostOperationFailed {
        operation: &'static str,
        reason: String,
    },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {reason}", path.display())]
    WriteFailed { path: PathBuf, reason: String },

    #[error("operation cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        EngineError::UnreadableFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn host(operation: &'static str, reason: impl ToString) -> Self {
        EngineError::HostOperationFailed {
            operation,
            reason: reason.to_string(),
        }
    }

    pub fn write_failed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        EngineError::WriteFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_operation() {
        let err = EngineError::host("save_as", "disk full");
        assert_eq!(err.to_string(), "host operation `save_as` failed: disk full");

        let err = EngineError::unreadable("/tmp/a.xlsx", "not a zip");
        assert_eq!(err.to_string(), "unreadable spreadsheet /tmp/a.xlsx: not a zip");
    }
}
