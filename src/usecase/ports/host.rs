use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::entities::row_union::RowUnion;
use crate::domain::error::EngineError;

/// The two interchangeable automation hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostIdentity {
    Primary,
    Alternate,
}

impl HostIdentity {
    pub fn other(self) -> Self {
        match self {
            HostIdentity::Primary => HostIdentity::Alternate,
            HostIdentity::Alternate => HostIdentity::Primary,
        }
    }
}

impl fmt::Display for HostIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostIdentity::Primary => write!(f, "primary"),
            HostIdentity::Alternate => write!(f, "alternate"),
        }
    }
}

/// Host selection as configured by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostMode {
    #[default]
    Auto,
    Primary,
    Alternate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// Open-xml workbook, the host's native format.
    Workbook,
}

/// Used area of the active sheet, 1-based inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SheetExtent {
    pub last_row: u32,
    pub last_column: u32,
}

/// Rows and columns of the active sheet that hold at least one value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SheetOccupancy {
    pub extent: SheetExtent,
    pub filled_rows: std::collections::BTreeSet<u32>,
    pub filled_columns: std::collections::BTreeSet<u32>,
}

impl SheetOccupancy {
    pub fn blank_rows(&self) -> impl DoubleEndedIterator<Item = u32> + '_ {
        (1..=self.extent.last_row).filter(|r| !self.filled_rows.contains(r))
    }

    pub fn blank_columns(&self) -> impl DoubleEndedIterator<Item = u32> + '_ {
        (1..=self.extent.last_column).filter(|c| !self.filled_columns.contains(c))
    }
}

/// One live session of an automation host.
///
/// Every operation works on the active sheet of the given document. Sessions
/// are exclusively owned and must be quit by the operation that launched them.
pub trait HostSession {
    fn identity(&self) -> HostIdentity;

    /// Last addressable row of a sheet in this host.
    fn row_limit(&self) -> u32;

    fn open(&mut self, path: &Path) -> Result<DocumentHandle, EngineError>;

    fn occupancy(&self, doc: DocumentHandle) -> Result<SheetOccupancy, EngineError>;

    /// Deletes every row of the union in one host call.
    fn delete_rows(&mut self, doc: DocumentHandle, rows: &RowUnion) -> Result<(), EngineError>;

    /// Deletes `first..=last`; rows past the used area are ignored.
    fn delete_row_span(
        &mut self,
        doc: DocumentHandle,
        first: u32,
        last: u32,
    ) -> Result<(), EngineError>;

    fn delete_columns(&mut self, doc: DocumentHandle, columns: &[u32]) -> Result<(), EngineError>;

    fn save(&mut self, doc: DocumentHandle) -> Result<(), EngineError>;

    fn save_as(
        &mut self,
        doc: DocumentHandle,
        path: &Path,
        format: SaveFormat,
    ) -> Result<(), EngineError>;

    fn close(&mut self, doc: DocumentHandle) -> Result<(), EngineError>;

    fn quit(&mut self) -> Result<(), EngineError>;
}

/// Starts host sessions.
pub trait HostLauncher {
    fn is_available(&self, identity: HostIdentity) -> bool;

    fn launch(&self, identity: HostIdentity) -> Result<Box<dyn HostSession>, EngineError>;
}
