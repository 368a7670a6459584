use std::path::Path;

use crate::domain::entities::cell::Row;
use crate::domain::error::EngineError;
use crate::infra::import::csv::DelimitedRows;
use crate::infra::import::xlsx::SheetRows;

/// Bounds on how much of a sheet a single pass may touch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadLimits {
    pub max_rows: Option<u32>,
    pub max_columns: Option<u32>,
}

impl ReadLimits {
    pub fn rows(max_rows: u32) -> Self {
        Self {
            max_rows: Some(max_rows),
            max_columns: None,
        }
    }
}

enum RowSource {
    Sheet(SheetRows),
    Delimited(DelimitedRows),
}

/// Single-pass row sequence over the first sheet of a spreadsheet file.
///
/// Restart by opening again. Blank cells are `None`.
pub struct TableReader {
    source: RowSource,
    limits: ReadLimits,
    emitted: u32,
}

impl TableReader {
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        Self::open_with(path, ReadLimits::default())
    }

    pub fn open_with(path: &Path, limits: ReadLimits) -> Result<Self, EngineError> {
        let is_delimited = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        let source = if is_delimited {
            RowSource::Delimited(DelimitedRows::open(path, limits.max_columns)?)
        } else {
            RowSource::Sheet(SheetRows::open(path, limits.max_rows, limits.max_columns)?)
        };

        Ok(Self {
            source,
            limits,
            emitted: 0,
        })
    }
}

impl Iterator for TableReader {
    type Item = Result<Row, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.limits.max_rows.is_some_and(|max| self.emitted >= max) {
            return None;
        }
        let item = match &mut self.source {
            RowSource::Sheet(rows) => rows.next().map(Ok),
            RowSource::Delimited(rows) => rows.next(),
        }?;
        self.emitted += 1;
        Some(item)
    }
}
