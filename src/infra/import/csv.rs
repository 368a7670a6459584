use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecordsIntoIter;

use crate::domain::entities::cell::{CellValue, Row};
use crate::domain::error::EngineError;

/// Records of a delimited text file as sheet rows, numbered from 1.
pub struct DelimitedRows {
    path: PathBuf,
    records: StringRecordsIntoIter<File>,
    max_columns: Option<u32>,
    next_row: u32,
}

impl DelimitedRows {
    pub fn open(path: &Path, max_columns: Option<u32>) -> Result<Self, EngineError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|err| EngineError::unreadable(path, err))?;

        Ok(Self {
            path: path.to_path_buf(),
            records: reader.into_records(),
            max_columns,
            next_row: 1,
        })
    }
}

impl Iterator for DelimitedRows {
    type Item = Result<Row, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(err) => return Some(Err(EngineError::unreadable(&self.path, err))),
        };
        let number = self.next_row;
        self.next_row += 1;

        let take = self.max_columns.map(|n| n as usize).unwrap_or(usize::MAX);
        let cells = record
            .iter()
            .take(take)
            .map(|value| {
                if value.is_empty() {
                    None
                } else {
                    Some(CellValue::Text(value.to_string()))
                }
            })
            .collect();
        Some(Ok(Row::new(number, cells)))
    }
}
