use std::fmt;
use std::str::FromStr;

use crate::domain::error::EngineError;

/// Last addressable row of an open-xml worksheet.
pub const SHEET_ROW_LIMIT: u32 = 1_048_576;
/// Last addressable column (XFD).
pub const SHEET_COLUMN_LIMIT: u32 = 16_384;

/// First row treated as data; rows above it are the header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StartRow(u32);

impl StartRow {
    pub fn new(row: u32) -> Result<Self, EngineError> {
        if row == 0 || row > SHEET_ROW_LIMIT {
            return Err(EngineError::InvalidParameters(format!(
                "start row must be between 1 and {SHEET_ROW_LIMIT}, got {row}"
            )));
        }
        Ok(Self(row))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for StartRow {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let row = s.trim().parse::<u32>().map_err(|_| {
            EngineError::InvalidParameters(format!("start row must be a number, got {s:?}"))
        })?;
        StartRow::new(row)
    }
}

impl fmt::Display for StartRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-based key column. Parses `3` as well as `C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyColumn(u32);

impl KeyColumn {
    pub fn new(column: u32) -> Result<Self, EngineError> {
        if column == 0 || column > SHEET_COLUMN_LIMIT {
            return Err(EngineError::InvalidParameters(format!(
                "key column must be between 1 and {SHEET_COLUMN_LIMIT}, got {column}"
            )));
        }
        Ok(Self(column))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn letter(self) -> String {
        column_letter(self.0)
    }
}

impl FromStr for KeyColumn {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(column) = trimmed.parse::<u32>() {
            return KeyColumn::new(column);
        }
        if trimmed.is_empty() || trimmed.len() > 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(EngineError::InvalidParameters(format!(
                "key column must be a number or column letters, got {s:?}"
            )));
        }
        let column = trimmed
            .to_ascii_uppercase()
            .bytes()
            .fold(0_u32, |acc, b| acc * 26 + u32::from(b - b'A' + 1));
        KeyColumn::new(column)
    }
}

impl fmt::Display for KeyColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.letter())
    }
}

pub fn column_letter(mut n: u32) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// Values only, styling is lost.
    #[default]
    Fast,
    /// Row deletion inside the host on full copies, styling is kept.
    Perfect,
}
