use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

/// A typed, non-blank cell. Blank cells are `None` in a [`Row`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date (1900 system).
    DateTime(f64),
    Error(String),
}

impl CellValue {
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(v) => v.clone(),
            CellValue::Number(v) => v.to_string(),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::DateTime(serial) => format_serial(*serial),
            CellValue::Error(v) => v.clone(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Text(v) | CellValue::Error(v) => v.trim().is_empty(),
            _ => false,
        }
    }
}

fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    if !serial.is_finite() || serial.abs() > 2_958_465.0 {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

fn format_serial(serial: f64) -> String {
    match serial_to_datetime(serial) {
        Some(dt) if dt.num_seconds_from_midnight() == 0 => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => serial.to_string(),
    }
}

/// One sheet row. `number` is the 1-based sheet row, `cells[0]` is column A.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub number: u32,
    pub cells: Vec<Option<CellValue>>,
}

impl Row {
    pub fn new(number: u32, cells: Vec<Option<CellValue>>) -> Self {
        Self { number, cells }
    }

    pub fn empty(number: u32) -> Self {
        Self {
            number,
            cells: Vec::new(),
        }
    }

    /// 1-based column lookup.
    pub fn cell(&self, column: u32) -> Option<&CellValue> {
        let idx = column.checked_sub(1)? as usize;
        self.cells.get(idx).and_then(Option::as_ref)
    }

    /// Trimmed string form of the cell, `None` when the cell is blank or absent.
    pub fn key_at(&self, column: u32) -> Option<String> {
        let key = self.cell(column)?.to_text().trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    /// A row is valid when at least one cell has a non-empty trimmed value.
    pub fn is_valid(&self) -> bool {
        self.cells.iter().flatten().any(|cell| !cell.is_blank())
    }

    /// Number of columns up to and including the last non-null cell.
    pub fn populated_width(&self) -> u32 {
        self.cells
            .iter()
            .rposition(Option::is_some)
            .map(|idx| idx as u32 + 1)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(v: &str) -> Option<CellValue> {
        Some(CellValue::Text(v.to_string()))
    }

    #[test]
    fn key_is_trimmed_and_blank_keys_are_none() {
        let row = Row::new(9, vec![text("  东区 "), text("   "), None]);

        assert_eq!(row.key_at(1).as_deref(), Some("东区"));
        assert_eq!(row.key_at(2), None);
        assert_eq!(row.key_at(3), None);
        assert_eq!(row.key_at(7), None);
        assert_eq!(row.key_at(0), None);
    }

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(9.0).to_text(), "9");
        assert_eq!(CellValue::Number(2.5).to_text(), "2.5");
        assert_eq!(CellValue::Number(0.0).to_text(), "0");
    }

    #[test]
    fn zero_and_false_are_real_values() {
        let row = Row::new(1, vec![Some(CellValue::Number(0.0)), Some(CellValue::Bool(false))]);

        assert_eq!(row.key_at(1).as_deref(), Some("0"));
        assert_eq!(row.key_at(2).as_deref(), Some("FALSE"));
        assert!(row.is_valid());
    }

    #[test]
    fn serial_dates_render_as_calendar_text() {
        assert_eq!(CellValue::DateTime(45292.0).to_text(), "2024-01-01");
        assert_eq!(CellValue::DateTime(45292.5).to_text(), "2024-01-01 12:00:00");
    }

    #[test]
    fn validity_ignores_whitespace_only_cells() {
        assert!(!Row::new(3, vec![None, text(" "), text("")]).is_valid());
        assert!(!Row::empty(4).is_valid());
        assert!(Row::new(5, vec![None, text("x")]).is_valid());
    }

    #[test]
    fn populated_width_stops_at_last_value() {
        let row = Row::new(1, vec![None, text("b"), None, text("d"), None, None]);
        assert_eq!(row.populated_width(), 4);
        assert_eq!(Row::empty(2).populated_width(), 0);
    }
}
