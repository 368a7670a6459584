use std::path::Path;

use calamine::{open_workbook, open_workbook_auto, Data, Reader, Xlsx, XlsxError};

use crate::domain::entities::cell::{CellValue, Row};
use crate::domain::error::EngineError;

pub fn cell_from_data(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::String(v) => Some(CellValue::Text(v.to_string())),
        Data::Float(v) => Some(CellValue::Number(*v)),
        Data::Int(v) => Some(CellValue::Number(*v as f64)),
        Data::Bool(v) => Some(CellValue::Bool(*v)),
        Data::DateTime(v) => Some(CellValue::DateTime(v.as_f64())),
        Data::DateTimeIso(v) => Some(CellValue::Text(v.to_string())),
        Data::DurationIso(v) => Some(CellValue::Text(v.to_string())),
        Data::Error(v) => Some(CellValue::Error(format!("{v:?}"))),
        Data::Empty => None,
    }
}

/// Rows of the first worksheet in absolute sheet coordinates.
///
/// Open-xml workbooks are parsed cell by cell and parsing stops at the row
/// ceiling. Other formats go through a calamine range, which trims leading
/// blank rows and columns; they are put back so `Row::number` and column
/// indexes match the sheet.
pub struct SheetRows {
    rows: std::vec::IntoIter<Row>,
}

impl SheetRows {
    pub fn open(
        path: &Path,
        max_rows: Option<u32>,
        max_columns: Option<u32>,
    ) -> Result<Self, EngineError> {
        let rows = if is_open_xml(path) {
            read_cells(path, max_rows, max_columns)?
        } else {
            read_range(path, max_rows, max_columns)?
        };
        Ok(Self {
            rows: rows.into_iter(),
        })
    }
}

impl Iterator for SheetRows {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.rows.next()
    }
}

fn is_open_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xlsm"))
}

fn place(rows: &mut Vec<Row>, row_idx: u32, col_idx: u32, value: CellValue) {
    while rows.len() <= row_idx as usize {
        let number = rows.len() as u32 + 1;
        rows.push(Row::empty(number));
    }
    let row = &mut rows[row_idx as usize];
    let col = col_idx as usize;
    if row.cells.len() <= col {
        row.cells.resize(col + 1, None);
    }
    row.cells[col] = Some(value);
}

/// Cells arrive in sheet order, so the first cell past the ceiling ends the read.
fn read_cells(
    path: &Path,
    max_rows: Option<u32>,
    max_columns: Option<u32>,
) -> Result<Vec<Row>, EngineError> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|err: XlsxError| EngineError::unreadable(path, err))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| EngineError::unreadable(path, "workbook has no worksheet"))?;
    let mut cells = workbook
        .worksheet_cells_reader(&first)
        .map_err(|err| EngineError::unreadable(path, err))?;

    let mut rows = Vec::new();
    while let Some(cell) = cells
        .next_cell()
        .map_err(|err| EngineError::unreadable(path, err))?
    {
        let (row_idx, col_idx) = cell.get_position();
        if max_rows.is_some_and(|max| row_idx >= max) {
            break;
        }
        if max_columns.is_some_and(|max| col_idx >= max) {
            continue;
        }
        if let Some(value) = cell_from_data(&Data::from(cell.get_value().clone())) {
            place(&mut rows, row_idx, col_idx, value);
        }
    }
    Ok(rows)
}

fn read_range(
    path: &Path,
    max_rows: Option<u32>,
    max_columns: Option<u32>,
) -> Result<Vec<Row>, EngineError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|err| EngineError::unreadable(path, err))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EngineError::unreadable(path, "workbook has no worksheet"))?
        .map_err(|err| EngineError::unreadable(path, err))?;

    let (origin_row, origin_col) = range.start().unwrap_or((0, 0));
    let mut rows = Vec::new();
    for (rel_row, rel_col, data) in range.used_cells() {
        let row_idx = origin_row + rel_row as u32;
        let col_idx = origin_col + rel_col as u32;
        if max_rows.is_some_and(|max| row_idx >= max)
            || max_columns.is_some_and(|max| col_idx >= max)
        {
            continue;
        }
        if let Some(value) = cell_from_data(data) {
            place(&mut rows, row_idx, col_idx, value);
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_typed_cells_map_to_values() {
        assert_eq!(cell_from_data(&Data::Empty), None);
        assert_eq!(
            cell_from_data(&Data::Int(7)),
            Some(CellValue::Number(7.0))
        );
        assert_eq!(
            cell_from_data(&Data::String("东区".to_string())),
            Some(CellValue::Text("东区".to_string()))
        );
        assert_eq!(cell_from_data(&Data::Bool(true)), Some(CellValue::Bool(true)));
    }

    #[test]
    fn cell_reader_stops_at_row_ceiling_and_keeps_coordinates() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("xlsplit-sheet-rows-{nanos}"));
        std::fs::create_dir_all(&dir).expect("should create temp dir");
        let path = dir.join("tall.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for row in 1..500u32 {
            sheet
                .write_string(row, 2, format!("r{row}"))
                .expect("should write cell");
        }
        workbook.save(&path).expect("should save fixture");

        let rows: Vec<Row> = SheetRows::open(&path, Some(10), None)
            .expect("should open")
            .collect();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0], Row::empty(1));
        assert_eq!(rows[9].number, 10);
        assert_eq!(
            rows[9].cell(3),
            Some(&CellValue::Text("r9".to_string()))
        );
        assert_eq!(rows[9].cell(1), None);

        let narrow: Vec<Row> = SheetRows::open(&path, Some(3), Some(2))
            .expect("should open")
            .collect();
        assert!(narrow.iter().all(|r| r.populated_width() == 0));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
