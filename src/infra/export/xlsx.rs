use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::domain::entities::cell::{CellValue, Row};
use crate::domain::entities::params::SHEET_COLUMN_LIMIT;
use crate::domain::error::EngineError;

const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Writes the header block followed by `rows` into a fresh single-sheet workbook.
///
/// Values only: the output carries no styling from the source.
pub fn write_partition(
    path: &Path,
    header: &[Row],
    rows: &[Row],
    default_row_height: f64,
) -> Result<(), EngineError> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format(DATE_FORMAT);

    let worksheet = workbook.add_worksheet();
    worksheet.set_default_row_height(default_row_height);

    for (idx, row) in header.iter().chain(rows.iter()).enumerate() {
        write_row(worksheet, idx as u32, row, &date_format)
            .map_err(|err| EngineError::write_failed(path, err))?;
    }

    workbook
        .save(path)
        .map_err(|err| EngineError::write_failed(path, err))
}

fn write_row(
    worksheet: &mut Worksheet,
    row_idx: u32,
    row: &Row,
    date_format: &Format,
) -> Result<(), XlsxError> {
    for (col_idx, cell) in row.cells.iter().enumerate() {
        if col_idx as u32 >= SHEET_COLUMN_LIMIT {
            break;
        }
        let col = col_idx as u16;
        match cell {
            None => {}
            Some(CellValue::Text(v)) | Some(CellValue::Error(v)) => {
                worksheet.write_string(row_idx, col, v)?;
            }
            Some(CellValue::Number(v)) => {
                worksheet.write_number(row_idx, col, *v)?;
            }
            Some(CellValue::Bool(v)) => {
                worksheet.write_boolean(row_idx, col, *v)?;
            }
            Some(CellValue::DateTime(serial)) => {
                worksheet.write_number_with_format(row_idx, col, *serial, date_format)?;
            }
        }
    }
    Ok(())
}
