use std::path::{Path, PathBuf};

use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::domain::entities::cell::{CellValue, Row};
use crate::domain::error::EngineError;

const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Only Open XML workbooks can be edited in place.
pub fn is_editable_template(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xlsm"))
}

pub fn ensure_editable_template(path: &Path) -> Result<(), EngineError> {
    if is_editable_template(path) {
        Ok(())
    } else {
        Err(EngineError::InvalidParameters(format!(
            "template must be .xlsx or .xlsm: {}",
            path.display()
        )))
    }
}

/// A copied template opened for in-place editing. Rows are appended after
/// the last used row of the first sheet; the template's own formatting stays.
pub struct TemplateWorkbook {
    path: PathBuf,
    book: Spreadsheet,
    next_row: u32,
}

impl TemplateWorkbook {
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let book = umya_spreadsheet::reader::xlsx::read(path)
            .map_err(|err| EngineError::unreadable(path, err))?;
        let mut template = Self {
            path: path.to_path_buf(),
            book,
            next_row: 1,
        };
        template.next_row = template.sheet()?.get_highest_row() + 1;
        Ok(template)
    }

    fn sheet(&self) -> Result<&Worksheet, EngineError> {
        self.book
            .get_sheet(&0)
            .ok_or_else(|| EngineError::unreadable(&self.path, "workbook has no worksheet"))
    }

    fn sheet_mut(&mut self) -> Result<&mut Worksheet, EngineError> {
        let path = self.path.clone();
        self.book
            .get_sheet_mut(&0)
            .ok_or_else(|| EngineError::unreadable(path, "workbook has no worksheet"))
    }

    /// Removes `start_row..=last_row`, keeping every row above it.
    /// Returns the number of rows removed.
    pub fn strip_data_region(&mut self, start_row: u32) -> Result<u32, EngineError> {
        let sheet = self.sheet_mut()?;
        let last = sheet.get_highest_row();
        let removed = if last >= start_row {
            let count = last - start_row + 1;
            sheet.remove_row(&start_row, &count);
            count
        } else {
            0
        };
        self.next_row = self.sheet()?.get_highest_row() + 1;
        Ok(removed)
    }

    pub fn append(&mut self, row: &Row) -> Result<u32, EngineError> {
        let target = self.next_row;
        let sheet = self.sheet_mut()?;
        for (idx, cell) in row.cells.iter().enumerate() {
            let Some(value) = cell else { continue };
            let coordinate = (idx as u32 + 1, target);
            match value {
                CellValue::Text(v) | CellValue::Error(v) => {
                    sheet.get_cell_mut(coordinate).set_value(v.clone());
                }
                CellValue::Number(v) => {
                    sheet.get_cell_mut(coordinate).set_value_number(*v);
                }
                CellValue::Bool(v) => {
                    sheet.get_cell_mut(coordinate).set_value_bool(*v);
                }
                CellValue::DateTime(serial) => {
                    sheet.get_cell_mut(coordinate).set_value_number(*serial);
                    sheet
                        .get_style_mut(coordinate)
                        .get_number_format_mut()
                        .set_format_code(DATE_FORMAT);
                }
            }
        }
        self.next_row += 1;
        Ok(target)
    }

    pub fn save(&self) -> Result<(), EngineError> {
        umya_spreadsheet::writer::xlsx::write(&self.book, &self.path)
            .map_err(|err| EngineError::write_failed(&self.path, err))
    }
}
