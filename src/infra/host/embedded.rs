use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tracing::debug;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::domain::entities::params::SHEET_ROW_LIMIT;
use crate::domain::entities::row_union::RowUnion;
use crate::domain::error::EngineError;
use crate::usecase::ports::host::{
    DocumentHandle, HostIdentity, HostLauncher, HostSession, SaveFormat, SheetExtent,
    SheetOccupancy,
};

struct OpenDocument {
    path: PathBuf,
    book: Spreadsheet,
}

/// In-process workbook host backed by umya-spreadsheet.
///
/// Styles, merged cells and column widths survive row and column deletion,
/// which is what perfect-mode splitting relies on. Reads and writes open-xml
/// workbooks only.
pub struct EmbeddedWorkbookHost {
    identity: HostIdentity,
    documents: HashMap<u32, OpenDocument>,
    next_id: u32,
    running: bool,
}

impl EmbeddedWorkbookHost {
    pub fn new(identity: HostIdentity) -> Self {
        Self {
            identity,
            documents: HashMap::new(),
            next_id: 1,
            running: true,
        }
    }

    fn ensure_running(&self, operation: &'static str) -> Result<(), EngineError> {
        if self.running {
            Ok(())
        } else {
            Err(EngineError::host(operation, "host session has already quit"))
        }
    }

    fn document(&self, doc: DocumentHandle, operation: &'static str) -> Result<&OpenDocument, EngineError> {
        self.ensure_running(operation)?;
        self.documents
            .get(&doc.0)
            .ok_or_else(|| EngineError::host(operation, format!("document {} is not open", doc.0)))
    }

    fn sheet(&self, doc: DocumentHandle, operation: &'static str) -> Result<&Worksheet, EngineError> {
        self.document(doc, operation)?
            .book
            .get_sheet(&0)
            .ok_or_else(|| EngineError::host(operation, "workbook has no worksheet"))
    }

    fn sheet_mut(
        &mut self,
        doc: DocumentHandle,
        operation: &'static str,
    ) -> Result<&mut Worksheet, EngineError> {
        self.ensure_running(operation)?;
        self.documents
            .get_mut(&doc.0)
            .ok_or_else(|| EngineError::host(operation, format!("document {} is not open", doc.0)))?
            .book
            .get_sheet_mut(&0)
            .ok_or_else(|| EngineError::host(operation, "workbook has no worksheet"))
    }
}

impl HostSession for EmbeddedWorkbookHost {
    fn identity(&self) -> HostIdentity {
        self.identity
    }

    fn row_limit(&self) -> u32 {
        SHEET_ROW_LIMIT
    }

    fn open(&mut self, path: &Path) -> Result<DocumentHandle, EngineError> {
        self.ensure_running("open")?;
        let book = umya_spreadsheet::reader::xlsx::read(path)
            .map_err(|err| EngineError::host("open", format!("{}: {err}", path.display())))?;
        let handle = DocumentHandle(self.next_id);
        self.next_id += 1;
        self.documents.insert(
            handle.0,
            OpenDocument {
                path: path.to_path_buf(),
                book,
            },
        );
        debug!(path = %path.display(), doc = handle.0, "opened document");
        Ok(handle)
    }

    fn occupancy(&self, doc: DocumentHandle) -> Result<SheetOccupancy, EngineError> {
        let sheet = self.sheet(doc, "occupancy")?;
        let mut filled_rows = BTreeSet::new();
        let mut filled_columns = BTreeSet::new();
        for cell in sheet.get_cell_collection() {
            // A lone space counts as content, as in Excel's COUNTA.
            if cell.get_value().is_empty() {
                continue;
            }
            let coordinate = cell.get_coordinate();
            filled_rows.insert(*coordinate.get_row_num());
            filled_columns.insert(*coordinate.get_col_num());
        }
        Ok(SheetOccupancy {
            extent: SheetExtent {
                last_row: sheet.get_highest_row(),
                last_column: sheet.get_highest_column(),
            },
            filled_rows,
            filled_columns,
        })
    }

    fn delete_rows(&mut self, doc: DocumentHandle, rows: &RowUnion) -> Result<(), EngineError> {
        let sheet = self.sheet_mut(doc, "delete_rows")?;
        for (first, last) in rows.spans() {
            sheet.remove_row(&first, &(last - first + 1));
        }
        Ok(())
    }

    fn delete_row_span(
        &mut self,
        doc: DocumentHandle,
        first: u32,
        last: u32,
    ) -> Result<(), EngineError> {
        if first == 0 || last < first {
            return Err(EngineError::host(
                "delete_row_span",
                format!("invalid row span {first}..={last}"),
            ));
        }
        let sheet = self.sheet_mut(doc, "delete_row_span")?;
        let highest = sheet.get_highest_row();
        if first > highest {
            return Ok(());
        }
        let last = last.min(highest);
        sheet.remove_row(&first, &(last - first + 1));
        Ok(())
    }

    fn delete_columns(&mut self, doc: DocumentHandle, columns: &[u32]) -> Result<(), EngineError> {
        let mut ordered: Vec<u32> = columns.iter().copied().filter(|c| *c > 0).collect();
        ordered.sort_unstable_by(|a, b| b.cmp(a));
        ordered.dedup();

        let sheet = self.sheet_mut(doc, "delete_columns")?;
        for column in ordered {
            sheet.remove_column_by_index(&column, &1);
        }
        Ok(())
    }

    fn save(&mut self, doc: DocumentHandle) -> Result<(), EngineError> {
        let document = self.document(doc, "save")?;
        umya_spreadsheet::writer::xlsx::write(&document.book, &document.path)
            .map_err(|err| EngineError::host("save", format!("{}: {err}", document.path.display())))
    }

    fn save_as(
        &mut self,
        doc: DocumentHandle,
        path: &Path,
        format: SaveFormat,
    ) -> Result<(), EngineError> {
        match format {
            SaveFormat::Workbook => {}
        }
        self.ensure_running("save_as")?;
        let document = self
            .documents
            .get_mut(&doc.0)
            .ok_or_else(|| EngineError::host("save_as", format!("document {} is not open", doc.0)))?;
        umya_spreadsheet::writer::xlsx::write(&document.book, path)
            .map_err(|err| EngineError::host("save_as", format!("{}: {err}", path.display())))?;
        document.path = path.to_path_buf();
        Ok(())
    }

    fn close(&mut self, doc: DocumentHandle) -> Result<(), EngineError> {
        self.ensure_running("close")?;
        self.documents
            .remove(&doc.0)
            .map(|_| ())
            .ok_or_else(|| EngineError::host("close", format!("document {} is not open", doc.0)))
    }

    fn quit(&mut self) -> Result<(), EngineError> {
        self.documents.clear();
        self.running = false;
        Ok(())
    }
}

/// Launcher for the embedded host under the identities it is registered as.
pub struct EmbeddedLauncher {
    identities: Vec<HostIdentity>,
}

impl EmbeddedLauncher {
    pub fn new(identities: Vec<HostIdentity>) -> Self {
        Self { identities }
    }
}

impl Default for EmbeddedLauncher {
    fn default() -> Self {
        Self::new(vec![HostIdentity::Primary])
    }
}

impl HostLauncher for EmbeddedLauncher {
    fn is_available(&self, identity: HostIdentity) -> bool {
        self.identities.contains(&identity)
    }

    fn launch(&self, identity: HostIdentity) -> Result<Box<dyn HostSession>, EngineError> {
        if !self.is_available(identity) {
            return Err(EngineError::host(
                "launch",
                format!("{identity} host is not installed"),
            ));
        }
        Ok(Box::new(EmbeddedWorkbookHost::new(identity)))
    }
}
