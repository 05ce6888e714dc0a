//! Spreadsheet input: a positional header row plus positional data rows.
//!
//! Only CSV is read here. Records may be longer or shorter than the header;
//! the read check decides what that means for a row.

use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("cannot read sheet {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed sheet: {0}")]
    Csv(#[from] csv::Error),
    #[error("sheet has no header row")]
    NoHeader,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SheetError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut records = rdr.records();
        let headers: Vec<String> = match records.next() {
            Some(rec) => rec?.iter().map(|h| h.trim().to_string()).collect(),
            None => return Err(SheetError::NoHeader),
        };
        if headers.iter().all(String::is_empty) {
            return Err(SheetError::NoHeader);
        }

        let mut rows = Vec::new();
        for rec in records {
            let rec = rec?;
            let cells: Vec<String> = rec.iter().map(str::to_string).collect();
            // Blank lines and rows of empty cells are not records.
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            rows.push(trim_trailing_empty(cells, headers.len()));
        }
        Ok(Self { headers, rows })
    }
}

/// Drop empty cells past the header width; spreadsheet exports often pad rows.
fn trim_trailing_empty(mut cells: Vec<String>, width: usize) -> Vec<String> {
    while cells.len() > width && cells.last().is_some_and(|c| c.trim().is_empty()) {
        cells.pop();
    }
    cells
}

pub fn load_csv(path: &Path) -> Result<Sheet, SheetError> {
    let file = std::fs::File::open(path).map_err(|source| SheetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let sheet = Sheet::from_reader(std::io::BufReader::new(file))?;
    tracing::debug!(
        path = %path.display(),
        headers = sheet.headers.len(),
        rows = sheet.rows.len(),
        "sheet loaded"
    );
    Ok(sheet)
}
