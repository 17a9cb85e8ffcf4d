// src/sheet/mod.rs
//! Decoding downloaded indicator documents into a plain grid of cells.
//!
//! The archive serves the same data either as an Excel workbook
//! (`downloadformat=excel`) or as a zip bundle of CSV files
//! (`downloadformat=csv`). Both decode into a [`RawSheet`] whose row
//! positions are absolute: row 0 is the first row of the document even when
//! it is blank, so skipping a fixed header preamble behaves identically for
//! either format.

use std::io::Cursor;
use tracing::debug;
use zip::ZipArchive;

pub mod csv_bundle;
pub mod excel;
pub mod preamble;

pub use preamble::SheetPreamble;

const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

static EMPTY_CELL: Cell = Cell::Empty;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Blank or whitespace-only text becomes `Empty`.
    pub fn from_text(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text form used when the cell is a column header. Whole numbers print
    /// without a fraction so a numeric `2010` header matches the label "2010".
    pub fn label(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row `r`, or an empty slice past the end.
    pub fn row(&self, r: usize) -> &[Cell] {
        self.rows.get(r).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell at (`r`, `c`); anything outside the grid reads as `Empty`.
    pub fn cell(&self, r: usize, c: usize) -> &Cell {
        self.rows
            .get(r)
            .and_then(|row| row.get(c))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Rows from `start` to the end.
    pub fn rows_from(&self, start: usize) -> impl Iterator<Item = (usize, &[Cell])> {
        self.rows
            .iter()
            .enumerate()
            .skip(start)
            .map(|(i, r)| (i, r.as_slice()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("document is neither an Excel workbook nor a CSV bundle")]
    UnrecognisedFormat,
    #[error("sheet `{sheet}` not found (available: {available:?})")]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },
    #[error("workbook error: {0}")]
    Excel(#[from] calamine::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Excel,
    CsvBundle,
}

/// Sniff the document type from its leading bytes and, for zips, from the
/// member names.
pub fn detect_format(bytes: &[u8]) -> Result<SheetFormat, SheetError> {
    if bytes.starts_with(OLE_MAGIC) {
        return Ok(SheetFormat::Excel);
    }
    if !bytes.starts_with(ZIP_MAGIC) {
        return Err(SheetError::UnrecognisedFormat);
    }

    let archive = ZipArchive::new(Cursor::new(bytes))?;
    let names: Vec<&str> = archive.file_names().collect();
    debug!(members = names.len(), "inspecting zip members");

    if names
        .iter()
        .any(|n| n.starts_with("xl/") || *n == "content.xml")
    {
        Ok(SheetFormat::Excel)
    } else if names.iter().any(|n| n.to_lowercase().ends_with(".csv")) {
        Ok(SheetFormat::CsvBundle)
    } else {
        Err(SheetError::UnrecognisedFormat)
    }
}

/// Decode `bytes` and return the grid of the sheet named `sheet`.
pub fn read_sheet(bytes: &[u8], sheet: &str) -> Result<RawSheet, SheetError> {
    match detect_format(bytes)? {
        SheetFormat::Excel => excel::read_sheet(bytes, sheet),
        SheetFormat::CsvBundle => csv_bundle::read_sheet(bytes, sheet),
    }
}
