// src/loader.rs
//! Fetch an indicator document, cut out the requested block and index it by
//! country.

use reqwest::blocking::Client;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::fetch::{fetch_bytes, FetchError};
use crate::sheet::{self, Cell, RawSheet, SheetError, SheetPreamble};
use crate::table::{IndicatorTable, Table, TableError, TransposedTable};

/// Marker the archive uses for "no data" in some exports.
const MISSING_MARKER: &str = "..";

/// Everything `load` needs to turn one remote document into a table.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    /// URL of the workbook or CSV bundle.
    pub source: String,
    /// Sheet name (workbooks) or member-name prefix (CSV bundles).
    pub sheet: String,
    /// Rows of boilerplate before the header row.
    pub header_skip: usize,
    /// Columns to keep, in output order. Must include `index_column`.
    pub columns: Vec<String>,
    /// The column whose values become the row keys.
    pub index_column: String,
    /// Name given to the axis of the remaining columns.
    pub column_axis: String,
    /// Row keys to keep, in output order.
    pub row_keys: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error("header row {0} is past the end of the sheet")]
    NoHeaderRow(usize),
    #[error("index column `{0}` is not among the requested columns")]
    IndexNotSelected(String),
    #[error("column `{column}` not found in header row {row}")]
    MissingColumn { column: String, row: usize },
    #[error("row key `{0}` not found")]
    MissingRowKey(String),
    #[error("row key `{key}` appears more than once in the source")]
    DuplicateRowKey { key: String },
    #[error("row key `{0}` requested more than once")]
    RepeatedRequest(String),
    #[error("value `{value}` for `{key}` / `{column}` is not a number")]
    MalformedValue {
        key: String,
        column: String,
        value: String,
    },
    #[error(transparent)]
    Shape(#[from] TableError),
}

/// Download `request.source` and return the selected table and its
/// transpose. Exactly one network fetch per call.
#[tracing::instrument(level = "info", skip(client, request), fields(source = %request.source, sheet = %request.sheet))]
pub fn load(
    client: &Client,
    request: &LoadRequest,
) -> Result<(IndicatorTable, TransposedTable), LoadError> {
    let bytes = fetch_bytes(client, &request.source)?;
    load_from_bytes(&bytes, request)
}

/// Same as [`load`] on a document already in memory.
pub fn load_from_bytes(
    bytes: &[u8],
    request: &LoadRequest,
) -> Result<(IndicatorTable, TransposedTable), LoadError> {
    let raw = sheet::read_sheet(bytes, &request.sheet)?;
    let preamble = SheetPreamble::parse(&raw, request.header_skip);
    info!(
        rows = raw.len(),
        data_source = preamble.data_source.as_deref().unwrap_or("-"),
        last_updated = ?preamble.last_updated,
        "decoded sheet"
    );

    let table = select(&raw, request)?;
    let transposed = table.transpose();
    Ok((table, transposed))
}

/// Skip the preamble, read the header row, keep the requested columns and
/// rows, and index by `request.index_column`.
pub fn select(raw: &RawSheet, request: &LoadRequest) -> Result<IndicatorTable, LoadError> {
    let header_row = request.header_skip;
    if header_row >= raw.len() {
        return Err(LoadError::NoHeaderRow(header_row));
    }

    // first occurrence wins when a header label repeats
    let mut header: HashMap<String, usize> = HashMap::new();
    for (pos, cell) in raw.row(header_row).iter().enumerate() {
        header.entry(cell.label()).or_insert(pos);
    }

    if !request.columns.contains(&request.index_column) {
        return Err(LoadError::IndexNotSelected(request.index_column.clone()));
    }
    let mut positions = Vec::with_capacity(request.columns.len());
    for column in &request.columns {
        let pos = header
            .get(column)
            .copied()
            .ok_or_else(|| LoadError::MissingColumn {
                column: column.clone(),
                row: header_row,
            })?;
        positions.push((column, pos));
    }
    let key_pos = header[&request.index_column];
    let value_columns: Vec<(&String, usize)> = positions
        .into_iter()
        .filter(|(c, _)| **c != request.index_column)
        .collect();

    let wanted: HashSet<&str> = request.row_keys.iter().map(String::as_str).collect();
    let mut key_rows: HashMap<String, usize> = HashMap::new();
    for (r, row) in raw.rows_from(header_row + 1) {
        let key = row.get(key_pos).map(Cell::label).unwrap_or_default();
        if key.is_empty() {
            continue;
        }
        if key_rows.contains_key(&key) {
            if wanted.contains(key.as_str()) {
                return Err(LoadError::DuplicateRowKey { key });
            }
            continue;
        }
        key_rows.insert(key, r);
    }
    debug!(source_rows = key_rows.len(), "indexed source rows");

    let mut seen: HashSet<&str> = HashSet::new();
    let mut values = Vec::with_capacity(request.row_keys.len());
    for key in &request.row_keys {
        if !seen.insert(key.as_str()) {
            return Err(LoadError::RepeatedRequest(key.clone()));
        }
        let r = *key_rows
            .get(key)
            .ok_or_else(|| LoadError::MissingRowKey(key.clone()))?;
        let row = value_columns
            .iter()
            .map(|(column, c)| parse_value(raw.cell(r, *c), key, column))
            .collect::<Result<Vec<_>, _>>()?;
        values.push(row);
    }

    Ok(Table::new(
        request.index_column.clone(),
        request.column_axis.clone(),
        request.row_keys.clone(),
        value_columns.iter().map(|(c, _)| (*c).clone()).collect(),
        values,
    )?)
}

fn parse_value(cell: &Cell, key: &str, column: &str) -> Result<Option<f64>, LoadError> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(n) if n.is_nan() => Ok(None),
        Cell::Number(n) => Ok(Some(*n)),
        Cell::Text(s) if s == MISSING_MARKER => Ok(None),
        Cell::Text(s) => s
            .parse::<f64>()
            .map(|v| (!v.is_nan()).then_some(v))
            .map_err(|_| LoadError::MalformedValue {
                key: key.to_string(),
                column: column.to_string(),
                value: s.clone(),
            }),
    }
}
