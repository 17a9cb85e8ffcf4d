// src/table/mod.rs
//! Labelled 2-D table of optional readings.
//!
//! A `Table` keeps its index labels (rows), its column labels and a dense
//! row-major grid of `Option<f64>`. An indicator table is indexed by country
//! with one column per year; its transpose is indexed by year with one
//! column per country. Both are the same type.

use std::collections::HashMap;

pub mod combine;

pub use combine::{combine_columns, ColumnSource};

/// Rows keyed by country name, columns keyed by year.
pub type IndicatorTable = Table;
/// Rows keyed by year, columns keyed by country name.
pub type TransposedTable = Table;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Name of the index axis, e.g. "Country Name" or "Year".
    index_name: String,
    /// Name of the column axis.
    columns_name: String,
    index: Vec<String>,
    columns: Vec<String>,
    /// `values[row][col]`
    values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TableError {
    #[error("expected {expected} rows, got {actual}")]
    RowCount { expected: usize, actual: usize },
    #[error("row `{row}` has {actual} values, expected {expected}")]
    RowWidth {
        row: String,
        expected: usize,
        actual: usize,
    },
    #[error("no column `{column}` in table indexed by `{index_name}`")]
    UnknownColumn { index_name: String, column: String },
}

impl Table {
    /// Build a table, checking that `values` is exactly `index.len()` ×
    /// `columns.len()`.
    pub fn new(
        index_name: impl Into<String>,
        columns_name: impl Into<String>,
        index: Vec<String>,
        columns: Vec<String>,
        values: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, TableError> {
        if values.len() != index.len() {
            return Err(TableError::RowCount {
                expected: index.len(),
                actual: values.len(),
            });
        }
        for (label, row) in index.iter().zip(&values) {
            if row.len() != columns.len() {
                return Err(TableError::RowWidth {
                    row: label.clone(),
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
        }
        Ok(Self {
            index_name: index_name.into(),
            columns_name: columns_name.into(),
            index,
            columns,
            values,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn columns_name(&self) -> &str {
        &self.columns_name
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.index.len(), self.columns.len())
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.index
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    /// Value at (row label, column label). `None` if either label is unknown
    /// or the cell is missing.
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.index.iter().position(|l| l == row)?;
        let c = self.columns.iter().position(|l| l == column)?;
        self.values[r][c]
    }

    /// All values of one column, in index order.
    pub fn column(&self, label: &str) -> Option<Vec<Option<f64>>> {
        let c = self.columns.iter().position(|l| l == label)?;
        Some(self.values.iter().map(|row| row[c]).collect())
    }

    /// Values of one row, in column order.
    pub fn row(&self, label: &str) -> Option<&[Option<f64>]> {
        let r = self.index.iter().position(|l| l == label)?;
        Some(&self.values[r])
    }

    /// Column label → position.
    pub(crate) fn column_positions(&self) -> HashMap<&str, usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect()
    }

    /// Swap rows and columns. No label is dropped or reordered.
    pub fn transpose(&self) -> Table {
        let mut values = vec![Vec::with_capacity(self.index.len()); self.columns.len()];
        for row in &self.values {
            for (c, v) in row.iter().enumerate() {
                values[c].push(*v);
            }
        }
        Table {
            index_name: self.columns_name.clone(),
            columns_name: self.index_name.clone(),
            index: self.columns.clone(),
            columns: self.index.clone(),
            values,
        }
    }
}
