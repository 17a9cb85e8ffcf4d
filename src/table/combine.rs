// src/table/combine.rs
use super::{Table, TableError};

/// One output column of [`combine_columns`]: take `column` from `table` and
/// call it `label`.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSource<'a> {
    pub label: &'a str,
    pub table: &'a Table,
    pub column: &'a str,
}

/// Build a new table from columns of several tables, aligned on index
/// labels. The output index is the union of the source indexes in
/// first-seen order; a label missing from one source leaves a gap.
pub fn combine_columns(
    columns_name: &str,
    sources: &[ColumnSource<'_>],
) -> Result<Table, TableError> {
    let index_name = sources
        .first()
        .map(|s| s.table.index_name().to_string())
        .unwrap_or_default();

    let mut index: Vec<String> = Vec::new();
    for src in sources {
        for label in src.table.index() {
            if !index.contains(label) {
                index.push(label.clone());
            }
        }
    }

    let mut values = vec![Vec::with_capacity(sources.len()); index.len()];
    for src in sources {
        let data = src
            .table
            .column(src.column)
            .ok_or_else(|| TableError::UnknownColumn {
                index_name: src.table.index_name().to_string(),
                column: src.column.to_string(),
            })?;
        for (row, label) in values.iter_mut().zip(&index) {
            let v = src
                .table
                .index()
                .iter()
                .position(|l| l == label)
                .and_then(|r| data[r]);
            row.push(v);
        }
    }

    Table::new(
        index_name,
        columns_name,
        index,
        sources.iter().map(|s| s.label.to_string()).collect(),
        values,
    )
}
