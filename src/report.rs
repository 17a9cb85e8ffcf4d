// src/report.rs
use prettytable::{format, Cell, Row, Table as PrettyTable};

use crate::table::Table;

const DEFAULT_PRECISION: usize = 6;

fn fmt_value(v: Option<f64>, precision: usize) -> String {
    match v {
        Some(x) => format!("{:.*}", precision, x),
        None => "NaN".to_string(),
    }
}

/// Box-drawn rendering of `table`: header row of column labels, one row per
/// index label, values right aligned.
pub fn render_table(table: &Table, precision: usize) -> PrettyTable {
    let mut out = PrettyTable::new();
    out.set_format(*format::consts::FORMAT_BOX_CHARS);

    let mut header = vec![Cell::new(table.index_name()).style_spec("bFg")];
    header.extend(table.columns().iter().map(|c| Cell::new(c).style_spec("bFg")));
    out.set_titles(Row::new(header));

    for (label, values) in table.rows() {
        let mut cells = vec![Cell::new(label).style_spec("b")];
        cells.extend(
            values
                .iter()
                .map(|v| Cell::new(&fmt_value(*v, precision)).style_spec("r")),
        );
        out.add_row(Row::new(cells));
    }
    out
}

/// Two-column rendering of a labelled series, e.g. one correlation per
/// country.
pub fn render_series(
    label_title: &str,
    value_title: &str,
    values: &[(String, Option<f64>)],
) -> PrettyTable {
    let mut out = PrettyTable::new();
    out.set_format(*format::consts::FORMAT_BOX_CHARS);
    out.set_titles(Row::new(vec![
        Cell::new(label_title).style_spec("bFg"),
        Cell::new(value_title).style_spec("bFg"),
    ]));
    for (label, v) in values {
        out.add_row(Row::new(vec![
            Cell::new(label),
            Cell::new(&fmt_value(*v, DEFAULT_PRECISION)).style_spec("r"),
        ]));
    }
    out
}

pub fn print_table(heading: &str, table: &Table) {
    println!("\n--- {} ---", heading);
    render_table(table, DEFAULT_PRECISION).printstd();
}

pub fn print_series(heading: &str, label_title: &str, values: &[(String, Option<f64>)]) {
    println!("\n--- {} ---", heading);
    render_series(label_title, "value", values).printstd();
}
