// src/stats.rs
//! Descriptive statistics and Pearson correlations over table columns.
//! Missing cells are skipped; correlations use pairwise-complete rows.

use crate::table::{Table, TableError};

/// Row labels of a [`describe`] table, in order.
pub const DESCRIBE_ROWS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1).
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    pub fn of(values: &[Option<f64>]) -> Self {
        let mut xs: Vec<f64> = values.iter().flatten().copied().collect();
        xs.sort_by(f64::total_cmp);

        let n = xs.len();
        let mean = if n == 0 {
            f64::NAN
        } else {
            xs.iter().sum::<f64>() / n as f64
        };
        let std = if n < 2 {
            f64::NAN
        } else {
            let ss: f64 = xs.iter().map(|x| (x - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        };

        ColumnSummary {
            count: n,
            mean,
            std,
            min: xs.first().copied().unwrap_or(f64::NAN),
            q25: quantile(&xs, 0.25),
            median: quantile(&xs, 0.5),
            q75: quantile(&xs, 0.75),
            max: xs.last().copied().unwrap_or(f64::NAN),
        }
    }

    fn as_column(&self) -> [f64; 8] {
        [
            self.count as f64,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }
}

/// Linear interpolation between closest ranks over sorted `xs`.
fn quantile(xs: &[f64], q: f64) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    let pos = q * (xs.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    xs[lo] + (xs[hi] - xs[lo]) * (pos - lo as f64)
}

fn some_finite(v: f64) -> Option<f64> {
    (!v.is_nan()).then_some(v)
}

/// Summary statistics for every column: a table indexed by statistic name
/// with the same columns as `table`. Undefined statistics are missing.
pub fn describe(table: &Table) -> Result<Table, TableError> {
    let summaries: Vec<[f64; 8]> = table
        .columns()
        .iter()
        .map(|c| ColumnSummary::of(&table.column(c).unwrap_or_default()).as_column())
        .collect();

    let values = (0..DESCRIBE_ROWS.len())
        .map(|stat| summaries.iter().map(|s| some_finite(s[stat])).collect())
        .collect();

    Table::new(
        "",
        table.columns_name(),
        DESCRIBE_ROWS.iter().map(|s| s.to_string()).collect(),
        table.columns().to_vec(),
        values,
    )
}

/// Pearson correlation over the rows where both values are present.
/// `NaN` with fewer than two such rows or with zero variance.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Square matrix of pairwise column correlations, labelled by `table`'s
/// columns on both axes. The diagonal is exactly 1.0 for every column with
/// a defined correlation.
pub fn correlation_matrix(table: &Table) -> Result<Table, TableError> {
    let labels = table.columns().to_vec();
    let data: Vec<Vec<Option<f64>>> = labels
        .iter()
        .map(|c| table.column(c).unwrap_or_default())
        .collect();

    let mut values = vec![vec![None; labels.len()]; labels.len()];
    for i in 0..labels.len() {
        for j in i..labels.len() {
            let r = some_finite(pearson(&data[i], &data[j])).map(|r| if i == j { 1.0 } else { r });
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Table::new(
        table.columns_name(),
        table.columns_name(),
        labels.clone(),
        labels,
        values,
    )
}

/// Correlation of each column of `a` with the same-named column of `b`,
/// aligned on row labels present in both. Columns only one table has are
/// left out.
pub fn corrwith(a: &Table, b: &Table) -> Vec<(String, Option<f64>)> {
    let b_cols = b.column_positions();
    let shared_rows: Vec<(&[Option<f64>], &[Option<f64>])> = a
        .rows()
        .filter_map(|(label, row)| b.row(label).map(|other| (row, other)))
        .collect();

    a.columns()
        .iter()
        .enumerate()
        .filter_map(|(ai, label)| {
            let bi = *b_cols.get(label.as_str())?;
            let (xs, ys): (Vec<Option<f64>>, Vec<Option<f64>>) =
                shared_rows.iter().map(|(ra, rb)| (ra[ai], rb[bi])).unzip();
            Some((label.clone(), some_finite(pearson(&xs, &ys))))
        })
        .collect()
}
