// src/analysis.rs
//! The fixed analysis pass: load every indicator, print tables and
//! statistics, write the charts.

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::config::{AnalysisConfig, IndicatorSource};
use crate::loader::load;
use crate::plot::{self, named_color, palette_color, Series};
use crate::report;
use crate::stats;
use crate::table::{combine_columns, ColumnSource, IndicatorTable, Table, TransposedTable};

const GDP_COLORS: &[&str] = &["purple", "magenta", "blue", "green", "yellow", "red", "black"];
const ARABLE_COLORS: &[&str] = &["red", "blue", "green", "orange", "purple", "cyan", "brown"];
const ELECTRICITY_COLORS: &[&str] = &[
    "orange", "pink", "cyan", "purple", "green", "red", "blue", "yellow", "brown", "gray", "teal",
    "magenta", "purple", "orange", "blue",
];

/// One indicator as loaded: countries × years and its transpose.
#[derive(Debug, Clone)]
pub struct IndicatorData {
    pub table: IndicatorTable,
    pub transposed: TransposedTable,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub gdp: IndicatorData,
    pub arable_land: IndicatorData,
    pub forest_area: IndicatorData,
    pub urban: IndicatorData,
    pub electricity: IndicatorData,
    pub agriculture: IndicatorData,
    pub co2: IndicatorData,
}

fn load_one(client: &Client, cfg: &AnalysisConfig, source: &IndicatorSource) -> Result<IndicatorData> {
    let request = cfg.request_for(source);
    let (table, transposed) =
        load(client, &request).with_context(|| format!("loading {}", source.label))?;
    info!(indicator = %source.label, shape = ?table.shape(), "loaded");
    Ok(IndicatorData { table, transposed })
}

/// Load every configured indicator, one after the other. The first failure
/// aborts the whole load.
pub fn load_all(client: &Client, cfg: &AnalysisConfig) -> Result<Dataset> {
    let ind = &cfg.indicators;
    Ok(Dataset {
        arable_land: load_one(client, cfg, &ind.arable_land)?,
        forest_area: load_one(client, cfg, &ind.forest_area)?,
        gdp: load_one(client, cfg, &ind.gdp)?,
        urban: load_one(client, cfg, &ind.urban)?,
        electricity: load_one(client, cfg, &ind.electricity)?,
        agriculture: load_one(client, cfg, &ind.agriculture)?,
        co2: load_one(client, cfg, &ind.co2)?,
    })
}

/// Year-indexed table of every indicator for one country.
pub fn country_profile(data: &Dataset, country: &str) -> Result<Table> {
    let parts = [
        ("Urban pop. growth", &data.urban),
        ("Electricity production", &data.electricity),
        ("Agric. forestry and Fisheries", &data.agriculture),
        ("CO2 Emissions", &data.co2),
        ("Forest Area", &data.forest_area),
        ("GDP Annual Growth", &data.gdp),
    ];
    let sources: Vec<ColumnSource<'_>> = parts
        .iter()
        .map(|(label, d)| ColumnSource {
            label,
            table: &d.transposed,
            column: country,
        })
        .collect();
    Ok(combine_columns("Indicator", &sources)?)
}

/// One line per country from a year-indexed table.
pub fn country_series(
    transposed: &TransposedTable,
    countries: &[String],
    colors: &[&str],
) -> Result<Vec<Series>> {
    countries
        .iter()
        .enumerate()
        .map(|(i, country)| {
            let values = transposed
                .column(country)
                .ok_or_else(|| anyhow!("no column for `{}`", country))?;
            let color = colors
                .get(i)
                .and_then(|c| named_color(c))
                .unwrap_or_else(|| palette_color(i));
            Ok(Series {
                label: country.clone(),
                values,
                color,
            })
        })
        .collect()
}

/// One bar group member per year, each across all countries of a
/// country-indexed table.
pub fn year_groups(table: &IndicatorTable, years: &[String]) -> Result<Vec<Series>> {
    years
        .iter()
        .enumerate()
        .map(|(i, year)| {
            let values = table
                .column(year)
                .ok_or_else(|| anyhow!("no column for year `{}`", year))?;
            Ok(Series {
                label: format!("Year {year}"),
                values,
                color: palette_color(i),
            })
        })
        .collect()
}

/// File-name friendly form of a label.
pub fn slug(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// 0.2 per bar, narrower when more groups would overflow a category slot.
fn bar_width(members: usize) -> f64 {
    (0.8 / members.max(1) as f64).min(0.2)
}

fn correlation_heading(a: &IndicatorSource, b: &IndicatorSource) -> String {
    format!("Correlation between {} and {}", a.label, b.label)
}

fn chart_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.png", slug(name)))
}

/// Print every table and statistic and write every chart. Returns the chart
/// paths in the order they were written.
pub fn report_all(cfg: &AnalysisConfig, data: &Dataset) -> Result<Vec<PathBuf>> {
    let out = &cfg.output_dir;
    let ind = &cfg.indicators;
    let mut charts = Vec::new();

    // GDP growth
    report::print_table(&format!("{} by year", ind.gdp.label), &data.gdp.transposed);
    report::print_table(
        &format!("{} statistics", ind.gdp.label),
        &stats::describe(&data.gdp.transposed)?,
    );
    let path = chart_path(out, "gdp_growth");
    plot::line_plot(
        data.gdp.transposed.index(),
        &country_series(&data.gdp.transposed, &cfg.countries, GDP_COLORS)?,
        "Years",
        "(%) GDP Growth",
        "Annual (%) GDP Growth Countries",
        &path,
    )
    .context("GDP line chart")?;
    charts.push(path);

    // arable land vs forest area
    report::print_table(&ind.arable_land.label, &data.arable_land.transposed);
    report::print_table(&ind.forest_area.label, &data.forest_area.transposed);
    report::print_series(
        &correlation_heading(&ind.arable_land, &ind.forest_area),
        "Country Name",
        &stats::corrwith(&data.arable_land.transposed, &data.forest_area.transposed),
    );
    let path = chart_path(out, "arable_land");
    plot::line_plot(
        data.arable_land.transposed.index(),
        &country_series(&data.arable_land.transposed, &cfg.countries, ARABLE_COLORS)?,
        "Years",
        "Arable Land (% of land area)",
        "Arable Land vs. Forest Area for Countries",
        &path,
    )
    .context("arable land line chart")?;
    charts.push(path);

    // urban population growth
    let path = chart_path(out, "urban_growth");
    plot::bar_plot(
        data.urban.table.index(),
        &year_groups(&data.urban.table, &cfg.bar_years)?,
        bar_width(cfg.bar_years.len()),
        "Urban growth",
        &ind.urban.label,
        false,
        &path,
    )
    .context("urban growth bar chart")?;
    charts.push(path);

    // per-country indicator correlations
    for country in &cfg.focus_countries {
        let profile = country_profile(data, country)?;
        report::print_table(&format!("{country}: indicators by year"), &profile);
        let corr = stats::correlation_matrix(&profile)?;
        report::print_table(&format!("{country}: indicator correlations"), &corr);

        let path = chart_path(out, &format!("correlation_{country}"));
        plot::correlation_heatmap(&corr, country, &path)
            .with_context(|| format!("{country} heatmap"))?;
        charts.push(path);
    }

    // electricity production
    let path = chart_path(out, "electricity");
    plot::line_plot(
        data.electricity.transposed.index(),
        &country_series(&data.electricity.transposed, &cfg.countries, ELECTRICITY_COLORS)?,
        "Years",
        "(%) Electricity Production",
        "Annual (%) of Electricity Production of different Countries",
        &path,
    )
    .context("electricity line chart")?;
    charts.push(path);

    // agriculture share of GDP
    let path = chart_path(out, "agriculture");
    plot::bar_plot(
        data.agriculture.table.index(),
        &year_groups(&data.agriculture.table, &cfg.bar_years)?,
        bar_width(cfg.bar_years.len()),
        "% of GDP",
        &ind.agriculture.label,
        true,
        &path,
    )
    .context("agriculture bar chart")?;
    charts.push(path);

    Ok(charts)
}

/// Load, report, plot.
pub fn run(client: &Client, cfg: &AnalysisConfig) -> Result<()> {
    let start = Instant::now();
    let data = load_all(client, cfg)?;
    info!(elapsed = ?start.elapsed(), "all indicators loaded");

    let charts = report_all(cfg, &data)?;
    info!(
        charts = charts.len(),
        dir = %cfg.output_dir.display(),
        elapsed = ?start.elapsed(),
        "analysis finished"
    );
    Ok(())
}
