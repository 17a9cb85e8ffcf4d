// src/plot.rs
//! PNG charts: multi-series line charts, grouped bar charts and annotated
//! correlation heatmaps, drawn with [`plotters`] on a bitmap backend.
//!
//! Every chart is 1600x1200. The x axis of line and bar charts is the
//! position of each label (0, 1, 2, ...) with the label text substituted by
//! a formatter, so arbitrary string labels (years, countries) line up with
//! integer ticks.

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use thiserror::Error;

use crate::table::Table;

const SIZE: (u32, u32) = (1600, 1200);
const COLORBAR_WIDTH: u32 = 180;
/// Height of one legend entry at the 18px label font, box padding included.
const LEGEND_ROW_PX: f64 = 28.0;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to save plot to file: {0}")]
    FileSave(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

/// One named line or bar group.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub values: Vec<Option<f64>>,
    pub color: RGBColor,
}

/// Colours referred to by name in the analysis settings.
pub fn named_color(name: &str) -> Option<RGBColor> {
    let c = match name.to_ascii_lowercase().as_str() {
        "black" => RGBColor(0, 0, 0),
        "blue" => RGBColor(31, 119, 180),
        "brown" => RGBColor(140, 86, 75),
        "cyan" => RGBColor(23, 190, 207),
        "gray" | "grey" => RGBColor(127, 127, 127),
        "green" => RGBColor(44, 160, 44),
        "magenta" => RGBColor(227, 30, 200),
        "orange" => RGBColor(255, 127, 14),
        "pink" => RGBColor(247, 129, 191),
        "purple" => RGBColor(148, 103, 189),
        "red" => RGBColor(214, 39, 40),
        "teal" => RGBColor(0, 128, 128),
        "yellow" => RGBColor(230, 200, 0),
        _ => return None,
    };
    Some(c)
}

/// Fallback cycle for series without an explicit colour.
pub fn palette_color(i: usize) -> RGBColor {
    const CYCLE: [&str; 10] = [
        "blue", "orange", "green", "red", "purple", "brown", "pink", "gray", "yellow", "cyan",
    ];
    named_color(CYCLE[i % CYCLE.len()]).unwrap_or(BLACK)
}

/// Diverging blue-white-red scale over [-1, 1].
pub fn coolwarm(v: f64) -> RGBColor {
    const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let v = v.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 {
        (COOL, MID, v + 1.0)
    } else {
        (MID, WARM, v)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

/// Label for tick `x` if it sits on an integer position, else blank.
fn tick_label(labels: &[String], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    labels.get(i as usize).cloned().unwrap_or_default()
}

/// (min, max) of all present values, padded so the data never touches the
/// frame. `None` when nothing is present.
fn value_range<'a>(values: impl Iterator<Item = &'a Option<f64>>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if lo > hi {
        return None;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    Some((lo - pad, hi + pad))
}

/// Raise the top of a y range so a legend of `entries` rows in the upper
/// corner sits above the data. `plot_px` is the height of the plotting area.
fn with_legend_headroom((lo, hi): (f64, f64), entries: usize, plot_px: f64) -> (f64, f64) {
    let share = (LEGEND_ROW_PX * (entries + 1) as f64 / plot_px).clamp(0.0, 0.5);
    (lo, hi + (hi - lo) * share / (1.0 - share))
}

/// Contiguous runs of present values as `(x, y)` points.
fn present_runs(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(y) => current.push((i as f64, *y)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn check_series(x_len: usize, series: &[Series]) -> Result<()> {
    if x_len == 0 || series.is_empty() {
        return Err(PlotError::InvalidData("nothing to plot".to_string()));
    }
    if let Some(s) = series.iter().find(|s| s.values.len() != x_len) {
        return Err(PlotError::InvalidData(format!(
            "series `{}` has {} values for {} labels",
            s.label,
            s.values.len(),
            x_len
        )));
    }
    Ok(())
}

fn ensure_parent(output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// One line per series over shared x labels. Gaps in a series break its
/// line rather than bridging the missing points.
pub fn line_plot(
    x_labels: &[String],
    series: &[Series],
    x_desc: &str,
    y_desc: &str,
    title: &str,
    output_path: &Path,
) -> Result<()> {
    check_series(x_labels.len(), series)?;
    let (y_lo, y_hi) = value_range(series.iter().flat_map(|s| s.values.iter()))
        .ok_or_else(|| PlotError::InvalidData("every value is missing".to_string()))?;
    ensure_parent(output_path)?;

    let root = BitMapBackend::new(output_path, SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let x_max = (x_labels.len() - 1) as f64;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.25..x_max + 0.25, y_lo..y_hi)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let x_fmt = |x: &f64| tick_label(x_labels, *x);
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_labels(x_labels.len())
        .x_label_formatter(&x_fmt)
        .label_style(("sans-serif", 20))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    for s in series {
        let color = s.color;
        // empty series carries the legend entry; the runs carry the data
        chart
            .draw_series(LineSeries::new(std::iter::empty::<(f64, f64)>(), color.stroke_width(2)))
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(s.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        for run in present_runs(&s.values) {
            chart
                .draw_series(LineSeries::new(run, color.stroke_width(2)))
                .map_err(|e| PlotError::Drawing(e.to_string()))?;
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", 18))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

/// Bar spans for one category: the group is centred on the category's
/// integer position, one bar of `width` per series.
fn bar_span(category: usize, member: usize, members: usize, width: f64) -> (f64, f64) {
    let offset = width * (member as f64 - (members as f64 - 1.0) / 2.0);
    let centre = category as f64 + offset;
    (centre - width / 2.0, centre + width / 2.0)
}

/// Grouped bars: for each category one bar per series, side by side.
/// `rotate_labels` turns category labels vertical for long names.
pub fn bar_plot(
    categories: &[String],
    groups: &[Series],
    width: f64,
    y_desc: &str,
    title: &str,
    rotate_labels: bool,
    output_path: &Path,
) -> Result<()> {
    check_series(categories.len(), groups)?;
    if !(width > 0.0) || width * groups.len() as f64 > 1.0 {
        return Err(PlotError::InvalidData(format!(
            "bar width {width} does not fit {} bars per group",
            groups.len()
        )));
    }
    let zero = Some(0.0);
    let (y_lo, y_hi) = value_range(
        groups
            .iter()
            .flat_map(|g| g.values.iter())
            .chain(std::iter::once(&zero)),
    )
    .ok_or_else(|| PlotError::InvalidData("every value is missing".to_string()))?;
    let x_label_area: u32 = if rotate_labels { 180 } else { 60 };
    // margins and caption take roughly 80px
    let plot_px = f64::from(SIZE.1 - x_label_area - 80);
    let (y_lo, y_hi) = with_legend_headroom((y_lo, y_hi), groups.len(), plot_px);
    ensure_parent(output_path)?;

    let root = BitMapBackend::new(output_path, SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let half = width * groups.len() as f64 / 2.0 + 0.1;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(x_label_area)
        .y_label_area_size(80)
        .build_cartesian_2d(-half..(categories.len() - 1) as f64 + half, y_lo..y_hi)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let label_style = if rotate_labels {
        ("sans-serif", 20).into_font().transform(FontTransform::Rotate90)
    } else {
        ("sans-serif", 20).into_font()
    };
    let x_fmt = |x: &f64| tick_label(categories, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc(y_desc)
        .x_labels(categories.len())
        .x_label_formatter(&x_fmt)
        .x_label_style(label_style)
        .y_label_style(("sans-serif", 20))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    for (member, group) in groups.iter().enumerate() {
        let color = group.color;
        let bars = group.values.iter().enumerate().filter_map(|(cat, v)| {
            let v = (*v)?;
            let (x0, x1) = bar_span(cat, member, groups.len(), width);
            Some(Rectangle::new([(x0, 0.0), (x1, v)], color.filled()))
        });
        chart
            .draw_series(bars)
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(group.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", 18))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

/// Correlation matrix as a coloured grid with every coefficient written in
/// its cell and a colour bar on the right. Row 0 is drawn at the top.
pub fn correlation_heatmap(matrix: &Table, title: &str, output_path: &Path) -> Result<()> {
    let (rows, cols) = matrix.shape();
    if rows == 0 || rows != cols {
        return Err(PlotError::InvalidData(format!(
            "correlation matrix must be square and non-empty, got {rows}x{cols}"
        )));
    }
    ensure_parent(output_path)?;
    let n = rows;
    let labels = matrix.columns().to_vec();
    let row_labels: Vec<String> = matrix.index().iter().rev().cloned().collect();

    let root = BitMapBackend::new(output_path, SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;
    let (grid_area, bar_area) = root.split_horizontally((SIZE.0 - COLORBAR_WIDTH) as i32);

    let span = -0.5..n as f64 - 0.5;
    let mut chart = ChartBuilder::on(&grid_area)
        .caption(title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(260)
        .y_label_area_size(260)
        .build_cartesian_2d(span.clone(), span)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let x_fmt = |x: &f64| tick_label(&labels, *x);
    let y_fmt = |y: &f64| tick_label(&row_labels, *y);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_label_style(("sans-serif", 18).into_font().transform(FontTransform::Rotate90))
        .y_label_style(("sans-serif", 18))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let cells: Vec<(f64, f64, Option<f64>)> = matrix
        .rows()
        .enumerate()
        .flat_map(|(i, (_, row))| {
            let y = (n - 1 - i) as f64;
            row.iter()
                .enumerate()
                .map(move |(j, v)| (j as f64, y, *v))
        })
        .collect();

    chart
        .draw_series(cells.iter().map(|&(x, y, v)| {
            let fill = v.map(coolwarm).unwrap_or(RGBColor(200, 200, 200));
            Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], fill.filled())
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let annotation = ("sans-serif", 20)
        .into_font()
        .color(&WHITE)
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart
        .draw_series(cells.iter().map(|&(x, y, v)| {
            let text = v.map_or_else(|| "nan".to_string(), |v| format!("{v:.2}"));
            Text::new(text, (x, y), annotation.clone())
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    draw_colorbar(&bar_area)?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

fn draw_colorbar<DB: DrawingBackend>(area: &DrawingArea<DB, plotters::coord::Shift>) -> Result<()> {
    const STEPS: usize = 100;
    let mut bar = ChartBuilder::on(area)
        .margin_top(80)
        .margin_bottom(280)
        .margin_right(20)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..1.0, -1.0..1.0)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(5)
        .y_label_style(("sans-serif", 16))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let step = 2.0 / STEPS as f64;
    bar.draw_series((0..STEPS).map(|i| {
        let lo = -1.0 + i as f64 * step;
        Rectangle::new([(0.0, lo), (1.0, lo + step)], coolwarm(lo + step / 2.0).filled())
    }))
    .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn series(label: &str, values: Vec<Option<f64>>) -> Series {
        Series {
            label: label.to_string(),
            values,
            color: BLUE,
        }
    }

    #[test]
    fn named_colours_resolve_case_insensitively() {
        assert_eq!(named_color("Red"), named_color("red"));
        assert!(named_color("red").is_some());
        assert!(named_color("chartreuse").is_none());
        assert_eq!(palette_color(0), palette_color(10));
    }

    #[test]
    fn coolwarm_ends_and_midpoint() {
        assert_eq!(coolwarm(-1.0), RGBColor(59, 76, 192));
        assert_eq!(coolwarm(0.0), RGBColor(221, 221, 221));
        assert_eq!(coolwarm(1.0), RGBColor(180, 4, 38));
        assert_eq!(coolwarm(7.0), coolwarm(1.0));
    }

    #[test]
    fn tick_labels_only_on_integer_positions() {
        let l = labels(&["2019", "2020"]);
        assert_eq!(tick_label(&l, 0.0), "2019");
        assert_eq!(tick_label(&l, 1.0000000001), "2020");
        assert_eq!(tick_label(&l, 0.5), "");
        assert_eq!(tick_label(&l, -1.0), "");
        assert_eq!(tick_label(&l, 2.0), "");
    }

    #[test]
    fn runs_split_on_missing_values() {
        let runs = present_runs(&[Some(1.0), Some(2.0), None, None, Some(5.0)]);
        assert_eq!(runs, vec![vec![(0.0, 1.0), (1.0, 2.0)], vec![(4.0, 5.0)]]);
        assert!(present_runs(&[None]).is_empty());
    }

    #[test]
    fn value_range_pads_and_handles_flat_data() {
        let vals = [Some(0.0), None, Some(10.0)];
        let (lo, hi) = value_range(vals.iter()).unwrap();
        assert!((lo + 0.5).abs() < 1e-9 && (hi - 10.5).abs() < 1e-9);
        let flat = [Some(3.0)];
        assert_eq!(value_range(flat.iter()), Some((2.0, 4.0)));
        assert_eq!(value_range([None].iter()), None);
    }

    #[test]
    fn legend_headroom_keeps_tall_bars_clear() {
        // seven countries by four years: five legend rows over 900px
        let (lo, hi) = with_legend_headroom((0.0, 10.0), 4, 900.0);
        assert_eq!(lo, 0.0);
        let legend_share = (hi - 10.0) / (hi - lo);
        assert!((legend_share - 140.0 / 900.0).abs() < 1e-9);

        // huge legends are capped at half the chart
        let (_, hi) = with_legend_headroom((-5.0, 5.0), 100, 900.0);
        assert!((hi - 15.0).abs() < 1e-9);
    }

    #[test]
    fn bar_groups_are_centred_on_categories() {
        // four bars of 0.2: centres at -0.3, -0.1, 0.1, 0.3 around the category
        let (x0, x1) = bar_span(2, 0, 4, 0.2);
        assert!((x0 - 1.6).abs() < 1e-9 && (x1 - 1.8).abs() < 1e-9);
        let (x0, x1) = bar_span(2, 3, 4, 0.2);
        assert!((x0 - 2.2).abs() < 1e-9 && (x1 - 2.4).abs() < 1e-9);
    }

    #[test]
    fn invalid_inputs_are_rejected_before_drawing() {
        let path = std::env::temp_dir().join("wdiscraper_invalid.png");
        let x = labels(&["2020", "2021"]);

        let result = line_plot(&x, &[], "x", "y", "t", &path);
        assert!(matches!(result, Err(PlotError::InvalidData(_))));

        let short = series("Germany", vec![Some(1.0)]);
        let result = line_plot(&x, &[short], "x", "y", "t", &path);
        assert!(matches!(result, Err(PlotError::InvalidData(_))));

        let blank = series("Germany", vec![None, None]);
        let result = line_plot(&x, &[blank], "x", "y", "t", &path);
        assert!(matches!(result, Err(PlotError::InvalidData(_))));

        let wide = vec![series("a", vec![Some(1.0), Some(2.0)]); 4];
        let result = bar_plot(&x, &wide, 0.3, "y", "t", false, &path);
        assert!(matches!(result, Err(PlotError::InvalidData(_))));

        let not_square = Table::new(
            "",
            "",
            labels(&["a"]),
            labels(&["a", "b"]),
            vec![vec![Some(1.0), None]],
        )
        .unwrap();
        let result = correlation_heatmap(&not_square, "t", &path);
        assert!(matches!(result, Err(PlotError::InvalidData(_))));
    }

    #[test]
    #[ignore = "Font rendering not available in test environment"]
    fn renders_all_chart_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let x = labels(&["2019", "2020", "2021"]);
        let lines = vec![
            series("Germany", vec![Some(1.1), Some(-3.8), Some(3.2)]),
            series("Panama", vec![Some(3.0), None, Some(15.8)]),
        ];

        let line_path = dir.path().join("line.png");
        line_plot(&x, &lines, "Years", "%", "GDP", &line_path).unwrap();
        assert!(line_path.exists());

        let bar_path = dir.path().join("bar.png");
        bar_plot(&x, &lines, 0.2, "%", "GDP", true, &bar_path).unwrap();
        assert!(bar_path.exists());

        let m = Table::new(
            "",
            "",
            labels(&["a", "b"]),
            labels(&["a", "b"]),
            vec![vec![Some(1.0), Some(-0.4)], vec![Some(-0.4), Some(1.0)]],
        )
        .unwrap();
        let heat_path = dir.path().join("heat.png");
        correlation_heatmap(&m, "Germany", &heat_path).unwrap();
        assert!(heat_path.exists());
    }
}
