// src/config.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::loader::LoadRequest;

const ARCHIVE_BASE: &str = "https://api.worldbank.org/v2/en/indicator";

/// One remote indicator series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSource {
    pub url: String,
    /// Human-readable name used in printed headings and bar chart titles.
    pub label: String,
}

impl IndicatorSource {
    fn archive(code: &str, label: &str) -> Self {
        Self {
            url: format!("{ARCHIVE_BASE}/{code}?downloadformat=excel"),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Indicators {
    pub gdp: IndicatorSource,
    pub arable_land: IndicatorSource,
    pub forest_area: IndicatorSource,
    pub urban: IndicatorSource,
    pub electricity: IndicatorSource,
    pub agriculture: IndicatorSource,
    pub co2: IndicatorSource,
}

impl Default for Indicators {
    fn default() -> Self {
        Self {
            gdp: IndicatorSource::archive("NY.GDP.MKTP.KD.ZG", "GDP growth (annual %)"),
            arable_land: IndicatorSource::archive("AG.LND.ARBL.ZS", "Arable land (% of land area)"),
            forest_area: IndicatorSource::archive("AG.LND.FRST.ZS", "Forest area (% of land area)"),
            urban: IndicatorSource::archive("SP.URB.GROW", "Urban population growth (annual %)"),
            electricity: IndicatorSource::archive(
                "EG.ELC.FOSL.ZS",
                "Electricity production from oil, gas and coal sources (% of total)",
            ),
            agriculture: IndicatorSource::archive(
                "NV.AGR.TOTL.ZS",
                "Agriculture, forestry, and fishing, value added (% of GDP)",
            ),
            co2: IndicatorSource::archive("EN.ATM.CO2E.PC", "CO2 emissions (metric tons per capita)"),
        }
    }
}

impl Indicators {
    pub fn all(&self) -> [(&'static str, &IndicatorSource); 7] {
        [
            ("gdp", &self.gdp),
            ("arable_land", &self.arable_land),
            ("forest_area", &self.forest_area),
            ("urban", &self.urban),
            ("electricity", &self.electricity),
            ("agriculture", &self.agriculture),
            ("co2", &self.co2),
        ]
    }
}

/// Settings for one analysis run. `Default` reproduces the stock run; a
/// YAML file may override any subset of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sheet: String,
    pub header_skip: usize,
    pub index_column: String,
    pub years: Vec<String>,
    pub countries: Vec<String>,
    /// Years shown side by side in the grouped bar charts.
    pub bar_years: Vec<String>,
    /// Countries that get a per-indicator correlation heatmap.
    pub focus_countries: Vec<String>,
    pub indicators: Indicators,
    pub output_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sheet: "Data".to_string(),
            header_skip: 3,
            index_column: "Country Name".to_string(),
            years: (2010..=2022).map(|y| y.to_string()).collect(),
            countries: [
                "Germany",
                "United States",
                "United Kingdom",
                "Pakistan",
                "China",
                "Panama",
                "Norway",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            bar_years: (2019..=2022).map(|y| y.to_string()).collect(),
            focus_countries: vec!["Germany".to_string(), "Panama".to_string()],
            indicators: Indicators::default(),
            output_dir: PathBuf::from("charts"),
        }
    }
}

impl AnalysisConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: AnalysisConfig = serde_yaml::from_str(text).context("parsing config yaml")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("loading config {:?}", path))
    }

    pub fn validate(&self) -> Result<()> {
        if self.countries.is_empty() {
            bail!("config lists no countries");
        }
        if self.years.is_empty() {
            bail!("config lists no years");
        }
        if let Some(y) = self.bar_years.iter().find(|y| !self.years.contains(y)) {
            bail!("bar year `{}` is not one of the loaded years", y);
        }
        if let Some(c) = self
            .focus_countries
            .iter()
            .find(|c| !self.countries.contains(c))
        {
            bail!("focus country `{}` is not one of the loaded countries", c);
        }
        Ok(())
    }

    /// The loader request for one indicator: index column followed by the
    /// configured years, rows in configured country order.
    pub fn request_for(&self, source: &IndicatorSource) -> LoadRequest {
        let mut columns = Vec::with_capacity(self.years.len() + 1);
        columns.push(self.index_column.clone());
        columns.extend(self.years.iter().cloned());

        LoadRequest {
            source: source.url.clone(),
            sheet: self.sheet.clone(),
            header_skip: self.header_skip,
            columns,
            index_column: self.index_column.clone(),
            column_axis: "Year".to_string(),
            row_keys: self.countries.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_the_stock_run() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.years.first().map(String::as_str), Some("2010"));
        assert_eq!(cfg.years.last().map(String::as_str), Some("2022"));
        assert_eq!(cfg.years.len(), 13);
        assert_eq!(cfg.countries.len(), 7);
        assert_eq!(
            cfg.indicators.gdp.url,
            "https://api.worldbank.org/v2/en/indicator/NY.GDP.MKTP.KD.ZG?downloadformat=excel"
        );
        cfg.validate().unwrap();
    }

    #[test]
    fn request_puts_index_first() {
        let cfg = AnalysisConfig::default();
        let req = cfg.request_for(&cfg.indicators.co2);
        assert_eq!(req.columns[0], "Country Name");
        assert_eq!(req.columns.len(), 14);
        assert_eq!(req.header_skip, 3);
        assert_eq!(req.sheet, "Data");
        assert_eq!(req.row_keys, cfg.countries);
        assert!(req.source.contains("EN.ATM.CO2E.PC"));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            "countries: [Germany, Panama]\nyears: ['2019', '2020', '2021', '2022']\noutput_dir: out\nindicators:\n  gdp:\n    url: https://example.org/gdp.xlsx\n    label: GDP"
        )?;

        let cfg = AnalysisConfig::from_yaml_file(file.path())?;
        assert_eq!(cfg.countries, vec!["Germany", "Panama"]);
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
        assert_eq!(cfg.indicators.gdp.url, "https://example.org/gdp.xlsx");
        assert_eq!(cfg.indicators.co2, Indicators::default().co2);
        assert_eq!(cfg.header_skip, 3);
        Ok(())
    }

    #[test]
    fn inconsistent_yaml_is_rejected() {
        let err = AnalysisConfig::from_yaml_str("countries: [Norway]\n").unwrap_err();
        assert!(format!("{err:#}").contains("focus country"));

        let err = AnalysisConfig::from_yaml_str("years: ['2010']\n").unwrap_err();
        assert!(format!("{err:#}").contains("bar year"));
    }
}
