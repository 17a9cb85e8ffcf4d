use anyhow::Result;
use clap::Parser;
use reqwest::blocking::Client;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wdiscraper::{analysis, AnalysisConfig};

/// Download World Bank indicators, print statistics and write charts.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML file overriding the built-in analysis settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the PNG charts (overrides the config)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) settings ─────────────────────────────────────────────────
    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => AnalysisConfig::from_yaml_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(dir) = args.out_dir {
        cfg.output_dir = dir;
    }
    info!(
        countries = cfg.countries.len(),
        years = cfg.years.len(),
        out = %cfg.output_dir.display(),
        "startup"
    );

    // ─── 3) load, report, plot ───────────────────────────────────────
    let client = Client::builder().gzip(true).build()?;
    analysis::run(&client, &cfg)?;

    info!("all done");
    Ok(())
}
