use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use strataplot::config::AppConfig;
use strataplot::loader::{self, NHANES_URL};
use strataplot::report::{run_report, Report, ReportBlock};
use strataplot::surface::HtmlSurface;
use strataplot::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "strataplot")]
#[command(about = "Render stratified bivariate charts from a CSV survey extract into an HTML page", long_about = None)]
struct Args {
    /// CSV source: http(s) URL, file path, or '-' for stdin
    #[arg(default_value = NHANES_URL)]
    source: String,

    /// Output directory for chart files and index.html
    #[arg(short, long, default_value = "report")]
    out: PathBuf,

    /// Report script (JSON). Defaults to the built-in NHANES report.
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Chart request to render instead of a report (repeatable),
    /// e.g. 'scatter(x: BMXLEG, y: BMXARML) | facet(row: RIAGENDRx)'
    #[arg(long = "chart", conflicts_with = "report")]
    charts: Vec<String>,

    /// Settings file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    if let Some(format) = args.format {
        config.render.format = format;
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }

    let mut report = if !args.charts.is_empty() {
        Report {
            blocks: args.charts.iter().map(|c| ReportBlock::chart(c)).collect(),
            ..Default::default()
        }
    } else if let Some(path) = &args.report {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report {}", path.display()))?;
        Report::from_json(&text)
            .with_context(|| format!("Invalid report {}", path.display()))?
    } else {
        Report::nhanes()
    };
    if let Some(page) = config.page.clone() {
        report.page = page;
    }

    let table = loader::load(&args.source, &config.loader)
        .with_context(|| format!("Failed to load data from {}", args.source))?;

    let mut surface = HtmlSurface::new(&args.out);
    let summary = run_report(&table, &report, &mut surface, &config.render)
        .context("Failed to write report")?;

    log::info!(
        "{} of {} chart request(s) rendered, {} artifact(s) in {}",
        summary.charts_requested - summary.failed.len(),
        summary.charts_requested,
        summary.artifacts_shown,
        surface.index_path().display()
    );

    Ok(())
}
