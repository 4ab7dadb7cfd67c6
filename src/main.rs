use anyhow::{Context, Result};
use clap::Parser;
use evdash::parser::{self, DEFAULT_PIPELINE};
use evdash::{data, graph, preprocessor, runtime, DashboardConfig, OutputFormat};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "evdash")]
#[command(about = "Render electric vehicle population charts from a CSV dataset", long_about = None)]
struct Args {
    /// Dataset file (.csv or .json), or '-' for CSV on stdin
    dataset: PathBuf,

    /// Dashboard pipeline (e.g., 'utility(make: "TESLA", year: 2020) | range(top: 5)')
    pipeline: Option<String>,

    /// Define a pipeline variable referenced as $NAME
    #[arg(short = 'D', long = "var", value_name = "NAME=VALUE", value_parser = preprocessor::parse_definition)]
    vars: Vec<(String, String)>,

    /// Directory the chart images are written to
    #[arg(short, long, default_value = "dashboard")]
    out_dir: PathBuf,

    /// JSON file with render options, a default pipeline and variables
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Print the chart specifications as JSON instead of rendering images
    #[arg(long, conflicts_with = "choices")]
    spec: bool,

    /// Print the selectable makes and years as JSON
    #[arg(long)]
    choices: bool,

    /// Make whose model years are listed by --choices
    #[arg(long, requires = "choices")]
    make: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::default(),
    };

    let table = data::load_file(&args.dataset).context("Failed to load dataset")?;

    if args.choices {
        let choices = runtime::choices(&table, args.make.as_deref())?;
        return print_json(&choices);
    }

    // Command-line definitions override the config file's
    let mut vars = config.vars.clone();
    vars.extend(args.vars.iter().cloned());

    let source = args
        .pipeline
        .clone()
        .or_else(|| config.pipeline.clone())
        .unwrap_or_else(|| DEFAULT_PIPELINE.to_string());
    let source = preprocessor::expand_variables(&source, &vars)
        .context("Failed to expand pipeline variables")?;

    let dashboard = match parser::parse_dashboard(&source) {
        Ok((_, dashboard)) => dashboard,
        Err(e) => {
            eprintln!("Parse error: {:?}", e);
            std::process::exit(1);
        }
    };

    let charts = runtime::build_dashboard(&dashboard, &table).context("Failed to build dashboard")?;

    if args.spec {
        return print_json(&charts);
    }

    let mut options = config.render.clone();
    if let Some(width) = args.width {
        options.width = width;
    }
    if let Some(height) = args.height {
        options.height = height;
    }
    if let Some(format) = args.format {
        options.format = format;
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for (idx, chart) in charts.iter().enumerate() {
        let bytes = graph::render_chart(chart, &options)
            .with_context(|| format!("Failed to render chart '{}'", chart.id))?;
        let path = args.out_dir.join(format!(
            "{:02}-{}.{}",
            idx + 1,
            chart.id,
            options.format.extension()
        ));
        std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("wrote {}", path.display());
        writeln!(handle, "{}", path.display()).context("Failed to write to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).context("Failed to write JSON to stdout")?;
    writeln!(handle).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
