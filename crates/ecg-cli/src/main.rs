use anyhow::{Context, Result};
use clap::Parser;
use ecg_lib::{
    config::AnalysisConfig,
    diagnostics::{DiagnosticKind, Diagnostics, Severity},
    metrics::summary::write_record,
    pipeline::analyze_file,
    plot::{figure_from_strip, Figure, Series},
};
use env_logger::{Env, Target, WriteStyle};
use plotters::prelude::*;
use std::{
    fs::File,
    path::{Path, PathBuf},
};

const DEFAULT_INPUT: &str = "test_data/test_data1.csv";

#[derive(Parser)]
#[command(
    name = "ecg-analysis",
    version,
    about = "Summarise a single-lead ECG strip: duration, voltage extremes, beats and mean heart rate"
)]
struct Cli {
    /// Two-column time,voltage CSV (defaults to the bundled sample)
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Output JSON path (defaults to the input path with a .json extension)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// TOML file with analysis settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Run log, truncated at start
    #[arg(long, default_value = "ecg_analysis_run.log")]
    log_file: PathBuf,
    /// Logging verbosity (e.g., debug, info, warn)
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Override the out-of-range voltage magnitude
    #[arg(long)]
    voltage_limit: Option<f64>,
    /// Override the field delimiter
    #[arg(long)]
    delimiter: Option<char>,
    /// Treat the first line as a header row
    #[arg(long)]
    has_header: bool,
    /// Render the strip with detected beats to a PNG
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Also print the metrics record to stdout
    #[arg(long)]
    print: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file, &cli.log_level)?;

    let mut diagnostics = Diagnostics::new();
    let result = run(&cli, &mut diagnostics);
    if let Err(err) = &result {
        log::error!("{:#}", err);
    }
    diagnostics.flush();
    result
}

fn init_logging(path: &Path, level: &str) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log {}", path.display()))?;
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .target(Target::Pipe(Box::new(file)))
        .write_style(WriteStyle::Never)
        .init();
    Ok(())
}

fn run(cli: &Cli, diagnostics: &mut Diagnostics) -> Result<()> {
    let input = match &cli.input {
        Some(path) => path.clone(),
        None => {
            diagnostics.emit(
                Severity::Warning,
                DiagnosticKind::DefaultInput {
                    path: DEFAULT_INPUT.into(),
                },
                format!("No input file given, using default {}", DEFAULT_INPUT),
            );
            PathBuf::from(DEFAULT_INPUT)
        }
    };
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&input));

    let cfg = load_config(cli)?;
    let analysis = analyze_file(&input, &cfg, diagnostics)
        .with_context(|| format!("analysing {}", input.display()))?;
    write_record(&output, &analysis.record)?;

    if let Some(plot_path) = &cli.plot {
        let fig = figure_from_strip(&analysis.series, &analysis.record, 4096);
        draw_plotters_figure(plot_path, &fig)
            .with_context(|| format!("rendering {}", plot_path.display()))?;
    }
    if cli.print {
        println!("{}", serde_json::to_string(&analysis.record)?);
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut cfg = match &cli.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(limit) = cli.voltage_limit {
        anyhow::ensure!(
            limit.is_finite() && limit > 0.0,
            "--voltage-limit must be positive, got {}",
            limit
        );
        cfg.voltage_limit = limit;
    }
    if let Some(delimiter) = cli.delimiter {
        cfg.loader.delimiter = delimiter;
    }
    if cli.has_header {
        cfg.loader.has_header = true;
    }
    Ok(cfg)
}

fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("json")
}

fn draw_plotters_figure(path: &Path, fig: &Figure) -> Result<()> {
    let (x_min, x_max, y_min, y_max) = fig.bounds().unwrap_or((0.0, 1.0, 0.0, 1.0));
    let backend = BitMapBackend::new(path, (1200, 480));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "ECG".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    let mut mesh = chart.configure_mesh();
    if let Some(label) = &fig.x.label {
        mesh.x_desc(label.as_str());
    }
    if let Some(label) = &fig.y.label {
        mesh.y_desc(label.as_str());
    }
    mesh.draw()?;
    for series in &fig.series {
        match series {
            Series::Line(line) => {
                chart.draw_series(LineSeries::new(
                    line.points.iter().map(|p| (p[0], p[1])),
                    &rgb(line.style.color.0),
                ))?;
            }
            Series::Points(points) => {
                let color = rgb(points.color.0);
                chart.draw_series(
                    points
                        .points
                        .iter()
                        .map(|p| Circle::new((p[0], p[1]), points.radius, color.filled())),
                )?;
            }
        }
    }
    root.present()?;
    Ok(())
}

fn rgb(color: u32) -> RGBColor {
    RGBColor(
        ((color >> 16) & 0xFF) as u8,
        ((color >> 8) & 0xFF) as u8,
        (color & 0xFF) as u8,
    )
}
