use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use quantcol_indicators::Pipeline;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "quantcol")]
#[command(about = "Append technical indicator columns (SMA, EMA, RSI, MACD) to price data")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a CSV file, run the indicator pipeline and write the result
    Compute {
        /// Path to the input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the output file
        #[arg(short, long)]
        output: PathBuf,

        /// Pipeline definition (TOML). Defaults to RSI/EMA/SMA over 7, 14, 21 plus MACD
        #[arg(short, long, env = "QUANTCOL_PIPELINE")]
        config: Option<PathBuf>,

        /// Keep only the first N rows of the output (overrides the pipeline's `head`)
        #[arg(long)]
        head: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },

    /// List available indicators and the columns they produce
    Indicators,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Compute {
            input,
            output,
            config,
            head,
            format,
        } => {
            run_compute(&input, &output, config.as_deref(), head, format)?;
        }
        Commands::Indicators => {
            println!("Available indicators:");
            println!("  sma  - Simple Moving Average            -> sma_{{period}}");
            println!("  ema  - Exponential Moving Average       -> ema_{{period}} (continuous)");
            println!("                                             ema_{{period}}_seeded (sma_seeded)");
            println!("  rsi  - Relative Strength Index          -> rsi_{{period}}");
            println!("  macd - Moving Average Conv/Divergence   -> macd_{{f}}_{{s}}_{{g}}");
            println!("                                             macd_signal_{{f}}_{{s}}_{{g}}");
            println!("                                             macd_hist_{{f}}_{{s}}_{{g}}");
        }
    }

    Ok(())
}

fn load_pipeline(path: Option<&Path>) -> Result<Pipeline> {
    let Some(path) = path else {
        return Ok(Pipeline::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline config {}", path.display()))?;
    let pipeline: Pipeline = toml::from_str(&contents)
        .with_context(|| format!("Invalid pipeline config {}", path.display()))?;
    Ok(pipeline)
}

fn run_compute(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    head: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let mut pipeline = load_pipeline(config)?;
    let head = head.or(pipeline.head.take());

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        steps = pipeline.steps.len(),
        "Starting indicator run"
    );

    let frame = quantcol_data::load_frame_from_csv(input)?;
    tracing::info!(rows = frame.num_rows(), "Loaded input data");

    if frame.num_rows() == 0 {
        anyhow::bail!("No rows loaded from {}", input.display());
    }

    let table = pipeline.run(frame.table())?;
    let mut frame = frame.with_table(table)?;
    if let Some(n) = head {
        frame = frame.head(n);
    }

    match format {
        OutputFormat::Csv => quantcol_data::write_frame_to_csv(&frame, output)?,
        OutputFormat::Json => quantcol_data::write_frame_to_json(&frame, output)?,
    }

    tracing::info!(
        rows = frame.num_rows(),
        columns = frame.headers().len(),
        "Indicator run complete"
    );
    println!(
        "Indicators are calculated and saved to {}",
        output.display()
    );

    Ok(())
}
