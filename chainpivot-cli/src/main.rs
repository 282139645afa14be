//! chainpivot CLI: pivot, validate and convert commands.
//!
//! Commands:
//! - `run`: pivot one day's long-format NFO CSV into per-symbol wide files
//! - `validate`: check an output directory against the universe and reference
//! - `convert`: turn a Feather artifact into CSV for inspection

use anyhow::{bail, Context, Result};
use chainpivot_runner::{
    feather_to_csv, load_reference, read_manifest, run, validate_outputs, ModeSetting,
    OutputFormat, PivotConfig, RunSummary,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "chainpivot",
    about = "chainpivot: pivot NFO option chains into wide per-symbol tables"
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pivot an input CSV and write one artifact per universe symbol.
    Run {
        #[command(flatten)]
        common: ConfigArgs,

        /// Input CSV in long format (Ticker, Date, Time, fields...).
        #[arg(long)]
        input: Option<PathBuf>,

        /// Comma-separated symbol universe, replacing the configured one.
        #[arg(long, value_delimiter = ',')]
        symbols: Option<Vec<String>>,

        /// Emit every symbol observed in the input.
        #[arg(long, default_value_t = false, conflicts_with = "symbols")]
        observed: bool,

        /// Reconcile and write symbols on one thread.
        #[arg(long, default_value_t = false)]
        serial: bool,
    },
    /// Check that every expected artifact exists and matches the reference.
    Validate {
        #[command(flatten)]
        common: ConfigArgs,

        /// File date to check (YYYY-MM-DD). Defaults to the manifest's date.
        #[arg(long)]
        date: Option<String>,
    },
    /// Convert a Feather file to CSV.
    Convert {
        /// Feather file to read.
        input: PathBuf,

        /// CSV path. Defaults to the input with a .csv extension.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Flags shared by `run` and `validate`; each overrides the TOML file.
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Schema mode: strict or dynamic.
    #[arg(long)]
    mode: Option<String>,

    /// Reference artifact defining the strict column layout.
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Output directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output format: feather, parquet or csv.
    #[arg(long)]
    format: Option<String>,
}

impl ConfigArgs {
    fn load(&self) -> Result<PivotConfig> {
        let mut config = match &self.config {
            Some(path) => PivotConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PivotConfig::default(),
        };
        if let Some(mode) = &self.mode {
            config.schema.mode = mode.parse::<ModeSetting>()?;
        }
        if let Some(reference) = &self.reference {
            config.schema.reference = Some(reference.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(format) = &self.format {
            config.output.format = format.parse::<OutputFormat>().map_err(anyhow::Error::msg)?;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            common,
            input,
            symbols,
            observed,
            serial,
        } => run_pivot(&common, input, symbols, observed, serial),
        Commands::Validate { common, date } => run_validate(&common, date),
        Commands::Convert { input, output } => {
            let written = feather_to_csv(&input, output.as_deref())?;
            info!(input = %input.display(), output = %written.display(), "converted to CSV");
            println!("Wrote {}", written.display());
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .init();
}

fn run_pivot(
    common: &ConfigArgs,
    input: Option<PathBuf>,
    symbols: Option<Vec<String>>,
    observed: bool,
    serial: bool,
) -> Result<()> {
    let mut config = common.load()?;
    if let Some(input) = input {
        config.input.path = input;
    }
    if let Some(symbols) = symbols {
        config.universe.symbols = Some(symbols);
        config.universe.observed = false;
    }
    if observed {
        config.universe.observed = true;
    }
    if serial {
        config.output.parallel = false;
    }

    let summary = run(&config)?;
    print_summary(&summary);
    Ok(())
}

fn run_validate(common: &ConfigArgs, date: Option<String>) -> Result<()> {
    let config = common.load()?;
    let dir = config.output.dir.as_path();
    let manifest = read_manifest(dir).ok();

    let date = match date {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .with_context(|| format!("invalid --date '{s}' (expected YYYY-MM-DD)"))?,
        None => match &manifest {
            Some(m) => m.file_date,
            None => bail!("no --date given and no manifest in {}", dir.display()),
        },
    };

    let symbols: Vec<String> = match config.universe() {
        Some(universe) => universe.symbols().map(str::to_string).collect(),
        None => match &manifest {
            Some(m) => m.symbols.iter().map(|s| s.symbol.clone()).collect(),
            None => bail!(
                "observed universe needs a manifest in {} to know which symbols to check",
                dir.display()
            ),
        },
    };

    let reference = match config.schema.mode {
        ModeSetting::Strict => {
            let Some(path) = config.schema.reference.as_deref() else {
                bail!("strict validation needs --reference or [schema] reference");
            };
            Some(load_reference(path)?)
        }
        ModeSetting::Dynamic => None,
    };

    info!(
        dir = %dir.display(),
        %date,
        symbols = symbols.len(),
        strict = reference.is_some(),
        "validating artifacts"
    );
    let report = validate_outputs(
        dir,
        date,
        symbols.iter().map(String::as_str),
        config.output.format,
        reference.as_ref(),
    );

    println!("Validated {} artifact(s) for {} in {}", report.checked, report.date, dir.display());
    if report.is_ok() {
        println!("All artifacts OK.");
        return Ok(());
    }
    for issue in &report.issues {
        warn!(symbol = %issue.symbol, problem = %issue.problem, "artifact failed validation");
        println!("  {:<12} {}", issue.symbol, issue.problem);
    }
    bail!(
        "{} of {} artifact(s) failed validation",
        report.issues.len(),
        report.checked
    )
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("=== Pivot Result ===");
    println!("File date:      {}", summary.file_date);
    println!("Mode:           {} (futures {:?})", summary.mode, summary.futures);
    println!("Output:         {}", summary.output_dir.display());
    println!(
        "Symbols:        {} ({} empty)",
        summary.symbols.len(),
        summary.empty_symbols()
    );
    println!("Elapsed:        {:.2}s", summary.elapsed_secs);
    println!();
    println!("--- Input ---");
    println!(
        "Rows:           {} read, {} kept, {} malformed",
        summary.ingest.rows_read, summary.ingest.rows_kept, summary.ingest.rows_malformed
    );
    if summary.ingest.rows_off_date > 0 {
        println!("Off-date rows:  {}", summary.ingest.rows_off_date);
    }
    println!(
        "Tickers:        {} distinct, {} unrecognized, {} superseded",
        summary.catalog.distinct_tickers,
        summary.catalog.unrecognized_tickers,
        summary.catalog.superseded_contracts
    );
    if !summary.catalog.outside_universe.is_empty() {
        println!(
            "Not emitted:    {}",
            summary.catalog.outside_universe.join(", ")
        );
    }
    println!(
        "Cells:          {} written, {} overwritten, {} rejected",
        summary.pivot.cells_written, summary.pivot.cells_overwritten, summary.pivot.cells_rejected
    );
    println!();
    println!("{:<12} {:>6} {:>8} {:>9} {:>8}", "Symbol", "Rows", "Columns", "Density", "Dropped");
    println!("{}", "-".repeat(47));
    for entry in &summary.symbols {
        println!(
            "{:<12} {:>6} {:>8} {:>8.1}% {:>8}",
            entry.symbol,
            entry.rows,
            entry.columns,
            entry.density * 100.0,
            entry.dropped_columns
        );
    }
}
