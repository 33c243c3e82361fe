use benchflux_converter::{
    clock::{Clock, FixedClock, SystemClock},
    collector::Collector,
    config::{ConfigErrors, ConverterConfig},
    convert::{ConvertError, Converter, Summary},
    ingest::CollisionPolicy,
    protocol::EscapeMode,
    sink::Sink,
};
use clap::{ArgAction, Parser};
use std::{path::PathBuf, process::ExitCode};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Convert benchmark result CSV files into line protocol
#[derive(Parser, Debug)]
#[command(name = "benchflux", author, version, about)]
struct Cli {
    /// File to write the line protocol to, overwritten if present [default: stdout]
    output: Option<PathBuf>,

    /// YAML config file, command line flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing the result files [default: .]
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// File name glob of result files [default: *.csv]
    #[arg(short, long)]
    pattern: Option<String>,

    /// Result file to convert instead of scanning the directory, can be repeated
    #[arg(short = 'f', long = "file")]
    files: Vec<PathBuf>,

    /// Measurement name of every line [default: benchmark]
    #[arg(long)]
    measurement: Option<String>,

    /// Only rows with this unit are converted [default: us/op]
    #[arg(long)]
    unit: Option<String>,

    /// Escaping of reserved characters in names and tags
    #[arg(long, value_enum)]
    escape: Option<EscapeMode>,

    /// Handling of parameter columns named like a built-in tag
    #[arg(long = "on-collision", value_enum)]
    collisions: Option<CollisionPolicy>,

    /// Use this unix timestamp (seconds) as the current time
    #[arg(long, allow_negative_numbers = true)]
    now: Option<i64>,

    /// More logging, can be repeated
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Less logging
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "verbose")]
    quiet: u8,
}

impl Cli {
    /// merge command line flags over `config`
    fn apply(&self, config: &mut ConverterConfig) {
        if let Some(ref output) = self.output {
            config.output = Some(output.clone());
        }
        if let Some(ref directory) = self.directory {
            config.directory = directory.clone();
        }
        if let Some(ref pattern) = self.pattern {
            config.pattern = pattern.clone();
        }
        if !self.files.is_empty() {
            config.files = self.files.clone();
        }
        if let Some(ref measurement) = self.measurement {
            config.measurement = measurement.clone();
        }
        if let Some(ref unit) = self.unit {
            config.unit = unit.clone();
        }
        if let Some(escape) = self.escape {
            config.escape = escape;
        }
        if let Some(collisions) = self.collisions {
            config.collisions = collisions;
        }
    }

    fn log_level(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (0, 0) => "warn",
            (0, _) => "error",
            (1, _) => "info",
            (2, _) => "debug",
            _ => "trace",
        }
    }
}

// logs go to stderr, stdout is reserved for line protocol
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<Summary, ConvertError> {
    let mut config = match cli.config {
        Some(ref path) => ConverterConfig::load(path)?,
        None => ConverterConfig::default(),
    };
    cli.apply(&mut config);
    debug!(config = ?config, "Loaded config");

    if config.preflight_checks() {
        return Err(ConfigErrors::Preflight.into());
    }

    let clock: Box<dyn Clock> = match cli.now {
        Some(now) => Box::new(FixedClock(now)),
        None => Box::new(SystemClock),
    };

    let collector = Collector::load(&config)?;
    info!(files = collector.len(), "Collected result files");

    let converter = Converter::from_config(&config, clock.as_ref());
    let mut sink = Sink::open(config.output.as_deref())?;
    let summary = converter.run(collector, &mut sink)?;
    sink.close()?;

    Ok(summary)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            error!(error = ?error, "{error}");

            ExitCode::FAILURE
        }
    }
}
