mod input;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sipcap_core::{CaptureSummary, JsonLinesSink, MessageSink, PipelineConfig, capture_pcap_file};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("SIPCAP_BUILD_COMMIT"),
    ", built ",
    env!("SIPCAP_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:
  sipcap capture trace.pcap -o messages.jsonl
  sipcap decode trace.pcapng --stdout
  sipcap capture 'captures/*.pcap' -c sipcap.json --workers 4 -o messages.jsonl";

#[derive(Parser, Debug)]
#[command(name = "sipcap", version, long_version = LONG_VERSION)]
#[command(
    about = "Extract SIP, SMPP, RTP/RTCP and ICMP port-unreachable reports from packet captures.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a capture file through the decode pipeline and write JSON lines.
    #[command(alias = "decode", after_help = EXAMPLES)]
    Capture(CaptureArgs),
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// Path to a .pcap or .pcapng file (a glob matching one file is accepted)
    input: PathBuf,

    /// Pipeline configuration (JSON, kebab-case keys)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Write one JSON object per decoded message to this file
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    output: Option<PathBuf>,

    /// Write decoded messages to stdout
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Number of dispatch workers (overrides the configuration)
    #[arg(long)]
    workers: Option<usize>,

    /// Only log warnings and errors, and skip the summary line
    #[arg(long)]
    quiet: bool,
}

/// User-facing failure: printed as `error:` plus an optional `hint:`.
#[derive(Debug)]
pub(crate) struct CliError {
    pub(crate) message: String,
    pub(crate) hint: Option<String>,
}

impl CliError {
    pub(crate) fn with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            message: format!("{err:#}"),
            hint: None,
        }
    }
}

/// Where decoded messages go.
enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    fn label(&self) -> String {
        match self {
            Destination::Stdout => "stdout".to_string(),
            Destination::File(path) => path.display().to_string(),
        }
    }
}

fn main() -> ExitCode {
    let Commands::Capture(args) = Cli::parse().command;
    init_tracing(args.quiet);

    match capture(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn capture(args: CaptureArgs) -> Result<(), CliError> {
    let input = input::resolve_capture(&args.input)?;
    debug!(input = %input.display(), "resolved capture");
    let config = load_config(args.config.as_deref(), args.workers)?;

    let destination = match args.output {
        Some(path) if !args.stdout => {
            ensure_distinct_output(&path, &input)?;
            Destination::File(path)
        }
        _ => Destination::Stdout,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    let summary = match &destination {
        Destination::Stdout => {
            let sink = Arc::new(JsonLinesSink::new(io::stdout()));
            let summary = decode(&runtime, &input, config, Arc::clone(&sink))?;
            sink.flush().context("failed to flush stdout")?;
            summary
        }
        Destination::File(path) => {
            let sink = Arc::new(JsonLinesSink::new(BufWriter::new(create_output(path)?)));
            let summary = decode(&runtime, &input, config, Arc::clone(&sink))?;
            sink.flush()
                .with_context(|| format!("failed to write {}", path.display()))?;
            summary
        }
    };

    if !args.quiet {
        eprintln!(
            "OK: {} packets -> {}",
            summary.packets_total,
            destination.label()
        );
    }
    Ok(())
}

fn decode<W: Write + Send + 'static>(
    runtime: &tokio::runtime::Runtime,
    input: &Path,
    config: PipelineConfig,
    sink: Arc<JsonLinesSink<W>>,
) -> Result<CaptureSummary, CliError> {
    let sink: Arc<dyn MessageSink> = sink;
    let summary = runtime
        .block_on(capture_pcap_file(input, config, sink))
        .with_context(|| format!("failed to decode {}", input.display()))?;
    Ok(summary)
}

fn load_config(path: Option<&Path>, workers: Option<usize>) -> Result<PipelineConfig, CliError> {
    let mut config = match path {
        Some(path) => PipelineConfig::load(path).map_err(|err| {
            CliError::with_hint(
                format!("invalid configuration '{}': {err}", path.display()),
                "expected a JSON document with kebab-case keys",
            )
        })?,
        None => PipelineConfig::default(),
    };
    if let Some(workers) = workers {
        config.workers = workers;
    }
    config
        .validate()
        .map_err(|err| CliError::with_hint(err.to_string(), "counts and sizes start at 1"))?;
    Ok(config)
}

fn create_output(path: &Path) -> Result<File, CliError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(file)
}

/// Refuse to truncate the capture being read.
fn ensure_distinct_output(output: &Path, input: &Path) -> Result<(), CliError> {
    // A file that does not exist yet cannot be the input.
    let (Ok(output), Ok(input)) = (fs::canonicalize(output), fs::canonicalize(input)) else {
        return Ok(());
    };
    if output == input {
        return Err(CliError::with_hint(
            format!("output path must differ from input: {}", output.display()),
            "pick another -o path or use --stdout",
        ));
    }
    Ok(())
}
