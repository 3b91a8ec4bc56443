use anyhow::Result;
use clap::{Parser, ValueEnum};
use knot::{KnotConfig, OutputFormat, run};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Plain,
    Json,
    Mermaid,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Plain => OutputFormat::Plain,
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Mermaid => OutputFormat::Mermaid,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Find circular imports and hub modules in a TypeScript/JavaScript project", long_about = None)]
struct Args {
    /// Project root to analyze
    path: Option<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<CliOutputFormat>,

    /// Add ignore pattern (glob)
    #[arg(long)]
    ignore: Vec<String>,

    /// Add include pattern (glob) - only include matching files
    #[arg(long)]
    include: Vec<String>,

    /// Maximum directory depth to traverse
    #[arg(long)]
    max_depth: Option<usize>,

    /// Minimum number of importers for a module to be reported as a hub
    #[arg(short, long)]
    threshold: Option<usize>,

    /// Skip the external semantic analyzer
    #[arg(long)]
    offline: bool,

    /// Model used for semantic analysis
    #[arg(long)]
    model: Option<String>,

    /// Chat completions endpoint used for semantic analysis
    #[arg(long)]
    endpoint: Option<String>,

    /// Re-run the analysis whenever a source file changes
    #[arg(short, long)]
    watch: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("KNOT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "knot=debug,info" } else { "knot=info,warn" })
    });

    // stdout carries the report
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load from file or default
    let mut config = KnotConfig::load_from_file().unwrap_or_default();

    // 2. Override with CLI args
    if let Some(p) = args.path {
        config.path = p;
    }
    if let Some(o) = args.output {
        config.output = Some(o);
    }
    if let Some(f) = args.format {
        config.output_format = f.into();
    }
    if !args.ignore.is_empty() {
        // CLI ignores ADD to config ignores
        config.ignore_patterns.extend(args.ignore);
    }
    if !args.include.is_empty() {
        config.include_patterns = args.include;
    }
    if let Some(d) = args.max_depth {
        config.max_depth = Some(d);
    }
    if let Some(t) = args.threshold {
        config.hub_threshold = t;
    }
    if args.offline {
        config.semantic.enabled = false;
    }
    if let Some(m) = args.model {
        config.semantic.model = m;
    }
    if let Some(e) = args.endpoint {
        config.semantic.endpoint = e;
    }
    if args.watch {
        config.watch = true;
    }
    if args.verbose {
        config.verbose = true;
    }

    init_tracing(config.verbose);

    run(config)
}
