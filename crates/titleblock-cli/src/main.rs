mod commands;
mod output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "titleblock",
    version,
    about = "Convert CAD drawings and scans to PDF and read their title blocks"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); ignored when RUST_LOG is set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where the region comes from: config file, preset, then individual flags.
#[derive(Args, Debug, Clone, Default)]
pub struct RegionArgs {
    /// JSON config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Predefined region: title-block (default), compact
    #[arg(short, long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Corner to scan: bottom-right, bottom-left, top-right, top-left
    #[arg(long)]
    pub corner: Option<String>,

    /// Region width in points, measured in from the page edge
    #[arg(long, value_name = "PT")]
    pub width_inset: Option<f64>,

    /// Region height in points, measured in from the page edge
    #[arg(long, value_name = "PT")]
    pub height_inset: Option<f64>,

    /// Token test: full-box (whole box inside) or corner-point (bottom-left corner inside)
    #[arg(long)]
    pub containment: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BatchArgs {
    /// Also process subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Write PDFs to this directory instead of next to the sources
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the words inside the region of each page of one or more PDFs
    Extract {
        /// PDF files
        #[arg(required = true)]
        pdf_files: Vec<PathBuf>,

        #[command(flatten)]
        region: RegionArgs,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        output: String,
    },
    /// Convert every drawing and scan in a folder to PDF
    Convert {
        /// Folder containing .slddrw, .dwg and .tif files
        dir: PathBuf,

        /// JSON config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        #[command(flatten)]
        batch: BatchArgs,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        output: String,
    },
    /// Convert a folder, then extract the region text from every PDF in it
    Run {
        /// Folder containing .slddrw, .dwg and .tif files
        dir: PathBuf,

        #[command(flatten)]
        region: RegionArgs,

        #[command(flatten)]
        batch: BatchArgs,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        output: String,
    },
    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// List predefined regions
    Presets,
    /// Print the effective configuration as JSON
    Show {
        #[command(flatten)]
        region: RegionArgs,
    },
    /// Validate a config file
    Validate {
        /// Path to JSON config file
        file: PathBuf,
    },
}

/// RUST_LOG, when set, takes the whole filter; otherwise `-v` picks the level.
fn log_filter(verbose: u8, rust_log: Option<&str>) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|s| !s.trim().is_empty()) {
        return EnvFilter::builder().parse_lossy(directives);
    }
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    EnvFilter::default().add_directive(level.into())
}

fn init_logging(verbose: u8) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            pdf_files,
            region,
            output,
        } => commands::extract::run(&pdf_files, &region, &output),
        Commands::Convert {
            dir,
            config,
            batch,
            output,
        } => commands::convert::run(&dir, config.as_deref(), &batch, &output),
        Commands::Run {
            dir,
            region,
            batch,
            output,
        } => commands::run::run(&dir, &region, &batch, &output),
        Commands::Config { action } => match action {
            ConfigAction::Presets => commands::config::presets(),
            ConfigAction::Show { region } => commands::config::show(&region),
            ConfigAction::Validate { file } => commands::config::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
