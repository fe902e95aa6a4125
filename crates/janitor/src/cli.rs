//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// ecr-janitor - delete expired ECR images nothing still runs
#[derive(Parser, Debug)]
#[command(name = "ecr-janitor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Explicit log level, overriding -v/--quiet
    #[arg(long, value_enum, env = "JANITOR_LOG_LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// When to colorize output
    #[arg(
        long,
        value_enum,
        env = "JANITOR_COLOR",
        default_value_t = ColorChoice::Auto,
        global = true
    )]
    pub color: ColorChoice,

    /// Path to the configuration file
    #[arg(
        short,
        long,
        env = "JANITOR_CONFIG",
        default_value = "ecr-janitor.yaml",
        global = true
    )]
    pub config: Utf8PathBuf,

    /// AWS region (defaults to the standard AWS configuration chain)
    #[arg(long, env = "JANITOR_REGION", global = true)]
    pub region: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan workloads and write the image references in use
    Scan(ScanArgs),

    /// Show which images would be deleted
    Plan(PlanArgs),

    /// Delete expired images
    Delete(DeleteArgs),

    /// Show version information
    Version(VersionArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Output format; `json` is the prescan format accepted by --scanned-files
    #[arg(long, value_enum, env = "JANITOR_FORMAT", default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write to a file instead of stdout
    #[arg(short, long, env = "JANITOR_OUTPUT")]
    pub output: Option<Utf8PathBuf>,
}

/// Options shared by `plan` and `delete`
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Previously scanned image lists to treat as in use
    #[arg(long, env = "JANITOR_SCANNED_FILES", value_delimiter = ',')]
    pub scanned_files: Vec<Utf8PathBuf>,

    /// Skip scanning workloads; requires --scanned-files
    #[arg(long, env = "JANITOR_NO_SCAN")]
    pub no_scan: bool,

    /// Only plan this repository
    #[arg(long, env = "JANITOR_REPOSITORY")]
    pub repository: Option<String>,

    /// Summary format
    #[arg(long, value_enum, env = "JANITOR_FORMAT", default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Write the summary to a file instead of stdout
    #[arg(short, long, env = "JANITOR_OUTPUT")]
    pub output: Option<Utf8PathBuf>,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Delete without asking for confirmation
    #[arg(short, long, env = "JANITOR_FORCE")]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
