use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::extractor::ExtractionMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "inspection-loader")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract inspection records from warehouse weight spreadsheets")]
#[command(
    long_about = "Reads the fixed-layout weight spreadsheets sent by each warehouse, \
                  builds one file record per workbook and one box record per box column, \
                  and optionally loads them into the warehouse store without duplicates."
)]
#[command(after_help = "EXAMPLES:\n  \
    inspection-loader ./NITTSU\n  \
    inspection-loader ./KOBE ./HAKATA --boxes\n  \
    inspection-loader --all --boxes --upload\n  \
    inspection-loader ./NITTSU --list\n  \
    inspection-loader ./KOBE --boxes --spec 20 --uw 550 --ow 720 --output-format json")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Warehouse directories to process
    #[arg(required_unless_present_any = ["all", "generate_config"])]
    pub directories: Vec<PathBuf>,

    /// Process every warehouse directory configured through *_PATH variables
    #[arg(long)]
    pub all: bool,

    /// Also extract box records
    #[arg(short, long)]
    pub boxes: bool,

    /// Load the extracted records into the warehouse store
    #[arg(short, long)]
    pub upload: bool,

    /// Load files even if their identifier already exists in the store
    #[arg(long, requires = "upload")]
    pub no_dedup: bool,

    /// Only list the spreadsheets that would be processed
    #[arg(short, long, conflicts_with = "upload")]
    pub list: bool,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Number of weight rows read per box
    #[arg(long, value_name = "ROWS")]
    pub spec: Option<u32>,

    /// Under-weight threshold
    #[arg(long, value_name = "KG")]
    pub uw: Option<f64>,

    /// Over-weight threshold
    #[arg(long, value_name = "KG")]
    pub ow: Option<f64>,

    /// Type tag written on every file record
    #[arg(long)]
    pub tipo: Option<String>,

    /// Directory of the local warehouse store
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    /// File, then environment (`.env` included), then flags.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;
        config.apply_environment()?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_spec_value(self.spec)
            .with_thresholds(self.uw, self.ow)
            .with_tipo_default(self.tipo.clone())
            .with_store_directory(self.store.clone())
            .with_check_duplicates(self.no_dedup.then_some(false))
    }

    pub fn extraction_mode(&self) -> ExtractionMode {
        if self.boxes {
            ExtractionMode::FilesAndBoxes
        } else {
            ExtractionMode::FilesOnly
        }
    }

    /// Directories named on the command line, followed by the configured ones
    /// when `--all` is given.
    pub fn target_directories(&self, config: &Config) -> Vec<PathBuf> {
        let mut targets = self.directories.clone();
        if self.all {
            for (_, path) in config.sources.available_warehouses() {
                if !targets.contains(&path) {
                    targets.push(path);
                }
            }
        }
        targets
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
