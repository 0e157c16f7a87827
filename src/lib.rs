pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod records;
pub mod scanner;
pub mod ui;
pub mod upload;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, ExtractionSettings};
pub use error::{IngestError, Result, UserFriendlyError};
pub use records::{BoxRecord, FileRecord};

// Core functionality re-exports
pub use extractor::{
    decode_traceability, ExtractionBatch, ExtractionMode, ExtractionOrchestrator,
    ExtractionProgress, ExtractionSummary,
};
pub use scanner::{FileListing, FileSetLocator, SpreadsheetSet, Warehouse};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};
pub use upload::{LocalStore, RecordStore, UploadOutcome, Uploader};

use std::path::{Path, PathBuf};

/// Result of processing one input directory.
#[derive(Debug)]
pub struct DirectoryOutcome {
    pub directory: PathBuf,
    pub result: Result<ExtractionBatch>,
}

impl DirectoryOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a run produced: one outcome per requested directory, in the
/// order they were given, and the upload totals when an upload happened.
#[derive(Debug)]
pub struct RunReport {
    pub mode: ExtractionMode,
    pub outcomes: Vec<DirectoryOutcome>,
    pub upload: Option<UploadOutcome>,
}

impl RunReport {
    pub fn new(mode: ExtractionMode) -> Self {
        Self {
            mode,
            outcomes: Vec::new(),
            upload: None,
        }
    }

    pub fn batches(&self) -> impl Iterator<Item = &ExtractionBatch> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn skipped_files(&self) -> usize {
        self.batches().map(|b| b.skipped.len()).sum()
    }

    pub fn summary(&self) -> ExtractionSummary {
        ExtractionSummary::from_batches(self.batches())
    }

    /// Some directories or files were processed, but not all of them.
    pub fn is_partial(&self) -> bool {
        self.succeeded() > 0 && (self.failed() > 0 || self.skipped_files() > 0)
    }

    pub fn first_error(&self) -> Option<&IngestError> {
        self.outcomes.iter().find_map(|o| o.result.as_ref().err())
    }
}

/// Main library interface: locates, extracts, reports, and uploads.
pub struct InspectionLoader {
    config: Config,
    orchestrator: ExtractionOrchestrator,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl InspectionLoader {
    /// Create a loader that stops between directories on Ctrl+C.
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let shutdown = GracefulShutdown::new()?;
        Ok(Self::with_shutdown(config, output_mode, verbose, quiet, shutdown))
    }

    /// Create a loader without registering a signal handler.
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self::with_shutdown(
            config,
            output_mode,
            verbose,
            quiet,
            GracefulShutdown::new_for_test(),
        )
    }

    fn with_shutdown(
        config: Config,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        shutdown: GracefulShutdown,
    ) -> Self {
        let filter = scanner::FileFilter::new()
            .with_exclude_patterns(&config.processing.exclude_patterns);
        let orchestrator = ExtractionOrchestrator::new(config.extraction_settings())
            .with_locator(FileSetLocator::new().with_filter(filter));
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            orchestrator,
            output_formatter,
            progress_manager,
            shutdown,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Self::new(
            config,
            OutputMode::from(cli_args.output_format),
            cli_args.verbose,
            cli_args.quiet,
        )
    }

    /// Extract one directory with a progress bar.
    pub fn process_directory<P: AsRef<Path>>(
        &self,
        directory: P,
        mode: ExtractionMode,
    ) -> Result<ExtractionBatch> {
        let directory = directory.as_ref();
        self.output_formatter
            .start_operation(&format!("Reading spreadsheets in {}", directory.display()));

        let set = self.orchestrator.locator().locate(directory)?;
        let stats = self.orchestrator.locator().get_statistics(&set.files);
        tracing::debug!(files = stats.total_files, "Located spreadsheet set");
        self.output_formatter.info(stats.display_summary().trim_end());

        let file_progress = self.progress_manager.create_file_progress(set.files.len() as u64);
        let progress_callback = {
            let pb = file_progress.clone();
            move |progress: &ExtractionProgress| {
                ui::update_file_progress(&pb, progress);
            }
        };

        let batch = self
            .orchestrator
            .extract_set(&set, mode, Some(&progress_callback));

        ui::finish_progress_with_summary(
            &file_progress,
            &format!(
                "{}: {} files, {} boxes",
                set.warehouse,
                batch.files.len(),
                batch.boxes.len()
            ),
            batch.duration,
        );

        Ok(batch)
    }

    /// Extract several directories. A directory-level failure is recorded in
    /// its [`DirectoryOutcome`] and the run moves on; only cancellation stops
    /// the run as a whole.
    pub fn process_directories(
        &self,
        directories: &[PathBuf],
        mode: ExtractionMode,
    ) -> Result<RunReport> {
        let mut report = RunReport::new(mode);

        for directory in directories {
            self.shutdown.check_shutdown()?;

            let result = self.process_directory(directory, mode);
            if let Err(ref err) = result {
                tracing::warn!(directory = %directory.display(), "Directory not processed: {}", err);
            }

            report.outcomes.push(DirectoryOutcome {
                directory: directory.clone(),
                result,
            });
        }

        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Run finished"
        );
        Ok(report)
    }

    /// Load every successful batch into the configured store and record the
    /// totals on the report.
    pub fn upload(&self, report: &mut RunReport) -> Result<UploadOutcome> {
        let store = LocalStore::from_config(&self.config.warehouse);
        self.upload_to(store, report)
    }

    pub fn upload_to<S: RecordStore>(&self, store: S, report: &mut RunReport) -> Result<UploadOutcome> {
        let warehouse = &self.config.warehouse;
        let mut uploader = Uploader::new(store, &warehouse.files_table, &warehouse.boxes_table);
        let total = self.progress_manager.with_spinner("Uploading records", |_| {
            report
                .batches()
                .try_fold(UploadOutcome::default(), |mut total, batch| {
                    self.shutdown.check_shutdown()?;
                    total.merge(&uploader.upload(batch, warehouse.check_duplicates)?);
                    Ok(total)
                })
        })?;
        report.upload = Some(total.clone());
        Ok(total)
    }

    /// The spreadsheets a directory holds, without opening any of them.
    pub fn list<P: AsRef<Path>>(&self, directory: P) -> Result<FileListing> {
        self.orchestrator.locator().describe(directory)
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn progress_manager(&self) -> &ProgressManager {
        &self.progress_manager
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    pub fn handle_error(&self, error: &IngestError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Extract a directory with default settings and no terminal output.
pub fn extract_directory<P: AsRef<Path>>(
    directory: P,
    mode: ExtractionMode,
) -> Result<ExtractionBatch> {
    let orchestrator = ExtractionOrchestrator::new(Config::default().extraction_settings());
    orchestrator.extract_directory(directory, mode, None)
}

pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        target: std::env::consts::ARCH.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_date: &'static str,
    pub target: String,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "inspection-loader {} ({}) built on {} for {}",
            self.version, self.git_hash, self.build_date, self.target
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn quiet_loader(config: Config) -> InspectionLoader {
        InspectionLoader::new_for_test(config, OutputMode::Plain, 0, true)
    }

    fn batch(directory: &str) -> ExtractionBatch {
        ExtractionBatch {
            directory: PathBuf::from(directory),
            warehouse: Warehouse::Kobe,
            mode: ExtractionMode::FilesOnly,
            files: Vec::new(),
            boxes: Vec::new(),
            skipped: Vec::new(),
            box_counts: Vec::new(),
            duration: std::time::Duration::default(),
        }
    }

    #[test]
    fn test_loader_creation() {
        let loader = quiet_loader(Config::default());
        assert!(loader.is_running());
        assert_eq!(loader.config().processing.spec_value, 30);
        assert!(!loader.progress_manager().is_enabled());
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        InspectionLoader::generate_sample_config(&config_path).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[processing]"));
        assert!(content.contains("[warehouse]"));
        assert!(Config::load_from_file(&config_path).is_ok());
    }

    #[test]
    fn test_missing_directory_does_not_abort_run() {
        let temp_dir = TempDir::new().unwrap();
        let empty = temp_dir.path().join("KOBE");
        fs::create_dir(&empty).unwrap();

        let loader = quiet_loader(Config::default());
        let report = loader
            .process_directories(
                &[temp_dir.path().join("missing"), empty],
                ExtractionMode::FilesOnly,
            )
            .unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failed(), 2);
        assert!(matches!(report.first_error(), Some(IngestError::NotFound { .. })));
        assert!(matches!(
            report.outcomes[1].result,
            Err(IngestError::EmptyInput { .. })
        ));
        assert!(!report.is_partial());
    }

    #[test]
    fn test_cancelled_run_stops() {
        let loader = quiet_loader(Config::default());
        loader.request_shutdown();

        let result = loader.process_directories(&[PathBuf::from("/tmp")], ExtractionMode::FilesOnly);
        assert!(matches!(result, Err(IngestError::Cancelled)));
    }

    #[test]
    fn test_report_partial_success() {
        let mut report = RunReport::new(ExtractionMode::FilesOnly);
        report.outcomes.push(DirectoryOutcome {
            directory: PathBuf::from("KOBE"),
            result: Ok(batch("KOBE")),
        });
        assert!(!report.is_partial());

        report.outcomes.push(DirectoryOutcome {
            directory: PathBuf::from("HAKATA"),
            result: Err(IngestError::NotFound {
                path: "HAKATA".to_string(),
            }),
        });
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.is_partial());
        assert_eq!(report.batches().count(), 1);
    }

    #[test]
    fn test_exclude_patterns_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("KOBE");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("神戸 WK01.xlsx"), b"x").unwrap();
        fs::write(dir.join("神戸 WK01 (copy).xlsx"), b"x").unwrap();

        let mut config = Config::default();
        config.processing.exclude_patterns = vec![r"\(copy\)".to_string()];

        let listing = quiet_loader(config).list(&dir).unwrap();
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].normalized_name, "WK01.xlsx");
    }

    #[test]
    fn test_list_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("HAKATA");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("b.xlsx"), b"x").unwrap();
        fs::write(dir.join("a.xls"), b"x").unwrap();

        let listing = quiet_loader(Config::default()).list(&dir).unwrap();
        assert_eq!(listing.warehouse, Warehouse::Hakata);
        let names: Vec<_> = listing.files.iter().map(|f| f.original_name.as_str()).collect();
        assert_eq!(names, vec!["a.xls", "b.xlsx"]);
    }

    #[test]
    fn test_upload_with_nothing_extracted() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.warehouse.output_directory = temp_dir.path().to_path_buf();

        let loader = quiet_loader(config);
        let mut report = RunReport::new(ExtractionMode::FilesOnly);
        report.outcomes.push(DirectoryOutcome {
            directory: PathBuf::from("KOBE"),
            result: Ok(batch("KOBE")),
        });

        let outcome = loader.upload(&mut report).unwrap();
        assert_eq!(outcome, UploadOutcome::default());
        assert_eq!(report.upload, Some(UploadOutcome::default()));
    }

    #[test]
    fn test_cancelled_upload_leaves_report_without_totals() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.warehouse.output_directory = temp_dir.path().to_path_buf();

        let loader = quiet_loader(config);
        let mut report = RunReport::new(ExtractionMode::FilesOnly);
        report.outcomes.push(DirectoryOutcome {
            directory: PathBuf::from("KOBE"),
            result: Ok(batch("KOBE")),
        });
        loader.request_shutdown();

        assert!(matches!(loader.upload(&mut report), Err(IngestError::Cancelled)));
        assert_eq!(report.upload, None);
    }

    #[test]
    fn test_version_info() {
        assert!(!version_info().is_empty());

        let build_info = build_info();
        assert!(build_info.to_string().contains("inspection-loader"));
        assert!(build_info.to_string().contains(build_info.version));
    }
}
