use crate::error::{IngestError, UserFriendlyError};
use crate::extractor::{ExtractionBatch, ExtractionSummary};
use crate::scanner::FileListing;
use crate::ui::progress::format_duration;
use crate::upload::UploadOutcome;
use crate::RunReport;
use console::{style, Emoji, Term};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

impl OutputMode {
    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputMode::Json,
            "plain" => OutputMode::Plain,
            _ => OutputMode::Human,
        }
    }
}

impl From<crate::cli::OutputFormat> for OutputMode {
    fn from(format: crate::cli::OutputFormat) -> Self {
        match format {
            crate::cli::OutputFormat::Human => OutputMode::Human,
            crate::cli::OutputFormat::Json => OutputMode::Json,
            crate::cli::OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static PACKAGE: Emoji = Emoji("📦 ", "# ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &IngestError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        eprintln!("{}{}", INFO, style(format!("Suggestion: {}", suggestion)).cyan());
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => self.print_json_object(&json!({
                    "type": "suggestion",
                    "message": suggestion
                })),
                OutputMode::Plain => eprintln!("SUGGESTION: {}", suggestion),
            }
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{}{}", PACKAGE, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Plain => println!("=== {} ===", title),
            OutputMode::Json => {}
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human if self.use_colors => println!("{}", style("─".repeat(60)).dim()),
            OutputMode::Human | OutputMode::Plain => println!("{}", "-".repeat(60)),
            OutputMode::Json => {}
        }
    }

    /// Spreadsheets a directory would contribute, without reading them.
    pub fn print_listing(&self, listing: &FileListing) {
        match self.mode {
            OutputMode::Json => self.print_json_object(&json!({
                "type": "listing",
                "listing": listing
            })),
            OutputMode::Human | OutputMode::Plain => {
                self.print_header(&format!(
                    "{} ({})",
                    listing.directory.display(),
                    listing.warehouse
                ));
                for (index, file) in listing.files.iter().enumerate() {
                    println!(
                        "  {:>3}. {} ({:.2} KB)",
                        index + 1,
                        file.normalized_name,
                        file.size_kb
                    );
                }
                println!();
                println!(
                    "  {} files, {:.2} KB",
                    listing.statistics.total_files,
                    listing.statistics.total_size as f64 / 1024.0
                );
            }
        }
    }

    pub fn print_run_report(&self, report: &RunReport) {
        match self.mode {
            OutputMode::Json => self.print_json_report(report),
            OutputMode::Human | OutputMode::Plain => self.print_text_report(report),
        }
    }

    pub fn print_upload_outcome(&self, outcome: &UploadOutcome) {
        if self.quiet {
            return;
        }

        let message = format!(
            "Loaded {} files and {} boxes ({} duplicate files skipped)",
            outcome.files_loaded, outcome.boxes_loaded, outcome.duplicates_skipped
        );
        match self.mode {
            OutputMode::Json => self.print_json_object(&json!({
                "type": "upload",
                "upload": outcome
            })),
            _ => self.success(&message),
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_json_report(&self, report: &RunReport) {
        let directories: Vec<serde_json::Value> = report
            .outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(batch) => json!({
                    "directory": outcome.directory,
                    "status": "ok",
                    "warehouse": batch.warehouse,
                    "mode": batch.mode,
                    "files": batch.files.len(),
                    "boxes": batch.boxes.len(),
                    "skipped": batch.skipped,
                    "duration_ms": batch.duration.as_millis() as u64,
                }),
                Err(err) => json!({
                    "directory": outcome.directory,
                    "status": "failed",
                    "error": err.to_string(),
                }),
            })
            .collect();

        let document = json!({
            "type": "report",
            "directories": directories,
            "succeeded": report.succeeded(),
            "failed": report.failed(),
            "summary": report.summary(),
            "upload": report.upload,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        println!(
            "{}",
            serde_json::to_string_pretty(&document).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_text_report(&self, report: &RunReport) {
        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(batch) => self.print_batch_line(batch),
                Err(err) => self.warning(&format!(
                    "{}: {}",
                    outcome.directory.display(),
                    err.user_message()
                )),
            }
        }

        if self.quiet {
            return;
        }

        let summary = report.summary();
        self.print_summary(&summary);

        for batch in report.batches() {
            for skipped in &batch.skipped {
                self.warning(&format!("Skipped {}: {}", skipped.name, skipped.reason));
            }
        }

        if let Some(ref upload) = report.upload {
            self.print_upload_outcome(upload);
        }
    }

    fn print_batch_line(&self, batch: &ExtractionBatch) {
        if self.quiet {
            return;
        }

        let line = format!(
            "{} [{}]: {} files, {} boxes in {}",
            batch.directory.display(),
            batch.warehouse,
            batch.files.len(),
            batch.boxes.len(),
            format_duration(batch.duration)
        );
        match self.mode {
            OutputMode::Plain => println!("DIRECTORY: {}", line),
            _ => self.success(&line),
        }
    }

    fn print_summary(&self, summary: &ExtractionSummary) {
        self.print_header("Extraction Summary");

        let rows = [
            ("Files", summary.total_files.to_string()),
            ("Boxes", summary.total_boxes.to_string()),
            ("Warehouses", summary.warehouses.join(", ")),
            (
                "Years",
                summary
                    .years
                    .iter()
                    .map(|y| y.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        ];
        for (label, value) in rows {
            println!("  {:<12} {}", format!("{}:", label), self.emphasize(&value));
        }

        if summary.total_boxes > 0 {
            println!("  {:<12} {}", "Units:", self.emphasize(&summary.total_units.to_string()));
            println!(
                "  {:<12} {} kg (avg {:.2} kg/box)",
                "Weight:",
                self.emphasize(&format!("{:.2}", summary.total_weight)),
                summary.average_box_weight
            );
            println!(
                "  {:<12} {} under / {} over",
                "Thresholds:", summary.under_weight, summary.over_weight
            );
        }

        if !summary.files_detail.is_empty() {
            println!();
            for detail in &summary.files_detail {
                println!(
                    "  - {} | {} | {} | {} | {}-W{:02} | {} boxes",
                    detail.name,
                    detail.warehouse,
                    detail.port,
                    detail.vessel,
                    detail.year,
                    detail.week,
                    detail.boxes
                );
            }
        }

        if summary.skipped_files > 0 {
            println!();
            println!("  {} files skipped", summary.skipped_files);
        }
        self.print_separator();
    }

    fn emphasize(&self, value: &str) -> String {
        if self.use_colors {
            style(value).cyan().bold().to_string()
        } else {
            value.to_string()
        }
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        let (emoji, prefix) = match msg_type {
            MessageType::Success => (&CHECKMARK, "✓"),
            MessageType::Error => (&CROSS, "✗"),
            MessageType::Warning => (&WARNING, "!"),
            MessageType::Info => (&INFO, "i"),
        };

        let line = if self.use_colors {
            let styled = match msg_type {
                MessageType::Success => style(message).green().bold(),
                MessageType::Error => style(message).red().bold(),
                MessageType::Warning => style(message).yellow().bold(),
                MessageType::Info => style(message).cyan(),
            };
            format!("{}{}", emoji, styled)
        } else {
            format!("{} {}", prefix, message)
        };

        match msg_type {
            MessageType::Error | MessageType::Warning => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        let value = json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        // Diagnostics stay off stdout so the report remains a single document.
        eprintln!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string()));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}
