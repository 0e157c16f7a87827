use crate::config::ExtractionSettings;
use crate::error::Result;
use crate::extractor::box_extractor::BoxExtractor;
use crate::extractor::file_metadata::FileMetadataExtractor;
use crate::extractor::sheet::{CellGrid, WorkbookSheet};
use crate::records::{round2, BoxRecord, FileRecord};
use crate::scanner::{FileSetLocator, SpreadsheetFile, SpreadsheetSet, Warehouse};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    FilesOnly,
    FilesAndBoxes,
}

impl ExtractionMode {
    pub fn includes_boxes(&self) -> bool {
        matches!(self, ExtractionMode::FilesAndBoxes)
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub boxes_found: usize,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub errors: Vec<String>,
}

impl ExtractionProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_processed: 0,
            total_files,
            boxes_found: 0,
            current_file: None,
            start_time: Instant::now(),
            errors: Vec::new(),
        }
    }

    pub fn update_file(&mut self, filename: String, boxes: usize) {
        self.files_processed += 1;
        self.boxes_found += boxes;
        self.current_file = Some(filename);
    }

    pub fn add_error<S: Into<String>>(&mut self, error: S) {
        self.errors.push(error.into());
    }

    pub fn percentage(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.files_processed as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// A file left out of a batch, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub name: String,
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileBoxCount {
    pub file_id: String,
    pub name: String,
    pub boxes: usize,
}

/// Records extracted from one directory.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionBatch {
    pub directory: PathBuf,
    pub warehouse: Warehouse,
    pub mode: ExtractionMode,
    pub files: Vec<FileRecord>,
    pub boxes: Vec<BoxRecord>,
    pub skipped: Vec<SkippedFile>,
    pub box_counts: Vec<FileBoxCount>,
    #[serde(skip)]
    pub duration: Duration,
}

impl ExtractionBatch {
    pub fn summary(&self) -> ExtractionSummary {
        ExtractionSummary::from_batches([self])
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Per-file line of a summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDetail {
    #[serde(rename = "archivo")]
    pub name: String,
    pub warehouse: String,
    #[serde(rename = "puerto")]
    pub port: String,
    #[serde(rename = "buque")]
    pub vessel: String,
    #[serde(rename = "annio")]
    pub year: i32,
    #[serde(rename = "semana")]
    pub week: i32,
    pub boxes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionSummary {
    pub total_files: usize,
    pub total_boxes: usize,
    pub warehouses: Vec<String>,
    pub years: Vec<i32>,
    pub files_detail: Vec<FileDetail>,
    pub total_units: i64,
    pub total_weight: f64,
    /// Total weight divided by the number of boxes.
    pub average_box_weight: f64,
    pub under_weight: u64,
    pub over_weight: u64,
    pub skipped_files: usize,
}

impl ExtractionSummary {
    pub fn from_batches<'a, I>(batches: I) -> Self
    where
        I: IntoIterator<Item = &'a ExtractionBatch>,
    {
        let mut summary = ExtractionSummary::default();
        let mut warehouses = BTreeSet::new();
        let mut years = BTreeSet::new();
        let mut total_weight = 0.0;

        for batch in batches {
            summary.total_files += batch.files.len();
            summary.total_boxes += batch.boxes.len();
            summary.skipped_files += batch.skipped.len();

            for file in &batch.files {
                warehouses.insert(file.warehouse.clone());
                years.insert(file.year);

                let boxes = batch
                    .box_counts
                    .iter()
                    .find(|count| count.file_id == file.id)
                    .map(|count| count.boxes)
                    .unwrap_or(0);
                summary.files_detail.push(FileDetail {
                    name: file.name.clone(),
                    warehouse: file.warehouse.clone(),
                    port: file.port.clone(),
                    vessel: file.vessel.clone(),
                    year: file.year,
                    week: file.week,
                    boxes,
                });
            }

            for record in &batch.boxes {
                summary.total_units += record.total_units;
                total_weight += record.total_weight;
                summary.under_weight += record.under_weight as u64;
                summary.over_weight += record.over_weight as u64;
            }
        }

        summary.warehouses = warehouses.into_iter().collect();
        summary.years = years.into_iter().collect();
        summary.total_weight = round2(total_weight);
        if summary.total_boxes > 0 {
            summary.average_box_weight = round2(total_weight / summary.total_boxes as f64);
        }
        summary
    }
}

/// Runs the locator and both extractors over a directory.
pub struct ExtractionOrchestrator {
    locator: FileSetLocator,
    metadata: FileMetadataExtractor,
    boxes: BoxExtractor,
}

impl ExtractionOrchestrator {
    pub fn new(settings: ExtractionSettings) -> Self {
        Self {
            locator: FileSetLocator::new(),
            metadata: FileMetadataExtractor::new(settings.clone()),
            boxes: BoxExtractor::new(settings),
        }
    }

    pub fn with_locator(mut self, locator: FileSetLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn locator(&self) -> &FileSetLocator {
        &self.locator
    }

    pub fn extract_directory<P: AsRef<Path>>(
        &self,
        directory: P,
        mode: ExtractionMode,
        progress_callback: Option<&dyn Fn(&ExtractionProgress)>,
    ) -> Result<ExtractionBatch> {
        let set = self.locator.locate(directory)?;
        Ok(self.extract_set(&set, mode, progress_callback))
    }

    /// Extracts every file of a located set. Files that fail are recorded in
    /// [`ExtractionBatch::skipped`]; records keep the listing order.
    pub fn extract_set(
        &self,
        set: &SpreadsheetSet,
        mode: ExtractionMode,
        progress_callback: Option<&dyn Fn(&ExtractionProgress)>,
    ) -> ExtractionBatch {
        let mut progress = ExtractionProgress::new(set.files.len());
        let mut batch = ExtractionBatch {
            directory: set.directory.clone(),
            warehouse: set.warehouse,
            mode,
            files: Vec::with_capacity(set.files.len()),
            boxes: Vec::new(),
            skipped: Vec::new(),
            box_counts: Vec::new(),
            duration: Duration::default(),
        };

        tracing::info!(
            directory = %set.directory.display(),
            warehouse = %set.warehouse,
            files = set.files.len(),
            "Extracting {:?}",
            mode
        );

        #[cfg(feature = "parallel")]
        let outcomes: Vec<_> = {
            use rayon::prelude::*;
            set.files
                .par_iter()
                .map(|file| (file, self.extract_file(file, set.warehouse, mode)))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes = set
            .files
            .iter()
            .map(|file| (file, self.extract_file(file, set.warehouse, mode)));

        for (file, outcome) in outcomes {
            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            match outcome {
                Ok((record, boxes)) => {
                    progress.update_file(file.normalized_name.clone(), boxes.len());
                    if mode.includes_boxes() {
                        batch.box_counts.push(FileBoxCount {
                            file_id: record.id.clone(),
                            name: record.name.clone(),
                            boxes: boxes.len(),
                        });
                    }
                    batch.files.push(record);
                    batch.boxes.extend(boxes);
                }
                Err(err) => {
                    tracing::warn!(file = %file.normalized_name, "Skipping file: {}", err);
                    progress.add_error(format!("{}: {}", file.normalized_name, err));
                    progress.files_processed += 1;
                    batch.skipped.push(SkippedFile {
                        name: file.normalized_name.clone(),
                        path: file.path.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        batch.duration = progress.elapsed();
        tracing::info!(
            files = batch.files.len(),
            boxes = batch.boxes.len(),
            skipped = batch.skipped.len(),
            "Directory extracted in {:.2?}",
            batch.duration
        );
        batch
    }

    /// Opens one workbook, reads it, and releases it before returning.
    pub fn extract_file(
        &self,
        file: &SpreadsheetFile,
        warehouse: Warehouse,
        mode: ExtractionMode,
    ) -> Result<(FileRecord, Vec<BoxRecord>)> {
        let sheet = WorkbookSheet::open(&file.path)?;
        self.extract_sheet(&sheet, &file.normalized_name, warehouse, mode)
    }

    pub fn extract_sheet<G: CellGrid + ?Sized>(
        &self,
        grid: &G,
        name: &str,
        warehouse: Warehouse,
        mode: ExtractionMode,
    ) -> Result<(FileRecord, Vec<BoxRecord>)> {
        let record = self.metadata.extract(grid, name, warehouse)?;
        let boxes = if mode.includes_boxes() {
            self.boxes.extract(grid, &record, warehouse)
        } else {
            Vec::new()
        };
        Ok((record, boxes))
    }
}
