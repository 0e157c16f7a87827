use crate::error::{IngestError, Result};
use crate::scanner::file_filter::FileFilter;
use crate::scanner::warehouse::Warehouse;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Leading characters of a partner file name that carry the facility short tag.
pub const NAME_PREFIX_WIDTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadsheetFile {
    pub normalized_name: String,
    pub original_name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl SpreadsheetFile {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let original_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        Self {
            normalized_name: normalize_file_name(&original_name),
            original_name,
            path,
            size,
        }
    }

    pub fn size_kb(&self) -> f64 {
        (self.size as f64 / 1024.0 * 100.0).round() / 100.0
    }
}

/// The spreadsheets of one directory, with the warehouse the folder belongs to.
#[derive(Debug, Clone)]
pub struct SpreadsheetSet {
    pub directory: PathBuf,
    pub folder_name: String,
    pub warehouse: Warehouse,
    pub files: Vec<SpreadsheetFile>,
}

/// Drops the facility short tag from a file name.
///
/// `"日通 WK26 MYNY.xlsx"` becomes `"WK26 MYNY.xlsx"`; names of three characters
/// or fewer are returned unchanged.
pub fn normalize_file_name(name: &str) -> String {
    if name.chars().count() > NAME_PREFIX_WIDTH {
        name.chars()
            .skip(NAME_PREFIX_WIDTH)
            .collect::<String>()
            .trim_start()
            .to_string()
    } else {
        name.to_string()
    }
}

pub struct FileSetLocator {
    filter: FileFilter,
}

impl FileSetLocator {
    pub fn new() -> Self {
        Self {
            filter: FileFilter::new(),
        }
    }

    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn locate<P: AsRef<Path>>(&self, directory: P) -> Result<SpreadsheetSet> {
        let directory = directory.as_ref();

        if !directory.exists() {
            return Err(IngestError::NotFound {
                path: directory.display().to_string(),
            });
        }

        if !directory.is_dir() {
            return Err(IngestError::NotADirectory {
                path: directory.display().to_string(),
            });
        }

        let mut files = Vec::new();

        let walker = WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(directory = %directory.display(), "Skipping unreadable entry: {}", err);
                    continue;
                }
            };

            if let Some(file) = self.process_entry(&entry) {
                files.push(file);
            }
        }

        if files.is_empty() {
            return Err(IngestError::EmptyInput {
                path: directory.display().to_string(),
                searched_extensions: self.filter.get_extensions().clone(),
            });
        }

        let folder_name = folder_name(directory);
        let warehouse = Warehouse::classify(&folder_name);

        if !warehouse.is_supported() {
            tracing::warn!(
                folder = %folder_name,
                warehouse = %warehouse,
                files = files.len(),
                "Folder belongs to an unsupported warehouse variant"
            );
            return Err(IngestError::UnsupportedVariant {
                folder: folder_name,
                warehouse: warehouse.to_string(),
            });
        }

        tracing::debug!(
            folder = %folder_name,
            warehouse = %warehouse,
            "Located {} spreadsheets",
            files.len()
        );

        Ok(SpreadsheetSet {
            directory: directory.to_path_buf(),
            folder_name,
            warehouse,
            files,
        })
    }

    fn process_entry(&self, entry: &DirEntry) -> Option<SpreadsheetFile> {
        if !entry.file_type().is_file() {
            return None;
        }

        let path = entry.path();
        if !self.filter.accepts(path) {
            return None;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        Some(SpreadsheetFile::new(path.to_path_buf(), size))
    }

    /// File listing of a directory, without opening any workbook.
    pub fn describe<P: AsRef<Path>>(&self, directory: P) -> Result<FileListing> {
        let set = self.locate(directory)?;
        let statistics = self.get_statistics(&set.files);

        let files = set
            .files
            .iter()
            .map(|file| FileInfo {
                original_name: file.original_name.clone(),
                normalized_name: file.normalized_name.clone(),
                path: file.path.clone(),
                size_kb: file.size_kb(),
            })
            .collect();

        Ok(FileListing {
            directory: set.directory,
            warehouse: set.warehouse,
            files,
            statistics,
        })
    }

    pub fn get_statistics(&self, files: &[SpreadsheetFile]) -> ScanStatistics {
        let mut files_by_extension = HashMap::new();
        for file in files {
            let ext = file
                .path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("no_extension")
                .to_lowercase();
            *files_by_extension.entry(ext).or_insert(0) += 1;
        }

        ScanStatistics {
            total_files: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
            files_by_extension,
        }
    }
}

impl Default for FileSetLocator {
    fn default() -> Self {
        Self::new()
    }
}

fn folder_name(directory: &Path) -> String {
    directory
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .or_else(|| {
            directory
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub original_name: String,
    pub normalized_name: String,
    pub path: PathBuf,
    pub size_kb: f64,
}

#[derive(Debug, Serialize)]
pub struct FileListing {
    pub directory: PathBuf,
    pub warehouse: Warehouse,
    pub files: Vec<FileInfo>,
    pub statistics: ScanStatistics,
}

#[derive(Debug, Default, Serialize)]
pub struct ScanStatistics {
    pub total_files: usize,
    pub total_size: u64,
    pub files_by_extension: HashMap<String, usize>,
}

impl ScanStatistics {
    pub fn display_summary(&self) -> String {
        let mut summary = format!(
            "Scan Results:\n  Total files: {}\n  Total size: {:.2} KB\n",
            self.total_files,
            self.total_size as f64 / 1024.0
        );

        if !self.files_by_extension.is_empty() {
            summary.push_str("  Files by type:\n");
            let mut extensions: Vec<_> = self.files_by_extension.iter().collect();
            extensions.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

            for (ext, count) in extensions {
                summary.push_str(&format!("    {}: {} files\n", ext, count));
            }
        }

        summary
    }
}
