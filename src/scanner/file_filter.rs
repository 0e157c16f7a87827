use regex::Regex;
use std::path::Path;

/// Prefix Excel gives the lock file it keeps next to an open workbook.
pub const LOCK_FILE_MARKER: &str = "~$";

pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls"];

pub struct FileFilter {
    extensions: Vec<String>,
    exclude_patterns: Vec<Regex>,
}

impl FileFilter {
    pub fn new() -> Self {
        Self {
            extensions: SPREADSHEET_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            exclude_patterns: Vec::new(),
        }
    }

    pub fn with_exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_patterns = patterns
            .into_iter()
            .filter_map(|pattern| Regex::new(pattern.as_ref()).ok())
            .collect();
        self
    }

    pub fn is_lock_file(&self, file_name: &str) -> bool {
        file_name.starts_with(LOCK_FILE_MARKER)
    }

    pub fn is_spreadsheet(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    pub fn accepts(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
            return false;
        };

        if self.is_lock_file(file_name) {
            return false;
        }

        if self.matches_any_pattern(file_name) {
            return false;
        }

        self.is_spreadsheet(path)
    }

    pub fn matches_any_pattern(&self, text: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.is_match(text))
    }

    pub fn get_extensions(&self) -> &Vec<String> {
        &self.extensions
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new()
    }
}
