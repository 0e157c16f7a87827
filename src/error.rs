use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Input directory not found: {path}")]
    NotFound { path: String },

    #[error("Input path is not a directory: {path}")]
    NotADirectory { path: String },

    #[error("No spreadsheet files found in {path}")]
    EmptyInput {
        path: String,
        searched_extensions: Vec<String>,
    },

    #[error("Warehouse variant {warehouse} is not supported yet (folder: {folder})")]
    UnsupportedVariant { folder: String, warehouse: String },

    #[error("Malformed cell {cell} in {file}: {message}")]
    MalformedCell {
        file: String,
        cell: String,
        message: String,
    },

    #[error("Failed to read workbook {path}: {message}")]
    Workbook { path: String, message: String },

    #[error("Invalid record: {message}")]
    InvalidRecord { message: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Upload failed: {message}")]
    Upload { message: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

impl IngestError {
    /// Failures that concern a whole input directory rather than one file or column.
    pub fn is_directory_level(&self) -> bool {
        matches!(
            self,
            IngestError::NotFound { .. }
                | IngestError::NotADirectory { .. }
                | IngestError::EmptyInput { .. }
                | IngestError::UnsupportedVariant { .. }
        )
    }

    pub fn malformed_cell<F, C, M>(file: F, cell: C, message: M) -> Self
    where
        F: Into<String>,
        C: Into<String>,
        M: Into<String>,
    {
        IngestError::MalformedCell {
            file: file.into(),
            cell: cell.into(),
            message: message.into(),
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for IngestError {
    fn user_message(&self) -> String {
        match self {
            IngestError::NotFound { path } => {
                format!("Directory does not exist: {}", path)
            }
            IngestError::NotADirectory { path } => {
                format!("Not a directory: {}", path)
            }
            IngestError::EmptyInput {
                path,
                searched_extensions,
            } => {
                format!(
                    "No spreadsheets ({}) found in {}",
                    searched_extensions.join(", "),
                    path
                )
            }
            IngestError::UnsupportedVariant { folder, warehouse } => {
                format!(
                    "Folder '{}' belongs to warehouse {}, which is not configured yet",
                    folder, warehouse
                )
            }
            IngestError::MalformedCell {
                file,
                cell,
                message,
            } => {
                format!("Cell {} of {} could not be read: {}", cell, file, message)
            }
            IngestError::Workbook { path, message } => {
                format!("Could not open spreadsheet {}: {}", path, message)
            }
            IngestError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            IngestError::Upload { message } => {
                format!("Upload error: {}", message)
            }
            IngestError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            IngestError::NotFound { .. } => Some(
                "Check the directory path, or the *_PATH variables in your .env file.".to_string()
            ),
            IngestError::NotADirectory { .. } => Some(
                "Pass the warehouse folder itself, not a file inside it.".to_string()
            ),
            IngestError::EmptyInput { .. } => Some(
                "Make sure the folder contains .xlsx or .xls files and that they are not open in Excel (~$ lock files are ignored).".to_string()
            ),
            IngestError::UnsupportedVariant { .. } => Some(
                "Process this folder once its layout is supported, or move the files to a NITTSU, KOBE or HAKATA folder.".to_string()
            ),
            IngestError::Workbook { .. } => Some(
                "Verify the file is a valid Excel workbook and is not password protected.".to_string()
            ),
            IngestError::Config { .. } => Some(
                "Check your configuration file syntax and the numeric environment variables (SPEC_VALUE, UW_THRESHOLD, OW_THRESHOLD).".to_string()
            ),
            IngestError::Upload { .. } => Some(
                "Verify the store directory is writable and that PROJECT_ID / DATASET_ID are set.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for IngestError {
    fn from(error: toml::de::Error) -> Self {
        IngestError::Config {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(error: serde_json::Error) -> Self {
        IngestError::Upload {
            message: error.to_string(),
        }
    }
}

impl From<calamine::Error> for IngestError {
    fn from(error: calamine::Error) -> Self {
        IngestError::Workbook {
            path: "workbook".to_string(),
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
