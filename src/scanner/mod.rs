pub mod file_filter;
pub mod spreadsheet_scanner;
pub mod warehouse;

pub use file_filter::FileFilter;
pub use spreadsheet_scanner::{
    normalize_file_name, FileInfo, FileListing, FileSetLocator, ScanStatistics, SpreadsheetFile,
    SpreadsheetSet,
};
pub use warehouse::Warehouse;
