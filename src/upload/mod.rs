//! Loading extracted records into the warehouse.
//!
//! The extraction core only relies on [`RecordStore`]; [`LocalStore`] is the
//! directory-backed implementation the command line uses.

pub mod local_store;
pub mod schema;
pub mod uploader;

use crate::error::Result;
use crate::records::{BoxRecord, FileRecord};
use std::collections::HashSet;

pub use local_store::LocalStore;
pub use schema::{FieldMode, FieldType, SchemaField, TableSchema};
pub use uploader::{UploadOutcome, Uploader};

pub trait RecordStore {
    /// Creates missing tables; existing ones must match their schema.
    fn ensure_tables(&mut self, schemas: &[TableSchema]) -> Result<()>;

    /// The subset of `ids` already present in the file table.
    fn existing_file_ids(&self, ids: &[String]) -> Result<HashSet<String>>;

    fn load_files(&mut self, files: &[FileRecord]) -> Result<usize>;

    fn load_boxes(&mut self, boxes: &[BoxRecord]) -> Result<usize>;
}
