use crate::error::Result;
use crate::extractor::ExtractionBatch;
use crate::records::{BoxRecord, FileRecord};
use crate::upload::schema::TableSchema;
use crate::upload::RecordStore;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadOutcome {
    pub files_loaded: usize,
    pub boxes_loaded: usize,
    pub duplicates_skipped: usize,
}

impl UploadOutcome {
    pub fn merge(&mut self, other: &UploadOutcome) {
        self.files_loaded += other.files_loaded;
        self.boxes_loaded += other.boxes_loaded;
        self.duplicates_skipped += other.duplicates_skipped;
    }
}

/// Deduplicates records by file identifier and hands the rest to a store.
pub struct Uploader<S: RecordStore> {
    store: S,
    schemas: [TableSchema; 2],
}

impl<S: RecordStore> Uploader<S> {
    pub fn new(store: S, files_table: &str, boxes_table: &str) -> Self {
        Self {
            store,
            schemas: [TableSchema::files(files_table), TableSchema::boxes(boxes_table)],
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn upload(&mut self, batch: &ExtractionBatch, check_duplicates: bool) -> Result<UploadOutcome> {
        self.upload_records(&batch.files, &batch.boxes, check_duplicates)
    }

    /// Loads the boxes of files not yet in the store, then the file rows.
    ///
    /// File rows go last because they are what the duplicate check sees: a
    /// stored file row means its boxes were stored too. When the existence
    /// check itself fails every record is loaded.
    pub fn upload_records(
        &mut self,
        files: &[FileRecord],
        boxes: &[BoxRecord],
        check_duplicates: bool,
    ) -> Result<UploadOutcome> {
        if files.is_empty() {
            tracing::warn!("No files to upload");
            return Ok(UploadOutcome::default());
        }

        self.store.ensure_tables(&self.schemas)?;

        let existing = if check_duplicates {
            self.existing_ids(files)
        } else {
            HashSet::new()
        };

        let new_files: Vec<FileRecord> = files
            .iter()
            .filter(|f| !existing.contains(&f.id))
            .cloned()
            .collect();
        let mut outcome = UploadOutcome {
            duplicates_skipped: files.len() - new_files.len(),
            ..UploadOutcome::default()
        };

        if new_files.is_empty() {
            tracing::info!(files = files.len(), "All files already exist in the warehouse");
            return Ok(outcome);
        }

        let new_ids: HashSet<&str> = new_files.iter().map(|f| f.id.as_str()).collect();
        let new_boxes: Vec<BoxRecord> = boxes
            .iter()
            .filter(|b| new_ids.contains(b.file_id.as_str()))
            .cloned()
            .collect();

        if !new_boxes.is_empty() {
            outcome.boxes_loaded = self.store.load_boxes(&new_boxes)?;
        }
        outcome.files_loaded = self.store.load_files(&new_files)?;

        tracing::info!(
            files = outcome.files_loaded,
            boxes = outcome.boxes_loaded,
            duplicates = outcome.duplicates_skipped,
            "Upload complete"
        );
        Ok(outcome)
    }

    fn existing_ids(&self, files: &[FileRecord]) -> HashSet<String> {
        let ids: Vec<String> = files.iter().map(|f| f.id.clone()).collect();
        match self.store.existing_file_ids(&ids) {
            Ok(existing) => {
                tracing::info!(
                    existing = existing.len(),
                    new = files.len().saturating_sub(existing.len()),
                    "Checked for existing files"
                );
                existing
            }
            Err(err) => {
                tracing::warn!("Could not check existing files: {}. Uploading all files.", err);
                HashSet::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct MemoryStore {
        files: Vec<FileRecord>,
        boxes: Vec<BoxRecord>,
        fail_lookup: bool,
        fail_boxes: bool,
        tables_ensured: usize,
    }

    impl RecordStore for MemoryStore {
        fn ensure_tables(&mut self, schemas: &[TableSchema]) -> Result<()> {
            self.tables_ensured += schemas.len();
            Ok(())
        }

        fn existing_file_ids(&self, ids: &[String]) -> Result<HashSet<String>> {
            if self.fail_lookup {
                return Err(IngestError::Upload {
                    message: "lookup unavailable".to_string(),
                });
            }
            Ok(self
                .files
                .iter()
                .filter(|f| ids.contains(&f.id))
                .map(|f| f.id.clone())
                .collect())
        }

        fn load_files(&mut self, files: &[FileRecord]) -> Result<usize> {
            self.files.extend_from_slice(files);
            Ok(files.len())
        }

        fn load_boxes(&mut self, boxes: &[BoxRecord]) -> Result<usize> {
            if self.fail_boxes {
                return Err(IngestError::Upload {
                    message: "box load rejected".to_string(),
                });
            }
            self.boxes.extend_from_slice(boxes);
            Ok(boxes.len())
        }
    }

    fn file(id: &str) -> FileRecord {
        FileRecord::new(
            id.to_string(),
            format!("{}.xlsx", id),
            "NITTSU".to_string(),
            String::new(),
            String::new(),
            2025,
            26,
            30,
            "CGC".to_string(),
        )
        .unwrap()
    }

    fn box_of(file_id: &str, name: &str) -> BoxRecord {
        BoxRecord {
            id: format!("{}_{}", file_id, name),
            file_id: file_id.to_string(),
            box_name: name.to_string(),
            container_code: String::new(),
            site_code: 0,
            traceability_code: String::new(),
            site_name: String::new(),
            temperature: 0.0,
            total_units: 0,
            gross_weight: 0.0,
            total_weight: 600.0,
            observation_count: 0,
            affected_units: 0,
            average_weight: 600.0,
            week_code: 0,
            year_code: 0,
            spec: 30,
            under_weight: 0,
            over_weight: 0,
        }
    }

    fn uploader(store: MemoryStore) -> Uploader<MemoryStore> {
        Uploader::new(store, "T1_ARCHIVOS", "T2_CAJAS")
    }

    #[test]
    fn test_uploads_new_records() {
        let mut uploader = uploader(MemoryStore::default());
        let outcome = uploader
            .upload_records(&[file("a"), file("b")], &[box_of("a", "1"), box_of("b", "1")], true)
            .unwrap();

        assert_eq!(
            outcome,
            UploadOutcome {
                files_loaded: 2,
                boxes_loaded: 2,
                duplicates_skipped: 0,
            }
        );
        assert_eq!(uploader.store().tables_ensured, 2);
    }

    #[test]
    fn test_skips_existing_files_and_their_boxes() {
        let store = MemoryStore {
            files: vec![file("a")],
            ..MemoryStore::default()
        };
        let mut uploader = uploader(store);

        let outcome = uploader
            .upload_records(
                &[file("a"), file("b")],
                &[box_of("a", "1"), box_of("a", "2"), box_of("b", "1")],
                true,
            )
            .unwrap();

        assert_eq!(outcome.files_loaded, 1);
        assert_eq!(outcome.boxes_loaded, 1);
        assert_eq!(outcome.duplicates_skipped, 1);

        let store = uploader.into_store();
        assert_eq!(store.boxes.len(), 1);
        assert_eq!(store.boxes[0].file_id, "b");
    }

    #[test]
    fn test_everything_already_present() {
        let store = MemoryStore {
            files: vec![file("a")],
            ..MemoryStore::default()
        };
        let mut uploader = uploader(store);

        let outcome = uploader.upload_records(&[file("a")], &[], true).unwrap();
        assert_eq!(outcome.files_loaded, 0);
        assert_eq!(outcome.duplicates_skipped, 1);
        assert_eq!(uploader.store().files.len(), 1);
    }

    #[test]
    fn test_dedup_disabled_loads_everything() {
        let store = MemoryStore {
            files: vec![file("a")],
            ..MemoryStore::default()
        };
        let mut uploader = uploader(store);

        let outcome = uploader.upload_records(&[file("a")], &[], false).unwrap();
        assert_eq!(outcome.files_loaded, 1);
        assert_eq!(uploader.store().files.len(), 2);
    }

    #[test]
    fn test_failed_lookup_uploads_everything() {
        let store = MemoryStore {
            files: vec![file("a")],
            fail_lookup: true,
            ..MemoryStore::default()
        };
        let mut uploader = uploader(store);

        let outcome = uploader.upload_records(&[file("a"), file("b")], &[], true).unwrap();
        assert_eq!(outcome.files_loaded, 2);
        assert_eq!(outcome.duplicates_skipped, 0);
    }

    #[test]
    fn test_empty_input_loads_nothing() {
        let mut uploader = uploader(MemoryStore::default());
        let outcome = uploader.upload_records(&[], &[box_of("a", "1")], true).unwrap();
        assert_eq!(outcome, UploadOutcome::default());
        assert_eq!(uploader.store().tables_ensured, 0);
    }

    #[test]
    fn test_failed_box_load_leaves_file_for_retry() {
        let store = MemoryStore {
            fail_boxes: true,
            ..MemoryStore::default()
        };
        let mut first = uploader(store);
        let files = [file("a")];
        let boxes = [box_of("a", "1")];

        assert!(first.upload_records(&files, &boxes, true).is_err());
        assert!(first.store().files.is_empty());

        let mut store = first.into_store();
        store.fail_boxes = false;
        let mut retry = uploader(store);

        let outcome = retry.upload_records(&files, &boxes, true).unwrap();
        assert_eq!(
            outcome,
            UploadOutcome {
                files_loaded: 1,
                boxes_loaded: 1,
                duplicates_skipped: 0,
            }
        );
        assert_eq!(retry.store().boxes.len(), 1);
    }
}
