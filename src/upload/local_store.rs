use crate::config::WarehouseConfig;
use crate::error::{IngestError, Result};
use crate::records::{BoxRecord, FileRecord};
use crate::upload::schema::TableSchema;
use crate::upload::RecordStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const ROWS_EXTENSION: &str = "jsonl";
const SCHEMA_SUFFIX: &str = "_schema.json";
const FILE_KEY_COLUMN: &str = "id_archivo";
const DATASET_FILE: &str = "_dataset.json";

/// Where the dataset lives in the warehouse, written once next to its tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub project_id: String,
    pub dataset_id: String,
    pub location: String,
}

/// Directory-backed warehouse: one newline-delimited JSON file per table
/// under `<root>/<dataset>/`, appended to on every load.
pub struct LocalStore {
    dataset: DatasetInfo,
    dataset_dir: PathBuf,
    files_table: String,
    boxes_table: String,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(root: P, dataset: &str, files_table: &str, boxes_table: &str) -> Self {
        Self {
            dataset: DatasetInfo {
                project_id: String::new(),
                dataset_id: dataset.to_string(),
                location: String::new(),
            },
            dataset_dir: root.as_ref().join(dataset),
            files_table: files_table.to_string(),
            boxes_table: boxes_table.to_string(),
        }
    }

    pub fn from_config(config: &WarehouseConfig) -> Self {
        Self::new(
            &config.output_directory,
            &config.dataset_id,
            &config.files_table,
            &config.boxes_table,
        )
        .with_location(&config.project_id, &config.location)
    }

    pub fn with_location(mut self, project_id: &str, location: &str) -> Self {
        self.dataset.project_id = project_id.to_string();
        self.dataset.location = location.to_string();
        self
    }

    pub fn dataset(&self) -> &DatasetInfo {
        &self.dataset
    }

    pub fn dataset_dir(&self) -> &Path {
        &self.dataset_dir
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dataset_dir.join(format!("{}.{}", table, ROWS_EXTENSION))
    }

    fn schema_path(&self, table: &str) -> PathBuf {
        self.dataset_dir.join(format!("{}{}", table, SCHEMA_SUFFIX))
    }

    pub fn files_table(&self) -> &str {
        &self.files_table
    }

    pub fn boxes_table(&self) -> &str {
        &self.boxes_table
    }

    fn append_rows<T: Serialize>(&self, table: &str, rows: &[T]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        fs::create_dir_all(&self.dataset_dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.table_path(table))?;
        let mut writer = BufWriter::new(file);

        for row in rows {
            serde_json::to_writer(&mut writer, row)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        tracing::info!(table, rows = rows.len(), "Appended rows");
        Ok(rows.len())
    }

    /// All rows of a table; a table that was never written reads as empty.
    pub fn read_rows<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        let path = self.table_path(table);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(fs::File::open(&path)?);
        let mut rows = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            rows.push(serde_json::from_str(&line)?);
        }
        Ok(rows)
    }
}

impl RecordStore for LocalStore {
    fn ensure_tables(&mut self, schemas: &[TableSchema]) -> Result<()> {
        fs::create_dir_all(&self.dataset_dir)?;

        let dataset_path = self.dataset_dir.join(DATASET_FILE);
        if !dataset_path.exists() {
            fs::write(&dataset_path, serde_json::to_string_pretty(&self.dataset)?)?;
            tracing::info!(
                project = %self.dataset.project_id,
                dataset = %self.dataset.dataset_id,
                location = %self.dataset.location,
                "Created dataset"
            );
        }

        for schema in schemas {
            let path = self.schema_path(&schema.table);
            if path.exists() {
                let stored: TableSchema = serde_json::from_str(&fs::read_to_string(&path)?)?;
                if &stored != schema {
                    return Err(IngestError::Upload {
                        message: format!(
                            "table {} exists with a different schema ({})",
                            schema.table,
                            path.display()
                        ),
                    });
                }
                tracing::debug!(table = %schema.table, "Table already exists");
            } else {
                fs::write(&path, serde_json::to_string_pretty(schema)?)?;
                tracing::info!(table = %schema.table, "Created table");
            }
        }

        Ok(())
    }

    fn existing_file_ids(&self, ids: &[String]) -> Result<HashSet<String>> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let rows: Vec<serde_json::Value> = self.read_rows(&self.files_table)?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get(FILE_KEY_COLUMN)?.as_str())
            .filter(|id| wanted.contains(id))
            .map(String::from)
            .collect())
    }

    fn load_files(&mut self, files: &[FileRecord]) -> Result<usize> {
        self.append_rows(&self.files_table, files)
    }

    fn load_boxes(&mut self, boxes: &[BoxRecord]) -> Result<usize> {
        self.append_rows(&self.boxes_table, boxes)
    }
}
