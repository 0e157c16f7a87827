pub mod box_extractor;
pub mod file_metadata;
pub mod orchestrator;
pub mod sheet;
pub mod traceability;

pub use box_extractor::{BoxColumns, BoxExtractor, Measurements, WeightStats};
pub use file_metadata::{parse_year, FileMetadataExtractor};
pub use orchestrator::{
    ExtractionBatch, ExtractionMode, ExtractionOrchestrator, ExtractionProgress,
    ExtractionSummary, FileBoxCount, FileDetail, SkippedFile,
};
pub use sheet::{cell_reference, CellGrid, CellValue, MemorySheet, WorkbookSheet};
pub use traceability::{decode_traceability, packing_date};
