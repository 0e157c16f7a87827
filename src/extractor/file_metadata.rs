use crate::config::ExtractionSettings;
use crate::error::{IngestError, Result};
use crate::extractor::sheet::{cell_reference, CellGrid, CellValue};
use crate::records::{compose_id, FileRecord};
use crate::scanner::Warehouse;

/// Header cells of a weights sheet, as `(row, col)`.
pub mod layout {
    pub const VESSEL: (u32, u32) = (1, 2); // B1
    pub const PORT: (u32, u32) = (1, 7); // G1
    pub const FILE_NUMBER: (u32, u32) = (1, 17); // Q1
    pub const WEEK: (u32, u32) = (1, 20); // T1
    pub const YEAR_LABEL: (u32, u32) = (2, 1); // A2
}

const YEAR_KEYWORD: &str = "Year";

pub struct FileMetadataExtractor {
    settings: ExtractionSettings,
}

impl FileMetadataExtractor {
    pub fn new(settings: ExtractionSettings) -> Self {
        Self { settings }
    }

    /// Reads the header block of a sheet into a [`FileRecord`].
    ///
    /// `name` is the normalized file name; it takes part in the identifier, so
    /// the same sheet under the same name always yields the same id.
    pub fn extract<G: CellGrid + ?Sized>(
        &self,
        grid: &G,
        name: &str,
        warehouse: Warehouse,
    ) -> Result<FileRecord> {
        let port = text_cell(grid, layout::PORT).to_uppercase();
        let vessel = text_cell(grid, layout::VESSEL);
        let file_number = text_cell(grid, layout::FILE_NUMBER);
        let year = parse_year(&text_cell(grid, layout::YEAR_LABEL));
        let week = read_week(grid, name)?;

        let year_text = year.to_string();
        let id = compose_id([warehouse.tag(), year_text.as_str(), name, file_number.as_str()]);

        tracing::debug!(file = %name, id = %id, week, year, "Read file header");

        FileRecord::new(
            id,
            name.to_string(),
            warehouse.tag().to_string(),
            port,
            vessel,
            year,
            week,
            self.settings.spec_value,
            self.settings.tipo_default.clone(),
        )
    }
}

/// Header cells are taken as stored; padding in Q1 is part of the identifier.
fn text_cell<G: CellGrid + ?Sized>(grid: &G, (row, col): (u32, u32)) -> String {
    grid.raw_text_at(row, col)
}

/// Week number from T1. A blank cell reads as 0; anything else must be an integer.
fn read_week<G: CellGrid + ?Sized>(grid: &G, file: &str) -> Result<i32> {
    let (row, col) = layout::WEEK;
    let Some(value) = grid.cell_at(row, col).filter(CellValue::is_truthy) else {
        return Ok(0);
    };

    let malformed = |message: String| {
        IngestError::malformed_cell(file, cell_reference(row, col), message)
    };

    match value {
        CellValue::Int(i) => {
            i32::try_from(i).map_err(|_| malformed(format!("week {} out of range", i)))
        }
        CellValue::Float(f) => Ok(f.trunc() as i32),
        CellValue::Bool(b) => Ok(b as i32),
        CellValue::Text(text) => text
            .trim()
            .parse::<i32>()
            .map_err(|_| malformed(format!("expected a week number, found '{}'", text))),
    }
}

/// Year from the A2 label.
///
/// Labels mentioning "Year" carry it as their last word (`"Crop Year 2025"`);
/// otherwise the last four characters are used. Unparseable labels give 0.
pub fn parse_year(label: &str) -> i32 {
    let candidate: String = if label.contains(YEAR_KEYWORD) {
        label.split_whitespace().last().unwrap_or("").to_string()
    } else {
        let chars: Vec<char> = label.chars().collect();
        chars[chars.len().saturating_sub(4)..].iter().collect()
    };

    candidate.trim().parse().unwrap_or(0)
}
