use crate::config::ExtractionSettings;
use crate::error::{IngestError, Result};
use crate::extractor::sheet::{cell_reference, CellGrid};
use crate::extractor::traceability::decode_traceability;
use crate::records::{compose_id, round2, BoxRecord, FileRecord};
use crate::scanner::Warehouse;

/// Rows of a box column.
pub mod layout {
    pub const BOX_NAME_ROW: u32 = 2;
    pub const CONTAINER_ROW: u32 = 3;
    pub const SITE_CODE_ROW: u32 = 4;
    pub const TRACEABILITY_ROW: u32 = 5;
    pub const SITE_NAME_ROW: u32 = 6;
    pub const FIRST_WEIGHT_ROW: u32 = 8;

    /// Rows holding the `spec` weights of a box.
    pub fn weight_rows(spec: u32) -> std::ops::Range<u32> {
        FIRST_WEIGHT_ROW..FIRST_WEIGHT_ROW.saturating_add(spec)
    }

    pub const FIRST_BOX_COLUMN: u32 = 2;
    /// Each box occupies a value column followed by a spacer column.
    pub const COLUMN_STEP: u32 = 2;
}

/// Candidate box columns of a sheet: 2, 4, 6, ... up to the column bound,
/// ending early at the first column whose box name is blank.
pub struct BoxColumns<'g, G: CellGrid + ?Sized> {
    grid: &'g G,
    next: u32,
    max_column: u32,
}

impl<'g, G: CellGrid + ?Sized> BoxColumns<'g, G> {
    pub fn new(grid: &'g G, max_column: u32) -> Self {
        Self {
            grid,
            next: layout::FIRST_BOX_COLUMN,
            max_column,
        }
    }
}

impl<G: CellGrid + ?Sized> Clone for BoxColumns<'_, G> {
    fn clone(&self) -> Self {
        Self {
            grid: self.grid,
            next: self.next,
            max_column: self.max_column,
        }
    }
}

impl<G: CellGrid + ?Sized> Iterator for BoxColumns<'_, G> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next > self.max_column {
            return None;
        }

        let column = self.next;
        if self.grid.text_at(layout::BOX_NAME_ROW, column).is_empty() {
            self.next = self.max_column.saturating_add(1);
            return None;
        }

        self.next += layout::COLUMN_STEP;
        Some(column)
    }
}

/// Weight aggregates of one box column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightStats {
    pub count: u32,
    pub total: f64,
    pub average: f64,
    pub under: u32,
    pub over: u32,
}

impl WeightStats {
    /// Scans `spec` weight rows of `column`; empty and non-numeric cells are skipped.
    pub fn collect<G: CellGrid + ?Sized>(grid: &G, column: u32, settings: &ExtractionSettings) -> Self {
        let mut stats = WeightStats::default();
        let rows = layout::weight_rows(settings.spec_value);

        for weight in rows.filter_map(|row| grid.cell_at(row, column)?.as_f64()) {
            stats.count += 1;
            stats.total += weight;
            if weight < settings.uw_threshold {
                stats.under += 1;
            } else if weight > settings.ow_threshold {
                stats.over += 1;
            }
        }

        if stats.count > 0 {
            stats.average = stats.total / stats.count as f64;
        }
        stats
    }
}

/// Per-box readings that no supported sheet layout records.
///
/// Temperature, unit and defect rows only exist on the unsupported warehouse
/// variant, so every supported box carries zeros here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurements {
    pub temperature: f64,
    pub total_units: i64,
    pub gross_weight: f64,
    pub observation_count: i64,
    pub affected_units: i64,
}

impl Measurements {
    pub fn for_warehouse(_warehouse: Warehouse) -> Self {
        Self::default()
    }
}

pub struct BoxExtractor {
    settings: ExtractionSettings,
}

impl BoxExtractor {
    pub fn new(settings: ExtractionSettings) -> Self {
        Self { settings }
    }

    pub fn columns<'g, G: CellGrid + ?Sized>(&self, grid: &'g G) -> BoxColumns<'g, G> {
        BoxColumns::new(grid, self.settings.max_columns)
    }

    /// Box records of a sheet, in column order.
    ///
    /// A column that fails is logged and skipped; the remaining columns still
    /// produce records.
    pub fn extract<G: CellGrid + ?Sized>(
        &self,
        grid: &G,
        file: &FileRecord,
        warehouse: Warehouse,
    ) -> Vec<BoxRecord> {
        let mut boxes = Vec::new();

        for column in self.columns(grid) {
            match self.extract_column(grid, column, file, warehouse) {
                Ok(record) => boxes.push(record),
                Err(err) => {
                    tracing::warn!(
                        file = %file.name,
                        column = %cell_reference(layout::BOX_NAME_ROW, column),
                        "Skipping box column: {}",
                        err
                    );
                }
            }
        }

        tracing::debug!(file = %file.name, boxes = boxes.len(), "Extracted boxes");
        boxes
    }

    pub fn extract_column<G: CellGrid + ?Sized>(
        &self,
        grid: &G,
        column: u32,
        file: &FileRecord,
        warehouse: Warehouse,
    ) -> Result<BoxRecord> {
        let box_name = grid.text_at(layout::BOX_NAME_ROW, column);
        let container_code = grid.text_at(layout::CONTAINER_ROW, column);
        let site_code = grid
            .cell_at(layout::SITE_CODE_ROW, column)
            .map(|v| v.as_int())
            .unwrap_or(0);
        let traceability_code = grid.text_at(layout::TRACEABILITY_ROW, column);
        let site_name = grid.text_at(layout::SITE_NAME_ROW, column).to_uppercase();

        let (week_code, year_code) = decode_traceability(&traceability_code);

        let stats = WeightStats::collect(grid, column, &self.settings);
        if !stats.total.is_finite() {
            return Err(IngestError::malformed_cell(
                &file.name,
                cell_reference(layout::FIRST_WEIGHT_ROW, column),
                "weight total is not a finite number",
            ));
        }

        let year_text = file.year.to_string();
        let site_code_text = site_code.to_string();
        let box_slug = box_name.replace(' ', "_");
        let site_slug = site_name.replace(' ', "_");
        let id = compose_id([
            file.warehouse.as_str(),
            year_text.as_str(),
            file.name.as_str(),
            box_slug.as_str(),
            container_code.as_str(),
            site_code_text.as_str(),
            traceability_code.as_str(),
            site_slug.as_str(),
        ]);

        let measurements = Measurements::for_warehouse(warehouse);

        BoxRecord {
            id,
            file_id: file.id.clone(),
            box_name,
            container_code,
            site_code,
            traceability_code,
            site_name,
            temperature: round2(measurements.temperature),
            total_units: measurements.total_units,
            gross_weight: round2(measurements.gross_weight),
            total_weight: round2(stats.total),
            observation_count: measurements.observation_count,
            affected_units: measurements.affected_units,
            average_weight: round2(stats.average),
            week_code,
            year_code,
            spec: self.settings.spec_value,
            under_weight: stats.under,
            over_weight: stats.over,
        }
        .validate()
    }
}
