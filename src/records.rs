//! File and box records as they are handed to the warehouse.
//!
//! Serde field names are the warehouse column names, so a record serializes
//! straight into the row shape of `T1_ARCHIVOS` / `T2_CAJAS`.

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};

pub const ID_SEPARATOR: &str = "_";

/// Metadata of one ingested spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(rename = "id_archivo")]
    pub id: String,
    #[serde(rename = "archivo")]
    pub name: String,
    pub warehouse: String,
    #[serde(rename = "puerto")]
    pub port: String,
    #[serde(rename = "buque")]
    pub vessel: String,
    #[serde(rename = "annio")]
    pub year: i32,
    #[serde(rename = "semana")]
    pub week: i32,
    pub spec: u32,
    #[serde(rename = "tipo")]
    pub kind: String,
}

impl FileRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        name: String,
        warehouse: String,
        port: String,
        vessel: String,
        year: i32,
        week: i32,
        spec: u32,
        kind: String,
    ) -> Result<Self> {
        if id.is_empty() {
            return Err(IngestError::InvalidRecord {
                message: "file identifier cannot be empty".to_string(),
            });
        }
        if name.is_empty() {
            return Err(IngestError::InvalidRecord {
                message: "file name cannot be empty".to_string(),
            });
        }

        Ok(Self {
            id,
            name,
            warehouse,
            port,
            vessel,
            year,
            week,
            spec,
            kind,
        })
    }
}

/// One box column of a spreadsheet, with its weight aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxRecord {
    #[serde(rename = "id_caja")]
    pub id: String,
    #[serde(rename = "id_archivo")]
    pub file_id: String,
    #[serde(rename = "nombre_caja")]
    pub box_name: String,
    #[serde(rename = "codigo_container")]
    pub container_code: String,
    #[serde(rename = "codigo_hacienda")]
    pub site_code: i64,
    #[serde(rename = "codigo_trazabilidad")]
    pub traceability_code: String,
    #[serde(rename = "nombre_hacienda")]
    pub site_name: String,
    #[serde(rename = "temperatura")]
    pub temperature: f64,
    #[serde(rename = "dedos_totales")]
    pub total_units: i64,
    #[serde(rename = "peso_bruto_kg")]
    pub gross_weight: f64,
    #[serde(rename = "peso_total_kg")]
    pub total_weight: f64,
    #[serde(rename = "cantidad_observaciones")]
    pub observation_count: i64,
    #[serde(rename = "dedos_afectados_totales")]
    pub affected_units: i64,
    #[serde(rename = "peso_promedio")]
    pub average_weight: f64,
    pub week_code: u32,
    pub year_code: i32,
    pub spec: u32,
    #[serde(rename = "uw")]
    pub under_weight: u32,
    #[serde(rename = "ow")]
    pub over_weight: u32,
}

impl BoxRecord {
    pub fn validate(self) -> Result<Self> {
        if self.id.is_empty() {
            return Err(IngestError::InvalidRecord {
                message: "box identifier cannot be empty".to_string(),
            });
        }
        if self.file_id.is_empty() {
            return Err(IngestError::InvalidRecord {
                message: format!("box {} has no owning file identifier", self.id),
            });
        }
        Ok(self)
    }
}

/// Joins identifier parts with the fixed separator.
pub fn compose_id<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|p| p.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(ID_SEPARATOR)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
