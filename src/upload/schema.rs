use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Integer,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    Required,
    Nullable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub mode: FieldMode,
}

impl SchemaField {
    fn required(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            mode: FieldMode::Required,
        }
    }

    fn nullable(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            mode: FieldMode::Nullable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    pub fields: Vec<SchemaField>,
}

impl TableSchema {
    /// Columns of the file table, keyed by `id_archivo`.
    pub fn files(table: &str) -> Self {
        let mut fields = vec![SchemaField::required("id_archivo", FieldType::String)];
        fields.extend(
            [
                ("archivo", FieldType::String),
                ("warehouse", FieldType::String),
                ("puerto", FieldType::String),
                ("buque", FieldType::String),
                ("annio", FieldType::Integer),
                ("semana", FieldType::Integer),
                ("spec", FieldType::Integer),
                ("tipo", FieldType::String),
            ]
            .into_iter()
            .map(|(name, ty)| SchemaField::nullable(name, ty)),
        );

        Self {
            table: table.to_string(),
            fields,
        }
    }

    /// Columns of the box table; `id_archivo` points back at the file table.
    pub fn boxes(table: &str) -> Self {
        let mut fields = vec![
            SchemaField::required("id_caja", FieldType::String),
            SchemaField::required("id_archivo", FieldType::String),
        ];
        fields.extend(
            [
                ("nombre_caja", FieldType::String),
                ("codigo_container", FieldType::String),
                ("codigo_hacienda", FieldType::Integer),
                ("codigo_trazabilidad", FieldType::String),
                ("nombre_hacienda", FieldType::String),
                ("temperatura", FieldType::Float),
                ("dedos_totales", FieldType::Integer),
                ("peso_bruto_kg", FieldType::Float),
                ("peso_total_kg", FieldType::Float),
                ("cantidad_observaciones", FieldType::Integer),
                ("dedos_afectados_totales", FieldType::Integer),
                ("peso_promedio", FieldType::Float),
                ("week_code", FieldType::Integer),
                ("year_code", FieldType::Integer),
                ("spec", FieldType::Integer),
                ("uw", FieldType::Integer),
                ("ow", FieldType::Integer),
            ]
            .into_iter()
            .map(|(name, ty)| SchemaField::nullable(name, ty)),
        );

        Self {
            table: table.to_string(),
            fields,
        }
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.iter().filter(|f| f.mode == FieldMode::Required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BoxRecord, FileRecord};
    use pretty_assertions::assert_eq;

    fn columns_of<T: Serialize>(record: &T) -> Vec<String> {
        let mut columns: Vec<String> = serde_json::to_value(record)
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        columns.sort();
        columns
    }

    #[test]
    fn test_file_schema_matches_record_shape() {
        let record = FileRecord::new(
            "KOBE_2025_a.xlsx_1".to_string(),
            "a.xlsx".to_string(),
            "KOBE".to_string(),
            String::new(),
            String::new(),
            2025,
            26,
            30,
            "CGC".to_string(),
        )
        .unwrap();

        let mut expected: Vec<String> = TableSchema::files("T1_ARCHIVOS")
            .field_names()
            .into_iter()
            .map(String::from)
            .collect();
        expected.sort();
        assert_eq!(columns_of(&record), expected);
    }

    #[test]
    fn test_box_schema_matches_record_shape() {
        let record = BoxRecord {
            id: "b".to_string(),
            file_id: "f".to_string(),
            box_name: String::new(),
            container_code: String::new(),
            site_code: 0,
            traceability_code: String::new(),
            site_name: String::new(),
            temperature: 0.0,
            total_units: 0,
            gross_weight: 0.0,
            total_weight: 0.0,
            observation_count: 0,
            affected_units: 0,
            average_weight: 0.0,
            week_code: 0,
            year_code: 0,
            spec: 30,
            under_weight: 0,
            over_weight: 0,
        };

        let schema = TableSchema::boxes("T2_CAJAS");
        let mut expected: Vec<String> = schema.field_names().into_iter().map(String::from).collect();
        expected.sort();
        assert_eq!(columns_of(&record), expected);

        let required: Vec<&str> = schema.required_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(required, vec!["id_caja", "id_archivo"]);
    }

    #[test]
    fn test_schema_serialization() {
        let schema = TableSchema::files("T1_ARCHIVOS");
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["fields"][0]["type"], "STRING");
        assert_eq!(value["fields"][0]["mode"], "REQUIRED");
        assert_eq!(value["fields"][5]["type"], "INTEGER");
    }
}
