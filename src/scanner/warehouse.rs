use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin facility of a spreadsheet batch, derived from the folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Warehouse {
    #[serde(rename = "NITTSU")]
    Nittsu,
    #[serde(rename = "KOBE")]
    Kobe,
    #[serde(rename = "HAKATA")]
    Hakata,
    /// Recognized but not yet supported: its sheets carry a different layout.
    #[serde(rename = "NITTSU_MATHIAS_NO_CONFIGURADO")]
    NittsuMathias,
    #[serde(rename = "DESCONOCIDO")]
    Unknown,
}

const VARIANT_MARKERS: &[&str] = &["MATIAS", "MATHIAS"];

// Checked in this order; a folder mentioning several markers takes the first.
const KNOWN_MARKERS: &[(&str, Warehouse)] = &[
    ("NITTSU", Warehouse::Nittsu),
    ("KOBE", Warehouse::Kobe),
    ("HAKATA", Warehouse::Hakata),
];

impl Warehouse {
    pub fn classify(folder_name: &str) -> Self {
        let folder_upper = folder_name.to_uppercase();

        if VARIANT_MARKERS.iter().any(|m| folder_upper.contains(m)) {
            return Warehouse::NittsuMathias;
        }

        KNOWN_MARKERS
            .iter()
            .find(|(marker, _)| folder_upper.contains(marker))
            .map(|(_, warehouse)| *warehouse)
            .unwrap_or(Warehouse::Unknown)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Warehouse::Nittsu => "NITTSU",
            Warehouse::Kobe => "KOBE",
            Warehouse::Hakata => "HAKATA",
            Warehouse::NittsuMathias => "NITTSU_MATHIAS_NO_CONFIGURADO",
            Warehouse::Unknown => "DESCONOCIDO",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Warehouse::NittsuMathias)
    }
}

impl fmt::Display for Warehouse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_warehouses() {
        assert_eq!(Warehouse::classify("2. Nittsu"), Warehouse::Nittsu);
        assert_eq!(Warehouse::classify("kobe weights"), Warehouse::Kobe);
        assert_eq!(Warehouse::classify("HAKATA"), Warehouse::Hakata);
        assert_eq!(Warehouse::classify("Osaka"), Warehouse::Unknown);
    }

    #[test]
    fn test_variant_takes_precedence() {
        assert_eq!(Warehouse::classify("NITTSU MATIAS"), Warehouse::NittsuMathias);
        assert_eq!(Warehouse::classify("0. Nittsu Mathias"), Warehouse::NittsuMathias);
        assert!(!Warehouse::classify("NITTSU MATIAS").is_supported());
    }

    #[test]
    fn test_marker_order_is_authoritative() {
        assert_eq!(Warehouse::classify("KOBE-HAKATA"), Warehouse::Kobe);
        assert_eq!(Warehouse::classify("hakata via nittsu"), Warehouse::Nittsu);
    }

    #[test]
    fn test_tags() {
        assert_eq!(Warehouse::Nittsu.to_string(), "NITTSU");
        assert_eq!(Warehouse::Unknown.to_string(), "DESCONOCIDO");
        assert_eq!(
            Warehouse::NittsuMathias.to_string(),
            "NITTSU_MATHIAS_NO_CONFIGURADO"
        );
    }
}
