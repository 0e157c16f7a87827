use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Upper bound on the weight rows scanned per box column.
pub const MAX_SPEC_VALUE: u32 = 10_000;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of weight rows scanned per box, starting at row 8.
    pub spec_value: u32,
    pub uw_threshold: f64,
    pub ow_threshold: f64,
    pub tipo_default: String,
    /// Last column inspected by the box scan.
    pub max_columns: u32,
    /// File names matching any of these regexes are left out of a set.
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub base_path: Option<PathBuf>,
    pub nittsu_path: Option<PathBuf>,
    pub kobe_path: Option<PathBuf>,
    pub hakata_path: Option<PathBuf>,
    pub mathias_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub project_id: String,
    pub dataset_id: String,
    pub location: String,
    pub files_table: String,
    pub boxes_table: String,
    pub output_directory: PathBuf,
    pub check_duplicates: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            spec_value: 30,
            uw_threshold: 560.0,
            ow_threshold: 725.0,
            tipo_default: "CGC".to_string(),
            max_columns: 50,
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset_id: "bd_banano".to_string(),
            location: "US".to_string(),
            files_table: "T1_ARCHIVOS".to_string(),
            boxes_table: "T2_CAJAS".to_string(),
            output_directory: PathBuf::from("warehouse"),
            check_duplicates: true,
        }
    }
}

/// Immutable settings threaded through the extractors.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSettings {
    pub spec_value: u32,
    pub uw_threshold: f64,
    pub ow_threshold: f64,
    pub tipo_default: String,
    pub max_columns: u32,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        ProcessingConfig::default().into()
    }
}

impl From<ProcessingConfig> for ExtractionSettings {
    fn from(p: ProcessingConfig) -> Self {
        Self {
            spec_value: p.spec_value,
            uw_threshold: p.uw_threshold,
            ow_threshold: p.ow_threshold,
            tipo_default: p.tipo_default,
            max_columns: p.max_columns,
        }
    }
}

impl SourcesConfig {
    /// Configured warehouse directories that exist on disk, in menu order.
    ///
    /// A warehouse without its own path falls back to `<base_path>/<NAME>`.
    pub fn available_warehouses(&self) -> Vec<(&'static str, PathBuf)> {
        [
            ("NITTSU", &self.nittsu_path),
            ("KOBE", &self.kobe_path),
            ("HAKATA", &self.hakata_path),
        ]
        .into_iter()
        .filter_map(|(name, path)| {
            path.clone()
                .or_else(|| self.base_path.as_ref().map(|base| base.join(name)))
                .filter(|p| p.exists())
                .map(|p| (name, p))
        })
        .collect()
    }

    /// Configured directories whose sheet layout cannot be read.
    pub fn unsupported_warehouses(&self) -> Vec<PathBuf> {
        self.mathias_path.iter().cloned().collect()
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(IngestError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| IngestError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| IngestError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["inspection-loader.toml", ".inspection-loader.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    /// Reads `.env` if present, then applies process environment overrides.
    pub fn apply_environment(&mut self) -> Result<()> {
        dotenvy::dotenv().ok();
        self.apply_env_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SPEC_VALUE") {
            self.processing.spec_value = parse_env("SPEC_VALUE", &v)?;
        }
        if let Some(v) = lookup("UW_THRESHOLD") {
            self.processing.uw_threshold = parse_env("UW_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("OW_THRESHOLD") {
            self.processing.ow_threshold = parse_env("OW_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("TIPO_DEFAULT") {
            self.processing.tipo_default = v;
        }

        let path_vars: [(&str, &mut Option<PathBuf>); 5] = [
            ("BASE_PATH", &mut self.sources.base_path),
            ("NITTSU_PATH", &mut self.sources.nittsu_path),
            ("KOBE_PATH", &mut self.sources.kobe_path),
            ("HAKATA_PATH", &mut self.sources.hakata_path),
            ("MATHIAS_PATH", &mut self.sources.mathias_path),
        ];
        for (key, slot) in path_vars {
            if let Some(v) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = Some(PathBuf::from(v));
            }
        }

        if let Some(v) = lookup("PROJECT_ID") {
            self.warehouse.project_id = v;
        }
        if let Some(v) = lookup("DATASET_ID") {
            self.warehouse.dataset_id = v;
        }
        if let Some(v) = lookup("LOCATION") {
            self.warehouse.location = v;
        }

        Ok(())
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(spec) = cli_args.spec_value {
            self.processing.spec_value = spec;
        }

        if let Some(uw) = cli_args.uw_threshold {
            self.processing.uw_threshold = uw;
        }

        if let Some(ow) = cli_args.ow_threshold {
            self.processing.ow_threshold = ow;
        }

        if let Some(ref tipo) = cli_args.tipo_default {
            self.processing.tipo_default = tipo.clone();
        }

        if let Some(ref store) = cli_args.store_directory {
            self.warehouse.output_directory = store.clone();
        }

        if let Some(check) = cli_args.check_duplicates {
            self.warehouse.check_duplicates = check;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| IngestError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| IngestError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.processing;

        if p.spec_value == 0 || p.spec_value > MAX_SPEC_VALUE {
            return Err(IngestError::Config {
                message: format!("spec_value must be between 1 and {}", MAX_SPEC_VALUE),
            });
        }

        if !p.uw_threshold.is_finite() || !p.ow_threshold.is_finite() {
            return Err(IngestError::Config {
                message: "Weight thresholds must be finite numbers".to_string(),
            });
        }

        if p.uw_threshold > p.ow_threshold {
            return Err(IngestError::Config {
                message: format!(
                    "uw_threshold ({}) cannot exceed ow_threshold ({})",
                    p.uw_threshold, p.ow_threshold
                ),
            });
        }

        if p.tipo_default.trim().is_empty() {
            return Err(IngestError::Config {
                message: "tipo_default cannot be empty".to_string(),
            });
        }

        if p.max_columns < 2 {
            return Err(IngestError::Config {
                message: "max_columns must be at least 2".to_string(),
            });
        }

        Ok(())
    }

    pub fn extraction_settings(&self) -> ExtractionSettings {
        self.processing.clone().into()
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| IngestError::Config {
        message: format!("Environment variable {} has an invalid value: {}", key, value),
    })
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub spec_value: Option<u32>,
    pub uw_threshold: Option<f64>,
    pub ow_threshold: Option<f64>,
    pub tipo_default: Option<String>,
    pub store_directory: Option<PathBuf>,
    pub check_duplicates: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spec_value(mut self, spec: Option<u32>) -> Self {
        self.spec_value = spec;
        self
    }

    pub fn with_thresholds(mut self, uw: Option<f64>, ow: Option<f64>) -> Self {
        self.uw_threshold = uw;
        self.ow_threshold = ow;
        self
    }

    pub fn with_tipo_default(mut self, tipo: Option<String>) -> Self {
        self.tipo_default = tipo;
        self
    }

    pub fn with_store_directory(mut self, dir: Option<PathBuf>) -> Self {
        self.store_directory = dir;
        self
    }

    pub fn with_check_duplicates(mut self, check: Option<bool>) -> Self {
        self.check_duplicates = check;
        self
    }
}
