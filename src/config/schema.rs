//! Configuration schema types
//!
//! This module defines the configuration structure for the conversion
//! pipeline, as loaded from the TOML file.

use serde::{Deserialize, Serialize};

/// Main configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloakConfig {
    /// Application-level settings
    pub application: ApplicationConfig,

    /// Input extract location and table file names
    pub input: InputConfig,

    /// Ontology classification settings
    #[serde(default)]
    pub ontology: OntologyConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Pipeline execution settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CloakConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.input.validate()?;
        self.ontology.validate()?;
        self.output.validate()?;
        self.pipeline.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Input extract configuration
///
/// Table file names are resolved relative to `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory holding the extract CSV files
    pub data_dir: String,

    /// Patient dimension table
    #[serde(default = "default_patient_table")]
    pub patient_table: String,

    /// Visit dimension table
    #[serde(default = "default_visit_table")]
    pub visit_table: String,

    /// Observation fact table
    #[serde(default = "default_fact_table")]
    pub fact_table: String,

    /// Dummy-to-patient mapping produced by the candidate generator
    #[serde(default = "default_dummy_table")]
    pub dummy_table: String,

    /// Concept dimension table (concept path to concept code)
    #[serde(default = "default_concept_table")]
    pub concept_table: String,

    /// Ontology tables holding the concept path hierarchy
    pub ontology_tables: Vec<String>,

    /// Optional time dimension table with sensitive time codes
    #[serde(default)]
    pub time_table: Option<String>,

    /// Optional survival-type table with sensitive survival-type codes
    #[serde(default)]
    pub survival_type_table: Option<String>,
}

impl InputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.data_dir.is_empty() {
            return Err("input.data_dir cannot be empty".to_string());
        }
        if self.ontology_tables.is_empty() {
            return Err("input.ontology_tables cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Ontology classification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyConfig {
    /// Concept paths marked sensitive directly; descendants inherit
    #[serde(default)]
    pub sensitive_concepts: Vec<String>,

    /// Substring marking a concept code as a survival-analysis observation
    #[serde(default = "default_survival_prefix")]
    pub survival_prefix: String,
}

impl OntologyConfig {
    fn validate(&self) -> Result<(), String> {
        if self.survival_prefix.is_empty() {
            return Err("ontology.survival_prefix cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            sensitive_concepts: Vec::new(),
            survival_prefix: default_survival_prefix(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the converted tables are written to
    pub folder: String,
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.folder.is_empty() {
            return Err("output.folder cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Pipeline execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of parallel encryption workers
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    /// Optional seed for the random number generator; a seeded run is
    /// reproducible end to end
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl PipelineConfig {
    fn validate(&self) -> Result<(), String> {
        if self.num_workers == 0 || self.num_workers > 100 {
            return Err(format!(
                "pipeline.num_workers must be between 1 and 100, got {}",
                self.num_workers
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_workers: default_num_workers(),
            random_seed: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log file path
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "cloak".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_patient_table() -> String {
    "patient_dimension.csv".to_string()
}

fn default_visit_table() -> String {
    "visit_dimension.csv".to_string()
}

fn default_fact_table() -> String {
    "observation_fact.csv".to_string()
}

fn default_dummy_table() -> String {
    "dummy_to_patient.csv".to_string()
}

fn default_concept_table() -> String {
    "concept_dimension.csv".to_string()
}

fn default_survival_prefix() -> String {
    "SRVA".to_string()
}

fn default_num_workers() -> usize {
    4
}

fn default_local_path() -> String {
    "/var/log/cloak".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> InputConfig {
        InputConfig {
            data_dir: "files".to_string(),
            patient_table: default_patient_table(),
            visit_table: default_visit_table(),
            fact_table: default_fact_table(),
            dummy_table: default_dummy_table(),
            concept_table: default_concept_table(),
            ontology_tables: vec!["shrine.csv".to_string()],
            time_table: None,
            survival_type_table: None,
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            name: "cloak".to_string(),
            log_level: "info".to_string(),
        };
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_input_config_validation() {
        let mut config = input();
        assert!(config.validate().is_ok());

        config.ontology_tables.clear();
        assert!(config.validate().is_err());

        config.ontology_tables = vec!["shrine.csv".to_string()];
        config.data_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pipeline_config_validation() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.num_workers, 4);
        assert!(config.validate().is_ok());

        config.num_workers = 0;
        assert!(config.validate().is_err());

        config.num_workers = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ontology_config_defaults() {
        let config = OntologyConfig::default();
        assert_eq!(config.survival_prefix, "SRVA");
        assert!(config.sensitive_concepts.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_config_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.local_rotation = "size".to_string();
        assert!(config.validate().is_err());
    }
}
