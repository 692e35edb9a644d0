//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables are serialized with a mutex
//! to avoid interference between tests.

use cloak::config::load_config;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    std::env::remove_var("CLOAK_APPLICATION_LOG_LEVEL");
    std::env::remove_var("CLOAK_OUTPUT_FOLDER");
    std::env::remove_var("CLOAK_PIPELINE_NUM_WORKERS");
    std::env::remove_var("CLOAK_PIPELINE_RANDOM_SEED");
    std::env::remove_var("TEST_CLOAK_DATA_DIR");
}

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(contents.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    let toml_content = r#"
[application]
name = "cloak"
log_level = "debug"

[input]
data_dir = "extract"
patient_table = "patients.csv"
visit_table = "visits.csv"
fact_table = "facts.csv"
dummy_table = "dummies.csv"
concept_table = "concepts.csv"
ontology_tables = ["shrine.csv", "local.csv"]
time_table = "time.csv"

[ontology]
sensitive_concepts = ['\Diagnoses\Neoplasms\', '\Labs\Genetics\']
survival_prefix = "SRVA"

[output]
folder = "converted"

[pipeline]
num_workers = 8
random_seed = 42

[logging]
local_enabled = true
local_path = "/tmp/cloak"
local_rotation = "hourly"
"#;

    let temp_file = write_temp_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.name, "cloak");
    assert_eq!(config.application.log_level, "debug");

    assert_eq!(config.input.data_dir, "extract");
    assert_eq!(config.input.patient_table, "patients.csv");
    assert_eq!(config.input.ontology_tables.len(), 2);
    assert_eq!(config.input.time_table, Some("time.csv".to_string()));
    assert_eq!(config.input.survival_type_table, None);

    assert_eq!(config.ontology.sensitive_concepts.len(), 2);
    assert_eq!(config.ontology.sensitive_concepts[0], r"\Diagnoses\Neoplasms\");
    assert_eq!(config.ontology.survival_prefix, "SRVA");

    assert_eq!(config.output.folder, "converted");
    assert_eq!(config.pipeline.num_workers, 8);
    assert_eq!(config.pipeline.random_seed, Some(42));

    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_minimal_config_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    let toml_content = r#"
[application]
log_level = "info"

[input]
data_dir = "files"
ontology_tables = ["shrine.csv"]

[output]
folder = "converted"
"#;

    let temp_file = write_temp_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.name, "cloak");
    assert_eq!(config.input.patient_table, "patient_dimension.csv");
    assert_eq!(config.input.visit_table, "visit_dimension.csv");
    assert_eq!(config.input.fact_table, "observation_fact.csv");
    assert_eq!(config.input.dummy_table, "dummy_to_patient.csv");
    assert_eq!(config.ontology.survival_prefix, "SRVA");
    assert_eq!(config.pipeline.num_workers, 4);
    assert_eq!(config.pipeline.random_seed, None);
    assert!(!config.logging.local_enabled);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_CLOAK_DATA_DIR", "/data/extract");

    let toml_content = r#"
[application]
log_level = "info"

[input]
data_dir = "${TEST_CLOAK_DATA_DIR}"
ontology_tables = ["shrine.csv"]

[output]
folder = "converted"
"#;

    let temp_file = write_temp_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");
    assert_eq!(config.input.data_dir, "/data/extract");

    cleanup_env_vars();
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("CLOAK_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("CLOAK_OUTPUT_FOLDER", "/tmp/override");
    std::env::set_var("CLOAK_PIPELINE_NUM_WORKERS", "16");

    let toml_content = r#"
[application]
log_level = "info"

[input]
data_dir = "files"
ontology_tables = ["shrine.csv"]

[output]
folder = "converted"
"#;

    let temp_file = write_temp_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.output.folder, "/tmp/override");
    assert_eq!(config.pipeline.num_workers, 16);

    cleanup_env_vars();
}

#[test]
fn test_invalid_log_level_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    let toml_content = r#"
[application]
log_level = "verbose"

[input]
data_dir = "files"
ontology_tables = ["shrine.csv"]

[output]
folder = "converted"
"#;

    let temp_file = write_temp_config(toml_content);
    assert!(load_config(temp_file.path()).is_err());
}

#[test]
fn test_missing_ontology_tables_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    let toml_content = r#"
[application]
log_level = "info"

[input]
data_dir = "files"
ontology_tables = []

[output]
folder = "converted"
"#;

    let temp_file = write_temp_config(toml_content);
    assert!(load_config(temp_file.path()).is_err());
}
