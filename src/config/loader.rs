//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::CloakConfig;
use crate::domain::errors::CloakError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into CloakConfig
/// 4. Applies environment variable overrides (CLOAK_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use cloak::config::loader::load_config;
///
/// let config = load_config("cloak.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<CloakConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CloakError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CloakError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: CloakConfig = toml::from_str(&contents)
        .map_err(|e| CloakError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        CloakError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    // Process line by line to skip comments
    for line in input.lines() {
        let trimmed = line.trim_start();

        // Skip comment lines - don't process env vars in comments
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(CloakError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using CLOAK_* prefix
///
/// Environment variables follow the pattern: CLOAK_<SECTION>_<KEY>
/// For example: CLOAK_INPUT_DATA_DIR, CLOAK_OUTPUT_FOLDER
fn apply_env_overrides(config: &mut CloakConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("CLOAK_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Input overrides
    if let Ok(val) = std::env::var("CLOAK_INPUT_DATA_DIR") {
        config.input.data_dir = val;
    }
    if let Ok(val) = std::env::var("CLOAK_INPUT_PATIENT_TABLE") {
        config.input.patient_table = val;
    }
    if let Ok(val) = std::env::var("CLOAK_INPUT_VISIT_TABLE") {
        config.input.visit_table = val;
    }
    if let Ok(val) = std::env::var("CLOAK_INPUT_FACT_TABLE") {
        config.input.fact_table = val;
    }
    if let Ok(val) = std::env::var("CLOAK_INPUT_DUMMY_TABLE") {
        config.input.dummy_table = val;
    }

    // Ontology overrides
    if let Ok(val) = std::env::var("CLOAK_ONTOLOGY_SURVIVAL_PREFIX") {
        config.ontology.survival_prefix = val;
    }

    // Output overrides
    if let Ok(val) = std::env::var("CLOAK_OUTPUT_FOLDER") {
        config.output.folder = val;
    }

    // Pipeline overrides
    if let Ok(val) = std::env::var("CLOAK_PIPELINE_NUM_WORKERS") {
        if let Ok(workers) = val.parse() {
            config.pipeline.num_workers = workers;
        }
    }
    if let Ok(val) = std::env::var("CLOAK_PIPELINE_RANDOM_SEED") {
        if let Ok(seed) = val.parse() {
            config.pipeline.random_seed = Some(seed);
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("CLOAK_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("CLOAK_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
