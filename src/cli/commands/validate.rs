//! Validate config command implementation
//!
//! This module implements the `validate-config` command.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Application: {}", config.application.name);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Data Directory: {}", config.input.data_dir);
        println!("  Ontology Tables: {:?}", config.input.ontology_tables);
        println!(
            "  Sensitive Concepts: {}",
            config.ontology.sensitive_concepts.len()
        );
        println!("  Survival Prefix: {}", config.ontology.survival_prefix);
        println!("  Output Folder: {}", config.output.folder);
        println!("  Workers: {}", config.pipeline.num_workers);
        match config.pipeline.random_seed {
            Some(seed) => println!("  Random Seed: {seed}"),
            None => println!("  Random Seed: entropy"),
        }
        println!();
        Ok(0)
    }
}
