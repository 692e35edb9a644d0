//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "cloak.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your extract location", self.output);
                println!("  2. List the sensitive concept paths under [ontology]");
                println!("  3. Validate configuration: cloak validate-config");
                println!("  4. Run the conversion: cloak convert");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate sample configuration
    fn generate_config() -> String {
        r#"# Cloak configuration file
# Re-identification protection for clinical warehouse extracts

[application]
name = "cloak"
log_level = "info"

[input]
# Directory holding the extract CSV files
data_dir = "files"
patient_table = "patient_dimension.csv"
visit_table = "visit_dimension.csv"
fact_table = "observation_fact.csv"
dummy_table = "dummy_to_patient.csv"
concept_table = "concept_dimension.csv"
ontology_tables = ["shrine.csv"]
# Optional sensitive code tables
# time_table = "time_dimension.csv"
# survival_type_table = "survival_type.csv"

[ontology]
# Concept paths marked sensitive; descendants inherit the marking
sensitive_concepts = [
    '\Diagnoses\Neoplasms\',
]
survival_prefix = "SRVA"

[output]
folder = "converted"

[pipeline]
num_workers = 4
# Set for a reproducible run
# random_seed = 42

[logging]
local_enabled = false
local_path = "/var/log/cloak"
local_rotation = "daily"
"#
        .to_string()
    }
}
