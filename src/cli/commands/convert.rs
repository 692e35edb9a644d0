//! Convert command implementation
//!
//! This module implements the `convert` command that runs the full
//! re-identification protection pipeline over an extract.

use std::sync::Arc;

use clap::Args;

use crate::config::load_config;
use crate::core::ConvertPipeline;
use crate::crypto::{LocalCipher, SequentialTaggingClient};

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Override the number of parallel encryption workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Override the random seed (a seeded run is reproducible)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the output folder
    #[arg(short, long)]
    pub output: Option<String>,
}

impl ConvertArgs {
    /// Execute the convert command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting convert command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        // Apply CLI overrides
        if let Some(workers) = self.workers {
            tracing::info!(workers, "Overriding worker count from CLI");
            config.pipeline.num_workers = workers;
        }
        if let Some(seed) = self.seed {
            tracing::info!(seed, "Overriding random seed from CLI");
            config.pipeline.random_seed = Some(seed);
        }
        if let Some(output) = &self.output {
            tracing::info!(output = %output, "Overriding output folder from CLI");
            config.output.folder = output.clone();
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let cipher = Arc::new(LocalCipher::from_entropy());
        let tagging = Arc::new(SequentialTaggingClient::new());
        let pipeline = ConvertPipeline::new(config, cipher, tagging);

        match pipeline.run().await {
            Ok(summary) => {
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                } else {
                    println!("Conversion complete:");
                    println!("  Patients:           {}", summary.patients);
                    println!("  Dummies:            {}", summary.dummies);
                    println!("  Visits:             {}", summary.visits);
                    println!("  Facts written:      {}", summary.facts_emitted);
                    println!("  Facts synthesized:  {}", summary.facts_synthesized);
                    println!("  Facts dropped:      {}", summary.facts_dropped);
                    println!("  Sensitive concepts: {}", summary.sensitive_concepts);
                    println!("  Tagged codes:       {}", summary.tagged_codes);
                    println!("  Duration:           {} ms", summary.duration_ms);
                }
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "Conversion failed");
                eprintln!("Conversion failed: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_args_defaults() {
        let args = ConvertArgs {
            json: false,
            workers: None,
            seed: None,
            output: None,
        };
        assert!(!args.json);
        assert!(args.workers.is_none());
    }
}
