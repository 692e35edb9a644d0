//! Configuration management
//!
//! TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Configuration files support:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for optional settings
//! - `CLOAK_*` environment variable overrides
//! - Type-safe configuration structs
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cloak::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("cloak.toml")?;
//!
//! println!("Input directory: {}", config.input.data_dir);
//! println!("Output folder: {}", config.output.folder);
//! println!("Workers: {}", config.pipeline.num_workers);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! name = "cloak"
//! log_level = "info"
//!
//! [input]
//! data_dir = "files"
//! ontology_tables = ["shrine.csv"]
//!
//! [ontology]
//! sensitive_concepts = ['\Diagnoses\Neoplasms\']
//! survival_prefix = "SRVA"
//!
//! [output]
//! folder = "converted"
//!
//! [pipeline]
//! num_workers = 4
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, CloakConfig, InputConfig, LoggingConfig, OntologyConfig, OutputConfig,
    PipelineConfig,
};
