//! # Cloak - re-identification protection for clinical extracts
//!
//! Cloak converts a clinical data warehouse extract into a privacy-hardened
//! copy: patient and encounter identifiers are replaced through a random
//! permutation, dummy patients are fleshed out with synthesized observations
//! drawn from the patients they impersonate, sensitive concept codes are
//! rewritten to opaque tags, and survival event tuples are encrypted.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Pipeline logic (permutation, remapping, fact synthesis, tags)
//! - [`ontology`] - Concept sensitivity classification
//! - [`crypto`] - Integer encryption, parallel dispatch, tagging protocol
//! - [`adapters`] - CSV table readers and writers
//! - [`domain`] - Entity records, keys and the error hierarchy
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cloak::config::load_config;
//! use cloak::core::ConvertPipeline;
//! use cloak::crypto::{LocalCipher, SequentialTaggingClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("cloak.toml")?;
//!     let cipher = Arc::new(LocalCipher::from_entropy());
//!     let tagging = Arc::new(SequentialTaggingClient::new());
//!
//!     let pipeline = ConvertPipeline::new(config, cipher, tagging);
//!     let summary = pipeline.run().await?;
//!
//!     println!("Wrote {} observation facts", summary.facts_emitted);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`] with the
//! [`domain::CloakError`] hierarchy; errors compose with the `?` operator:
//!
//! ```rust,no_run
//! use cloak::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let _config = cloak::config::load_config("cloak.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Cloak uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! tracing::info!(patients = 120, "Extract loaded");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod domain;
pub mod logging;
pub mod ontology;
