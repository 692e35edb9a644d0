//! Deterministic tagging boundary
//!
//! The tagging collaborator is a group of cooperating servers running a
//! distributed protocol that converts encrypted sensitive values into
//! unlinkable opaque tags. The pipeline treats it as an opaque network call:
//! serialized ciphertexts in, tag identifiers out, one tag per input, in
//! input order.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::{CloakError, Result};

/// Client for the distributed deterministic-tagging protocol
#[async_trait]
pub trait TaggingClient: Send + Sync {
    /// Submits serialized ciphertexts and returns one tag ID per input, in
    /// input order.
    async fn deterministic_tags(&self, encrypted_values: Vec<String>) -> Result<Vec<i64>>;
}

/// Local stand-in that hands out sequential tag IDs
///
/// Keeps the "one opaque tag per submitted value" contract without a server
/// roster. Repeated submissions of the same ciphertext get distinct tags,
/// which is fine for single-run use: the pipeline submits each sensitive code
/// exactly once.
#[derive(Debug, Default)]
pub struct SequentialTaggingClient {
    next: Mutex<i64>,
}

impl SequentialTaggingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the tag sequence at an offset, for tests that need
    /// recognizable IDs
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: Mutex::new(first),
        }
    }
}

#[async_trait]
impl TaggingClient for SequentialTaggingClient {
    async fn deterministic_tags(&self, encrypted_values: Vec<String>) -> Result<Vec<i64>> {
        let mut next = self
            .next
            .lock()
            .map_err(|_| CloakError::Tagging("tag counter poisoned".to_string()))?;
        let mut tags = Vec::with_capacity(encrypted_values.len());
        for _ in &encrypted_values {
            tags.push(*next);
            *next += 1;
        }
        tracing::debug!(count = tags.len(), "Assigned local tags");
        Ok(tags)
    }
}
