//! Tag substitution for sensitive codes
//!
//! Sensitive concept, time and survival-type codes never leave the pipeline
//! in the clear: once the tagging collaborator has converted their encrypt
//! IDs into opaque tags, every occurrence of a sensitive code is rewritten to
//! a `TAG_ID:<id>` token. Substitution is pure lookup-and-rewrite and
//! idempotent: an already-substituted token is not in any map and passes
//! through untouched.

use std::collections::HashMap;
use std::sync::Arc;

use crate::crypto::cipher::IntegerCipher;
use crate::crypto::dispatch::encrypt_all;
use crate::crypto::tagging::TaggingClient;
use crate::domain::{CloakError, Result};

/// Prefix of a substituted tag token
pub const TAG_TOKEN_PREFIX: &str = "TAG_ID:";

/// Code → tag lookup maps for one pipeline run
///
/// Built once after the tagging phase, read-only afterward.
#[derive(Debug, Default)]
pub struct TagMaps {
    pub concept: HashMap<String, i64>,
    pub time: HashMap<String, i64>,
    pub survival_type: HashMap<String, i64>,
}

impl TagMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrites a concept code to its tag token; codes not in the map are
    /// returned untouched.
    pub fn substitute_concept(&self, code: &str) -> String {
        substitute(&self.concept, code)
    }

    /// Rewrites a time code to its tag token
    pub fn substitute_time(&self, code: &str) -> String {
        substitute(&self.time, code)
    }

    /// Rewrites a survival-type code to its tag token
    pub fn substitute_survival_type(&self, code: &str) -> String {
        substitute(&self.survival_type, code)
    }

    /// Self-consistency check run after substitution: a code still carrying
    /// the reserved survival prefix was never submitted for tagging, which
    /// should be impossible.
    pub fn ensure_survival_tagged(&self, code: &str, survival_prefix: &str) -> Result<()> {
        if code.contains(survival_prefix) && !self.concept.contains_key(code) {
            return Err(CloakError::InvariantViolation(format!(
                "concept {code:?} identifies as a survival concept but has no tag"
            )));
        }
        Ok(())
    }
}

fn substitute(map: &HashMap<String, i64>, code: &str) -> String {
    match map.get(code) {
        Some(tag_id) => format!("{TAG_TOKEN_PREFIX}{tag_id}"),
        None => code.to_string(),
    }
}

/// Builds one code → tag map by driving the external collaborators: the
/// codes' encrypt IDs are batch-encrypted across the worker pool, the
/// ciphertexts submitted to the tagging protocol, and the returned tags
/// zipped back onto the codes.
///
/// # Errors
///
/// Fails on encryption or tagging errors, and with
/// [`CloakError::Tagging`] if the collaborator returns a tag count different
/// from the submission count.
pub async fn build_tag_map(
    codes: Vec<(String, i64)>,
    cipher: Arc<dyn IntegerCipher>,
    tagging: &dyn TaggingClient,
    workers: usize,
) -> Result<HashMap<String, i64>> {
    if codes.is_empty() {
        return Ok(HashMap::new());
    }

    let encrypt_ids: Vec<i64> = codes.iter().map(|(_, id)| *id).collect();
    let encrypted = encrypt_all(cipher, encrypt_ids, workers).await?;
    let serialized: Vec<String> = encrypted.iter().map(|ct| ct.serialize()).collect();

    let tags = tagging.deterministic_tags(serialized).await?;
    if tags.len() != codes.len() {
        return Err(CloakError::Tagging(format!(
            "submitted {} values but received {} tags",
            codes.len(),
            tags.len()
        )));
    }

    tracing::info!(count = tags.len(), "Built code-to-tag map");
    Ok(codes
        .into_iter()
        .zip(tags)
        .map(|((code, _), tag)| (code, tag))
        .collect())
}
