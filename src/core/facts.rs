//! Observation fact emission and dummy synthesis
//!
//! The single pass over the sorted fact table decides, per fact, one of three
//! behaviors:
//!
//! 1. a survival fact owned by a dummy patient has its content replaced by an
//!    encryption of the zero-event/zero-censoring tuple;
//! 2. a fact whose nominal patient is a dummy is not emitted verbatim;
//!    instead a donor observation is drawn at random (without replacement)
//!    from the impersonated patient's pool, cloned, re-identified with the
//!    dummy's new numbers, and given the original fact's concept code and
//!    text-search index so it answers the same kind of query;
//! 3. an ordinary real fact only has its identifiers rewritten.
//!
//! After rewriting, sensitive concept codes are tag-substituted, and a fact
//! whose resolved encounter number is empty is dropped rather than emitted
//! with a dangling reference.

use std::collections::HashMap;

use rand::Rng;

use crate::core::projection::{self, numeric_sorted};
use crate::core::remap::IdentityRemapper;
use crate::core::tags::TagMaps;
use crate::crypto::cipher::IntegerCipher;
use crate::crypto::events::encrypt_zero_event;
use crate::domain::records::{FactKey, ObservationFact, VisitKey};
use crate::domain::{CloakError, DummyMapping, Result};

/// Donor observation pools, keyed by dummy patient number
///
/// Each dummy's pool holds the fact keys of the real patient it impersonates;
/// sampling removes the drawn key so no donor observation is used twice
/// within a run.
pub type DummyPools = HashMap<String, Vec<FactKey>>;

/// Derives the donor pools from the fact table and the dummy mapping.
///
/// Pools are built in sorted fact order so a seeded run is reproducible.
pub fn build_dummy_pools(
    facts: &HashMap<FactKey, ObservationFact>,
    dummy_to_patient: &DummyMapping,
) -> Result<DummyPools> {
    let mut by_original: HashMap<&str, Vec<&str>> = HashMap::new();
    for (dummy_num, original_num) in dummy_to_patient {
        by_original
            .entry(original_num.as_str())
            .or_default()
            .push(dummy_num.as_str());
    }

    let mut pools: DummyPools = dummy_to_patient
        .keys()
        .map(|dummy| (dummy.clone(), Vec::new()))
        .collect();

    for (key, _) in numeric_sorted(facts, projection::fact_sort_key)? {
        if let Some(dummies) = by_original.get(key.patient_num.as_str()) {
            for dummy in dummies {
                if let Some(pool) = pools.get_mut(*dummy) {
                    pool.push(key.clone());
                }
            }
        }
    }
    Ok(pools)
}

/// One observation fact pass over the sorted projection
///
/// All maps are built before the pass starts; the pass only mutates the donor
/// pools (sampling without replacement).
pub struct FactPass<'a> {
    pub facts: &'a HashMap<FactKey, ObservationFact>,
    pub dummy_to_patient: &'a DummyMapping,
    pub dummy_pools: &'a mut DummyPools,
    /// Encrypted survival blobs computed by the encryption phase
    pub survival_blobs: &'a HashMap<FactKey, String>,
    pub remapper: &'a IdentityRemapper,
    pub tags: &'a TagMaps,
    pub survival_prefix: &'a str,
    pub cipher: &'a dyn IntegerCipher,
}

/// Counters reported after a fact pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FactPassStats {
    pub emitted: usize,
    pub synthesized: usize,
    pub dropped_unmapped: usize,
    pub skipped_empty_pool: usize,
}

impl FactPass<'_> {
    /// Runs the pass and returns the rewritten facts in emission order.
    ///
    /// # Errors
    ///
    /// A survival fact with no encrypted blob is reported as
    /// [`CloakError::MissingState`]: it means the encryption phase skipped
    /// that fact. An untagged survival concept after substitution is fatal.
    pub fn run<R: Rng>(&mut self, rng: &mut R) -> Result<(Vec<ObservationFact>, FactPassStats)> {
        let mut emitted = Vec::with_capacity(self.facts.len());
        let mut stats = FactPassStats::default();

        for (key, fact) in numeric_sorted(self.facts, projection::fact_sort_key)? {
            if let Some(rewritten) = self.rewrite(key, fact, rng, &mut stats)? {
                stats.emitted += 1;
                emitted.push(rewritten);
            }
        }

        tracing::info!(
            emitted = stats.emitted,
            synthesized = stats.synthesized,
            dropped = stats.dropped_unmapped,
            empty_pool_skips = stats.skipped_empty_pool,
            "Finished observation fact pass"
        );
        Ok((emitted, stats))
    }

    fn rewrite<R: Rng>(
        &mut self,
        key: &FactKey,
        fact: &ObservationFact,
        rng: &mut R,
        stats: &mut FactPassStats,
    ) -> Result<Option<ObservationFact>> {
        let mut out = fact.clone();
        let survival = fact.is_survival(self.survival_prefix);

        if survival {
            let blob = self.survival_blobs.get(key).ok_or_else(|| {
                CloakError::MissingState(format!(
                    "no encrypted blob for survival fact {key:?}; was the encryption of the \
                     observation blob performed?"
                ))
            })?;
            out.observation_blob = blob.clone();
        }

        if self.dummy_to_patient.contains_key(&key.patient_num) {
            let pool = self.dummy_pools.get_mut(&key.patient_num).ok_or_else(|| {
                CloakError::InvariantViolation(format!(
                    "dummy {} has no donor observation pool",
                    key.patient_num
                ))
            })?;
            if pool.is_empty() {
                // The generator should not produce a dummy without donors;
                // tolerate it and leave the operator a signal.
                tracing::warn!(dummy = %key.patient_num, "Empty donor pool, skipping fact");
                stats.skipped_empty_pool += 1;
                return Ok(None);
            }

            let donor_key = pool.swap_remove(rng.gen_range(0..pool.len()));
            out = self.facts[&donor_key].clone();

            // The donor's encounter was inherited by the dummy under the
            // dummy's own patient number.
            let lookup = VisitKey::new(donor_key.encounter_num.clone(), key.patient_num.clone());
            let (new_encounter, new_patient) = match self.remapper.new_visit_key(&lookup) {
                Some(new_key) => (new_key.encounter_num.clone(), new_key.patient_num.clone()),
                None => (String::new(), String::new()),
            };
            out.key.encounter_num = new_encounter;
            out.key.patient_num = new_patient;

            // Same concept (and text-search index) the fact already had, so
            // the synthesized row answers the same kind of query.
            out.key.concept_code = key.concept_code.clone();
            out.text_search_index = fact.text_search_index.clone();

            if survival {
                out.observation_blob = encrypt_zero_event(self.cipher)?;
            }
            stats.synthesized += 1;
        } else {
            let lookup = VisitKey::new(key.encounter_num.clone(), key.patient_num.clone());
            let (new_encounter, new_patient) = match self.remapper.new_visit_key(&lookup) {
                Some(new_key) => (new_key.encounter_num.clone(), new_key.patient_num.clone()),
                None => (String::new(), String::new()),
            };
            out.key.encounter_num = new_encounter;
            out.key.patient_num = new_patient;
        }

        out.key.concept_code = self.tags.substitute_concept(&out.key.concept_code);
        self.tags
            .ensure_survival_tagged(&out.key.concept_code, self.survival_prefix)?;

        // An empty encounter means the identifier was never remapped; emitting
        // it would plant a dangling reference in the output.
        if out.key.encounter_num.is_empty() {
            tracing::warn!(fact = ?key, "Resolved encounter is empty, dropping fact");
            stats.dropped_unmapped += 1;
            return Ok(None);
        }
        Ok(Some(out))
    }
}
