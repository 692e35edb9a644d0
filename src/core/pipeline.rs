//! Conversion pipeline coordinator
//!
//! Owns the per-run state and drives the phases in their required order:
//! load, ontology classification, tagging, survival blob encryption, identity
//! remapping, observation fact rewriting, output. Every phase finishes before
//! the next starts; nothing here is incremental.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::adapters::csv as tables;
use crate::config::CloakConfig;
use crate::core::facts::{build_dummy_pools, FactPass};
use crate::core::permutation::PermutationCursor;
use crate::core::remap::IdentityRemapper;
use crate::core::tags::{build_tag_map, TagMaps};
use crate::crypto::cipher::IntegerCipher;
use crate::crypto::events::encrypt_event_blobs;
use crate::crypto::tagging::TaggingClient;
use crate::domain::records::{FactKey, ObservationFact, PatientRecord, VisitKey, VisitRecord};
use crate::domain::{DummyMapping, Result};
use crate::ontology::ConceptTable;

/// All tables and derived maps of one run, loaded up front
///
/// Headers are kept verbatim so the converted tables echo the extract's
/// column names.
pub struct RunContext {
    pub patient_header: Vec<String>,
    pub patients: HashMap<String, PatientRecord>,
    pub visit_header: Vec<String>,
    pub visits: HashMap<VisitKey, VisitRecord>,
    pub patient_visits: HashMap<String, Vec<String>>,
    pub fact_header: Vec<String>,
    pub facts: HashMap<FactKey, ObservationFact>,
    pub dummy_to_patient: DummyMapping,
    pub ontology: ConceptTable,
    /// Concept path to concept code, from the concept dimension
    pub concept_codes: HashMap<String, String>,
    pub time_codes: Vec<String>,
    pub survival_type_codes: Vec<String>,
}

/// Summary of a conversion run
#[derive(Debug, Clone, Serialize)]
pub struct ConvertSummary {
    /// Real patients in the extract
    pub patients: usize,
    /// Dummy patients synthesized
    pub dummies: usize,
    /// Visits written, inherited dummy visits included
    pub visits: usize,
    /// Observation facts written
    pub facts_emitted: usize,
    /// Facts synthesized from donor observations
    pub facts_synthesized: usize,
    /// Facts dropped for an unmapped encounter
    pub facts_dropped: usize,
    /// Dummy facts skipped because the donor pool ran dry
    pub empty_pool_skips: usize,
    /// Ontology nodes classified sensitive
    pub sensitive_concepts: usize,
    /// Codes substituted by a tag across all three maps
    pub tagged_codes: usize,
    /// Wall-clock duration of the run
    pub duration_ms: u64,
    /// When the run finished
    pub completed_at: DateTime<Utc>,
}

/// The conversion pipeline
///
/// Holds the configuration and the two cryptographic collaborators; all
/// per-run state lives in [`RunContext`] and is dropped when the run ends.
pub struct ConvertPipeline {
    config: CloakConfig,
    cipher: Arc<dyn IntegerCipher>,
    tagging: Arc<dyn TaggingClient>,
}

impl ConvertPipeline {
    pub fn new(
        config: CloakConfig,
        cipher: Arc<dyn IntegerCipher>,
        tagging: Arc<dyn TaggingClient>,
    ) -> Self {
        Self {
            config,
            cipher,
            tagging,
        }
    }

    /// Runs the full conversion and writes the output tables.
    ///
    /// # Errors
    ///
    /// Fails fast on malformed input, broken invariants, and encryption or
    /// tagging failures; a partially written output directory is left behind
    /// for inspection.
    pub async fn run(&self) -> Result<ConvertSummary> {
        let started = Instant::now();

        let mut ctx = self.load_inputs()?;
        self.classify_ontology(&mut ctx);
        let tags = self.build_tags(&mut ctx).await?;

        let survival_blobs = self.encrypt_survival_blobs(&ctx)?;

        // The pool must cover every entity drawing a new identifier: real
        // patients, dummies, real visits, and each dummy's inherited visits.
        let inherited_visits: usize = ctx
            .dummy_to_patient
            .values()
            .map(|original| ctx.patient_visits.get(original).map_or(0, Vec::len))
            .sum();
        let pool_size =
            ctx.patients.len() + ctx.dummy_to_patient.len() + ctx.visits.len() + inherited_visits;
        tracing::info!(pool_size, "Generated identifier permutation");

        let mut cursor = PermutationCursor::new(pool_size);
        let mut remapper = IdentityRemapper::new();
        let patients_out = remapper.assign_patients(
            &ctx.patients,
            &ctx.dummy_to_patient,
            &mut cursor,
            self.cipher.as_ref(),
        )?;
        let visits_out = remapper.assign_visits(
            &ctx.visits,
            &ctx.dummy_to_patient,
            &ctx.patient_visits,
            &mut cursor,
        )?;

        let mut pools = build_dummy_pools(&ctx.facts, &ctx.dummy_to_patient)?;
        let mut pass = FactPass {
            facts: &ctx.facts,
            dummy_to_patient: &ctx.dummy_to_patient,
            dummy_pools: &mut pools,
            survival_blobs: &survival_blobs,
            remapper: &remapper,
            tags: &tags,
            survival_prefix: &self.config.ontology.survival_prefix,
            cipher: self.cipher.as_ref(),
        };
        let mut rng = match self.config.pipeline.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (facts_out, stats) = pass.run(&mut rng)?;

        self.write_outputs(&ctx, &remapper, &patients_out, &visits_out, &facts_out)?;

        let summary = ConvertSummary {
            patients: ctx.patients.len(),
            dummies: ctx.dummy_to_patient.len(),
            visits: visits_out.len(),
            facts_emitted: stats.emitted,
            facts_synthesized: stats.synthesized,
            facts_dropped: stats.dropped_unmapped,
            empty_pool_skips: stats.skipped_empty_pool,
            sensitive_concepts: ctx.ontology.iter().filter(|n| n.sensitive).count(),
            tagged_codes: tags.concept.len() + tags.time.len() + tags.survival_type.len(),
            duration_ms: started.elapsed().as_millis() as u64,
            completed_at: Utc::now(),
        };
        tracing::info!(
            patients = summary.patients,
            dummies = summary.dummies,
            visits = summary.visits,
            facts = summary.facts_emitted,
            duration_ms = summary.duration_ms,
            "Conversion complete"
        );
        Ok(summary)
    }

    fn input_path(&self, file: &str) -> PathBuf {
        Path::new(&self.config.input.data_dir).join(file)
    }

    fn load_inputs(&self) -> Result<RunContext> {
        let input = &self.config.input;
        tracing::info!(data_dir = %input.data_dir, "Loading extract tables");

        let (patient_header, patients) =
            tables::read_patient_table(&self.input_path(&input.patient_table))?;
        let (visit_header, visits, patient_visits) =
            tables::read_visit_table(&self.input_path(&input.visit_table))?;
        let (fact_header, facts) = tables::read_fact_table(&self.input_path(&input.fact_table))?;
        let dummy_to_patient = tables::read_dummy_mapping(&self.input_path(&input.dummy_table))?;
        let concept_codes =
            tables::read_concept_dimension(&self.input_path(&input.concept_table))?;

        let mut paths = Vec::new();
        for file in &input.ontology_tables {
            paths.extend(tables::read_ontology_paths(&self.input_path(file))?);
        }
        let ontology = ConceptTable::from_paths(paths);

        let time_codes = match &input.time_table {
            Some(file) => tables::read_code_column(&self.input_path(file))?,
            None => Vec::new(),
        };
        let survival_type_codes = match &input.survival_type_table {
            Some(file) => tables::read_code_column(&self.input_path(file))?,
            None => Vec::new(),
        };

        tracing::info!(
            patients = patients.len(),
            visits = visits.len(),
            facts = facts.len(),
            dummies = dummy_to_patient.len(),
            concepts = ontology.len(),
            "Extract loaded"
        );
        Ok(RunContext {
            patient_header,
            patients,
            visit_header,
            visits,
            patient_visits,
            fact_header,
            facts,
            dummy_to_patient,
            ontology,
            concept_codes,
            time_codes,
            survival_type_codes,
        })
    }

    fn classify_ontology(&self, ctx: &mut RunContext) {
        let direct: HashSet<String> = self
            .config
            .ontology
            .sensitive_concepts
            .iter()
            .cloned()
            .collect();
        ctx.ontology.classify(&direct);
        ctx.ontology.update_children_encrypt_ids();
        tracing::info!(
            total = ctx.ontology.len(),
            sensitive = ctx.ontology.iter().filter(|n| n.sensitive).count(),
            "Classified ontology"
        );
    }

    /// Builds all three tag maps and records concept tags back onto the
    /// ontology nodes.
    async fn build_tags(&self, ctx: &mut RunContext) -> Result<TagMaps> {
        let workers = self.config.pipeline.num_workers;

        // Sensitive concepts: the concept dimension resolves path to code. A
        // sensitive path without a code has no facts referencing it, so it
        // needs no tag.
        let mut concept_codes: Vec<(String, i64)> = Vec::new();
        let mut tagged_paths: Vec<(String, String)> = Vec::new();
        for node in ctx.ontology.iter() {
            let Some(encrypt_id) = node.encrypt_id else {
                continue;
            };
            match ctx.concept_codes.get(&node.path) {
                Some(code) => {
                    concept_codes.push((code.clone(), encrypt_id));
                    tagged_paths.push((node.path.clone(), code.clone()));
                }
                None => {
                    tracing::warn!(path = %node.path, "Sensitive concept has no code, not tagging");
                }
            }
        }

        let mut tags = TagMaps::new();
        tags.concept =
            build_tag_map(concept_codes, Arc::clone(&self.cipher), &*self.tagging, workers)
                .await?;
        for (path, code) in tagged_paths {
            if let Some(tag_id) = tags.concept.get(&code) {
                ctx.ontology.set_tag_id(&path, *tag_id)?;
            }
        }

        let time_codes: Vec<(String, i64)> = ctx
            .time_codes
            .iter()
            .enumerate()
            .map(|(i, code)| (code.clone(), i as i64))
            .collect();
        tags.time =
            build_tag_map(time_codes, Arc::clone(&self.cipher), &*self.tagging, workers).await?;

        let survival_type_codes: Vec<(String, i64)> = ctx
            .survival_type_codes
            .iter()
            .enumerate()
            .map(|(i, code)| (code.clone(), i as i64))
            .collect();
        tags.survival_type = build_tag_map(
            survival_type_codes,
            Arc::clone(&self.cipher),
            &*self.tagging,
            workers,
        )
        .await?;

        Ok(tags)
    }

    /// Encrypts the plaintext survival event tuples of every survival fact
    fn encrypt_survival_blobs(&self, ctx: &RunContext) -> Result<HashMap<FactKey, String>> {
        let prefix = &self.config.ontology.survival_prefix;
        let plaintext: HashMap<FactKey, String> = ctx
            .facts
            .iter()
            .filter(|(_, fact)| fact.is_survival(prefix))
            .map(|(key, fact)| (key.clone(), fact.observation_blob.clone()))
            .collect();
        encrypt_event_blobs(self.cipher.as_ref(), &plaintext)
    }

    fn write_outputs(
        &self,
        ctx: &RunContext,
        remapper: &IdentityRemapper,
        patients: &[PatientRecord],
        visits: &[VisitRecord],
        facts: &[ObservationFact],
    ) -> Result<()> {
        let out_dir = Path::new(&self.config.output.folder);
        std::fs::create_dir_all(out_dir)?;

        tables::write_table(
            &out_dir.join(&self.config.input.patient_table),
            &ctx.patient_header,
            patients.iter().map(PatientRecord::to_fields),
        )?;
        tables::write_table(
            &out_dir.join(&self.config.input.visit_table),
            &ctx.visit_header,
            visits.iter().map(VisitRecord::to_fields),
        )?;
        tables::write_table(
            &out_dir.join(&self.config.input.fact_table),
            &ctx.fact_header,
            facts.iter().map(ObservationFact::to_fields),
        )?;
        tables::write_patient_assignments(
            &out_dir.join("new_patient_num.csv"),
            remapper.patient_assignments(),
        )?;

        tracing::info!(folder = %out_dir.display(), "Wrote converted tables");
        Ok(())
    }
}
