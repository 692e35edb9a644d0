//! Warehouse entity records and their composite keys
//!
//! Records mirror the entity tables of the source extract: patients, visits
//! and observation facts. Identifier columns are kept as strings (the way they
//! travel through the CSV extract); the projection layer parses them to
//! integers only for ordering, and the remapper rewrites them in place.
//!
//! Keys are plain value types with structural equality, so they can be used
//! directly as map keys.

use serde::{Deserialize, Serialize};

use crate::domain::errors::CloakError;
use crate::domain::result::Result;

/// Composite key of a visit: `(encounter_num, patient_num)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisitKey {
    pub encounter_num: String,
    pub patient_num: String,
}

impl VisitKey {
    pub fn new(encounter_num: impl Into<String>, patient_num: impl Into<String>) -> Self {
        Self {
            encounter_num: encounter_num.into(),
            patient_num: patient_num.into(),
        }
    }
}

/// Composite key of an observation fact
///
/// Includes the concept code: the same encounter can carry several facts for
/// different concepts, and the same concept can repeat within an encounter
/// under distinct instance numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactKey {
    pub encounter_num: String,
    pub patient_num: String,
    pub concept_code: String,
    pub instance_num: String,
}

/// A patient dimension row
///
/// `encrypted_flag` carries the serialized ciphertext of the patient's
/// "real/dummy" marker. Real patients arrive with it already populated by the
/// upstream encryption phase; synthesized dummies get it overwritten with an
/// encryption of zero during the remap pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_num: String,
    pub vital_status_code: String,
    pub birth_date: String,
    pub death_date: String,
    pub encrypted_flag: String,
    /// Remaining demographic columns, carried through untouched
    pub extra_fields: Vec<String>,
}

impl PatientRecord {
    /// Flattens the record into output CSV fields
    pub fn to_fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.patient_num.clone(),
            self.vital_status_code.clone(),
            self.birth_date.clone(),
            self.death_date.clone(),
            self.encrypted_flag.clone(),
        ];
        fields.extend(self.extra_fields.iter().cloned());
        fields
    }

    /// Builds a record from input CSV fields
    ///
    /// # Errors
    ///
    /// Returns [`CloakError::Csv`] if fewer than five columns are present.
    pub fn from_fields(fields: &[String]) -> Result<Self> {
        if fields.len() < 5 {
            return Err(CloakError::Csv(format!(
                "patient_dimension row has {} columns, expected at least 5",
                fields.len()
            )));
        }
        Ok(Self {
            patient_num: fields[0].clone(),
            vital_status_code: fields[1].clone(),
            birth_date: fields[2].clone(),
            death_date: fields[3].clone(),
            encrypted_flag: fields[4].clone(),
            extra_fields: fields[5..].to_vec(),
        })
    }
}

/// A visit dimension row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub encounter_num: String,
    pub patient_num: String,
    pub active_status_code: String,
    pub start_date: String,
    pub end_date: String,
    pub extra_fields: Vec<String>,
}

impl VisitRecord {
    /// The visit's composite key
    pub fn key(&self) -> VisitKey {
        VisitKey::new(self.encounter_num.clone(), self.patient_num.clone())
    }

    /// Flattens the record into output CSV fields
    pub fn to_fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.encounter_num.clone(),
            self.patient_num.clone(),
            self.active_status_code.clone(),
            self.start_date.clone(),
            self.end_date.clone(),
        ];
        fields.extend(self.extra_fields.iter().cloned());
        fields
    }

    /// Builds a record from input CSV fields
    pub fn from_fields(fields: &[String]) -> Result<Self> {
        if fields.len() < 5 {
            return Err(CloakError::Csv(format!(
                "visit_dimension row has {} columns, expected at least 5",
                fields.len()
            )));
        }
        Ok(Self {
            encounter_num: fields[0].clone(),
            patient_num: fields[1].clone(),
            active_status_code: fields[2].clone(),
            start_date: fields[3].clone(),
            end_date: fields[4].clone(),
            extra_fields: fields[5..].to_vec(),
        })
    }
}

/// An observation fact row
///
/// `observation_blob` carries the encrypted survival event tuple when the
/// concept code marks the fact as a survival-analysis observation; it is empty
/// otherwise. `text_search_index` is the warehouse's free-text index column
/// and travels with the concept code during dummy synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationFact {
    pub key: FactKey,
    pub value_type_code: String,
    pub value_char: String,
    pub value_num: String,
    pub units_code: String,
    pub start_date: String,
    pub observation_blob: String,
    pub text_search_index: String,
    pub extra_fields: Vec<String>,
}

impl ObservationFact {
    /// Flattens the record into output CSV fields
    pub fn to_fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.key.encounter_num.clone(),
            self.key.patient_num.clone(),
            self.key.concept_code.clone(),
            self.key.instance_num.clone(),
            self.value_type_code.clone(),
            self.value_char.clone(),
            self.value_num.clone(),
            self.units_code.clone(),
            self.start_date.clone(),
            self.observation_blob.clone(),
            self.text_search_index.clone(),
        ];
        fields.extend(self.extra_fields.iter().cloned());
        fields
    }

    /// Builds a record from input CSV fields
    pub fn from_fields(fields: &[String]) -> Result<Self> {
        if fields.len() < 11 {
            return Err(CloakError::Csv(format!(
                "observation_fact row has {} columns, expected at least 11",
                fields.len()
            )));
        }
        Ok(Self {
            key: FactKey {
                encounter_num: fields[0].clone(),
                patient_num: fields[1].clone(),
                concept_code: fields[2].clone(),
                instance_num: fields[3].clone(),
            },
            value_type_code: fields[4].clone(),
            value_char: fields[5].clone(),
            value_num: fields[6].clone(),
            units_code: fields[7].clone(),
            start_date: fields[8].clone(),
            observation_blob: fields[9].clone(),
            text_search_index: fields[10].clone(),
            extra_fields: fields[11..].to_vec(),
        })
    }

    /// True when the concept code marks a survival-analysis observation
    pub fn is_survival(&self, survival_prefix: &str) -> bool {
        self.key.concept_code.contains(survival_prefix)
    }
}
