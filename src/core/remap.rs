//! Identity remapping of patients, dummies and visits
//!
//! Consumes the shared permutation cursor in a fixed order: all real patients
//! (sorted projection over the patient table), then all dummy patients
//! (sorted by the dummy table's own numeric key), then all real visits, then
//! each dummy's inherited visits. The bidirectional maps built here are an
//! input to observation fact processing; they are fully populated before the
//! fact pass starts, never built incrementally during it.

use std::collections::HashMap;

use crate::core::permutation::PermutationCursor;
use crate::core::projection::{self, numeric_sorted, parse_numeric_key};
use crate::crypto::cipher::IntegerCipher;
use crate::domain::records::{PatientRecord, VisitKey, VisitRecord};
use crate::domain::{CloakError, DummyMapping, Result};

/// Bidirectional identifier maps for one pipeline run
///
/// `new_patient_nums` maps every original patient number, real or dummy, to
/// its new number. `new_encounter_nums` maps every original
/// `(encounter, patient)` pair to its new pair; for a dummy's inherited
/// visits the original pair is keyed by the *dummy's* patient number, since
/// that is the number its synthesized facts carry.
#[derive(Debug, Default)]
pub struct IdentityRemapper {
    new_patient_nums: HashMap<String, String>,
    new_encounter_nums: HashMap<VisitKey, VisitKey>,
}

impl IdentityRemapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// New patient number for an original one, if assigned
    pub fn new_patient_num(&self, original: &str) -> Option<&str> {
        self.new_patient_nums.get(original).map(String::as_str)
    }

    /// New `(encounter, patient)` pair for an original one, if assigned
    pub fn new_visit_key(&self, original: &VisitKey) -> Option<&VisitKey> {
        self.new_encounter_nums.get(original)
    }

    /// Snapshot of the patient map, for the `new_patient_num` output file
    pub fn patient_assignments(&self) -> &HashMap<String, String> {
        &self.new_patient_nums
    }

    /// Number of `(encounter, patient)` pairs remapped so far
    pub fn encounter_count(&self) -> usize {
        self.new_encounter_nums.len()
    }

    /// Assigns new patient numbers to all real patients, then to all dummies,
    /// drawing from the shared cursor.
    ///
    /// Returns the rewritten patient rows in emission order. Dummy rows are
    /// cloned from the impersonated patient's record with the dummy's new
    /// number and an `encrypted_flag` overwritten by an encryption of zero,
    /// so a dummy never carries real signal.
    ///
    /// # Errors
    ///
    /// Non-numeric patient or dummy numbers are fatal. A dummy whose original
    /// patient is absent from the patient table is an invariant violation:
    /// the dummy generator and the extract fell out of lock-step.
    pub fn assign_patients(
        &mut self,
        patients: &HashMap<String, PatientRecord>,
        dummy_to_patient: &DummyMapping,
        cursor: &mut PermutationCursor,
        cipher: &dyn IntegerCipher,
    ) -> Result<Vec<PatientRecord>> {
        let mut emitted = Vec::with_capacity(patients.len() + dummy_to_patient.len());

        for (patient_num, record) in
            numeric_sorted(patients, projection::patient_sort_key("patient_dimension"))?
        {
            let new_num = cursor.next_id()?;
            tracing::trace!(patient_num = %patient_num, new_num = %new_num, "Remapped patient");
            self.new_patient_nums
                .insert(patient_num.clone(), new_num.clone());

            let mut rewritten = record.clone();
            rewritten.patient_num = new_num;
            emitted.push(rewritten);
        }

        for (dummy_num, original_num) in numeric_sorted(
            dummy_to_patient,
            projection::patient_sort_key("dummy_to_patient"),
        )? {
            let new_num = cursor.next_id()?;
            self.new_patient_nums
                .insert(dummy_num.clone(), new_num.clone());

            let original = patients.get(original_num).ok_or_else(|| {
                CloakError::InvariantViolation(format!(
                    "dummy {dummy_num} references patient {original_num} absent from the extract"
                ))
            })?;

            let mut dummy = original.clone();
            dummy.patient_num = new_num;
            dummy.encrypted_flag = cipher.encrypt_int(0)?.serialize();
            emitted.push(dummy);
        }

        Ok(emitted)
    }

    /// Assigns new encounter numbers to all real visits, then clones each
    /// dummy's inherited visits from its original patient's visit list.
    ///
    /// Must run after [`assign_patients`](Self::assign_patients): visit rows
    /// substitute their patient number through the patient map.
    ///
    /// # Errors
    ///
    /// Non-numeric keys are fatal; a visit whose patient was never remapped,
    /// or a dummy inherited visit absent from the visit table, is an
    /// invariant violation.
    pub fn assign_visits(
        &mut self,
        visits: &HashMap<VisitKey, VisitRecord>,
        dummy_to_patient: &DummyMapping,
        patient_visits: &HashMap<String, Vec<String>>,
        cursor: &mut PermutationCursor,
    ) -> Result<Vec<VisitRecord>> {
        let mut emitted = Vec::with_capacity(visits.len());

        for (key, record) in numeric_sorted(visits, projection::visit_sort_key)? {
            let new_encounter = cursor.next_id()?;
            let new_patient = self
                .new_patient_nums
                .get(&key.patient_num)
                .ok_or_else(|| {
                    CloakError::InvariantViolation(format!(
                        "visit {key:?} belongs to a patient that was never remapped"
                    ))
                })?
                .clone();

            self.new_encounter_nums.insert(
                key.clone(),
                VisitKey::new(new_encounter.clone(), new_patient.clone()),
            );

            let mut rewritten = record.clone();
            rewritten.encounter_num = new_encounter;
            rewritten.patient_num = new_patient;
            emitted.push(rewritten);
        }

        for (dummy_num, original_num) in numeric_sorted(
            dummy_to_patient,
            projection::patient_sort_key("dummy_to_patient"),
        )? {
            let new_dummy_num = self
                .new_patient_nums
                .get(dummy_num)
                .ok_or_else(|| {
                    CloakError::InvariantViolation(format!(
                        "dummy {dummy_num} was never assigned a new patient number"
                    ))
                })?
                .clone();

            // One inherited visit per visit the original patient had.
            let inherited: &[String] = patient_visits
                .get(original_num)
                .map(Vec::as_slice)
                .unwrap_or_default();

            for encounter_num in inherited {
                parse_numeric_key("visit_dimension", encounter_num)?;
                let new_encounter = cursor.next_id()?;
                self.new_encounter_nums.insert(
                    VisitKey::new(encounter_num.clone(), dummy_num.clone()),
                    VisitKey::new(new_encounter.clone(), new_dummy_num.clone()),
                );

                let original_key = VisitKey::new(encounter_num.clone(), original_num.clone());
                let original_visit = visits.get(&original_key).ok_or_else(|| {
                    CloakError::InvariantViolation(format!(
                        "visit list for patient {original_num} names encounter {encounter_num} \
                         absent from the visit table"
                    ))
                })?;

                let mut cloned = original_visit.clone();
                cloned.encounter_num = new_encounter;
                cloned.patient_num = new_dummy_num.clone();
                emitted.push(cloned);
            }
        }

        Ok(emitted)
    }
}
