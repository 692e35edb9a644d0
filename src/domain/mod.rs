//! Core domain types and models
//!
//! This module contains the entity records, composite keys, survival event
//! type and the error hierarchy shared by every pipeline component.

pub mod errors;
pub mod records;
pub mod result;
pub mod survival;

pub use errors::CloakError;
pub use records::{FactKey, ObservationFact, PatientRecord, VisitKey, VisitRecord};
pub use result::Result;
pub use survival::{SurvivalEvent, EVENT_SEPARATOR};

use std::collections::HashMap;

/// Mapping from a dummy patient number to the real patient it impersonates.
///
/// Produced by the external dummy-candidate generator, loaded once at
/// start-of-run, immutable thereafter. Several dummies may map to the same
/// original patient.
pub type DummyMapping = HashMap<String, String>;
