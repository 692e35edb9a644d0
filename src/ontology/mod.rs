//! Ontology concept classification
//!
//! Decides which concepts of the warehouse ontology are sensitive, by direct
//! marking and by hierarchical propagation from ancestors, and computes the
//! per-node child aggregates that feed the tagging phase.

pub mod classifier;

pub use classifier::{strip_by_level, ConceptTable, OntologyNode, PATH_DELIMITER};
