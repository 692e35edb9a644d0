//! Re-identification protection engine
//!
//! The transformation core: randomized identifier permutation, deterministic
//! sorted projections over the entity tables, the identity remapper, the
//! dummy synthesizer with observation fact emission, tag substitution, and
//! the pipeline coordinator that owns the per-run state.

pub mod facts;
pub mod permutation;
pub mod pipeline;
pub mod projection;
pub mod remap;
pub mod tags;

pub use permutation::{random_permutation, PermutationCursor};
pub use pipeline::{ConvertPipeline, ConvertSummary, RunContext};
pub use remap::IdentityRemapper;
pub use tags::TagMaps;
