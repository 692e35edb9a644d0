//! Cryptographic collaborator boundary
//!
//! The pipeline consumes two external cryptographic services through narrow
//! traits: homomorphic integer encryption ([`cipher::IntegerCipher`]) and the
//! distributed deterministic-tagging protocol ([`tagging::TaggingClient`]).
//! Their internal algorithms live outside this repository; local stand-ins
//! are provided for development and tests.
//!
//! [`dispatch`] parallelizes batch encryption over a fixed worker pool, and
//! [`events`] applies the cipher to survival event blobs.

pub mod cipher;
pub mod dispatch;
pub mod events;
pub mod tagging;

pub use cipher::{Ciphertext, IntegerCipher, LocalCipher};
pub use dispatch::encrypt_all;
pub use tagging::{SequentialTaggingClient, TaggingClient};
