//! External data adapters
//!
//! The extract arrives and leaves as CSV files on disk; this module owns all
//! parsing and serialization at that boundary so the core never touches raw
//! rows.

pub mod csv;
