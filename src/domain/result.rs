//! Result type alias for Cloak operations

use super::errors::CloakError;

/// Result type used throughout the Cloak library
pub type Result<T> = std::result::Result<T, CloakError>;
