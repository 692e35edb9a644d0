//! Survival-analysis event tuples
//!
//! A survival fact's observation blob carries a time-to-event tuple: the
//! event-of-interest indicator and the censoring indicator. In the source
//! extract the tuple is textual; the encryption phase replaces it with two
//! serialized ciphertexts joined by the same separator.

use std::fmt;
use std::str::FromStr;

use crate::domain::errors::CloakError;
use crate::domain::result::Result;

/// Separator between the event-of-interest and censoring components of a blob
pub const EVENT_SEPARATOR: &str = " ";

/// A plaintext survival event tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurvivalEvent {
    pub event_of_interest: i64,
    pub censoring: i64,
}

impl SurvivalEvent {
    /// The "zero event, zero censoring" tuple written into dummy survival facts
    pub fn zero() -> Self {
        Self {
            event_of_interest: 0,
            censoring: 0,
        }
    }
}

impl FromStr for SurvivalEvent {
    type Err = CloakError;

    fn from_str(blob: &str) -> Result<Self> {
        let mut parts = blob.split(EVENT_SEPARATOR);
        let event = parts.next().unwrap_or_default();
        let censoring = parts.next().ok_or_else(|| {
            CloakError::Serialization(format!("survival blob {blob:?} has no censoring component"))
        })?;
        if parts.next().is_some() {
            return Err(CloakError::Serialization(format!(
                "survival blob {blob:?} has more than two components"
            )));
        }

        let event_of_interest = event.trim().parse::<i64>().map_err(|_| {
            CloakError::Serialization(format!("survival event {event:?} is not an integer"))
        })?;
        let censoring = censoring.trim().parse::<i64>().map_err(|_| {
            CloakError::Serialization(format!("censoring event {censoring:?} is not an integer"))
        })?;

        Ok(Self {
            event_of_interest,
            censoring,
        })
    }
}

impl fmt::Display for SurvivalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.event_of_interest, EVENT_SEPARATOR, self.censoring
        )
    }
}
