//! Survival event blob encryption
//!
//! A survival fact's blob is a textual event tuple until the encryption phase
//! replaces it with two serialized ciphertexts (event-of-interest, censoring)
//! joined by the tuple separator. Dummies never carry real survival signal:
//! their blobs are always an encryption of the zero tuple.

use std::collections::HashMap;
use std::time::Instant;

use crate::crypto::cipher::IntegerCipher;
use crate::domain::{FactKey, Result, SurvivalEvent, EVENT_SEPARATOR};

/// Encrypts one plaintext event tuple into blob form
pub fn encrypt_event(cipher: &dyn IntegerCipher, event: SurvivalEvent) -> Result<String> {
    let event_ct = cipher.encrypt_int(event.event_of_interest)?.serialize();
    let censoring_ct = cipher.encrypt_int(event.censoring)?.serialize();
    Ok(format!("{event_ct}{EVENT_SEPARATOR}{censoring_ct}"))
}

/// Encrypts the "zero event, zero censoring" tuple written into dummy
/// survival facts
pub fn encrypt_zero_event(cipher: &dyn IntegerCipher) -> Result<String> {
    encrypt_event(cipher, SurvivalEvent::zero())
}

/// Encrypts every plaintext survival blob in the map, keyed by the owning
/// fact.
///
/// # Errors
///
/// Fails on the first blob that does not parse as an event tuple or fails to
/// encrypt.
pub fn encrypt_event_blobs(
    cipher: &dyn IntegerCipher,
    blobs: &HashMap<FactKey, String>,
) -> Result<HashMap<FactKey, String>> {
    let started = Instant::now();
    let mut encrypted = HashMap::with_capacity(blobs.len());
    for (key, blob) in blobs {
        let event: SurvivalEvent = blob.parse()?;
        encrypted.insert(key.clone(), encrypt_event(cipher, event)?);
    }
    tracing::info!(
        count = encrypted.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "Finished probabilistic encryption of survival events"
    );
    Ok(encrypted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::cipher::{Ciphertext, LocalCipher};

    fn decrypt_blob(cipher: &LocalCipher, blob: &str) -> (i64, i64) {
        let mut parts = blob.split(EVENT_SEPARATOR);
        let event = Ciphertext::from_serialized(parts.next().unwrap()).unwrap();
        let censoring = Ciphertext::from_serialized(parts.next().unwrap()).unwrap();
        (
            cipher.decrypt_int(&event).unwrap(),
            cipher.decrypt_int(&censoring).unwrap(),
        )
    }

    #[test]
    fn test_zero_event_decrypts_to_zero_tuple() {
        let cipher = LocalCipher::from_entropy();
        let blob = encrypt_zero_event(&cipher).unwrap();
        assert_eq!(decrypt_blob(&cipher, &blob), (0, 0));
    }

    #[test]
    fn test_event_blob_preserves_both_components() {
        let cipher = LocalCipher::from_entropy();
        let blob = encrypt_event(
            &cipher,
            SurvivalEvent {
                event_of_interest: 1,
                censoring: 0,
            },
        )
        .unwrap();
        assert_eq!(decrypt_blob(&cipher, &blob), (1, 0));
    }

    #[test]
    fn test_encrypt_event_blobs_map() {
        let cipher = LocalCipher::from_entropy();
        let key = FactKey {
            encounter_num: "10".to_string(),
            patient_num: "1".to_string(),
            concept_code: "SRVA:death".to_string(),
            instance_num: "1".to_string(),
        };
        let blobs = HashMap::from([(key.clone(), "1 0".to_string())]);

        let encrypted = encrypt_event_blobs(&cipher, &blobs).unwrap();
        assert_eq!(decrypt_blob(&cipher, &encrypted[&key]), (1, 0));
    }

    #[test]
    fn test_malformed_blob_rejected() {
        let cipher = LocalCipher::from_entropy();
        let key = FactKey {
            encounter_num: "10".to_string(),
            patient_num: "1".to_string(),
            concept_code: "SRVA:death".to_string(),
            instance_num: "1".to_string(),
        };
        let blobs = HashMap::from([(key, "not an event".to_string())]);
        assert!(encrypt_event_blobs(&cipher, &blobs).is_err());
    }
}
