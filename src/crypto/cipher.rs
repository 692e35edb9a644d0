//! Integer encryption boundary
//!
//! [`IntegerCipher`] is the seam to the homomorphic encryption collaborator:
//! the pipeline only ever encrypts integers and serializes the result into a
//! textual ciphertext for the output CSV files.
//!
//! [`LocalCipher`] is a randomized, keyed stand-in for local runs and tests.
//! It is **not** homomorphic and not production-grade; it exists so the
//! pipeline can execute end-to-end without the external crypto service, while
//! still guaranteeing that equal plaintexts produce distinct ciphertexts.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{CloakError, Result};

/// An opaque ciphertext produced by the encryption collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext(Vec<u8>);

impl Ciphertext {
    /// Wraps raw ciphertext bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Textual form written into output rows
    pub fn serialize(&self) -> String {
        BASE64.encode(&self.0)
    }

    /// Parses the textual form back into an opaque ciphertext
    pub fn from_serialized(text: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(text)
            .map_err(|e| CloakError::Serialization(format!("invalid ciphertext encoding: {e}")))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Integer encryption as supplied by the external crypto collaborator
pub trait IntegerCipher: Send + Sync {
    /// Encrypts a single integer under the collaborator's public key
    fn encrypt_int(&self, value: i64) -> Result<Ciphertext>;
}

/// Dev/test-grade randomized cipher
///
/// Encrypts by XOR-ing the little-endian plaintext with a keystream derived
/// from the key and a fresh random nonce; the nonce travels with the
/// ciphertext. Stands in for the homomorphic collaborator wherever a real
/// roster is not available.
#[derive(Debug, Clone)]
pub struct LocalCipher {
    key: [u8; 32],
}

const NONCE_LEN: usize = 16;
const BLOCK_LEN: usize = 8;

impl LocalCipher {
    /// Creates a cipher from a fixed key
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Creates a cipher with a random key
    pub fn from_entropy() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill(&mut key);
        Self { key }
    }

    fn keystream(&self, nonce: &[u8; NONCE_LEN]) -> [u8; BLOCK_LEN] {
        let mut seed = self.key;
        for (i, byte) in nonce.iter().enumerate() {
            seed[i % 32] ^= byte;
        }
        let mut rng = StdRng::from_seed(seed);
        let mut pad = [0u8; BLOCK_LEN];
        rng.fill(&mut pad);
        pad
    }

    /// Recovers a plaintext integer; test/verification helper, deliberately
    /// not part of [`IntegerCipher`]
    pub fn decrypt_int(&self, ciphertext: &Ciphertext) -> Result<i64> {
        let bytes = ciphertext.as_bytes();
        if bytes.len() != NONCE_LEN + BLOCK_LEN {
            return Err(CloakError::Crypto(format!(
                "ciphertext has {} bytes, expected {}",
                bytes.len(),
                NONCE_LEN + BLOCK_LEN
            )));
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[..NONCE_LEN]);
        let pad = self.keystream(&nonce);

        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(&bytes[NONCE_LEN..]);
        for i in 0..BLOCK_LEN {
            block[i] ^= pad[i];
        }
        Ok(i64::from_le_bytes(block))
    }
}

impl IntegerCipher for LocalCipher {
    fn encrypt_int(&self, value: i64) -> Result<Ciphertext> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill(&mut nonce);
        let pad = self.keystream(&nonce);

        let mut block = value.to_le_bytes();
        for i in 0..BLOCK_LEN {
            block[i] ^= pad[i];
        }

        let mut out = Vec::with_capacity(NONCE_LEN + BLOCK_LEN);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&block);
        Ok(Ciphertext(out))
    }
}
