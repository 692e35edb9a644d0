//! Parallel encryption dispatcher
//!
//! Integer encryption dominates the pipeline's run time, so large value
//! batches are partitioned across a fixed worker pool. The partition is
//! contiguous and near-equal: each worker takes `len / workers` values and
//! the last worker absorbs the remainder. The caller blocks until every
//! worker finishes; results come back in the original order, and a failing
//! worker fails the whole batch with no partial results.

use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;

use crate::crypto::cipher::{Ciphertext, IntegerCipher};
use crate::domain::{CloakError, Result};

/// Encrypts a batch of integers across `workers` blocking tasks.
///
/// An empty batch yields an empty result without spawning workers. A worker
/// count larger than the batch is clamped so no worker receives an empty
/// block.
///
/// # Errors
///
/// Returns the first encryption error, or [`CloakError::Crypto`] if a worker
/// task is cancelled or panics.
pub async fn encrypt_all(
    cipher: Arc<dyn IntegerCipher>,
    values: Vec<i64>,
    workers: usize,
) -> Result<Vec<Ciphertext>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let workers = workers.clamp(1, values.len());
    let block_size = values.len() / workers;
    let started = Instant::now();

    let mut handles = Vec::with_capacity(workers);
    for i in 0..workers {
        let start = i * block_size;
        // The last worker takes the remainder of the batch.
        let end = if i == workers - 1 {
            values.len()
        } else {
            start + block_size
        };
        let block: Vec<i64> = values[start..end].to_vec();
        let cipher = Arc::clone(&cipher);

        handles.push(tokio::task::spawn_blocking(move || {
            let mut encrypted = Vec::with_capacity(block.len());
            for value in block {
                encrypted.push(cipher.encrypt_int(value)?);
            }
            tracing::debug!(count = encrypted.len(), "Worker finished encrypting block");
            Ok::<Vec<Ciphertext>, CloakError>(encrypted)
        }));
    }

    let blocks = try_join_all(handles)
        .await
        .map_err(|e| CloakError::Crypto(format!("encryption worker failed: {e}")))?;

    let mut out = Vec::with_capacity(values.len());
    for block in blocks {
        out.extend(block?);
    }

    tracing::info!(
        count = out.len(),
        workers,
        duration_ms = started.elapsed().as_millis() as u64,
        "Finished batch encryption"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::cipher::LocalCipher;

    fn decrypt_all(cipher: &LocalCipher, cts: &[Ciphertext]) -> Vec<i64> {
        cts.iter().map(|ct| cipher.decrypt_int(ct).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_order_preserved_across_workers() {
        let cipher = LocalCipher::from_entropy();
        let values: Vec<i64> = (0..103).collect();
        let encrypted = encrypt_all(Arc::new(cipher.clone()), values.clone(), 4)
            .await
            .unwrap();
        assert_eq!(decrypt_all(&cipher, &encrypted), values);
    }

    #[tokio::test]
    async fn test_last_block_absorbs_remainder() {
        let cipher = LocalCipher::from_entropy();
        // 10 values over 3 workers: blocks of 3, 3, 4.
        let values: Vec<i64> = (100..110).collect();
        let encrypted = encrypt_all(Arc::new(cipher.clone()), values.clone(), 3)
            .await
            .unwrap();
        assert_eq!(encrypted.len(), 10);
        assert_eq!(decrypt_all(&cipher, &encrypted), values);
    }

    #[tokio::test]
    async fn test_more_workers_than_values() {
        let cipher = LocalCipher::from_entropy();
        let values = vec![1i64, 2];
        let encrypted = encrypt_all(Arc::new(cipher.clone()), values.clone(), 16)
            .await
            .unwrap();
        assert_eq!(decrypt_all(&cipher, &encrypted), values);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let cipher = LocalCipher::from_entropy();
        let encrypted = encrypt_all(Arc::new(cipher), Vec::new(), 4).await.unwrap();
        assert!(encrypted.is_empty());
    }
}
