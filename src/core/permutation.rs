//! Random identifier permutation and the shared assignment cursor
//!
//! New patient and encounter numbers come from one uniformly random
//! permutation of `0..n`, consumed left to right by a single cursor shared
//! across every entity stream that draws identifiers from the pool (real
//! patients, then dummies, then visits, then dummy visits). Sharing the
//! cursor is what guarantees no two entities ever receive the same new
//! identifier.

use rand::seq::SliceRandom;

use crate::domain::{CloakError, Result};

/// Produces a uniformly random permutation of `0..n`.
///
/// `n == 0` yields an empty sequence; consumers treat that as "no entities to
/// remap", not an error.
pub fn random_permutation(n: usize) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..n).collect();
    perm.shuffle(&mut rand::thread_rng());
    perm
}

/// The shared, monotonically advancing position into a permutation
///
/// Exactly one cursor exists per run. Every identifier assignment advances it
/// by one; it never rewinds and is never shared between runs.
#[derive(Debug)]
pub struct PermutationCursor {
    perm: Vec<usize>,
    next: usize,
}

impl PermutationCursor {
    /// Creates a cursor over a fresh random permutation of `0..n`
    pub fn new(n: usize) -> Self {
        Self::from_values(random_permutation(n))
    }

    /// Creates a cursor over a caller-supplied sequence; used by tests that
    /// need a fixed assignment order
    pub fn from_values(perm: Vec<usize>) -> Self {
        Self { perm, next: 0 }
    }

    /// Draws the next identifier, formatted the way identifier columns are
    /// stored.
    ///
    /// # Errors
    ///
    /// Exhausting the permutation is an invariant violation: the pool was
    /// sized for every entity needing a new identifier before the passes
    /// started.
    pub fn next_id(&mut self) -> Result<String> {
        let value = self.perm.get(self.next).ok_or_else(|| {
            CloakError::InvariantViolation(format!(
                "identifier permutation exhausted after {} assignments",
                self.next
            ))
        })?;
        self.next += 1;
        Ok(value.to_string())
    }

    /// Number of identifiers not yet assigned
    pub fn remaining(&self) -> usize {
        self.perm.len() - self.next
    }

    /// Current cursor position (number of identifiers already assigned)
    pub fn position(&self) -> usize {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0)]
    #[test_case(1)]
    #[test_case(17)]
    #[test_case(1000)]
    fn test_permutation_is_bijection(n: usize) {
        let mut perm = random_permutation(n);
        perm.sort_unstable();
        let expected: Vec<usize> = (0..n).collect();
        assert_eq!(perm, expected);
    }

    #[test]
    fn test_cursor_consumes_left_to_right() {
        let mut cursor = PermutationCursor::from_values(vec![2, 0, 1, 3]);
        assert_eq!(cursor.next_id().unwrap(), "2");
        assert_eq!(cursor.next_id().unwrap(), "0");
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.remaining(), 2);
    }

    #[test]
    fn test_cursor_exhaustion_is_invariant_violation() {
        let mut cursor = PermutationCursor::from_values(vec![0]);
        cursor.next_id().unwrap();
        let err = cursor.next_id().unwrap_err();
        assert!(matches!(err, CloakError::InvariantViolation(_)));
    }

    #[test]
    fn test_empty_permutation_means_no_entities() {
        let mut cursor = PermutationCursor::new(0);
        assert_eq!(cursor.remaining(), 0);
        assert!(cursor.next_id().is_err());
    }
}
