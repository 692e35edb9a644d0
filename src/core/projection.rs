//! Deterministic numeric-key ordered views over entity tables
//!
//! Storage order (hash maps) is decoupled from output order by projecting
//! each table into a plain vector sorted ascending on its parsed numeric key.
//! Composite tables sort on the full parsed key tuple, so ties cannot occur.
//! A non-numeric key is a fatal configuration error: the extract violates the
//! assumed schema.

use std::collections::HashMap;

use crate::domain::records::{FactKey, VisitKey};
use crate::domain::{CloakError, Result};

/// Parses an identifier column that the schema requires to be numeric
pub fn parse_numeric_key(table: &'static str, raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| CloakError::MalformedKey {
        table,
        value: raw.to_string(),
    })
}

/// Projects a keyed table into entry references ordered ascending by the
/// parsed sort key.
///
/// Consumers iterate the result with ordinary control flow and propagate
/// errors with `?`; no callback indirection is needed.
pub fn numeric_sorted<'a, K, V, S, F>(
    table: &'a HashMap<K, V>,
    sort_key: F,
) -> Result<Vec<(&'a K, &'a V)>>
where
    S: Ord,
    F: Fn(&K) -> Result<S>,
{
    let mut keyed = Vec::with_capacity(table.len());
    for (key, value) in table {
        keyed.push((sort_key(key)?, key, value));
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, k, v)| (k, v)).collect())
}

/// Sort key for the patient table: the patient number
pub fn patient_sort_key(table: &'static str) -> impl Fn(&String) -> Result<i64> {
    move |patient_num| parse_numeric_key(table, patient_num)
}

/// Sort key for the visit table: `(patient_num, encounter_num)` parsed
pub fn visit_sort_key(key: &VisitKey) -> Result<(i64, i64)> {
    Ok((
        parse_numeric_key("visit_dimension", &key.patient_num)?,
        parse_numeric_key("visit_dimension", &key.encounter_num)?,
    ))
}

/// Sort key for the fact table: numeric identifiers first, then the concept
/// code for full determinism
pub fn fact_sort_key(key: &FactKey) -> Result<(i64, i64, String, String)> {
    Ok((
        parse_numeric_key("observation_fact", &key.patient_num)?,
        parse_numeric_key("observation_fact", &key.encounter_num)?,
        key.concept_code.clone(),
        key.instance_num.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorts_numerically_not_lexically() {
        let table: HashMap<String, &str> = [
            ("10".to_string(), "ten"),
            ("2".to_string(), "two"),
            ("1".to_string(), "one"),
        ]
        .into_iter()
        .collect();

        let sorted = numeric_sorted(&table, patient_sort_key("patient_dimension")).unwrap();
        let keys: Vec<&str> = sorted.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_non_numeric_key_is_fatal() {
        let table: HashMap<String, &str> = [("abc".to_string(), "bad")].into_iter().collect();
        let err = numeric_sorted(&table, patient_sort_key("patient_dimension")).unwrap_err();
        assert!(matches!(
            err,
            CloakError::MalformedKey {
                table: "patient_dimension",
                ..
            }
        ));
    }

    #[test]
    fn test_composite_visit_ordering() {
        let table: HashMap<VisitKey, &str> = [
            (VisitKey::new("30", "2"), "b"),
            (VisitKey::new("20", "2"), "a"),
            (VisitKey::new("5", "11"), "c"),
        ]
        .into_iter()
        .collect();

        let sorted = numeric_sorted(&table, visit_sort_key).unwrap();
        let order: Vec<&str> = sorted.iter().map(|(_, v)| **v).collect();
        // Patient 2 before patient 11, encounters ascending within a patient.
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_table() {
        let table: HashMap<String, &str> = HashMap::new();
        let sorted = numeric_sorted(&table, patient_sort_key("patient_dimension")).unwrap();
        assert!(sorted.is_empty());
    }
}
