//! CSV readers and writers for the extract tables
//!
//! Every table travels as headed CSV. Readers parse rows into their record
//! types and key them for map lookup; writers emit the header first and the
//! rows in the order the caller produced them. Rows are kept as strings end
//! to end, so columns this pipeline does not interpret pass through
//! byte-identical.

use std::collections::HashMap;
use std::path::Path;

use crate::core::projection::{self, numeric_sorted};
use crate::domain::records::{FactKey, ObservationFact, PatientRecord, VisitKey, VisitRecord};
use crate::domain::{CloakError, DummyMapping, Result};

/// Reads a headed CSV file into its header and raw string rows
fn read_rows(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| CloakError::Csv(format!("cannot open {}: {}", path.display(), e)))?;

    let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(String::from).collect());
    }
    Ok((header, rows))
}

/// Loads the patient dimension table, keyed by patient number.
///
/// Returns the header alongside so the converted table can echo it.
pub fn read_patient_table(path: &Path) -> Result<(Vec<String>, HashMap<String, PatientRecord>)> {
    let (header, rows) = read_rows(path)?;
    let mut patients = HashMap::with_capacity(rows.len());
    for fields in &rows {
        let record = PatientRecord::from_fields(fields)?;
        patients.insert(record.patient_num.clone(), record);
    }
    tracing::debug!(count = patients.len(), "Loaded patient dimension");
    Ok((header, patients))
}

/// Loads the visit dimension table, keyed by `(encounter, patient)`.
///
/// Also derives the per-patient encounter list consumed when dummies inherit
/// their original patient's visits.
pub fn read_visit_table(
    path: &Path,
) -> Result<(
    Vec<String>,
    HashMap<VisitKey, VisitRecord>,
    HashMap<String, Vec<String>>,
)> {
    let (header, rows) = read_rows(path)?;
    let mut visits = HashMap::with_capacity(rows.len());
    let mut patient_visits: HashMap<String, Vec<String>> = HashMap::new();
    for fields in &rows {
        let record = VisitRecord::from_fields(fields)?;
        patient_visits
            .entry(record.patient_num.clone())
            .or_default()
            .push(record.encounter_num.clone());
        visits.insert(record.key(), record);
    }
    tracing::debug!(count = visits.len(), "Loaded visit dimension");
    Ok((header, visits, patient_visits))
}

/// Loads the observation fact table, keyed by the full fact key
pub fn read_fact_table(path: &Path) -> Result<(Vec<String>, HashMap<FactKey, ObservationFact>)> {
    let (header, rows) = read_rows(path)?;
    let mut facts = HashMap::with_capacity(rows.len());
    for fields in &rows {
        let record = ObservationFact::from_fields(fields)?;
        facts.insert(record.key.clone(), record);
    }
    tracing::debug!(count = facts.len(), "Loaded observation facts");
    Ok((header, facts))
}

/// Loads the dummy-to-patient mapping (dummy number, original number)
pub fn read_dummy_mapping(path: &Path) -> Result<DummyMapping> {
    let (_, rows) = read_rows(path)?;
    let mut mapping = DummyMapping::with_capacity(rows.len());
    for fields in &rows {
        if fields.len() < 2 {
            return Err(CloakError::Csv(format!(
                "dummy mapping row has {} columns, expected 2",
                fields.len()
            )));
        }
        mapping.insert(fields[0].clone(), fields[1].clone());
    }
    tracing::debug!(count = mapping.len(), "Loaded dummy mapping");
    Ok(mapping)
}

/// Loads the concept paths of one ontology table (first column)
pub fn read_ontology_paths(path: &Path) -> Result<Vec<String>> {
    let (_, rows) = read_rows(path)?;
    Ok(rows
        .into_iter()
        .filter_map(|mut fields| {
            if fields.is_empty() {
                None
            } else {
                Some(fields.swap_remove(0))
            }
        })
        .collect())
}

/// Loads the concept dimension: concept path to concept code
pub fn read_concept_dimension(path: &Path) -> Result<HashMap<String, String>> {
    let (_, rows) = read_rows(path)?;
    let mut codes = HashMap::with_capacity(rows.len());
    for fields in &rows {
        if fields.len() < 2 {
            return Err(CloakError::Csv(format!(
                "concept dimension row has {} columns, expected 2",
                fields.len()
            )));
        }
        codes.insert(fields[0].clone(), fields[1].clone());
    }
    Ok(codes)
}

/// Loads a single-code-column table (time and survival-type dimensions)
pub fn read_code_column(path: &Path) -> Result<Vec<String>> {
    let (_, rows) = read_rows(path)?;
    Ok(rows
        .into_iter()
        .filter_map(|mut fields| {
            if fields.is_empty() {
                None
            } else {
                Some(fields.swap_remove(0))
            }
        })
        .collect())
}

/// Writes a headed CSV table
pub fn write_table<I>(path: &Path, header: &[String], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| CloakError::Csv(format!("cannot create {}: {}", path.display(), e)))?;

    writer.write_record(header)?;
    let mut count = 0usize;
    for row in rows {
        writer.write_record(&row)?;
        count += 1;
    }
    writer.flush()?;
    tracing::debug!(path = %path.display(), rows = count, "Wrote table");
    Ok(())
}

/// Writes the original-to-new patient number map, ordered by the original
/// number
pub fn write_patient_assignments(
    path: &Path,
    assignments: &HashMap<String, String>,
) -> Result<()> {
    let header = vec!["patient_num".to_string(), "new_patient_num".to_string()];
    let sorted = numeric_sorted(assignments, projection::patient_sort_key("new_patient_num"))?;
    let rows = sorted
        .into_iter()
        .map(|(old, new)| vec![old.clone(), new.clone()]);
    write_table(path, &header, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_patient_table() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "patients.csv",
            "patient_num,vital_status_cd,birth_date,death_date,enc_dummy_flag_cd,sex_cd\n\
             1,N,1970-01-01,,ZmxhZw==,F\n\
             2,D,1955-05-05,2020-01-01,ZmxhZw==,M\n",
        );

        let (header, patients) = read_patient_table(&path).unwrap();
        assert_eq!(header.len(), 6);
        assert_eq!(patients.len(), 2);
        assert_eq!(patients["2"].vital_status_code, "D");
        assert_eq!(patients["1"].extra_fields, vec!["F".to_string()]);
    }

    #[test]
    fn test_read_visit_table_builds_patient_visits() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "visits.csv",
            "encounter_num,patient_num,active_status_cd,start_date,end_date\n\
             10,1,F,2020-06-01,2020-06-02\n\
             11,1,F,2020-07-01,2020-07-02\n\
             20,2,F,2020-06-01,2020-06-02\n",
        );

        let (_, visits, patient_visits) = read_visit_table(&path).unwrap();
        assert_eq!(visits.len(), 3);
        assert_eq!(patient_visits["1"].len(), 2);
        assert_eq!(patient_visits["2"], vec!["20".to_string()]);
    }

    #[test]
    fn test_read_fact_table() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "facts.csv",
            "encounter_num,patient_num,concept_cd,instance_num,valtype_cd,tval_char,nval_num,units_cd,start_date,observation_blob,text_search_index\n\
             10,1,ICD9:250,1,N,E,7.4,mmol/L,2019-03-01,,881\n",
        );

        let (_, facts) = read_fact_table(&path).unwrap();
        assert_eq!(facts.len(), 1);
        let key = FactKey {
            encounter_num: "10".to_string(),
            patient_num: "1".to_string(),
            concept_code: "ICD9:250".to_string(),
            instance_num: "1".to_string(),
        };
        assert_eq!(facts[&key].value_num, "7.4");
    }

    #[test]
    fn test_read_dummy_mapping_short_row_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "dummies.csv", "dummy_num,patient_num\n4\n");
        assert!(read_dummy_mapping(&path).is_err());
    }

    #[test]
    fn test_write_and_reread_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let header = vec!["a".to_string(), "b".to_string()];
        let rows = vec![vec!["1".to_string(), "x".to_string()]];

        write_table(&path, &header, rows).unwrap();
        let (reread_header, reread_rows) = read_rows(&path).unwrap();
        assert_eq!(reread_header, header);
        assert_eq!(reread_rows, vec![vec!["1".to_string(), "x".to_string()]]);
    }

    #[test]
    fn test_write_patient_assignments_ordered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new_patient_num.csv");
        let assignments: HashMap<String, String> = [
            ("10".to_string(), "0".to_string()),
            ("2".to_string(), "1".to_string()),
        ]
        .into_iter()
        .collect();

        write_patient_assignments(&path, &assignments).unwrap();
        let (_, rows) = read_rows(&path).unwrap();
        // Numeric order, not lexical: 2 before 10.
        assert_eq!(rows[0][0], "2");
        assert_eq!(rows[1][0], "10");
    }
}
