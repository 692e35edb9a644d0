//! Integration tests for identity remapping with a fixed permutation

use std::collections::{HashMap, HashSet};

use cloak::core::{IdentityRemapper, PermutationCursor};
use cloak::crypto::LocalCipher;
use cloak::domain::records::{PatientRecord, VisitKey, VisitRecord};
use cloak::domain::DummyMapping;

fn patient(num: &str) -> PatientRecord {
    PatientRecord {
        patient_num: num.to_string(),
        vital_status_code: "N".to_string(),
        birth_date: "1970-01-01".to_string(),
        death_date: String::new(),
        encrypted_flag: "cmVhbA==".to_string(),
        extra_fields: vec!["F".to_string()],
    }
}

fn visit(encounter: &str, patient: &str) -> VisitRecord {
    VisitRecord {
        encounter_num: encounter.to_string(),
        patient_num: patient.to_string(),
        active_status_code: "F".to_string(),
        start_date: "2020-06-01".to_string(),
        end_date: "2020-06-02".to_string(),
        extra_fields: Vec::new(),
    }
}

struct Extract {
    patients: HashMap<String, PatientRecord>,
    visits: HashMap<VisitKey, VisitRecord>,
    dummies: DummyMapping,
    patient_visits: HashMap<String, Vec<String>>,
}

/// Three real patients with one visit each; dummy 4 impersonates patient 1.
fn extract() -> Extract {
    Extract {
        patients: ["1", "2", "3"]
            .iter()
            .map(|n| (n.to_string(), patient(n)))
            .collect(),
        visits: [("10", "1"), ("20", "2"), ("30", "3")]
            .iter()
            .map(|(e, p)| (VisitKey::new(*e, *p), visit(e, p)))
            .collect(),
        dummies: [("4".to_string(), "1".to_string())].into_iter().collect(),
        patient_visits: [
            ("1".to_string(), vec!["10".to_string()]),
            ("2".to_string(), vec!["20".to_string()]),
            ("3".to_string(), vec!["30".to_string()]),
        ]
        .into_iter()
        .collect(),
    }
}

#[test]
fn test_fixed_permutation_assignment_order() {
    let ex = extract();
    let cipher = LocalCipher::from_entropy();
    // Patients and dummies draw first, visits after.
    let mut cursor = PermutationCursor::from_values(vec![2, 0, 1, 3, 6, 4, 5, 7]);
    let mut remapper = IdentityRemapper::new();

    remapper
        .assign_patients(&ex.patients, &ex.dummies, &mut cursor, &cipher)
        .unwrap();

    // Real patients in ascending order, then the dummy.
    assert_eq!(remapper.new_patient_num("1"), Some("2"));
    assert_eq!(remapper.new_patient_num("2"), Some("0"));
    assert_eq!(remapper.new_patient_num("3"), Some("1"));
    assert_eq!(remapper.new_patient_num("4"), Some("3"));

    remapper
        .assign_visits(&ex.visits, &ex.dummies, &ex.patient_visits, &mut cursor)
        .unwrap();

    // Real visits continue from the shared cursor.
    assert_eq!(
        remapper.new_visit_key(&VisitKey::new("10", "1")),
        Some(&VisitKey::new("6", "2"))
    );
    assert_eq!(
        remapper.new_visit_key(&VisitKey::new("20", "2")),
        Some(&VisitKey::new("4", "0"))
    );
    assert_eq!(
        remapper.new_visit_key(&VisitKey::new("30", "3")),
        Some(&VisitKey::new("5", "1"))
    );
    // The dummy inherits patient 1's visit under its own number.
    assert_eq!(
        remapper.new_visit_key(&VisitKey::new("10", "4")),
        Some(&VisitKey::new("7", "3"))
    );
}

#[test]
fn test_random_permutation_assignment_is_bijective() {
    let ex = extract();
    let cipher = LocalCipher::from_entropy();
    let mut cursor = PermutationCursor::new(8);
    let mut remapper = IdentityRemapper::new();

    let patients_out = remapper
        .assign_patients(&ex.patients, &ex.dummies, &mut cursor, &cipher)
        .unwrap();
    let visits_out = remapper
        .assign_visits(&ex.visits, &ex.dummies, &ex.patient_visits, &mut cursor)
        .unwrap();

    assert_eq!(patients_out.len(), 4);
    assert_eq!(visits_out.len(), 4);
    assert_eq!(cursor.position(), 8);

    // No identifier is handed out twice across patients and encounters.
    let mut assigned: HashSet<String> = HashSet::new();
    for record in &patients_out {
        assert!(assigned.insert(record.patient_num.clone()));
    }
    for record in &visits_out {
        assert!(assigned.insert(record.encounter_num.clone()));
    }
    assert_eq!(assigned.len(), 8);
}

#[test]
fn test_dummy_patient_clones_original_demographics() {
    let ex = extract();
    let cipher = LocalCipher::from_entropy();
    let mut cursor = PermutationCursor::from_values((0..8).collect());
    let mut remapper = IdentityRemapper::new();

    let patients_out = remapper
        .assign_patients(&ex.patients, &ex.dummies, &mut cursor, &cipher)
        .unwrap();

    let dummy = patients_out.last().unwrap();
    let original = &ex.patients["1"];
    assert_eq!(dummy.vital_status_code, original.vital_status_code);
    assert_eq!(dummy.birth_date, original.birth_date);
    assert_eq!(dummy.extra_fields, original.extra_fields);
    // The real/dummy flag is overwritten, never copied.
    assert_ne!(dummy.encrypted_flag, original.encrypted_flag);
}
