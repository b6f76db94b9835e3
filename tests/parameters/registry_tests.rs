//! Tests for loading parameter tables into a registry.

use nllfit_rs::{FitError, ParameterKind, ParameterRegistry, ParameterTable};

const SELECTIONS: [&str; 2] = ["ee", "mumu"];
const PROCESSES: [&str; 2] = ["zjets", "ttbar"];

const TABLE: &str = r#"[
    {"name": "jes", "kind": "shape", "value": 0.0, "uncertainty": 1.0,
     "ee": true, "mumu": true, "zjets": true, "ttbar": true},
    {"name": "beta_e", "kind": "poi", "value": 0.108, "uncertainty": 0.0,
     "ee": true, "mumu": true, "zjets": true, "ttbar": true},
    {"name": "beta_mu", "kind": "poi", "value": 0.108, "uncertainty": 0.0,
     "ee": true, "mumu": true, "zjets": true, "ttbar": true},
    {"name": "lumi", "kind": "norm", "value": 1.0, "uncertainty": 0.025,
     "ee": true, "mumu": false, "zjets": true, "ttbar": true},
    {"name": "beta_tau", "kind": "poi", "value": 0.108, "uncertainty": 0.0,
     "ee": true, "mumu": true, "zjets": true, "ttbar": true},
    {"name": "beta_h", "kind": "poi", "value": 0.676, "uncertainty": 0.0,
     "ee": true, "mumu": true, "zjets": true, "ttbar": true},
    {"name": "xs_ttbar", "kind": "norm", "value": 1.0, "uncertainty": 0.05, "active": false,
     "ee": true, "mumu": true, "zjets": false, "ttbar": true}
]"#;

#[test]
fn test_registry_orders_by_kind() {
    let table = ParameterTable::from_json(TABLE).unwrap();
    let registry = ParameterRegistry::from_table(&table, &SELECTIONS, &PROCESSES).unwrap();

    assert_eq!(
        registry.names(),
        vec!["beta_e", "beta_mu", "beta_tau", "beta_h", "lumi", "xs_ttbar", "jes"]
    );
    assert_eq!(registry.n_poi(), 4);
    assert_eq!(registry.n_norm(), 2);
    assert_eq!(registry.n_shape(), 1);
    assert_eq!(registry.len(), 7);
    assert_eq!(registry.index_of("jes"), Some(6));
    assert_eq!(registry.get("lumi").unwrap().kind(), ParameterKind::Norm);
}

#[test]
fn test_applicability_lookups() {
    let table = ParameterTable::from_json(TABLE).unwrap();
    let registry = ParameterRegistry::from_table(&table, &SELECTIONS, &PROCESSES).unwrap();

    assert!(registry.applies_to_selection("lumi", "ee").unwrap());
    assert!(!registry.applies_to_selection("lumi", "mumu").unwrap());
    assert!(!registry.applies_to_process("xs_ttbar", "zjets").unwrap());

    // inactive parameters keep their flags but never take effect
    let xs = registry.get("xs_ttbar").unwrap();
    assert!(!xs.is_active());
    assert!(xs.applies_to_process("ttbar"));
    assert!(!xs.affects("ee", "ttbar"));

    assert!(matches!(
        registry.applies_to_selection("nope", "ee"),
        Err(FitError::ParameterNotFound(_))
    ));
}

#[test]
fn test_initial_values_follow_vector_layout() {
    let table = ParameterTable::from_json(TABLE).unwrap();
    let registry = ParameterRegistry::from_table(&table, &SELECTIONS, &PROCESSES).unwrap();

    let values = registry.initial_values();
    assert_eq!(values.to_vec(), vec![0.108, 0.108, 0.108, 0.676, 1.0, 1.0, 0.0]);
    assert_eq!(registry.initial_uncertainties()[4], 0.025);
}

#[test]
fn test_missing_selection_column_is_fatal() {
    let table = ParameterTable::from_json(TABLE).unwrap();
    match ParameterRegistry::from_table(&table, &["ee", "emu"], &PROCESSES) {
        Err(FitError::MissingColumn { column, .. }) => assert_eq!(column, "emu"),
        other => panic!("Expected MissingColumn, got {:?}", other),
    }
}

#[test]
fn test_load_json_from_file() {
    let path = std::env::temp_dir().join("nllfit_rs_registry_tests_table.json");
    std::fs::write(&path, TABLE).unwrap();

    let table = ParameterTable::load_json(&path).unwrap();
    assert_eq!(table.len(), 7);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(
        ParameterTable::load_json("/nonexistent/nllfit_rs/table.json"),
        Err(FitError::IoError(_))
    ));
}
