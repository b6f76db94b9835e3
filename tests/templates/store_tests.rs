//! Tests for building the template store from a provider.

use nllfit_rs::{FitError, ParameterRegistry, TemplateProvider, TemplateStore};

use crate::test_helpers::{config, parameter_table, two_category_provider, PROCESSES, SELECTIONS};

const PROVIDER: &str = r#"{
    "emu": {
        "cat_0": {
            "data": {"values": [31.0, 19.0], "variances": [31.0, 19.0]},
            "processes": {
                "ttbar": {
                    "e+mu": {"values": [10.0, 5.0], "variances": [1.0, 0.5]},
                    "tau_h+h": {"values": [0.5, 0.5], "variances": [0.1, 0.1]}
                },
                "zjets": {"values": [20.0, 15.0], "variances": [2.0, 1.5]}
            }
        },
        "cat_1": {
            "data": {"values": [29.0, 21.0], "variances": [29.0, 21.0]},
            "processes": {
                "zjets": {"values": [20.0, 15.0], "variances": [2.0, 1.5]}
            }
        }
    }
}"#;

fn registry() -> ParameterRegistry {
    ParameterRegistry::from_table(&parameter_table(), &SELECTIONS, &PROCESSES).unwrap()
}

#[test]
fn test_store_from_json_provider() {
    let provider = TemplateProvider::from_json(PROVIDER).unwrap();
    let store = TemplateStore::build(&registry(), &provider, &config()).unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(store.n_slots(), 21 + 1);

    let cat_0 = store.get(store.id("emu", "cat_0").unwrap()).unwrap();
    assert_eq!(cat_0.row_labels(), &["ttbar/e+mu", "ttbar/tau_h+h", "zjets"]);
    assert_eq!(cat_0.n_bins(), 2);

    // absent ttbar in cat_1 masks all 21 channel slots
    let cat_1 = store.get(store.id("emu", "cat_1").unwrap()).unwrap();
    assert_eq!(cat_1.row_labels(), &["zjets"]);
    assert!(cat_1.process_mask()[..21].iter().all(|on| !on));
    assert!(cat_1.process_mask()[21]);
}

#[test]
fn test_mask_invariants_hold_in_every_category() {
    let provider = TemplateProvider::from_json(PROVIDER).unwrap();
    let store = TemplateStore::build(&registry(), &provider, &config()).unwrap();

    for (_, category) in store.iter() {
        let active = category.process_mask().iter().filter(|on| **on).count();
        assert_eq!(category.process_mask().len(), store.n_slots());
        assert_eq!(category.n_rows(), active);
        assert_eq!(category.norm_mask().nrows(), active);
        assert_eq!(category.norm_mask().ncols(), 1);
        assert_eq!(category.tensor().shape(), &[active, 2, category.n_bins()]);
    }
}

#[test]
fn test_data_length_mismatch_is_a_load_error() {
    let json = PROVIDER.replace(
        r#""data": {"values": [29.0, 21.0], "variances": [29.0, 21.0]}"#,
        r#""data": {"values": [29.0], "variances": [29.0]}"#,
    );
    let provider = TemplateProvider::from_json(&json).unwrap();
    assert!(matches!(
        TemplateStore::build(&registry(), &provider, &config()),
        Err(FitError::DimensionMismatch(_))
    ));
}

#[test]
fn test_significance_cut_masks_whole_template() {
    let config = config().with_significance_cut(2.0);
    let store = TemplateStore::build(&registry(), &two_category_provider(), &config).unwrap();

    // signal: 15 / sqrt(50) ≈ 2.12 survives, a cut of 3 removes it
    let category = store.get(store.id("emu", "cat_0").unwrap()).unwrap();
    assert_eq!(category.n_rows(), 2);

    let config = crate::test_helpers::config().with_significance_cut(3.0);
    let store = TemplateStore::build(&registry(), &two_category_provider(), &config).unwrap();
    let category = store.get(store.id("emu", "cat_0").unwrap()).unwrap();
    assert_eq!(category.row_labels(), &["zjets"]);
}
