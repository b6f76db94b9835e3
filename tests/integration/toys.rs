//! Toy datasets evaluated sequentially and in parallel.

use approx::assert_relative_eq;
use nllfit_rs::parallel::{evaluate_toys, try_evaluate_toys};
use nllfit_rs::{BinnedData, CostOptions, ExternalData, FitError, FitModel, Objective};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Poisson};

use crate::test_helpers::two_category_model;

/// Poisson toys drawn around the frozen-randomized prediction at the initial values.
fn toys(model: &FitModel, count: usize, seed: u64) -> Vec<ExternalData> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let params = model.initial_values();

    (0..count)
        .map(|_| {
            model
                .store()
                .ids()
                .map(|id| {
                    let expected = model.predict(&params, id, true).unwrap().value;
                    let counts = expected.mapv(|mu| {
                        let poisson = Poisson::new(mu.max(1e-3)).unwrap();
                        poisson.sample(&mut rng)
                    });
                    (id, BinnedData::poisson(counts))
                })
                .collect()
        })
        .collect()
}

#[test]
fn test_parallel_matches_sequential() {
    let model = two_category_model();
    let toys = toys(&model, 16, 1234);
    let params = model.initial_values();
    let options = CostOptions::new().with_mc_stat(true);

    let parallel = evaluate_toys(&model, &params, &toys, &options);
    assert_eq!(parallel.len(), toys.len());

    for (toy, cost) in toys.iter().zip(parallel) {
        let sequential = model.session(options.clone()).with_data(toy).eval_cost(&params).unwrap();
        assert_relative_eq!(cost.unwrap(), sequential, epsilon = 1e-12);
    }

    let costs = try_evaluate_toys(&model, &params, &toys, &options).unwrap();
    assert_eq!(costs.len(), 16);
    assert!(costs.iter().all(|c| c.is_finite()));
}

#[test]
fn test_toys_differ_from_observed_data() {
    let model = two_category_model();
    let toys = toys(&model, 4, 99);
    let params = model.initial_values();
    let options = CostOptions::new();

    let observed = model.cost(&params, None, &options).unwrap();
    let costs = try_evaluate_toys(&model, &params, &toys, &options).unwrap();
    assert!(costs.iter().any(|c| (c - observed).abs() > 1e-9));
}

#[test]
fn test_incomplete_toy_fails() {
    let model = two_category_model();
    let mut toys = toys(&model, 3, 5);
    let dropped = model.store().id("emu", "cat_1").unwrap();
    toys[1].remove(&dropped);

    let params = model.initial_values();
    let options = CostOptions::new();

    let results = evaluate_toys(&model, &params, &toys, &options);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(FitError::MissingData(_))));
    assert!(results[2].is_ok());

    assert!(try_evaluate_toys(&model, &params, &toys, &options).is_err());
}
