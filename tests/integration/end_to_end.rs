//! End-to-end evaluation of the cost on two categories with one signal and
//! one background process each.

use approx::assert_relative_eq;
use ndarray::Array1;
use nllfit_rs::{
    CategoryTemplates, CostOptions, CostType, FitModel, Histogram, Objective, Template,
    TemplateProvider,
};

use crate::test_helpers::{config, parameter_table, two_category_model, REFERENCE};

fn params(beta: [f64; 4], xs: f64) -> Array1<f64> {
    let mut values = beta.to_vec();
    values.push(xs);
    Array1::from_vec(values)
}

fn poisson(data: &[f64], model: &[f64]) -> f64 {
    data.iter()
        .zip(model)
        .map(|(d, m)| -d * m.ln() + m)
        .sum()
}

#[test]
fn test_cost_matches_manual_sum() {
    let model = two_category_model();
    let p = params(REFERENCE, 1.1);

    // background scaled by 1.1, signal at the reference point
    let expected_model = [10.0 + 22.0, 5.0 + 16.5];
    let data_cost = poisson(&[31.0, 19.0], &expected_model) + poisson(&[29.0, 21.0], &expected_model);
    let prior = (1.1 - 1.0_f64).powi(2) / (2.0 * 0.1 * 0.1);
    let beta_sum: f64 = REFERENCE.iter().sum();
    let constraint = (1.0 - beta_sum).powi(2) / (2.0 * 1e-6 * 1e-6);

    let evaluation = model.evaluate(&p, None, &CostOptions::new()).unwrap();
    assert_relative_eq!(evaluation.diagnostics.prior, prior, epsilon = 1e-12);
    assert_relative_eq!(evaluation.diagnostics.sum_constraint, constraint, epsilon = 1e-12);
    assert_relative_eq!(evaluation.cost, data_cost + prior + constraint, epsilon = 1e-9);
    assert_relative_eq!(
        model.cost(&p, None, &CostOptions::new()).unwrap(),
        evaluation.cost
    );
}

#[test]
fn test_signal_follows_branching_fractions() {
    let model = two_category_model();

    // doubling β_e doubles the e+mu amplitude; shift β_h to keep Σβ = 1
    let beta = [0.216, 0.108, 0.108, 0.568];
    let id = model.store().id("emu", "cat_0").unwrap();
    let prediction = model.predict(&params(beta, 1.0), id, false).unwrap();
    assert_relative_eq!(prediction.value[0], 20.0 + 20.0, epsilon = 1e-12);
    assert_relative_eq!(prediction.value[1], 10.0 + 15.0, epsilon = 1e-12);

    let yields = model.expected_yields(&params(beta, 1.0), id).unwrap();
    assert_eq!(yields[0].0, "ttbar/e+mu");
    assert_relative_eq!(yields[0].1, 30.0, epsilon = 1e-12);
    assert_relative_eq!(yields[1].1, 35.0, epsilon = 1e-12);
}

#[test]
fn test_out_of_range_branching_fraction_is_infinite() {
    let model = two_category_model();

    for (index, bad) in [(0, 0.0), (1, 1.0), (2, -0.5), (3, 2.0)] {
        for xs in [1.0, 0.0, 1e6, f64::NAN] {
            let mut beta = REFERENCE;
            beta[index] = bad;
            for cost_type in [CostType::Poisson, CostType::Chi2] {
                let options = CostOptions::new()
                    .with_cost_type(cost_type)
                    .with_mc_stat(true);
                let cost = model.cost(&params(beta, xs), None, &options).unwrap();
                assert_eq!(cost, f64::INFINITY);
            }
        }
    }
}

#[test]
fn test_single_process_prediction_is_nominal() {
    let provider = TemplateProvider::new().with_category(
        "emu",
        "only_zjets",
        CategoryTemplates::new(Histogram::poisson(vec![3.0, 4.0, 5.0]))
            .with_simple("zjets", Template::new(vec![2.5, 4.5, 6.5], vec![0.1, 0.2, 0.3])),
    );
    let model = FitModel::new(config(), &parameter_table(), &provider).unwrap();
    let id = model.store().id("emu", "only_zjets").unwrap();

    let prediction = model.predict(&model.initial_values(), id, false).unwrap();
    assert_eq!(prediction.value.to_vec(), vec![2.5, 4.5, 6.5]);
    assert_eq!(prediction.variance.to_vec(), vec![0.1, 0.2, 0.3]);
}

#[test]
fn test_session_drives_like_a_minimizer() {
    let model = two_category_model();
    let session = model.session(CostOptions::new());

    // crude scan over the background normalization
    let best = (80..=120)
        .map(|i| f64::from(i) / 100.0)
        .map(|xs| (xs, session.eval_cost(&params(REFERENCE, xs)).unwrap()))
        .fold((f64::NAN, f64::INFINITY), |best, (xs, cost)| {
            if cost < best.1 {
                (xs, cost)
            } else {
                best
            }
        });

    assert_eq!(session.evaluations(), 41);
    // the excesses and deficits of the four bins balance at the nominal background
    assert_relative_eq!(best.0, 1.0, epsilon = 1e-12);

    let diagnostics = session.last_diagnostics().unwrap();
    assert_eq!(diagnostics.categories.len(), 2);
    assert!(!diagnostics.rejected);
}
