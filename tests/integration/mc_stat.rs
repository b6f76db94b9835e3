//! Barlow-Beeston treatment inside the full cost.

use approx::assert_relative_eq;
use nllfit_rs::barlow_beeston;
use nllfit_rs::{
    CategoryTemplates, CostOptions, CostType, FitModel, Histogram, Template, TemplateProvider,
};

use crate::test_helpers::{config, parameter_table, two_category_model};

fn model_with_variance(variance: f64) -> FitModel {
    let provider = TemplateProvider::new().with_category(
        "emu",
        "cat_0",
        CategoryTemplates::new(Histogram::poisson(vec![31.0, 19.0]))
            .with_simple("zjets", Template::new(vec![30.0, 20.0], vec![variance, variance])),
    );
    FitModel::new(config(), &parameter_table(), &provider).unwrap()
}

#[test]
fn test_vanishing_mc_variance_leaves_cost_unchanged() {
    let plain = CostOptions::new();
    let mc_stat = CostOptions::new().with_mc_stat(true);

    for variance in [1e-6, 1e-9, 1e-12] {
        let model = model_with_variance(variance);
        let params = model.initial_values();

        let without = model.cost(&params, None, &plain).unwrap();
        let with = model.evaluate(&params, None, &mc_stat).unwrap();
        assert_relative_eq!(with.cost, without, epsilon = 1e-4);

        let beta = with.diagnostics.categories[0].beta.as_ref().unwrap();
        for b in beta.iter() {
            assert_relative_eq!(*b, 1.0, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_penalty_is_part_of_the_cost() {
    let model = two_category_model();
    let params = model.initial_values();

    let evaluation = model
        .evaluate(&params, None, &CostOptions::new().with_mc_stat(true))
        .unwrap();
    let category = &evaluation.diagnostics.categories[0];
    assert!(category.mc_stat_penalty > 0.0);

    // model [30, 20] with variance [3, 2] against data [31, 19]
    let beta_0 = barlow_beeston::solve(31.0, 30.0, 3.0);
    let beta_1 = barlow_beeston::solve(19.0, 20.0, 2.0);
    assert!(beta_0 > 1.0 && beta_1 < 1.0);

    let expected = barlow_beeston::penalty(beta_0, 30.0, 3.0) + barlow_beeston::penalty(beta_1, 20.0, 2.0);
    assert_relative_eq!(category.mc_stat_penalty, expected, epsilon = 1e-12);
}

#[test]
fn test_no_shape_integrates_before_correction() {
    let model = two_category_model();
    let params = model.initial_values();

    let options = CostOptions::new().with_no_shape(true).with_mc_stat(true);
    let evaluation = model.evaluate(&params, None, &options).unwrap();

    // cat_0: data 50, model 50, variance 5: one bin, no correction needed
    let category = &evaluation.diagnostics.categories[0];
    let beta = category.beta.as_ref().unwrap();
    assert_eq!(beta.len(), 1);
    assert_relative_eq!(beta[0], 1.0, epsilon = 1e-12);
    assert_relative_eq!(category.mc_stat_penalty, 0.0, epsilon = 1e-20);

    let chi2 = options.with_cost_type(CostType::Chi2);
    let evaluation = model.evaluate(&params, None, &chi2).unwrap();
    assert_relative_eq!(evaluation.diagnostics.categories[1].cost, 0.0, epsilon = 1e-20);
}
