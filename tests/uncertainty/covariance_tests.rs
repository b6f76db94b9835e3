//! Covariance of a nuisance parameter from the curvature of the full cost.

use approx::assert_relative_eq;
use ndarray::Array1;
use nllfit_rs::uncertainty::covariance;
use nllfit_rs::{
    CategoryTemplates, CostOptions, FitError, FitModel, FitSession, Histogram, Objective,
    Result, Template, TemplateProvider,
};

use crate::test_helpers::{config, parameter_table, REFERENCE};

/// Exposes only the background normalization, with the POIs held fixed.
struct NormalizationOnly<'a> {
    session: FitSession<'a>,
}

impl Objective for NormalizationOnly<'_> {
    fn parameter_count(&self) -> usize {
        1
    }

    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let mut full = REFERENCE.to_vec();
        full.push(params[0]);
        self.session.eval_cost(&Array1::from_vec(full))
    }
}

fn background_only_model() -> FitModel {
    let provider = TemplateProvider::new().with_category(
        "emu",
        "cat_0",
        CategoryTemplates::new(Histogram::poisson(vec![10.0, 20.0]))
            .with_simple("zjets", Template::new(vec![10.0, 20.0], vec![1.0, 2.0])),
    );
    FitModel::new(config(), &parameter_table(), &provider).unwrap()
}

#[test]
fn test_normalization_uncertainty() {
    let model = background_only_model();
    let objective = NormalizationOnly {
        session: model.session(CostOptions::new()),
    };

    // cost = Σ(-d·ln(x·t) + x·t) + (x - 1)²/(2·0.1²), curvature at x = 1: Σd + 100
    let estimate = covariance(&objective, &Array1::from_vec(vec![1.0]), None).unwrap();
    assert_relative_eq!(estimate.hessian[[0, 0]], 130.0, max_relative = 1e-4);
    assert_relative_eq!(estimate.sigma[0], (1.0_f64 / 130.0).sqrt(), max_relative = 1e-4);
    assert_eq!(estimate.correlation[[0, 0]], 1.0);

    // 1 Hessian centre + 2 shifted points
    assert_eq!(objective.session.evaluations(), 3);
}

#[test]
fn test_covariance_at_rejected_point_fails() {
    let model = background_only_model();
    let session = model.session(CostOptions::new());

    // β_e = 0.005 is pushed out of (0, 1) by the default step
    let mut params = REFERENCE.to_vec();
    params[0] = 0.005;
    params.push(1.0);

    assert!(matches!(
        covariance(&session, &Array1::from_vec(params), None),
        Err(FitError::NumericalError(_))
    ));
}
