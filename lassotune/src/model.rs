// BSD 3-Clause License
//
// Copyright (c) 2025, BlackPortal ○
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this
//    list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice,
//    this list of conditions and the following disclaimer in the documentation
//    and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its
//    contributors may be used to endorse or promote products derived from
//    this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Penalized linear regression.
//!
//! The model is declared through a builder, the same way for a fixed and
//! for a tunable penalty. Fitting is delegated to `linfa-elasticnet`
//! (coordinate descent); a mixture of 1.0 is the lasso.

use linfa::traits::Fit;
use linfa::Dataset as Observations;
use linfa_elasticnet::ElasticNet;
use log::debug;
use ndarray::{Array1, Array2};

use crate::errors::ModelError;

pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Regularization strength of a model specification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Penalty {
    Fixed(f64),
    /// Placeholder filled in by tuning. A model in this state cannot be fit.
    Tune,
}

pub struct LinearRegressionBuilder {
    penalty: Penalty,
    mixture: f64,
    max_iterations: u32,
    tolerance: f64,
}

impl LinearRegressionBuilder {
    pub fn penalty(mut self, penalty: f64) -> Self {
        self.penalty = Penalty::Fixed(penalty);
        self
    }

    pub fn tune_penalty(mut self) -> Self {
        self.penalty = Penalty::Tune;
        self
    }

    /// Share of the L1 term in the penalty: 1.0 is the lasso, 0.0 is ridge.
    pub fn mixture(mut self, mixture: f64) -> Self {
        self.mixture = mixture;
        self
    }

    pub fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn build(self) -> LinearRegression {
        LinearRegression {
            penalty: self.penalty,
            mixture: self.mixture,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        }
    }
}

/// An unfit model specification.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression {
    penalty: Penalty,
    mixture: f64,
    max_iterations: u32,
    tolerance: f64,
}

impl LinearRegression {
    /// Lasso with a tunable penalty unless configured otherwise.
    pub fn new() -> LinearRegressionBuilder {
        LinearRegressionBuilder {
            penalty: Penalty::Tune,
            mixture: 1.0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn penalty(&self) -> Penalty {
        self.penalty
    }

    pub fn mixture(&self) -> f64 {
        self.mixture
    }

    pub fn is_tunable(&self) -> bool {
        self.penalty == Penalty::Tune
    }

    /// Copy of this specification with the penalty bound to `penalty`.
    pub fn with_penalty(&self, penalty: f64) -> LinearRegression {
        LinearRegression { penalty: Penalty::Fixed(penalty), ..self.clone() }
    }

    /// Checks the hyperparameters and returns the bound penalty.
    pub fn validate(&self) -> Result<f64, ModelError> {
        let penalty = match self.penalty {
            Penalty::Tune => return Err(ModelError::UntunedPenalty),
            Penalty::Fixed(p) if !p.is_finite() || p < 0.0 => return Err(ModelError::InvalidPenalty(p)),
            Penalty::Fixed(p) => p,
        };
        if !(0.0..=1.0).contains(&self.mixture) {
            return Err(ModelError::InvalidMixture(self.mixture));
        }
        Ok(penalty)
    }

    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedLinearRegression, ModelError> {
        let penalty = self.validate()?;
        if x.nrows() == 0 || y.is_empty() {
            return Err(ModelError::EmptyInput);
        }
        if x.ncols() == 0 {
            return Err(ModelError::NoPredictors);
        }
        if x.nrows() != y.len() {
            return Err(ModelError::DimensionMismatch { expected: x.nrows(), actual: y.len() });
        }

        let observations = Observations::new(x.clone(), y.clone());
        let model = ElasticNet::params()
            .penalty(penalty)
            .l1_ratio(self.mixture)
            .with_intercept(true)
            .max_iterations(self.max_iterations)
            .tolerance(self.tolerance)
            .fit(&observations)?;
        debug!(
            "Elastic net fit: penalty={penalty:e}, steps={}, duality gap={:e}",
            model.n_steps(),
            model.duality_gap()
        );

        let coefficients = model.hyperplane().to_owned();
        let intercept = model.intercept();
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::NonFiniteCoefficients);
        }
        Ok(FittedLinearRegression { coefficients, intercept, penalty })
    }
}

/// Coefficients of a fitted model, one per design-matrix column.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedLinearRegression {
    coefficients: Array1<f64>,
    intercept: f64,
    penalty: f64,
}

impl FittedLinearRegression {
    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    /// Number of coefficients that are not exactly zero.
    pub fn n_nonzero(&self) -> usize {
        self.coefficients.iter().filter(|&&c| c != 0.0).count()
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if x.ncols() != self.coefficients.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: x.ncols(),
            });
        }
        Ok(x.dot(&self.coefficients) + self.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // y = 1 + 2 * x1 - 3 * x2 on two centered, orthogonal predictors.
    fn exact() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [-1.0, -1.0],
            [1.0, -1.0],
            [-1.0, 1.0],
            [1.0, 1.0],
            [-1.0, -1.0],
            [1.0, -1.0],
            [-1.0, 1.0],
            [1.0, 1.0]
        ];
        let y = x.column(0).mapv(|v| 2.0 * v) + x.column(1).mapv(|v| -3.0 * v) + 1.0;
        (x, y)
    }

    #[test]
    fn test_small_penalty_recovers_coefficients() {
        let (x, y) = exact();
        let fitted = LinearRegression::new().penalty(1e-6).build().fit(&x, &y).unwrap();

        assert!((fitted.coefficients()[0] - 2.0).abs() < 1e-2);
        assert!((fitted.coefficients()[1] + 3.0).abs() < 1e-2);
        assert!((fitted.intercept() - 1.0).abs() < 1e-2);

        let predictions = fitted.predict(&x).unwrap();
        for (p, a) in predictions.iter().zip(y.iter()) {
            assert!((p - a).abs() < 5e-2, "prediction {p} too far from {a}");
        }
    }

    #[test]
    fn test_large_penalty_zeroes_every_coefficient() {
        let (x, y) = exact();
        let fitted = LinearRegression::new().penalty(100.0).build().fit(&x, &y).unwrap();
        assert_eq!(fitted.n_nonzero(), 0);
        assert!((fitted.intercept() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_penalty_controls_sparsity_on_diabetes() {
        let data = linfa_datasets::diabetes();
        let x = data.records().to_owned();
        let y = data.targets().to_owned();

        let dense = LinearRegression::new().penalty(1e-4).build().fit(&x, &y).unwrap();
        let sparse = LinearRegression::new().penalty(1e3).build().fit(&x, &y).unwrap();

        assert!(dense.n_nonzero() > 0);
        assert_eq!(sparse.n_nonzero(), 0);

        let mean = y.mean().unwrap();
        let sse = |pred: Array1<f64>| pred.iter().zip(y.iter()).map(|(p, a)| (p - a).powi(2)).sum::<f64>();
        let dense_sse = sse(dense.predict(&x).unwrap());
        let null_sse = sse(Array1::from_elem(y.len(), mean));
        assert!(dense_sse < null_sse);
    }

    #[test]
    fn test_untuned_and_invalid_hyperparameters() {
        let (x, y) = exact();
        let tunable = LinearRegression::new().build();
        assert!(tunable.is_tunable());
        assert!(matches!(tunable.fit(&x, &y), Err(ModelError::UntunedPenalty)));

        let negative = LinearRegression::new().penalty(-1.0).build();
        assert!(matches!(negative.fit(&x, &y), Err(ModelError::InvalidPenalty(_))));

        let nan = LinearRegression::new().penalty(f64::NAN).build();
        assert!(matches!(nan.fit(&x, &y), Err(ModelError::InvalidPenalty(_))));

        let mixture = LinearRegression::new().penalty(0.1).mixture(1.5).build();
        assert!(matches!(mixture.fit(&x, &y), Err(ModelError::InvalidMixture(_))));
    }

    #[test]
    fn test_with_penalty_binds_tunable_spec() {
        let spec = LinearRegression::new().tune_penalty().mixture(0.5).build();
        let bound = spec.with_penalty(0.01);
        assert_eq!(bound.penalty(), Penalty::Fixed(0.01));
        assert_eq!(bound.mixture(), 0.5);
        assert!(spec.is_tunable());
    }

    #[test]
    fn test_shape_errors() {
        let (x, y) = exact();
        let model = LinearRegression::new().penalty(0.1).build();

        let short = y.slice(ndarray::s![..4]).to_owned();
        assert!(matches!(
            model.fit(&x, &short),
            Err(ModelError::DimensionMismatch { expected: 8, actual: 4 })
        ));

        let no_columns = Array2::<f64>::zeros((8, 0));
        assert!(matches!(model.fit(&no_columns, &y), Err(ModelError::NoPredictors)));

        let fitted = model.fit(&x, &y).unwrap();
        let wide = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            fitted.predict(&wide),
            Err(ModelError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }
}
