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

use std::fmt;

use log::info;
use ndarray::Array1;

use crate::errors::Error;
use crate::metrics::{MetricSet, MetricValue};
use crate::split::Split;
use crate::workflow::{FittedWorkflow, Workflow};

/// Direction of a coefficient's effect on the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
    /// Shrunk to exactly zero by the penalty.
    Zero,
}

impl Sign {
    fn of(value: f64) -> Sign {
        if value > 0.0 {
            Sign::Positive
        } else if value < 0.0 {
            Sign::Negative
        } else {
            Sign::Zero
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sign::Positive => "POS",
            Sign::Negative => "NEG",
            Sign::Zero => "ZERO",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Importance {
    pub feature: String,
    /// Absolute coefficient on the normalized scale.
    pub importance: f64,
    pub sign: Sign,
}

/// Output of fitting a finalized workflow on the training set and scoring
/// it on the test set.
#[derive(Debug)]
pub struct LastFit {
    pub fitted: FittedWorkflow,
    pub predictions: Array1<f64>,
    pub metrics: Vec<MetricValue>,
}

impl LastFit {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.iter().find(|m| m.metric == name).map(|m| m.value)
    }
}

/// Fits `workflow` on `split.train`, predicts `split.test` and computes
/// `metrics` on the test predictions.
pub fn last_fit(workflow: &Workflow, split: &Split, metrics: &MetricSet) -> Result<LastFit, Error> {
    let fitted = workflow.fit(&split.train)?;
    let predictions = fitted.predict(&split.test)?;
    let actuals = split.test.targets()?;
    let metrics = metrics.evaluate(&predictions, &actuals)?;

    info!(
        "Last fit: {} training rows, {} test rows, {} of {} coefficients non-zero",
        split.train.n_rows(),
        split.test.n_rows(),
        fitted.model().n_nonzero(),
        fitted.model().coefficients().len()
    );
    for m in &metrics {
        info!("Test {}: {:.4}", m.metric, m.value);
    }
    Ok(LastFit { fitted, predictions, metrics })
}

/// Predictors ranked by absolute coefficient, largest first, limited to
/// `top_n`. Equal magnitudes keep design-matrix order.
pub fn variable_importance(fitted: &FittedWorkflow, top_n: usize) -> Vec<Importance> {
    let mut ranked: Vec<Importance> = fitted
        .coefficients()
        .into_iter()
        .map(|(feature, coefficient)| Importance {
            feature: feature.to_string(),
            importance: coefficient.abs(),
            sign: Sign::of(coefficient),
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked.truncate(top_n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter_dataset;
    use crate::datasets::synthetic_loans;
    use crate::model::LinearRegression;
    use crate::preprocess::Recipe;
    use crate::split::Splitter;

    fn split() -> Split {
        let config = crate::config::AnalysisConfig::loans();
        let data = filter_dataset(&synthetic_loans(400, 3).unwrap(), &config.filter).unwrap();
        Splitter::new(123).prop(0.8).strata("interest_rate").initial_split(&data).unwrap()
    }

    #[test]
    fn test_last_fit_scores_test_rows() {
        let split = split();
        let workflow = Workflow::new(Recipe::standard(), LinearRegression::new().penalty(0.01).build());
        let result = last_fit(&workflow, &split, &MetricSet::all()).unwrap();

        assert_eq!(result.predictions.len(), split.test.n_rows());
        assert_eq!(result.metrics.len(), 3);
        assert!(result.metric("rmse").unwrap() >= 0.0);
        assert!(result.metric("mape").is_none());
    }

    #[test]
    fn test_last_fit_requires_finalized_workflow() {
        let workflow = Workflow::new(Recipe::standard(), LinearRegression::new().build());
        let result = last_fit(&workflow, &split(), &MetricSet::default());
        assert!(matches!(result, Err(Error::Model(crate::errors::ModelError::UntunedPenalty))));
    }

    #[test]
    fn test_importance_sorted_and_truncated() {
        let workflow = Workflow::new(Recipe::standard(), LinearRegression::new().penalty(0.001).build());
        let fitted = workflow.fit(&split().train).unwrap();

        let all = variable_importance(&fitted, usize::MAX);
        assert_eq!(all.len(), fitted.recipe().predictors().len());
        assert!(all.windows(2).all(|w| w[0].importance >= w[1].importance));

        let top = variable_importance(&fitted, 5);
        assert_eq!(top.len(), 5);
        assert_eq!(top, all[..5]);
        for item in &top {
            let expected = match item.sign {
                Sign::Positive | Sign::Negative => item.importance > 0.0,
                Sign::Zero => item.importance == 0.0,
            };
            assert!(expected);
        }
    }

    #[test]
    fn test_sign() {
        assert_eq!(Sign::of(2.0), Sign::Positive);
        assert_eq!(Sign::of(-0.5), Sign::Negative);
        assert_eq!(Sign::of(0.0), Sign::Zero);
        assert_eq!(Sign::Negative.to_string(), "NEG");
    }
}
