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

use log::debug;
use ndarray::Array1;

use crate::data::Dataset;
use crate::errors::ModelError;
use crate::model::{FittedLinearRegression, LinearRegression};
use crate::preprocess::{PreparedRecipe, Recipe};

/// A recipe paired with a model specification.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    recipe: Recipe,
    model: LinearRegression,
}

impl Workflow {
    pub fn new(recipe: Recipe, model: LinearRegression) -> Self {
        Workflow { recipe, model }
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn model(&self) -> &LinearRegression {
        &self.model
    }

    /// Unfit copy of this workflow with the penalty bound.
    pub fn finalize(&self, penalty: f64) -> Workflow {
        Workflow { recipe: self.recipe.clone(), model: self.model.with_penalty(penalty) }
    }

    /// Preps the recipe on `train` and fits the model on the baked rows.
    pub fn fit(&self, train: &Dataset) -> Result<FittedWorkflow, ModelError> {
        self.model.validate()?;
        let recipe = self.recipe.prep(train)?;
        let (x, y) = recipe.bake_matrix(train)?;
        debug!("Fitting workflow on {} rows x {} predictors", x.nrows(), x.ncols());
        let model = self.model.fit(&x, &y)?;
        Ok(FittedWorkflow { recipe, model })
    }
}

/// A prepped recipe and the model fitted on its output.
#[derive(Debug)]
pub struct FittedWorkflow {
    recipe: PreparedRecipe,
    model: FittedLinearRegression,
}

impl FittedWorkflow {
    pub fn recipe(&self) -> &PreparedRecipe {
        &self.recipe
    }

    pub fn model(&self) -> &FittedLinearRegression {
        &self.model
    }

    /// Predictor names paired with their fitted coefficients.
    pub fn coefficients(&self) -> Vec<(&str, f64)> {
        self.recipe
            .predictors()
            .iter()
            .map(String::as_str)
            .zip(self.model.coefficients().iter().copied())
            .collect()
    }

    /// Bakes `data` with the training parameters and predicts it.
    pub fn predict(&self, data: &Dataset) -> Result<Array1<f64>, ModelError> {
        let (x, _) = self.recipe.bake_matrix(data)?;
        self.model.predict(&x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::synthetic_loans;

    #[test]
    fn test_fit_predict_on_loans() {
        let data = synthetic_loans(200, 7).unwrap();
        let filtered = crate::data::filter_dataset(&data, &crate::config::AnalysisConfig::loans().filter)
            .unwrap();
        let workflow = Workflow::new(
            Recipe::standard(),
            LinearRegression::new().penalty(0.01).build(),
        );

        let fitted = workflow.fit(&filtered).unwrap();
        let predictions = fitted.predict(&filtered).unwrap();
        assert_eq!(predictions.len(), filtered.n_rows());
        assert!(predictions.iter().all(|p| p.is_finite()));
        assert_eq!(fitted.coefficients().len(), fitted.recipe().predictors().len());
    }

    #[test]
    fn test_tunable_workflow_must_be_finalized() {
        let data = synthetic_loans(50, 1).unwrap();
        let workflow = Workflow::new(Recipe::standard(), LinearRegression::new().tune_penalty().build());
        assert!(matches!(workflow.fit(&data), Err(ModelError::UntunedPenalty)));

        let finalized = workflow.finalize(0.1);
        assert!(!finalized.model().is_tunable());
        assert_eq!(finalized.recipe(), workflow.recipe());
    }
}
