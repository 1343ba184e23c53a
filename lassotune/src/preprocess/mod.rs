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

//! Declarative preprocessing recipes.
//!
//! A [`Recipe`] is an ordered list of [`StepSpec`]s. Prepping it on training
//! data builds one [`Step`] per spec, fits it, and feeds its output to the
//! next step. The resulting [`PreparedRecipe`] only ever *applies* its
//! fitted steps (`&self`), so whatever it learned from training data stays
//! fixed when it is baked onto validation or test data.
//!
//! Order matters: encoding steps turn categorical predictors into the
//! numeric columns that variance filtering and normalization work on.

pub mod encode;
pub mod normalize;
pub mod variance;

pub use encode::{Dummy, Novel, NOVEL_LEVEL};
pub use normalize::Normalize;
pub use variance::NearZeroVariance;

use std::fmt;

use log::debug;
use ndarray::{Array1, Array2};

use crate::data::Dataset;
use crate::errors::PreprocessError;

/// Shared capability of every preprocessing step.
pub trait Step: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Learns the step's parameters from training data.
    fn fit(&mut self, data: &Dataset) -> Result<(), PreprocessError>;

    /// Applies the learned parameters to any data.
    fn apply(&self, data: Dataset) -> Result<Dataset, PreprocessError>;

    fn fit_apply(&mut self, data: Dataset) -> Result<Dataset, PreprocessError> {
        self.fit(&data)?;
        self.apply(data)
    }
}

/// Declarative description of a step, built into a fresh [`Step`] on every
/// prep so resamples never share fitted state.
#[derive(Debug, Clone, PartialEq)]
pub enum StepSpec {
    /// Map levels unseen during fitting (and missing levels) to [`NOVEL_LEVEL`].
    Novel,
    /// Indicator columns for categorical predictors.
    Dummy { one_hot: bool },
    /// Drop predictors with (near) zero variance.
    NearZeroVariance { freq_cut: f64, unique_cut: f64 },
    /// Center and scale numeric predictors.
    Normalize,
}

impl StepSpec {
    pub fn build(&self) -> Box<dyn Step> {
        match self {
            StepSpec::Novel => Box::new(Novel::new()),
            StepSpec::Dummy { one_hot } => Box::new(Dummy::new(*one_hot)),
            StepSpec::NearZeroVariance { freq_cut, unique_cut } => {
                Box::new(NearZeroVariance::new(*freq_cut, *unique_cut))
            }
            StepSpec::Normalize => Box::new(Normalize::new()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recipe {
    steps: Vec<StepSpec>,
}

impl Recipe {
    pub fn new() -> Self {
        Recipe { steps: Vec::new() }
    }

    /// Novel levels, dummy encoding, near-zero-variance filter, normalization.
    pub fn standard() -> Self {
        Recipe::new().step_novel().step_dummy().step_nzv().step_normalize()
    }

    pub fn step_novel(mut self) -> Self {
        self.steps.push(StepSpec::Novel);
        self
    }

    /// Dummy encoding that drops each predictor's first (reference) level.
    pub fn step_dummy(mut self) -> Self {
        self.steps.push(StepSpec::Dummy { one_hot: false });
        self
    }

    /// Dummy encoding that keeps an indicator for every level.
    pub fn step_one_hot(mut self) -> Self {
        self.steps.push(StepSpec::Dummy { one_hot: true });
        self
    }

    pub fn step_nzv(mut self) -> Self {
        self.steps.push(StepSpec::NearZeroVariance {
            freq_cut: variance::DEFAULT_FREQ_CUT,
            unique_cut: variance::DEFAULT_UNIQUE_CUT,
        });
        self
    }

    pub fn step_normalize(mut self) -> Self {
        self.steps.push(StepSpec::Normalize);
        self
    }

    pub fn push(mut self, spec: StepSpec) -> Self {
        self.steps.push(spec);
        self
    }

    pub fn steps(&self) -> &[StepSpec] {
        &self.steps
    }

    /// Fits every step, in order, on `train`.
    pub fn prep(&self, train: &Dataset) -> Result<PreparedRecipe, PreprocessError> {
        let mut data = train.clone();
        let mut fitted = Vec::with_capacity(self.steps.len());
        for spec in &self.steps {
            let mut step = spec.build();
            data = step.fit_apply(data)?;
            debug!("Prepped step '{}': {} columns remain", step.name(), data.n_cols());
            fitted.push(step);
        }

        let predictors: Vec<String> = data.predictor_names().into_iter().map(String::from).collect();
        if predictors.is_empty() {
            return Err(PreprocessError::NoPredictors);
        }
        Ok(PreparedRecipe { steps: fitted, predictors })
    }
}

/// A recipe whose steps have been fitted on training data.
#[derive(Debug)]
pub struct PreparedRecipe {
    steps: Vec<Box<dyn Step>>,
    predictors: Vec<String>,
}

impl PreparedRecipe {
    /// Names of the predictor columns produced on the training data, in
    /// design-matrix order.
    pub fn predictors(&self) -> &[String] {
        &self.predictors
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Applies every fitted step to `data`.
    pub fn bake(&self, data: &Dataset) -> Result<Dataset, PreprocessError> {
        self.steps.iter().try_fold(data.clone(), |acc, step| step.apply(acc))
    }

    /// Bakes `data` into a design matrix (columns in [`Self::predictors`]
    /// order) and the target vector.
    pub fn bake_matrix(&self, data: &Dataset) -> Result<(Array2<f64>, Array1<f64>), PreprocessError> {
        let baked = self.bake(data)?;

        let mut columns = Vec::with_capacity(self.predictors.len());
        for name in &self.predictors {
            let column =
                baked.column_by_name(name).ok_or_else(|| PreprocessError::UnknownColumn(name.clone()))?;
            let values = column
                .as_numeric()
                .ok_or_else(|| PreprocessError::NonNumericPredictor(name.clone()))?;
            if let Some(row) = values.iter().position(|v| v.map_or(true, |x| !x.is_finite())) {
                return Err(PreprocessError::MissingValue { column: name.clone(), row });
            }
            columns.push(values);
        }

        let x = Array2::from_shape_fn((baked.n_rows(), columns.len()), |(i, j)| {
            columns[j][i].unwrap_or(f64::NAN)
        });
        let y = baked.targets()?;
        Ok((x, y))
    }
}
