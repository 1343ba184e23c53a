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

use ndarray::Array1;

use crate::errors::MetricError;

/// Whether smaller or larger metric values are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Minimize,
    Maximize,
}

impl Direction {
    /// True when `candidate` is strictly better than `incumbent`.
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Minimize => candidate < incumbent,
            Direction::Maximize => candidate > incumbent,
        }
    }
}

pub trait Metric: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn direction(&self) -> Direction;

    fn calculate(&self, predictions: &Array1<f64>, actuals: &Array1<f64>)
    -> Result<f64, MetricError>;
}

fn check_inputs(predictions: &Array1<f64>, actuals: &Array1<f64>) -> Result<(), MetricError> {
    if predictions.is_empty() || actuals.is_empty() {
        return Err(MetricError::EmptyInput);
    }

    if predictions.len() != actuals.len() {
        return Err(MetricError::DimensionMismatch {
            expected: predictions.len(),
            actual: actuals.len(),
        });
    }

    if predictions.iter().any(|&v| !v.is_finite()) || actuals.iter().any(|&v| !v.is_finite()) {
        return Err(MetricError::InvalidNumericValue);
    }
    Ok(())
}

/// Root mean squared error.
#[derive(Debug, Clone, Copy)]
pub struct Rmse;

impl Metric for Rmse {
    fn name(&self) -> &'static str {
        "rmse"
    }

    fn direction(&self) -> Direction {
        Direction::Minimize
    }

    fn calculate(
        &self,
        predictions: &Array1<f64>,
        actuals: &Array1<f64>,
    ) -> Result<f64, MetricError> {
        check_inputs(predictions, actuals)?;
        let diff = predictions - actuals;
        let mse = diff.mapv(|x| x * x).mean().ok_or(MetricError::EmptyInput)?;
        Ok(mse.sqrt())
    }
}

/// Squared Pearson correlation between predictions and actuals.
///
/// Constant predictions explain nothing and score 0.0. Constant actuals
/// leave the metric undefined: the result is NaN, which selection ranks
/// last.
#[derive(Debug, Clone, Copy)]
pub struct Rsq;

impl Metric for Rsq {
    fn name(&self) -> &'static str {
        "rsq"
    }

    fn direction(&self) -> Direction {
        Direction::Maximize
    }

    fn calculate(
        &self,
        predictions: &Array1<f64>,
        actuals: &Array1<f64>,
    ) -> Result<f64, MetricError> {
        check_inputs(predictions, actuals)?;
        let p_mean = predictions.mean().ok_or(MetricError::EmptyInput)?;
        let a_mean = actuals.mean().ok_or(MetricError::EmptyInput)?;

        let (mut cov, mut p_var, mut a_var) = (0.0, 0.0, 0.0);
        for (&p, &a) in predictions.iter().zip(actuals.iter()) {
            cov += (p - p_mean) * (a - a_mean);
            p_var += (p - p_mean).powi(2);
            a_var += (a - a_mean).powi(2);
        }

        if a_var == 0.0 {
            return Ok(f64::NAN);
        }
        if p_var == 0.0 {
            return Ok(0.0);
        }
        Ok(cov * cov / (p_var * a_var))
    }
}

/// Mean absolute error.
#[derive(Debug, Clone, Copy)]
pub struct Mae;

impl Metric for Mae {
    fn name(&self) -> &'static str {
        "mae"
    }

    fn direction(&self) -> Direction {
        Direction::Minimize
    }

    fn calculate(
        &self,
        predictions: &Array1<f64>,
        actuals: &Array1<f64>,
    ) -> Result<f64, MetricError> {
        check_inputs(predictions, actuals)?;
        let diff = predictions - actuals;
        diff.mapv(f64::abs).mean().ok_or(MetricError::EmptyInput)
    }
}

/// One computed metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricValue {
    pub metric: &'static str,
    pub value: f64,
}

/// Ordered collection of metrics computed together.
#[derive(Debug)]
pub struct MetricSet {
    metrics: Vec<Box<dyn Metric>>,
}

impl Default for MetricSet {
    /// RMSE and R².
    fn default() -> Self {
        MetricSet::new().with(Rmse).with(Rsq)
    }
}

impl MetricSet {
    pub fn new() -> Self {
        MetricSet { metrics: Vec::new() }
    }

    /// RMSE, R² and MAE.
    pub fn all() -> Self {
        MetricSet::default().with(Mae)
    }

    /// Adds `metric` unless one with the same name is already present.
    pub fn with(mut self, metric: impl Metric + 'static) -> Self {
        if self.get(metric.name()).is_none() {
            self.metrics.push(Box::new(metric));
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Metric> {
        self.metrics.iter().find(|m| m.name() == name).map(|m| m.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.metrics.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Computes every metric, in insertion order.
    pub fn evaluate(
        &self,
        predictions: &Array1<f64>,
        actuals: &Array1<f64>,
    ) -> Result<Vec<MetricValue>, MetricError> {
        self.metrics
            .iter()
            .map(|m| Ok(MetricValue { metric: m.name(), value: m.calculate(predictions, actuals)? }))
            .collect()
    }
}
