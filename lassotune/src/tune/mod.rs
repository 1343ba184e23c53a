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

//! Grid search of the penalty over cross-validation folds.
//!
//! For every fold the recipe is prepped once on the analysis rows; the
//! model is then fit for every penalty of the grid and scored on the
//! assessment rows. Folds are independent, so they can run on the rayon
//! pool. Results are merged in (penalty, fold) order, which makes a
//! parallel run indistinguishable from a sequential one.

pub mod select;

pub use select::{select_best, select_by_one_std_err, SelectionRule};

use std::collections::HashMap;

use log::{debug, info};
use rayon::prelude::*;

use crate::data::Dataset;
use crate::errors::{ConfigError, TuneError};
use crate::metrics::{Direction, MetricSet};
use crate::split::{Fold, FoldSet};
use crate::workflow::Workflow;

/// Candidate penalties, ascending and without duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyGrid {
    values: Vec<f64>,
}

impl PenaltyGrid {
    /// `levels` penalties evenly spaced on the log10 scale between
    /// `10^log10_min` and `10^log10_max`, both included.
    pub fn regular(levels: usize, log10_min: f64, log10_max: f64) -> Result<Self, ConfigError> {
        if levels == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if !log10_min.is_finite() || !log10_max.is_finite() || log10_min > log10_max {
            return Err(ConfigError::InvalidPenaltyRange { min: log10_min, max: log10_max });
        }
        let values = if levels == 1 {
            vec![10f64.powf(log10_min)]
        } else {
            let step = (log10_max - log10_min) / (levels - 1) as f64;
            (0..levels).map(|i| 10f64.powf(log10_min + step * i as f64)).collect()
        };
        PenaltyGrid::from_values(values)
    }

    pub fn from_values(mut values: Vec<f64>) -> Result<Self, ConfigError> {
        if values.is_empty() {
            return Err(ConfigError::EmptyGrid);
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "penalty",
                reason: format!("{bad} is not a finite, non-negative value"),
            });
        }
        values.sort_by(f64::total_cmp);
        values.dedup();
        Ok(PenaltyGrid { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One metric of one fold at one penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldMetric {
    pub penalty: f64,
    pub fold: usize,
    pub metric: &'static str,
    pub value: f64,
}

/// A metric aggregated over folds for one penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    pub penalty: f64,
    pub metric: &'static str,
    pub direction: Direction,
    pub mean: f64,
    pub n: usize,
    pub std_err: f64,
}

#[derive(Debug, Clone)]
pub struct TuneResults {
    penalties: Vec<f64>,
    metrics: Vec<(&'static str, Direction)>,
    fold_metrics: Vec<FoldMetric>,
    n_folds: usize,
}

impl TuneResults {
    /// Every computed value, sorted by penalty then fold.
    pub fn fold_metrics(&self) -> &[FoldMetric] {
        &self.fold_metrics
    }

    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    pub fn penalties(&self) -> &[f64] {
        &self.penalties
    }

    pub fn metric_names(&self) -> Vec<&'static str> {
        self.metrics.iter().map(|(name, _)| *name).collect()
    }

    /// Mean and standard error across folds, per penalty (ascending) and
    /// metric (in metric-set order).
    pub fn collect_metrics(&self) -> Vec<MetricSummary> {
        let mut grouped: HashMap<(u64, &str), Vec<f64>> = HashMap::new();
        for m in &self.fold_metrics {
            grouped.entry((m.penalty.to_bits(), m.metric)).or_default().push(m.value);
        }

        let mut summaries = Vec::with_capacity(self.penalties.len() * self.metrics.len());
        for &penalty in &self.penalties {
            for &(metric, direction) in &self.metrics {
                let Some(values) = grouped.get(&(penalty.to_bits(), metric)) else {
                    continue;
                };
                let (mean, std_err) = mean_std_err(values);
                summaries.push(MetricSummary { penalty, metric, direction, mean, n: values.len(), std_err });
            }
        }
        summaries
    }

    /// The `n` best penalties for `metric`, best first.
    pub fn show_best(&self, metric: &str, n: usize) -> Result<Vec<MetricSummary>, TuneError> {
        let mut summaries: Vec<MetricSummary> =
            self.collect_metrics().into_iter().filter(|s| s.metric == metric).collect();
        if summaries.is_empty() {
            return Err(TuneError::UnknownMetric(metric.to_string()));
        }
        summaries.sort_by(select::rank);
        summaries.truncate(n);
        Ok(summaries)
    }

    pub fn select_best(&self, metric: &str) -> Result<MetricSummary, TuneError> {
        select_best(&self.collect_metrics(), metric)
    }
}

fn mean_std_err(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, (var / n).sqrt())
}

/// Cross-validated evaluation of a workflow over a penalty grid.
#[derive(Debug)]
pub struct GridSearch {
    workflow: Workflow,
    grid: PenaltyGrid,
    metrics: MetricSet,
    parallel: bool,
}

impl GridSearch {
    pub fn new(workflow: Workflow, grid: PenaltyGrid) -> Self {
        GridSearch { workflow, grid, metrics: MetricSet::default(), parallel: true }
    }

    pub fn metrics(mut self, metrics: MetricSet) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run(&self, train: &Dataset, folds: &FoldSet) -> Result<TuneResults, TuneError> {
        if folds.n_rows() != train.n_rows() {
            return Err(TuneError::FoldMismatch { expected: train.n_rows(), actual: folds.n_rows() });
        }
        if folds.is_empty() || self.metrics.is_empty() {
            return Err(TuneError::NoResults);
        }
        info!(
            "Tuning {} penalties over {} folds ({})",
            self.grid.len(),
            folds.len(),
            if self.parallel { "parallel" } else { "sequential" }
        );

        let per_fold: Vec<Vec<FoldMetric>> = if self.parallel {
            folds
                .folds()
                .par_iter()
                .map(|fold| self.evaluate_fold(train, fold))
                .collect::<Result<_, _>>()?
        } else {
            folds
                .folds()
                .iter()
                .map(|fold| self.evaluate_fold(train, fold))
                .collect::<Result<_, _>>()?
        };

        let mut fold_metrics: Vec<FoldMetric> = per_fold.into_iter().flatten().collect();
        // Stable: metric order within a (penalty, fold) pair is kept.
        fold_metrics.sort_by(|a, b| a.penalty.total_cmp(&b.penalty).then(a.fold.cmp(&b.fold)));

        Ok(TuneResults {
            penalties: self.grid.values().to_vec(),
            metrics: self.metric_directions(),
            fold_metrics,
            n_folds: folds.len(),
        })
    }

    fn metric_directions(&self) -> Vec<(&'static str, Direction)> {
        self.metrics
            .names()
            .into_iter()
            .filter_map(|name| self.metrics.get(name).map(|m| (name, m.direction())))
            .collect()
    }

    fn evaluate_fold(&self, train: &Dataset, fold: &Fold) -> Result<Vec<FoldMetric>, TuneError> {
        let analysis = train.select_rows(&fold.analysis)?;
        let assessment = train.select_rows(&fold.assessment)?;

        let prep_err = |source| TuneError::Prep { fold: fold.id, source };
        let recipe = self.workflow.recipe().prep(&analysis).map_err(prep_err)?;
        let (x, y) = recipe.bake_matrix(&analysis).map_err(prep_err)?;
        let (x_assess, y_assess) = recipe.bake_matrix(&assessment).map_err(prep_err)?;

        let mut out = Vec::with_capacity(self.grid.len() * self.metrics.len());
        for &penalty in self.grid.values() {
            let fold_err = |source| TuneError::Fold { fold: fold.id, penalty, source };
            let model = self.workflow.model().with_penalty(penalty).fit(&x, &y).map_err(fold_err)?;
            let predictions = model.predict(&x_assess).map_err(fold_err)?;
            let values = self
                .metrics
                .evaluate(&predictions, &y_assess)
                .map_err(|source| TuneError::Metric { fold: fold.id, source })?;
            out.extend(values.into_iter().map(|v| FoldMetric {
                penalty,
                fold: fold.id,
                metric: v.metric,
                value: v.value,
            }));
        }
        debug!("Fold {} done: {} predictors, {} assessment rows", fold.id, x.ncols(), y_assess.len());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{filter_dataset, Column};
    use crate::datasets::synthetic_loans;
    use crate::metrics::Rmse;
    use crate::model::LinearRegression;
    use crate::preprocess::Recipe;
    use crate::split::Splitter;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn setup() -> (Dataset, FoldSet, GridSearch) {
        let config = crate::config::AnalysisConfig::loans();
        let data = filter_dataset(&synthetic_loans(300, 11).unwrap(), &config.filter).unwrap();
        let folds = Splitter::new(5).strata("interest_rate").vfold(&data, 3).unwrap();
        let workflow = Workflow::new(Recipe::standard(), LinearRegression::new().tune_penalty().build());
        let grid = PenaltyGrid::regular(4, -4.0, 0.0).unwrap();
        (data, folds, GridSearch::new(workflow, grid))
    }

    #[test]
    fn test_regular_grid() {
        let grid = PenaltyGrid::regular(5, -10.0, 0.0).unwrap();
        let expected = [1e-10, 10f64.powf(-7.5), 1e-5, 10f64.powf(-2.5), 1.0];
        for (v, e) in grid.values().iter().zip(expected) {
            assert!((v / e - 1.0).abs() < 1e-12);
        }
        let single = PenaltyGrid::regular(1, -3.0, 0.0).unwrap();
        assert_eq!(single.len(), 1);
        assert!((single.values()[0] - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn test_grid_validation() {
        assert!(matches!(PenaltyGrid::regular(0, -1.0, 0.0), Err(ConfigError::EmptyGrid)));
        assert!(matches!(
            PenaltyGrid::regular(3, 0.0, -1.0),
            Err(ConfigError::InvalidPenaltyRange { .. })
        ));
        assert!(matches!(PenaltyGrid::from_values(vec![]), Err(ConfigError::EmptyGrid)));
        assert!(matches!(
            PenaltyGrid::from_values(vec![0.1, -0.1]),
            Err(ConfigError::InvalidParameter { name: "penalty", .. })
        ));
        let grid = PenaltyGrid::from_values(vec![0.1, 0.001, 0.1]).unwrap();
        assert_eq!(grid.values(), &[0.001, 0.1]);
    }

    #[test]
    fn test_each_penalty_fold_pair_evaluated_once() {
        init();
        let (data, folds, search) = setup();
        let results = search.run(&data, &folds).unwrap();

        assert_eq!(results.n_folds(), 3);
        assert_eq!(results.fold_metrics().len(), 4 * 3 * 2);
        for &penalty in results.penalties() {
            for fold in 0..3 {
                let hits = results
                    .fold_metrics()
                    .iter()
                    .filter(|m| m.penalty == penalty && m.fold == fold && m.metric == "rmse")
                    .count();
                assert_eq!(hits, 1);
            }
        }
    }

    #[test]
    fn test_summary_is_mean_of_folds() {
        let (data, folds, search) = setup();
        let results = search.run(&data, &folds).unwrap();
        let summaries = results.collect_metrics();
        assert_eq!(summaries.len(), 4 * 2);

        for s in &summaries {
            let values: Vec<f64> = results
                .fold_metrics()
                .iter()
                .filter(|m| m.penalty == s.penalty && m.metric == s.metric)
                .map(|m| m.value)
                .collect();
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            assert_eq!(s.n, 3);
            assert!((s.mean - mean).abs() < 1e-12);
            assert!(s.std_err >= 0.0);
        }
        assert!(summaries.windows(2).all(|w| w[0].penalty <= w[1].penalty));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (data, folds, search) = setup();
        let parallel = search.run(&data, &folds).unwrap();
        let search = search.parallel(false);
        let sequential = search.run(&data, &folds).unwrap();
        assert_eq!(parallel.fold_metrics(), sequential.fold_metrics());
    }

    #[test]
    fn test_show_best_and_unknown_metric() {
        let (data, folds, search) = setup();
        let results = search.metrics(MetricSet::new().with(Rmse)).run(&data, &folds).unwrap();

        let best = results.show_best("rmse", 2).unwrap();
        assert_eq!(best.len(), 2);
        assert!(best[0].mean <= best[1].mean);
        assert!((results.select_best("rmse").unwrap().mean - best[0].mean).abs() < 1e-9);

        assert!(matches!(results.show_best("rsq", 1), Err(TuneError::UnknownMetric(_))));
    }

    #[test]
    fn test_constant_assessment_targets_do_not_abort_tuning() {
        init();
        let n = 40;
        let data = Dataset::new(
            vec![
                Column::numeric(
                    "y",
                    (0..n).map(|i| Some(if i < 3 { 6.0 + i as f64 } else { 5.0 })).collect(),
                ),
                Column::numeric("x", (0..n).map(|i| Some(i as f64)).collect()),
            ],
            "y",
        )
        .unwrap();
        let folds = Splitter::new(3).vfold(&data, 5).unwrap();
        let workflow = Workflow::new(Recipe::new().step_normalize(), LinearRegression::new().build());
        let grid = PenaltyGrid::from_values(vec![0.01, 0.1]).unwrap();

        let results = GridSearch::new(workflow, grid).parallel(false).run(&data, &folds).unwrap();

        // At most three folds see a non-constant target.
        let metrics = results.fold_metrics();
        assert!(metrics.iter().any(|m| m.metric == "rsq" && m.value.is_nan()));
        assert!(metrics.iter().filter(|m| m.metric == "rmse").all(|m| m.value.is_finite()));
        assert!(results.select_best("rmse").is_ok());
    }

    #[test]
    fn test_fold_mismatch() {
        let (data, _, search) = setup();
        let other = Splitter::new(1).vfold(&data.select_rows(&[0, 1, 2, 3]).unwrap(), 2).unwrap();
        assert!(matches!(search.run(&data, &other), Err(TuneError::FoldMismatch { .. })));
    }
}
