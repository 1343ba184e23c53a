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

//! End-to-end run: filter, split, tune, finalize, evaluate.

use std::path::Path;

use log::{info, warn};

use crate::config::AnalysisConfig;
use crate::data::{filter_dataset, load_data, CsvLoader, Dataset};
use crate::errors::Error;
use crate::evaluate::{last_fit, variable_importance, Importance};
use crate::metrics::{MetricSet, MetricValue};
use crate::model::LinearRegression;
use crate::preprocess::Recipe;
use crate::split::Splitter;
use crate::tune::{GridSearch, MetricSummary, PenaltyGrid, SelectionRule};
use crate::workflow::Workflow;

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub target: String,
    pub n_rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub n_folds: usize,
    /// Predictors entering the final model, after preprocessing.
    pub n_predictors: usize,
    pub n_nonzero: usize,
    pub metric: String,
    pub selection: SelectionRule,
    pub summaries: Vec<MetricSummary>,
    pub selected: MetricSummary,
    pub test_metrics: Vec<MetricValue>,
    pub importance: Vec<Importance>,
}

impl AnalysisReport {
    pub fn test_metric(&self, name: &str) -> Option<f64> {
        self.test_metrics.iter().find(|m| m.metric == name).map(|m| m.value)
    }

    pub fn test_rmse(&self) -> Option<f64> {
        self.test_metric("rmse")
    }
}

/// Runs the analysis on an in-memory dataset.
pub fn run(data: &Dataset, config: &AnalysisConfig) -> Result<AnalysisReport, Error> {
    config.validate()?;

    let filtered = filter_dataset(data, &config.filter)?;

    let mut splitter = Splitter::new(config.seed).prop(config.prop);
    if let Some(strata) = &config.strata {
        splitter = splitter.strata(strata.clone());
    }
    let split = splitter.initial_split(&filtered)?;
    let folds = splitter.vfold(&split.train, config.folds)?;
    info!(
        "Split {} rows into {} training and {} test rows; {} folds",
        filtered.n_rows(),
        split.train.n_rows(),
        split.test.n_rows(),
        folds.len()
    );

    let workflow = Workflow::new(
        Recipe::standard(),
        LinearRegression::new().tune_penalty().mixture(config.mixture).build(),
    );
    let (log10_min, log10_max) = config.penalty_range;
    let grid = PenaltyGrid::regular(config.grid_levels, log10_min, log10_max)?;
    let (grid_min, grid_max) = (grid.values()[0], grid.values()[grid.len() - 1]);

    let results = GridSearch::new(workflow.clone(), grid)
        .metrics(MetricSet::default())
        .parallel(config.parallel)
        .run(&split.train, &folds)?;
    let summaries = results.collect_metrics();
    let selected = config.selection.select(&summaries, &config.metric)?;
    info!(
        "Selected penalty {:e} ({} = {:.4} ± {:.4})",
        selected.penalty, selected.metric, selected.mean, selected.std_err
    );
    if grid_min < grid_max && (selected.penalty == grid_min || selected.penalty == grid_max) {
        warn!("Selected penalty {:e} lies on the edge of the grid", selected.penalty);
    }

    let last = last_fit(&workflow.finalize(selected.penalty), &split, &MetricSet::default())?;
    let importance = variable_importance(&last.fitted, config.top_n);

    Ok(AnalysisReport {
        target: filtered.target_name().to_string(),
        n_rows: filtered.n_rows(),
        n_train: split.train.n_rows(),
        n_test: split.test.n_rows(),
        n_folds: folds.len(),
        n_predictors: last.fitted.recipe().predictors().len(),
        n_nonzero: last.fitted.model().n_nonzero(),
        metric: config.metric.clone(),
        selection: config.selection,
        summaries,
        selected,
        test_metrics: last.metrics,
        importance,
    })
}

/// Loads a CSV file and runs the analysis on it.
pub fn run_csv<P: AsRef<Path>>(path: P, config: &AnalysisConfig) -> Result<AnalysisReport, Error> {
    let data = load_data::<CsvLoader, _>(path, &config.target)?;
    info!("Loaded {} rows and {} columns", data.n_rows(), data.n_cols());
    run(&data, config)
}
