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

use crate::data::{FilterSpec, RowFilter};
use crate::errors::ConfigError;
use crate::tune::SelectionRule;

/// Identifier-like and post-origination columns of the loan schema. They
/// either carry no signal or leak the outcome.
pub const LOAN_EXCLUSIONS: &[&str] = &[
    "emp_title",
    "state",
    "grade",
    "sub_grade",
    "installment",
    "balance",
    "paid_total",
    "paid_interest",
    "loan_status",
];

/// Every knob of an end-to-end analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub target: String,
    pub strata: Option<String>,
    pub filter: FilterSpec,
    pub seed: u64,
    /// Share of rows assigned to training.
    pub prop: f64,
    pub folds: usize,
    pub grid_levels: usize,
    /// log10 bounds of the penalty grid.
    pub penalty_range: (f64, f64),
    pub mixture: f64,
    pub top_n: usize,
    pub metric: String,
    pub selection: SelectionRule,
    pub parallel: bool,
}

impl AnalysisConfig {
    pub fn new(target: impl Into<String>) -> Self {
        AnalysisConfig {
            target: target.into(),
            strata: None,
            filter: FilterSpec::default(),
            seed: 123,
            prop: 0.8,
            folds: 5,
            grid_levels: 5,
            penalty_range: (-10.0, 0.0),
            mixture: 1.0,
            top_n: 15,
            metric: "rmse".to_string(),
            selection: SelectionRule::Best,
            parallel: true,
        }
    }

    /// Interest-rate analysis of individual applications in the loan schema.
    pub fn loans() -> Self {
        AnalysisConfig::new("interest_rate").with_strata("interest_rate").with_filter(
            FilterSpec::new()
                .exclude(LOAN_EXCLUSIONS)
                .keep_where(RowFilter::new("application_type", &["individual"])),
        )
    }

    pub fn with_strata(mut self, column: impl Into<String>) -> Self {
        self.strata = Some(column.into());
        self
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_prop(mut self, prop: f64) -> Self {
        self.prop = prop;
        self
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    pub fn with_grid(mut self, levels: usize, log10_min: f64, log10_max: f64) -> Self {
        self.grid_levels = levels;
        self.penalty_range = (log10_min, log10_max);
        self
    }

    pub fn with_mixture(mut self, mixture: f64) -> Self {
        self.mixture = mixture;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = metric.into();
        self
    }

    pub fn with_selection(mut self, selection: SelectionRule) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Checks the values that can be checked without data. The fold count
    /// is checked again against the training rows when folds are built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "target",
                reason: "must name a column".to_string(),
            });
        }
        if !(self.prop > 0.0 && self.prop < 1.0) {
            return Err(ConfigError::InvalidProportion(self.prop));
        }
        if self.folds < 2 {
            return Err(ConfigError::InvalidFoldCount { folds: self.folds, rows: 0 });
        }
        if self.grid_levels == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        let (min, max) = self.penalty_range;
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ConfigError::InvalidPenaltyRange { min, max });
        }
        if !(0.0..=1.0).contains(&self.mixture) {
            return Err(ConfigError::InvalidParameter {
                name: "mixture",
                reason: format!("{} is outside [0, 1]", self.mixture),
            });
        }
        if self.top_n == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "top_n",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
