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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Preprocessing error: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Metric error: {0}")]
    Metric(#[from] MetricError),

    #[error("Tuning error: {0}")]
    Tune(#[from] TuneError),
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to open file: {0}")]
    FileOpen(#[from] std::io::Error),

    #[error("CSV file is empty")]
    EmptyFile,

    #[error("Inconsistent column count: row {row} has {actual} columns, expected {expected}")]
    InconsistentColumns { row: usize, actual: usize, expected: usize },

    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    #[error("Column '{0}' does not exist")]
    UnknownColumn(String),

    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch { name: String, actual: usize, expected: usize },

    #[error("Target column '{0}' must be numeric")]
    NonNumericTarget(String),

    #[error("Target column '{name}' is missing a value at row {row}")]
    MissingTarget { name: String, row: usize },

    #[error("Row filter on '{column}' matched no rows")]
    EmptyFilterResult { column: String },

    #[error("Partition '{0}' is empty")]
    EmptyPartition(&'static str),

    #[error("Row index {index} out of bounds for {rows} rows")]
    RowOutOfBounds { index: usize, rows: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Split proportion must lie strictly between 0 and 1, got {0}")]
    InvalidProportion(f64),

    #[error("Fold count must be at least 2 and at most the number of training rows ({rows}), got {folds}")]
    InvalidFoldCount { folds: usize, rows: usize },

    #[error("Penalty grid needs at least one level")]
    EmptyGrid,

    #[error("Invalid penalty range: log10 bounds [{min}, {max}]")]
    InvalidPenaltyRange { min: f64, max: f64 },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Step '{0}' has not been fitted")]
    NotFitted(&'static str),

    #[error("Column '{0}' seen during fitting is absent from the data")]
    UnknownColumn(String),

    #[error("Column '{0}' is not categorical")]
    NotCategorical(String),

    #[error("Predictor '{0}' is still non-numeric after preprocessing")]
    NonNumericPredictor(String),

    #[error("Predictor '{column}' is missing a value at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Recipe produced no predictors")]
    NoPredictors,

    #[error("Encoding produces column '{0}' more than once")]
    DuplicateColumn(String),

    #[error(transparent)]
    Data(#[from] DataError),
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Penalty is marked for tuning and has no value yet")]
    UntunedPenalty,

    #[error("Penalty must be finite and non-negative, got {0}")]
    InvalidPenalty(f64),

    #[error("Mixture must lie in [0, 1], got {0}")]
    InvalidMixture(f64),

    #[error("Design matrix has no predictor columns")]
    NoPredictors,

    #[error("Input is empty")]
    EmptyInput,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Elastic net fit failed: {0}")]
    Fit(#[from] linfa_elasticnet::ElasticNetError),

    #[error("Fitted coefficients are not finite")]
    NonFiniteCoefficients,

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
}

#[derive(Error, Debug)]
pub enum MetricError {
    #[error("Input is empty")]
    EmptyInput,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid numeric value encountered")]
    InvalidNumericValue,
}

#[derive(Error, Debug)]
pub enum TuneError {
    #[error("Metric '{0}' was not computed during tuning")]
    UnknownMetric(String),

    #[error("No tuning results to select from")]
    NoResults,

    #[error("Fold {fold} failed at penalty {penalty}: {source}")]
    Fold {
        fold: usize,
        penalty: f64,
        #[source]
        source: ModelError,
    },

    #[error("Fold {fold} failed to score: {source}")]
    Metric {
        fold: usize,
        #[source]
        source: MetricError,
    },

    #[error("Fold {fold} failed to prep the recipe: {source}")]
    Prep {
        fold: usize,
        #[source]
        source: PreprocessError,
    },

    #[error("Folds cover {actual} rows but the training set has {expected}")]
    FoldMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Data(#[from] DataError),
}
