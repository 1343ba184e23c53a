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

//! # lassotune
//!
//! Lasso regression with a cross-validated penalty, from raw table to
//! variable importance:
//!
//! 1. [`data`] loads and filters a typed [`data::Dataset`].
//! 2. [`split`] makes a seeded, stratified train/test split and k folds.
//! 3. [`preprocess`] builds a [`preprocess::Recipe`] that is prepped on
//!    training rows only and baked onto any rows.
//! 4. [`model`] fits the elastic net through `linfa-elasticnet`.
//! 5. [`tune`] grid-searches the penalty over the folds and selects one.
//! 6. [`evaluate`] refits on the training set, scores the test set and
//!    ranks predictors.
//!
//! [`analysis::run`] chains all of it from an [`config::AnalysisConfig`].

pub mod analysis;
pub mod config;
pub mod data;
pub mod datasets;
pub mod errors;
pub mod evaluate;
pub mod metrics;
pub mod model;
pub mod preprocess;
pub mod report;
pub mod split;
pub mod tune;
pub mod workflow;

pub use analysis::{run, AnalysisReport};
pub use config::AnalysisConfig;
pub use errors::Error;
