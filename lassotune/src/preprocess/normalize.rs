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

use super::Step;
use crate::data::{Column, Dataset, Role};
use crate::errors::PreprocessError;

#[derive(Debug, Clone, PartialEq)]
struct Scale {
    column: String,
    mean: f64,
    std: f64,
}

/// Centers every numeric predictor on its training mean and divides by its
/// training standard deviation (n - 1 denominator). A column with zero
/// deviation is only centered.
#[derive(Debug, Default)]
pub struct Normalize {
    scales: Option<Vec<Scale>>,
}

impl Normalize {
    pub fn new() -> Self {
        Normalize { scales: None }
    }

    /// Learned `(column, mean, std)` triples.
    pub fn parameters(&self) -> Vec<(&str, f64, f64)> {
        self.scales.iter().flatten().map(|s| (s.column.as_str(), s.mean, s.std)).collect()
    }
}

fn mean_std(values: &[Option<f64>]) -> (f64, f64) {
    let present: Vec<f64> = values.iter().flatten().copied().filter(|x| x.is_finite()).collect();
    let n = present.len() as f64;
    if present.is_empty() {
        return (0.0, 1.0);
    }
    let mean = present.iter().sum::<f64>() / n;
    if present.len() < 2 {
        return (mean, 1.0);
    }
    let var = present.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = var.sqrt();
    (mean, if std == 0.0 { 1.0 } else { std })
}

impl Step for Normalize {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn fit(&mut self, data: &Dataset) -> Result<(), PreprocessError> {
        let scales = data
            .numeric_predictors()
            .into_iter()
            .map(|i| {
                let column = data.column(i);
                let (mean, std) = mean_std(column.as_numeric().unwrap_or_default());
                Scale { column: column.name().to_string(), mean, std }
            })
            .collect();
        self.scales = Some(scales);
        Ok(())
    }

    fn apply(&self, data: Dataset) -> Result<Dataset, PreprocessError> {
        let scales = self.scales.as_ref().ok_or(PreprocessError::NotFitted("normalize"))?;
        let mut indices = Vec::with_capacity(scales.len());
        for scale in scales {
            let index = data
                .index_of(&scale.column)
                .ok_or_else(|| PreprocessError::UnknownColumn(scale.column.clone()))?;
            if data.column(index).role() != Role::Numeric {
                return Err(PreprocessError::NonNumericPredictor(scale.column.clone()));
            }
            indices.push(index);
        }

        let n_rows = data.n_rows();
        let mut columns = data.into_columns();
        for (scale, index) in scales.iter().zip(indices) {
            let scaled = columns[index]
                .as_numeric()
                .unwrap_or_default()
                .iter()
                .map(|v| v.map(|x| (x - scale.mean) / scale.std))
                .collect();
            columns[index] = Column::numeric(scale.column.clone(), scaled);
        }
        Ok(Dataset::from_columns(columns, n_rows))
    }
}
