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

use std::collections::{HashMap, HashSet};

use log::debug;

use super::Step;
use crate::data::{ColumnData, Dataset};
use crate::errors::PreprocessError;

/// Maximum ratio between the most and second most frequent value.
pub const DEFAULT_FREQ_CUT: f64 = 95.0 / 5.0;
/// Maximum percentage of distinct values among all rows.
pub const DEFAULT_UNIQUE_CUT: f64 = 10.0;

/// Removes predictors that are constant or nearly so.
///
/// A predictor is removed when it has a single distinct value, or when both
/// its frequency ratio exceeds `freq_cut` and its percentage of distinct
/// values is at most `unique_cut`. Missing cells count as a value of their
/// own.
#[derive(Debug)]
pub struct NearZeroVariance {
    freq_cut: f64,
    unique_cut: f64,
    removed: Option<Vec<String>>,
}

impl NearZeroVariance {
    pub fn new(freq_cut: f64, unique_cut: f64) -> Self {
        NearZeroVariance { freq_cut, unique_cut, removed: None }
    }

    /// Columns dropped by this step, once fitted.
    pub fn removed(&self) -> &[String] {
        self.removed.as_deref().unwrap_or_default()
    }

    fn is_near_zero(&self, data: &ColumnData) -> bool {
        let counts = value_counts(data);
        if counts.len() <= 1 {
            return true;
        }
        let mut freq: Vec<usize> = counts.into_values().collect();
        freq.sort_unstable_by(|a, b| b.cmp(a));

        let freq_ratio = freq[0] as f64 / freq[1] as f64;
        let percent_unique = 100.0 * freq.len() as f64 / data.len() as f64;
        freq_ratio > self.freq_cut && percent_unique <= self.unique_cut
    }
}

impl Default for NearZeroVariance {
    fn default() -> Self {
        NearZeroVariance::new(DEFAULT_FREQ_CUT, DEFAULT_UNIQUE_CUT)
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum Key<'a> {
    Missing,
    Number(u64),
    Level(&'a str),
}

fn value_counts(data: &ColumnData) -> HashMap<Key<'_>, usize> {
    let mut counts = HashMap::new();
    match data {
        ColumnData::Numeric(values) => {
            for v in values {
                // -0.0 and 0.0 are the same value.
                let key = v.map_or(Key::Missing, |x| Key::Number((x + 0.0).to_bits()));
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        ColumnData::Categorical(values) => {
            for v in values {
                let key = v.as_deref().map_or(Key::Missing, Key::Level);
                *counts.entry(key).or_insert(0) += 1;
            }
        }
    }
    counts
}

impl Step for NearZeroVariance {
    fn name(&self) -> &'static str {
        "nzv"
    }

    fn fit(&mut self, data: &Dataset) -> Result<(), PreprocessError> {
        let removed: Vec<String> = data
            .columns()
            .iter()
            .filter(|c| c.is_predictor() && self.is_near_zero(c.data()))
            .map(|c| c.name().to_string())
            .collect();
        if !removed.is_empty() {
            debug!("Near-zero variance predictors removed: {:?}", removed);
        }
        self.removed = Some(removed);
        Ok(())
    }

    fn apply(&self, data: Dataset) -> Result<Dataset, PreprocessError> {
        let removed = self.removed.as_ref().ok_or(PreprocessError::NotFitted("nzv"))?;
        if let Some(name) = removed.iter().find(|name| data.index_of(name).is_none()) {
            return Err(PreprocessError::UnknownColumn(name.clone()));
        }
        let removed: HashSet<&str> = removed.iter().map(String::as_str).collect();
        Ok(data.retain_predictors(|c| !removed.contains(c.name())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;

    fn with_predictor(values: Vec<Option<f64>>) -> Dataset {
        let n = values.len();
        Dataset::new(
            vec![
                Column::numeric("y", (0..n).map(|i| Some(i as f64)).collect()),
                Column::numeric("x", values),
            ],
            "y",
        )
        .unwrap()
    }

    fn fitted(data: &Dataset) -> NearZeroVariance {
        let mut step = NearZeroVariance::default();
        step.fit(data).unwrap();
        step
    }

    #[test]
    fn test_constant_column_is_removed() {
        let step = fitted(&with_predictor(vec![Some(3.0); 10]));
        assert_eq!(step.removed(), &["x"]);
    }

    #[test]
    fn test_rare_value_column_is_removed() {
        // 199 zeros and a single one: ratio 199, 1% unique.
        let mut values = vec![Some(0.0); 199];
        values.push(Some(1.0));
        let step = fitted(&with_predictor(values));
        assert_eq!(step.removed(), &["x"]);
    }

    #[test]
    fn test_skewed_but_diverse_column_is_kept() {
        // Ratio is high but 20% of the values are distinct.
        let mut values = vec![Some(0.0); 80];
        values.extend((1..=20).map(|i| Some(i as f64)));
        let step = fitted(&with_predictor(values));
        assert!(step.removed().is_empty());
    }

    #[test]
    fn test_balanced_binary_column_is_kept() {
        let values = (0..100).map(|i| Some((i % 2) as f64)).collect();
        let step = fitted(&with_predictor(values));
        assert!(step.removed().is_empty());
    }

    #[test]
    fn test_apply_uses_fitted_decision() {
        let step = fitted(&with_predictor(vec![Some(1.0); 4]));
        // The column varies in new data but was constant during fitting.
        let out = step.apply(with_predictor(vec![Some(1.0), Some(2.0)])).unwrap();
        assert_eq!(out.column_names(), vec!["y"]);

        let missing = with_predictor(vec![Some(1.0)]).retain_predictors(|_| false);
        assert!(matches!(step.apply(missing), Err(PreprocessError::UnknownColumn(_))));
    }
}
