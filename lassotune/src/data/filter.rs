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

use std::collections::HashSet;

use log::{debug, info};

use super::Dataset;
use crate::errors::DataError;

/// Keep only rows whose categorical `column` takes one of `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
    pub column: String,
    pub values: Vec<String>,
}

impl RowFilter {
    pub fn new(column: impl Into<String>, values: &[&str]) -> Self {
        RowFilter { column: column.into(), values: values.iter().map(|v| v.to_string()).collect() }
    }
}

/// Column pruning and row filtering applied before any modeling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub exclude: Vec<String>,
    pub keep_where: Option<RowFilter>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, columns: &[&str]) -> Self {
        self.exclude.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    pub fn keep_where(mut self, filter: RowFilter) -> Self {
        self.keep_where = Some(filter);
        self
    }
}

/// Applies `spec` to `dataset`:
///
/// 1. keeps the rows matching the row filter (if any),
/// 2. removes the excluded columns,
/// 3. drops every predictor column that still contains a missing value.
///
/// The target may not be excluded and must have no missing value in the
/// surviving rows. A row filter that matches nothing is an error because no
/// split can be made from an empty table.
pub fn filter_dataset(dataset: &Dataset, spec: &FilterSpec) -> Result<Dataset, DataError> {
    for name in &spec.exclude {
        let index = dataset.index_of(name).ok_or_else(|| DataError::UnknownColumn(name.clone()))?;
        if index == dataset.target_index() {
            return Err(DataError::UnknownColumn(format!("{name} (target cannot be excluded)")));
        }
    }

    let filtered = match &spec.keep_where {
        Some(filter) => {
            let column = dataset
                .column_by_name(&filter.column)
                .ok_or_else(|| DataError::UnknownColumn(filter.column.clone()))?;
            let levels = column
                .as_categorical()
                .ok_or_else(|| DataError::UnknownColumn(format!("{} (not categorical)", filter.column)))?;
            let wanted: HashSet<&str> = filter.values.iter().map(String::as_str).collect();
            let rows: Vec<usize> = levels
                .iter()
                .enumerate()
                .filter(|(_, v)| v.as_deref().is_some_and(|v| wanted.contains(v)))
                .map(|(i, _)| i)
                .collect();
            if rows.is_empty() {
                return Err(DataError::EmptyFilterResult { column: filter.column.clone() });
            }
            debug!("Row filter on '{}' kept {} of {} rows", filter.column, rows.len(), dataset.n_rows());
            dataset.select_rows(&rows)?
        }
        None => dataset.clone(),
    };

    if filtered.n_rows() == 0 {
        return Err(DataError::EmptyPartition("filtered dataset"));
    }

    let excluded: HashSet<&str> = spec.exclude.iter().map(String::as_str).collect();
    let mut dropped = Vec::new();
    let pruned = filtered.retain_predictors(|c| {
        if excluded.contains(c.name()) {
            return false;
        }
        if c.data().has_missing() {
            dropped.push(c.name().to_string());
            return false;
        }
        true
    });
    if !dropped.is_empty() {
        debug!("Dropped columns with missing values: {:?}", dropped);
    }

    // Enforces the target invariant.
    pruned.targets()?;

    info!(
        "Filtered dataset: {} rows, {} predictors ({} excluded, {} dropped for missing values)",
        pruned.n_rows(),
        pruned.n_cols() - 1,
        spec.exclude.len(),
        dropped.len()
    );
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;

    fn loans() -> Dataset {
        Dataset::new(
            vec![
                Column::numeric("interest_rate", vec![Some(10.0), Some(12.0), Some(8.0), Some(15.0)]),
                Column::categorical(
                    "application_type",
                    vec![
                        Some("individual".into()),
                        Some("joint".into()),
                        Some("individual".into()),
                        Some("individual".into()),
                    ],
                ),
                Column::numeric("annual_income_joint", vec![None, Some(90.0), None, None]),
                Column::numeric("emp_length", vec![Some(3.0), Some(1.0), None, Some(10.0)]),
                Column::numeric("paid_total", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
                Column::numeric("loan_amount", vec![Some(5.0), Some(6.0), Some(7.0), Some(8.0)]),
            ],
            "interest_rate",
        )
        .unwrap()
    }

    #[test]
    fn test_filter_excludes_then_drops_missing() {
        let spec = FilterSpec::new()
            .exclude(&["paid_total"])
            .keep_where(RowFilter::new("application_type", &["individual"]));
        let ds = filter_dataset(&loans(), &spec).unwrap();

        assert_eq!(ds.n_rows(), 3);
        assert_eq!(ds.column_names(), vec!["interest_rate", "application_type", "loan_amount"]);
        assert_eq!(ds.targets().unwrap().to_vec(), vec![10.0, 8.0, 15.0]);
    }

    #[test]
    fn test_filter_without_row_filter_keeps_all_rows() {
        let ds = filter_dataset(&loans(), &FilterSpec::new()).unwrap();
        assert_eq!(ds.n_rows(), 4);
        assert!(ds.column_by_name("annual_income_joint").is_none());
        assert!(ds.column_by_name("paid_total").is_some());
    }

    #[test]
    fn test_filter_matching_nothing_is_fatal() {
        let spec = FilterSpec::new().keep_where(RowFilter::new("application_type", &["business"]));
        let result = filter_dataset(&loans(), &spec);
        assert!(matches!(result, Err(DataError::EmptyFilterResult { column }) if column == "application_type"));
    }

    #[test]
    fn test_filter_unknown_columns() {
        let exclude = FilterSpec::new().exclude(&["nope"]);
        assert!(matches!(filter_dataset(&loans(), &exclude), Err(DataError::UnknownColumn(_))));

        let keep = FilterSpec::new().keep_where(RowFilter::new("nope", &["x"]));
        assert!(matches!(filter_dataset(&loans(), &keep), Err(DataError::UnknownColumn(_))));

        let target = FilterSpec::new().exclude(&["interest_rate"]);
        assert!(matches!(filter_dataset(&loans(), &target), Err(DataError::UnknownColumn(_))));
    }

    #[test]
    fn test_filter_rejects_missing_target() {
        let ds = Dataset::new(
            vec![
                Column::numeric("y", vec![Some(1.0), None]),
                Column::numeric("x", vec![Some(1.0), Some(2.0)]),
            ],
            "y",
        )
        .unwrap();
        let result = filter_dataset(&ds, &FilterSpec::new());
        assert!(matches!(result, Err(DataError::MissingTarget { row: 1, .. })));
    }
}
