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

pub mod csv;
pub mod filter;

pub use csv::CsvLoader;
pub use filter::{filter_dataset, FilterSpec, RowFilter};

use std::collections::HashSet;

use ndarray::Array1;

use crate::errors::DataError;

/// A trait for loading tabular data from files into a [`Dataset`].
///
/// Implementors read a file from `path`, infer a type for every column and
/// mark the column named `target` as the regression target. The trait is
/// generic over an associated error type so each format can report its own
/// failures.
///
/// # Notes
/// - Column roles are computed once here; downstream code addresses columns
///   by index and role rather than by re-inspecting names.
pub trait DataLoader {
    /// Loads a dataset from a file, marking `target` as the target column.
    fn load<P: AsRef<std::path::Path>>(path: P, target: &str) -> Result<Dataset, Self::Error>;

    /// The error type returned by the `load` method.
    type Error: std::error::Error + 'static;
}

/// Loads a dataset from a file using a specified `DataLoader` implementation.
pub fn load_data<T: DataLoader, P: AsRef<std::path::Path>>(
    path: P,
    target: &str,
) -> Result<Dataset, T::Error> {
    T::load(path, target)
}

/// How a column takes part in modeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Numeric,
    Categorical,
    Target,
}

/// Cell storage for one column. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_missing(&self) -> bool {
        match self {
            ColumnData::Numeric(values) => values.iter().any(|v| v.map_or(true, |x| !x.is_finite())),
            ColumnData::Categorical(values) => values.iter().any(Option::is_none),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Numeric(_))
    }

    fn select(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(values) => {
                ColumnData::Numeric(rows.iter().map(|&r| values[r]).collect())
            }
            ColumnData::Categorical(values) => {
                ColumnData::Categorical(rows.iter().map(|&r| values[r].clone()).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    role: Role,
    data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Column { name: name.into(), role: Role::Numeric, data: ColumnData::Numeric(values) }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Column { name: name.into(), role: Role::Categorical, data: ColumnData::Categorical(values) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn is_predictor(&self) -> bool {
        self.role != Role::Target
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Numeric cells, or `None` for a categorical column.
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Categorical(_) => None,
        }
    }

    /// Categorical cells, or `None` for a numeric column.
    pub fn as_categorical(&self) -> Option<&[Option<String>]> {
        match &self.data {
            ColumnData::Categorical(values) => Some(values),
            ColumnData::Numeric(_) => None,
        }
    }
}

/// A table of equally long, uniquely named columns with exactly one numeric
/// target column.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Builds a dataset and assigns the target role to the column named
    /// `target`.
    pub fn new(mut columns: Vec<Column>, target: &str) -> Result<Self, DataError> {
        let n_rows = columns.first().map_or(0, Column::len);

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DataError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != n_rows {
                return Err(DataError::LengthMismatch {
                    name: column.name.clone(),
                    actual: column.len(),
                    expected: n_rows,
                });
            }
        }

        let target_column = columns
            .iter_mut()
            .find(|c| c.name == target)
            .ok_or_else(|| DataError::UnknownColumn(target.to_string()))?;
        if !target_column.data.is_numeric() {
            return Err(DataError::NonNumericTarget(target.to_string()));
        }
        target_column.role = Role::Target;

        Ok(Dataset { columns, n_rows })
    }

    /// Reassembles a dataset from columns that already share one length and
    /// carry their roles. Used by preprocessing steps.
    pub(crate) fn from_columns(columns: Vec<Column>, n_rows: usize) -> Self {
        debug_assert!(columns.iter().all(|c| c.len() == n_rows));
        Dataset { columns, n_rows }
    }

    pub(crate) fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> &Column {
        &self.columns[index]
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn target_index(&self) -> usize {
        self.columns
            .iter()
            .position(|c| c.role == Role::Target)
            .expect("dataset always carries a target column")
    }

    pub fn target_name(&self) -> &str {
        self.columns[self.target_index()].name()
    }

    /// Indices of predictor columns with the given role.
    pub fn indices_with_role(&self, role: Role) -> Vec<usize> {
        self.columns.iter().enumerate().filter(|(_, c)| c.role == role).map(|(i, _)| i).collect()
    }

    pub fn numeric_predictors(&self) -> Vec<usize> {
        self.indices_with_role(Role::Numeric)
    }

    pub fn categorical_predictors(&self) -> Vec<usize> {
        self.indices_with_role(Role::Categorical)
    }

    pub fn predictor_names(&self) -> Vec<&str> {
        self.columns.iter().filter(|c| c.is_predictor()).map(Column::name).collect()
    }

    /// Copies the given rows (in the given order) into a new dataset.
    pub fn select_rows(&self, rows: &[usize]) -> Result<Dataset, DataError> {
        if let Some(&index) = rows.iter().find(|&&r| r >= self.n_rows) {
            return Err(DataError::RowOutOfBounds { index, rows: self.n_rows });
        }
        let columns = self
            .columns
            .iter()
            .map(|c| Column { name: c.name.clone(), role: c.role, data: c.data.select(rows) })
            .collect();
        Ok(Dataset { columns, n_rows: rows.len() })
    }

    /// Keeps the predictor columns for which `keep` returns true. The target
    /// column is always kept.
    pub fn retain_predictors(mut self, mut keep: impl FnMut(&Column) -> bool) -> Dataset {
        self.columns.retain(|c| !c.is_predictor() || keep(c));
        self
    }

    /// Target values as a dense array.
    pub fn targets(&self) -> Result<Array1<f64>, DataError> {
        let target = &self.columns[self.target_index()];
        let values = target.as_numeric().ok_or_else(|| DataError::NonNumericTarget(target.name.clone()))?;
        values
            .iter()
            .enumerate()
            .map(|(row, v)| match v {
                Some(x) if x.is_finite() => Ok(*x),
                _ => Err(DataError::MissingTarget { name: target.name.clone(), row }),
            })
            .collect::<Result<Vec<f64>, DataError>>()
            .map(Array1::from_vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Dataset {
        Dataset::new(
            vec![
                Column::numeric("rate", vec![Some(10.0), Some(12.5), Some(7.0)]),
                Column::numeric("income", vec![Some(50.0), None, Some(80.0)]),
                Column::categorical(
                    "purpose",
                    vec![Some("car".into()), Some("house".into()), Some("car".into())],
                ),
            ],
            "rate",
        )
        .unwrap()
    }

    #[test]
    fn test_roles_are_assigned_once() {
        let ds = small();
        assert_eq!(ds.target_index(), 0);
        assert_eq!(ds.target_name(), "rate");
        assert_eq!(ds.numeric_predictors(), vec![1]);
        assert_eq!(ds.categorical_predictors(), vec![2]);
        assert_eq!(ds.predictor_names(), vec!["income", "purpose"]);
    }

    #[test]
    fn test_new_rejects_categorical_target() {
        let result = Dataset::new(
            vec![Column::categorical("grade", vec![Some("A".into())])],
            "grade",
        );
        assert!(matches!(result, Err(DataError::NonNumericTarget(name)) if name == "grade"));
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let result = Dataset::new(
            vec![
                Column::numeric("y", vec![Some(1.0), Some(2.0)]),
                Column::numeric("x", vec![Some(1.0)]),
            ],
            "y",
        );
        assert!(matches!(
            result,
            Err(DataError::LengthMismatch { actual: 1, expected: 2, .. })
        ));
    }

    #[test]
    fn test_new_rejects_duplicates_and_unknown_target() {
        let dup = Dataset::new(
            vec![Column::numeric("y", vec![Some(1.0)]), Column::numeric("y", vec![Some(2.0)])],
            "y",
        );
        assert!(matches!(dup, Err(DataError::DuplicateColumn(_))));

        let unknown = Dataset::new(vec![Column::numeric("y", vec![Some(1.0)])], "rate");
        assert!(matches!(unknown, Err(DataError::UnknownColumn(name)) if name == "rate"));
    }

    #[test]
    fn test_select_rows_preserves_order_and_roles() {
        let ds = small();
        let subset = ds.select_rows(&[2, 0]).unwrap();
        assert_eq!(subset.n_rows(), 2);
        assert_eq!(subset.target_index(), 0);
        assert_eq!(subset.targets().unwrap(), Array1::from_vec(vec![7.0, 10.0]));

        let err = ds.select_rows(&[3]).unwrap_err();
        assert!(matches!(err, DataError::RowOutOfBounds { index: 3, rows: 3 }));
    }

    #[test]
    fn test_retain_predictors_keeps_target() {
        let ds = small().retain_predictors(|_| false);
        assert_eq!(ds.column_names(), vec!["rate"]);
    }

    #[test]
    fn test_has_missing() {
        let ds = small();
        assert!(!ds.column(0).data().has_missing());
        assert!(ds.column(1).data().has_missing());
        assert!(!ds.column(2).data().has_missing());
    }
}
