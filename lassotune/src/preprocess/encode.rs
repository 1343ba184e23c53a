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

use std::collections::{BTreeSet, HashMap, HashSet};

use super::Step;
use crate::data::{Column, Dataset, Role};
use crate::errors::PreprocessError;

/// Level assigned to categorical cells that were not seen during fitting.
pub const NOVEL_LEVEL: &str = "new";

/// Returns the column index for `name`, requiring it to be categorical.
fn categorical_index(data: &Dataset, name: &str) -> Result<usize, PreprocessError> {
    let index = data.index_of(name).ok_or_else(|| PreprocessError::UnknownColumn(name.to_string()))?;
    if data.column(index).role() != Role::Categorical {
        return Err(PreprocessError::NotCategorical(name.to_string()));
    }
    Ok(index)
}

/// Maps levels absent from the training data, and missing cells, to
/// [`NOVEL_LEVEL`].
#[derive(Debug, Default)]
pub struct Novel {
    vocab: Option<Vec<(String, HashSet<String>)>>,
}

impl Novel {
    pub fn new() -> Self {
        Novel { vocab: None }
    }
}

impl Step for Novel {
    fn name(&self) -> &'static str {
        "novel"
    }

    fn fit(&mut self, data: &Dataset) -> Result<(), PreprocessError> {
        let vocab = data
            .categorical_predictors()
            .into_iter()
            .map(|i| {
                let column = data.column(i);
                let levels =
                    column.as_categorical().unwrap_or_default().iter().flatten().cloned().collect();
                (column.name().to_string(), levels)
            })
            .collect();
        self.vocab = Some(vocab);
        Ok(())
    }

    fn apply(&self, data: Dataset) -> Result<Dataset, PreprocessError> {
        let vocab = self.vocab.as_ref().ok_or(PreprocessError::NotFitted("novel"))?;
        let indices = vocab
            .iter()
            .map(|(name, _)| categorical_index(&data, name))
            .collect::<Result<Vec<_>, _>>()?;

        let n_rows = data.n_rows();
        let mut columns = data.into_columns();
        for ((name, known), index) in vocab.iter().zip(indices) {
            let values = columns[index].as_categorical().unwrap_or_default();
            let mapped = values
                .iter()
                .map(|v| match v {
                    Some(level) if known.contains(level) => Some(level.clone()),
                    _ => Some(NOVEL_LEVEL.to_string()),
                })
                .collect();
            columns[index] = Column::categorical(name.clone(), mapped);
        }
        Ok(Dataset::from_columns(columns, n_rows))
    }
}

/// Replaces characters that are awkward in column names with `_`.
fn sanitize(level: &str) -> String {
    level.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect()
}

#[derive(Debug, Clone)]
struct Encoding {
    column: String,
    /// Encoded levels, sorted. Excludes the reference level unless one-hot.
    levels: Vec<String>,
}

impl Encoding {
    fn indicator_name(&self, level: &str) -> String {
        format!("{}_{}", self.column, sanitize(level))
    }
}

/// Replaces every categorical predictor with numeric 0/1 indicator columns.
///
/// Levels are sorted; the first one is the reference level and gets no
/// indicator unless `one_hot` is set. A level not learned during fitting
/// (including [`NOVEL_LEVEL`] when it never occurred in training) encodes
/// as all zeros, the same as the reference level.
#[derive(Debug)]
pub struct Dummy {
    one_hot: bool,
    encodings: Option<Vec<Encoding>>,
}

impl Dummy {
    pub fn new(one_hot: bool) -> Self {
        Dummy { one_hot, encodings: None }
    }

    /// Names of the indicator columns this step produces, once fitted.
    pub fn output_names(&self) -> Vec<String> {
        self.encodings
            .iter()
            .flatten()
            .flat_map(|e| e.levels.iter().map(move |l| e.indicator_name(l)))
            .collect()
    }
}

impl Step for Dummy {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn fit(&mut self, data: &Dataset) -> Result<(), PreprocessError> {
        let encoded = data.categorical_predictors();
        let encodings: Vec<Encoding> = encoded
            .iter()
            .map(|&i| {
                let column = data.column(i);
                let sorted: BTreeSet<&String> =
                    column.as_categorical().unwrap_or_default().iter().flatten().collect();
                let skip = if self.one_hot { 0 } else { 1 };
                Encoding {
                    column: column.name().to_string(),
                    levels: sorted.into_iter().skip(skip).cloned().collect(),
                }
            })
            .collect();

        // Indicator names must be unique and must not shadow kept columns.
        let mut names: HashSet<String> = data
            .columns()
            .iter()
            .enumerate()
            .filter(|(i, _)| !encoded.contains(i))
            .map(|(_, c)| c.name().to_string())
            .collect();
        for encoding in &encodings {
            for level in &encoding.levels {
                let name = encoding.indicator_name(level);
                if names.contains(&name) {
                    return Err(PreprocessError::DuplicateColumn(name));
                }
                names.insert(name);
            }
        }

        self.encodings = Some(encodings);
        Ok(())
    }

    fn apply(&self, data: Dataset) -> Result<Dataset, PreprocessError> {
        let encodings = self.encodings.as_ref().ok_or(PreprocessError::NotFitted("dummy"))?;
        let mut by_column: HashMap<usize, &Encoding> = HashMap::with_capacity(encodings.len());
        for encoding in encodings {
            by_column.insert(categorical_index(&data, &encoding.column)?, encoding);
        }

        let n_rows = data.n_rows();
        let mut columns = Vec::with_capacity(data.n_cols());
        for (index, column) in data.into_columns().into_iter().enumerate() {
            let Some(encoding) = by_column.get(&index) else {
                columns.push(column);
                continue;
            };
            let values = column.as_categorical().unwrap_or_default();
            if let Some(row) = values.iter().position(Option::is_none) {
                return Err(PreprocessError::MissingValue { column: encoding.column.clone(), row });
            }
            for level in &encoding.levels {
                let indicator = values
                    .iter()
                    .map(|v| Some(if v.as_deref() == Some(level.as_str()) { 1.0 } else { 0.0 }))
                    .collect();
                columns.push(Column::numeric(encoding.indicator_name(level), indicator));
            }
        }
        Ok(Dataset::from_columns(columns, n_rows))
    }
}
