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

//! Seeded, stratified resampling: the initial train/test split and the
//! k-fold partition of the training rows.
//!
//! Stratification works on one column. Numeric columns are cut into
//! quantile bins by rank, categorical columns group by level. Rows are
//! shuffled inside each stratum with an explicitly seeded `StdRng`, so the
//! same seed always reproduces the same partition.

use std::collections::BTreeMap;

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::{ColumnData, Dataset};
use crate::errors::{ConfigError, DataError, Error};

/// Offset mixed into the seed for fold assignment so folds do not replay the
/// shuffle used by the initial split.
const FOLD_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Number of quantile bins for numeric strata.
const DEFAULT_BREAKS: usize = 4;

/// Strata smaller than this share of the rows are pooled with a neighbour.
const DEFAULT_POOL: f64 = 0.1;

/// A train/test partition of one dataset.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
    train_rows: Vec<usize>,
    test_rows: Vec<usize>,
}

impl Split {
    /// Row indices (into the split dataset) assigned to training, ascending.
    pub fn train_rows(&self) -> &[usize] {
        &self.train_rows
    }

    /// Row indices (into the split dataset) assigned to testing, ascending.
    pub fn test_rows(&self) -> &[usize] {
        &self.test_rows
    }
}

/// One resample: `analysis` rows fit a model, `assessment` rows score it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub id: usize,
    pub analysis: Vec<usize>,
    pub assessment: Vec<usize>,
}

/// k disjoint assessment sets covering every training row exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSet {
    folds: Vec<Fold>,
    n_rows: usize,
}

impl FoldSet {
    pub fn folds(&self) -> &[Fold] {
        &self.folds
    }

    pub fn len(&self) -> usize {
        self.folds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }

    /// Number of rows in the partitioned dataset.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }
}

#[derive(Debug, Clone)]
pub struct Splitter {
    seed: u64,
    prop: f64,
    strata: Option<String>,
    breaks: usize,
    pool: f64,
}

impl Splitter {
    pub fn new(seed: u64) -> Self {
        Splitter { seed, prop: 0.75, strata: None, breaks: DEFAULT_BREAKS, pool: DEFAULT_POOL }
    }

    /// Share of rows assigned to training.
    pub fn prop(mut self, prop: f64) -> Self {
        self.prop = prop;
        self
    }

    /// Column to stratify on. Without one, all rows form a single stratum.
    pub fn strata(mut self, column: impl Into<String>) -> Self {
        self.strata = Some(column.into());
        self
    }

    pub fn breaks(mut self, breaks: usize) -> Self {
        self.breaks = breaks.max(1);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn initial_split(&self, dataset: &Dataset) -> Result<Split, Error> {
        if !(self.prop > 0.0 && self.prop < 1.0) {
            return Err(ConfigError::InvalidProportion(self.prop).into());
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut train_rows = Vec::new();
        let mut test_rows = Vec::new();
        for mut stratum in self.strata_of(dataset)? {
            stratum.shuffle(&mut rng);
            let n_train = (stratum.len() as f64 * self.prop).floor() as usize;
            train_rows.extend_from_slice(&stratum[..n_train]);
            test_rows.extend_from_slice(&stratum[n_train..]);
        }
        train_rows.sort_unstable();
        test_rows.sort_unstable();

        if train_rows.is_empty() {
            return Err(DataError::EmptyPartition("train").into());
        }
        if test_rows.is_empty() {
            return Err(DataError::EmptyPartition("test").into());
        }
        debug!(
            "Initial split (seed {}): {} train rows, {} test rows",
            self.seed,
            train_rows.len(),
            test_rows.len()
        );

        Ok(Split {
            train: dataset.select_rows(&train_rows)?,
            test: dataset.select_rows(&test_rows)?,
            train_rows,
            test_rows,
        })
    }

    /// Partitions the rows of `dataset` (normally `Split::train`) into `k`
    /// stratified folds.
    pub fn vfold(&self, dataset: &Dataset, k: usize) -> Result<FoldSet, Error> {
        let n_rows = dataset.n_rows();
        if k < 2 || k > n_rows {
            return Err(ConfigError::InvalidFoldCount { folds: k, rows: n_rows }.into());
        }

        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(FOLD_STREAM));
        let mut fold_of = vec![0usize; n_rows];
        let mut next = 0usize;
        for mut stratum in self.strata_of(dataset)? {
            stratum.shuffle(&mut rng);
            for row in stratum {
                fold_of[row] = next % k;
                next += 1;
            }
        }

        let folds = (0..k)
            .map(|id| {
                let (assessment, analysis): (Vec<usize>, Vec<usize>) =
                    (0..n_rows).partition(|&row| fold_of[row] == id);
                Fold { id, analysis, assessment }
            })
            .collect();
        debug!("Created {} folds over {} rows (seed {})", k, n_rows, self.seed);

        Ok(FoldSet { folds, n_rows })
    }

    fn strata_of(&self, dataset: &Dataset) -> Result<Vec<Vec<usize>>, DataError> {
        let Some(name) = &self.strata else {
            return Ok(vec![(0..dataset.n_rows()).collect()]);
        };
        let column =
            dataset.column_by_name(name).ok_or_else(|| DataError::UnknownColumn(name.clone()))?;
        let bins = match column.data() {
            ColumnData::Numeric(values) => quantile_bins(values, self.breaks),
            ColumnData::Categorical(values) => level_bins(values),
        };
        Ok(pool_bins(bins, (self.pool * dataset.n_rows() as f64).ceil() as usize))
    }
}

/// Cuts rows into `breaks` bins of (almost) equal size by rank. Missing
/// values form a trailing bin of their own.
fn quantile_bins(values: &[Option<f64>], breaks: usize) -> Vec<Vec<usize>> {
    let mut present: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| x.is_finite()).map(|x| (i, x)))
        .collect();
    present.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let n = present.len();
    let mut bins = vec![Vec::new(); breaks];
    for (rank, (row, _)) in present.into_iter().enumerate() {
        bins[rank * breaks / n.max(1)].push(row);
    }

    let missing: Vec<usize> =
        values.iter().enumerate().filter(|(_, v)| v.map_or(true, |x| !x.is_finite())).map(|(i, _)| i).collect();
    if !missing.is_empty() {
        bins.push(missing);
    }
    bins.retain(|b| !b.is_empty());
    bins
}

/// Groups rows by level, ordered by level name. Missing values group under
/// the empty level.
fn level_bins(values: &[Option<String>]) -> Vec<Vec<usize>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (row, v) in values.iter().enumerate() {
        groups.entry(v.as_deref().unwrap_or("")).or_default().push(row);
    }
    groups.into_values().collect()
}

/// Merges bins smaller than `min_size` into the following bin; a small last
/// bin joins the previous one.
fn pool_bins(bins: Vec<Vec<usize>>, min_size: usize) -> Vec<Vec<usize>> {
    let mut pooled: Vec<Vec<usize>> = Vec::with_capacity(bins.len());
    let mut pending: Vec<usize> = Vec::new();
    for bin in bins {
        pending.extend(bin);
        if pending.len() >= min_size {
            pooled.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        match pooled.last_mut() {
            Some(last) => last.extend(pending),
            None => pooled.push(pending),
        }
    }
    pooled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use std::collections::HashSet;

    fn numeric_dataset(n: usize) -> Dataset {
        // Skewed target so an unstratified split could drift.
        let y: Vec<Option<f64>> = (0..n).map(|i| Some((((i * 37) % n) as f64).powf(1.5))).collect();
        let x: Vec<Option<f64>> = (0..n).map(|i| Some(i as f64)).collect();
        Dataset::new(vec![Column::numeric("y", y), Column::numeric("x", x)], "y").unwrap()
    }

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_split_is_deterministic_for_a_seed() {
        let ds = numeric_dataset(200);
        let splitter = Splitter::new(123).prop(0.8).strata("y");
        let a = splitter.initial_split(&ds).unwrap();
        let b = splitter.initial_split(&ds).unwrap();
        assert_eq!(a.train_rows(), b.train_rows());
        assert_eq!(a.test_rows(), b.test_rows());
        assert_eq!(a.train, b.train);

        let other = Splitter::new(124).prop(0.8).strata("y").initial_split(&ds).unwrap();
        assert_ne!(a.train_rows(), other.train_rows());
    }

    #[test]
    fn test_split_is_disjoint_and_exhaustive() {
        let ds = numeric_dataset(101);
        let split = Splitter::new(7).prop(0.8).strata("y").initial_split(&ds).unwrap();

        let train: HashSet<usize> = split.train_rows().iter().copied().collect();
        let test: HashSet<usize> = split.test_rows().iter().copied().collect();
        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 101);
        assert_eq!(split.train.n_rows(), train.len());
        assert_eq!(split.test.n_rows(), test.len());
    }

    #[test]
    fn test_stratified_split_preserves_target_mean() {
        let ds = numeric_dataset(1000);
        let split = Splitter::new(123).prop(0.8).strata("y").initial_split(&ds).unwrap();

        let all = mean(&ds.targets().unwrap().to_vec());
        let train = mean(&split.train.targets().unwrap().to_vec());
        let test = mean(&split.test.targets().unwrap().to_vec());
        assert!((train - all).abs() / all < 0.05, "train mean {train} vs {all}");
        assert!((test - all).abs() / all < 0.10, "test mean {test} vs {all}");
        assert_eq!(split.train.n_rows(), 800);
    }

    #[test]
    fn test_split_rejects_bad_proportion() {
        let ds = numeric_dataset(10);
        for prop in [0.0, 1.0, -0.5, f64::NAN] {
            let result = Splitter::new(1).prop(prop).initial_split(&ds);
            assert!(matches!(result, Err(Error::Config(ConfigError::InvalidProportion(_)))));
        }
    }

    #[test]
    fn test_split_too_small_for_a_test_side() {
        let ds = numeric_dataset(1);
        let result = Splitter::new(1).prop(0.5).initial_split(&ds);
        assert!(matches!(result, Err(Error::Data(DataError::EmptyPartition("train")))));
    }

    #[test]
    fn test_unknown_strata_column() {
        let ds = numeric_dataset(10);
        let result = Splitter::new(1).strata("nope").initial_split(&ds);
        assert!(matches!(result, Err(Error::Data(DataError::UnknownColumn(_)))));
    }

    #[test]
    fn test_folds_cover_each_row_once() {
        let ds = numeric_dataset(103);
        let folds = Splitter::new(123).strata("y").vfold(&ds, 5).unwrap();
        assert_eq!(folds.len(), 5);

        let mut assessed = vec![0usize; 103];
        let mut analysed = vec![0usize; 103];
        for fold in folds.folds() {
            for &r in &fold.assessment {
                assessed[r] += 1;
            }
            for &r in &fold.analysis {
                analysed[r] += 1;
            }
            assert_eq!(fold.analysis.len() + fold.assessment.len(), 103);
        }
        assert!(assessed.iter().all(|&c| c == 1));
        assert!(analysed.iter().all(|&c| c == 4));

        let sizes: Vec<usize> = folds.folds().iter().map(|f| f.assessment.len()).collect();
        let (min, max) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
        assert!(max - min <= 1, "fold sizes {sizes:?}");
    }

    #[test]
    fn test_folds_are_deterministic() {
        let ds = numeric_dataset(50);
        let a = Splitter::new(9).strata("y").vfold(&ds, 5).unwrap();
        let b = Splitter::new(9).strata("y").vfold(&ds, 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fold_count_validation() {
        let ds = numeric_dataset(4);
        for k in [0, 1, 5] {
            let result = Splitter::new(1).vfold(&ds, k);
            assert!(matches!(
                result,
                Err(Error::Config(ConfigError::InvalidFoldCount { rows: 4, .. }))
            ));
        }
    }

    #[test]
    fn test_categorical_strata_keep_level_shares() {
        let levels: Vec<Option<String>> =
            (0..100).map(|i| Some(if i % 4 == 0 { "rare" } else { "common" }.to_string())).collect();
        let y: Vec<Option<f64>> = (0..100).map(|i| Some(i as f64)).collect();
        let ds = Dataset::new(vec![Column::numeric("y", y), Column::categorical("kind", levels)], "y")
            .unwrap();
        let split = Splitter::new(3).prop(0.8).strata("kind").initial_split(&ds).unwrap();

        let rare_in_train = split
            .train
            .column_by_name("kind")
            .and_then(|c| c.as_categorical())
            .unwrap()
            .iter()
            .filter(|v| v.as_deref() == Some("rare"))
            .count();
        assert_eq!(rare_in_train, 20);
    }

    #[test]
    fn test_pool_bins_merges_small_strata() {
        let bins = vec![vec![0], vec![1, 2, 3], vec![4]];
        assert_eq!(pool_bins(bins, 2), vec![vec![0, 1, 2, 3, 4]]);

        let bins = vec![vec![0, 1], vec![2, 3], vec![4]];
        assert_eq!(pool_bins(bins, 2), vec![vec![0, 1], vec![2, 3, 4]]);
    }

    #[test]
    fn test_quantile_bins_split_by_rank() {
        let values: Vec<Option<f64>> = vec![Some(4.0), Some(1.0), None, Some(3.0), Some(2.0)];
        let bins = quantile_bins(&values, 2);
        assert_eq!(bins, vec![vec![1, 4], vec![3, 0], vec![2]]);
    }
}
