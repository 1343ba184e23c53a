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

use std::cmp::Ordering;

use log::debug;

use super::MetricSummary;
use crate::errors::TuneError;
use crate::metrics::Direction;

/// Relative difference under which two means count as tied.
pub const TIE_TOLERANCE: f64 = 1e-12;

/// How the final penalty is chosen from the tuning summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionRule {
    /// Numerically best mean.
    #[default]
    Best,
    /// Largest penalty within one standard error of the best.
    OneStdErr,
}

impl SelectionRule {
    pub fn select(self, summaries: &[MetricSummary], metric: &str) -> Result<MetricSummary, TuneError> {
        match self {
            SelectionRule::Best => select_best(summaries, metric),
            SelectionRule::OneStdErr => select_by_one_std_err(summaries, metric),
        }
    }
}

fn is_tie(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIE_TOLERANCE * a.abs().max(b.abs())
}

/// Orders summaries best first, then by larger penalty; undefined means go
/// last. Exact means only: the tie tolerance belongs to [`select_best`].
pub(crate) fn rank(a: &MetricSummary, b: &MetricSummary) -> Ordering {
    let by_mean = match (a.mean.is_nan(), b.mean.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match a.direction {
            Direction::Minimize => a.mean.total_cmp(&b.mean),
            Direction::Maximize => b.mean.total_cmp(&a.mean),
        },
    };
    by_mean.then_with(|| b.penalty.total_cmp(&a.penalty))
}

fn candidates<'a>(
    summaries: &'a [MetricSummary],
    metric: &str,
) -> Result<Vec<&'a MetricSummary>, TuneError> {
    if summaries.is_empty() {
        return Err(TuneError::NoResults);
    }
    let matching: Vec<&MetricSummary> = summaries.iter().filter(|s| s.metric == metric).collect();
    if matching.is_empty() {
        return Err(TuneError::UnknownMetric(metric.to_string()));
    }
    let defined: Vec<&MetricSummary> = matching.into_iter().filter(|s| !s.mean.is_nan()).collect();
    if defined.is_empty() {
        return Err(TuneError::NoResults);
    }
    Ok(defined)
}

/// Summary with the best mean for `metric`. Among tied means the largest
/// penalty (the simplest model) wins.
pub fn select_best(summaries: &[MetricSummary], metric: &str) -> Result<MetricSummary, TuneError> {
    let candidates = candidates(summaries, metric)?;
    let top = candidates.iter().copied().min_by(|a, b| rank(a, b)).ok_or(TuneError::NoResults)?;
    let best = candidates
        .into_iter()
        .filter(|s| is_tie(s.mean, top.mean))
        .max_by(|a, b| a.penalty.total_cmp(&b.penalty))
        .copied()
        .unwrap_or(*top);
    debug!("Best {metric}: {:.6} at penalty {:e}", best.mean, best.penalty);
    Ok(best)
}

/// Largest penalty whose mean lies within one standard error of the best
/// mean for `metric`.
pub fn select_by_one_std_err(
    summaries: &[MetricSummary],
    metric: &str,
) -> Result<MetricSummary, TuneError> {
    let best = select_best(summaries, metric)?;
    let within = |s: &MetricSummary| match best.direction {
        Direction::Minimize => s.mean <= best.mean + best.std_err,
        Direction::Maximize => s.mean >= best.mean - best.std_err,
    };
    let chosen = candidates(summaries, metric)?
        .into_iter()
        .filter(|s| within(s))
        .max_by(|a, b| a.penalty.total_cmp(&b.penalty))
        .copied()
        .unwrap_or(best);
    debug!(
        "One-std-err {metric}: {:.6} at penalty {:e} (best {:.6} ± {:.6})",
        chosen.mean, chosen.penalty, best.mean, best.std_err
    );
    Ok(chosen)
}
