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

use std::fmt;

use crate::analysis::AnalysisReport;
use crate::tune::SelectionRule;

/// Renders `report` as plain text: data sizes, the tuning table, the
/// selected penalty, test metrics and the importance ranking.
pub fn format_report(report: &AnalysisReport) -> String {
    report.to_string()
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_report(out, self)
    }
}

fn write_report(out: &mut fmt::Formatter<'_>, report: &AnalysisReport) -> fmt::Result {
    writeln!(out, "Lasso regression of '{}'", report.target)?;
    writeln!(
        out,
        "Rows: {} ({} train / {} test), {} folds, {} predictors after preprocessing",
        report.n_rows, report.n_train, report.n_test, report.n_folds, report.n_predictors
    )?;

    writeln!(out)?;
    writeln!(out, "Cross-validated metrics")?;
    writeln!(out, "{:>12}  {:<6}  {:>10}  {:>10}", "penalty", "metric", "mean", "std_err")?;
    for s in &report.summaries {
        writeln!(out, "{:>12.3e}  {:<6}  {:>10.4}  {:>10.4}", s.penalty, s.metric, s.mean, s.std_err)?;
    }

    writeln!(out)?;
    let rule = match report.selection {
        SelectionRule::Best => "best",
        SelectionRule::OneStdErr => "one standard error",
    };
    writeln!(
        out,
        "Selected penalty: {:.3e} ({} {}, mean {:.4})",
        report.selected.penalty, rule, report.metric, report.selected.mean
    )?;
    writeln!(
        out,
        "Non-zero coefficients: {} of {}",
        report.n_nonzero, report.n_predictors
    )?;

    writeln!(out)?;
    writeln!(out, "Test set")?;
    for m in &report.test_metrics {
        writeln!(out, "  {:<6} {:.4}", m.metric, m.value)?;
    }

    writeln!(out)?;
    writeln!(out, "Variable importance (top {})", report.importance.len())?;
    let width = report.importance.iter().map(|i| i.feature.len()).max().unwrap_or(0);
    for (rank, item) in report.importance.iter().enumerate() {
        writeln!(
            out,
            "{:>3}. {:<width$}  {:>10.4}  {}",
            rank + 1,
            item.feature,
            item.importance,
            item.sign
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::{Importance, Sign};
    use crate::metrics::{Direction, MetricValue};
    use crate::tune::MetricSummary;

    fn summary(penalty: f64, mean: f64) -> MetricSummary {
        MetricSummary { penalty, metric: "rmse", direction: Direction::Minimize, mean, n: 5, std_err: 0.1 }
    }

    fn report() -> AnalysisReport {
        AnalysisReport {
            target: "interest_rate".to_string(),
            n_rows: 100,
            n_train: 80,
            n_test: 20,
            n_folds: 5,
            n_predictors: 2,
            n_nonzero: 1,
            metric: "rmse".to_string(),
            selection: SelectionRule::Best,
            summaries: vec![summary(1e-3, 4.8), summary(1e-1, 6.0)],
            selected: summary(1e-3, 4.8),
            test_metrics: vec![MetricValue { metric: "rmse", value: 4.5 }],
            importance: vec![
                Importance { feature: "term".to_string(), importance: 1.25, sign: Sign::Positive },
                Importance { feature: "loan_amount".to_string(), importance: 0.0, sign: Sign::Zero },
            ],
        }
    }

    #[test]
    fn test_format_report() {
        let text = format_report(&report());
        assert!(text.starts_with("Lasso regression of 'interest_rate'"));
        assert!(text.contains("80 train / 20 test"));
        assert!(text.contains("Selected penalty: 1.000e-3 (best rmse, mean 4.8000)"));
        assert!(text.contains("  rmse   4.5000"));
        assert!(text.contains("  1. term"));
        assert!(text.contains("POS"));
        assert!(text.contains("  2. loan_amount"));
        assert!(text.contains("ZERO"));
    }

    #[test]
    fn test_display_matches_format_report() {
        let report = report();
        assert_eq!(format!("{report}"), format_report(&report));
    }
}
