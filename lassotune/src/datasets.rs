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

//! Synthetic loan applications shaped like the Lending Club loan schema.
//!
//! The interest rate depends on a handful of borrower attributes plus
//! noise. Identifier-like columns, post-origination columns that leak the
//! outcome, a joint-income column that is only present for joint
//! applications, and columns with scattered missing values are included so
//! the whole filtering and preprocessing chain has something to do.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Poisson, StandardNormal};

use crate::data::{Column, Dataset};
use crate::errors::{ConfigError, Error};

const MIN_RATE: f64 = 5.31;
const MAX_RATE: f64 = 30.94;

const STATES: &[(&str, f64)] =
    &[("CA", 0.14), ("TX", 0.08), ("NY", 0.08), ("FL", 0.07), ("IL", 0.04), ("OH", 0.04), ("WA", 0.03)];

const EMP_TITLES: &[(&str, f64)] = &[
    ("manager", 0.1),
    ("owner", 0.05),
    ("teacher", 0.05),
    ("driver", 0.04),
    ("registered nurse", 0.04),
    ("sales", 0.03),
    ("engineer", 0.03),
];

const HOMEOWNERSHIP: &[(&str, f64)] = &[("MORTGAGE", 0.48), ("RENT", 0.39), ("OWN", 0.13)];

const VERIFIED: &[(&str, f64)] =
    &[("Not Verified", 0.35), ("Source Verified", 0.40), ("Verified", 0.25)];

const PURPOSES: &[(&str, f64)] = &[
    ("debt_consolidation", 0.51),
    ("credit_card", 0.23),
    ("other", 0.09),
    ("home_improvement", 0.07),
    ("major_purchase", 0.03),
    ("medical", 0.02),
    ("car", 0.02),
    ("small_business", 0.015),
    ("house", 0.01),
    ("moving", 0.01),
    ("vacation", 0.005),
];

const GRADES: &[&str] = &["A", "B", "C", "D", "E", "F", "G"];

struct Sampler {
    rng: StdRng,
}

impl Sampler {
    fn normal(&mut self, mean: f64, sd: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mean + sd * z
    }

    fn log_normal(&mut self, mu: f64, sigma: f64) -> f64 {
        self.normal(mu, sigma).exp()
    }

    fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p)
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.rng.gen_range(low..high)
    }

    fn count(&mut self, dist: &Poisson<f64>) -> f64 {
        self.rng.sample(dist)
    }

    /// Weighted choice; weights need not sum to one.
    fn pick(&mut self, choices: &[(&'static str, f64)]) -> &'static str {
        let total: f64 = choices.iter().map(|(_, w)| w).sum();
        let mut u = self.rng.gen::<f64>() * total;
        for &(choice, weight) in choices {
            if u < weight {
                return choice;
            }
            u -= weight;
        }
        choices[choices.len() - 1].0
    }
}

fn poisson(rate: f64) -> Result<Poisson<f64>, ConfigError> {
    Poisson::new(rate).map_err(|e| ConfigError::InvalidParameter {
        name: "poisson rate",
        reason: e.to_string(),
    })
}

struct Loan {
    emp_title: Option<&'static str>,
    emp_length: Option<f64>,
    state: &'static str,
    homeownership: &'static str,
    annual_income: f64,
    verified_income: &'static str,
    debt_to_income: f64,
    annual_income_joint: Option<f64>,
    application_type: &'static str,
    delinq_2y: f64,
    months_since_last_delinq: Option<f64>,
    earliest_credit_line: f64,
    inquiries_last_12m: f64,
    total_credit_lines: f64,
    open_credit_lines: f64,
    total_credit_limit: f64,
    total_credit_utilized: f64,
    num_historical_failed_to_pay: f64,
    accounts_opened_24m: f64,
    num_satisfactory_accounts: f64,
    tax_liens: f64,
    public_record_bankrupt: f64,
    loan_purpose: &'static str,
    loan_amount: f64,
    term: f64,
    interest_rate: f64,
    grade: &'static str,
    sub_grade: String,
    installment: f64,
    balance: f64,
    paid_total: f64,
    paid_interest: f64,
    loan_status: &'static str,
}

fn round_to(x: f64, step: f64) -> f64 {
    (x / step).round() * step
}

/// Monthly payment of an amortized loan.
fn installment(amount: f64, annual_rate: f64, months: f64) -> f64 {
    let r = annual_rate / 100.0 / 12.0;
    amount * r / (1.0 - (1.0 + r).powf(-months))
}

/// Generates `n` loans from `seed`. The same arguments always produce the
/// same dataset.
pub fn synthetic_loans(n: usize, seed: u64) -> Result<Dataset, Error> {
    if n == 0 {
        return Err(ConfigError::InvalidParameter {
            name: "n",
            reason: "at least one loan is required".to_string(),
        }
        .into());
    }

    let delinq = poisson(0.2)?;
    let inquiries = poisson(1.9)?;
    let credit_lines = poisson(21.0)?;
    let failed = poisson(0.15)?;
    let opened = poisson(4.4)?;

    let mut s = Sampler { rng: StdRng::seed_from_u64(seed) };
    let mut loans = Vec::with_capacity(n);
    for _ in 0..n {
        let joint = s.chance(0.15);
        let annual_income = round_to(s.log_normal(11.0, 0.6), 100.0);
        let debt_to_income = s.normal(19.0, 9.0).clamp(0.0, 60.0);
        let delinq_2y = s.count(&delinq);
        let inquiries_last_12m = s.count(&inquiries);
        let total_credit_lines = s.count(&credit_lines) + 2.0;
        let open_credit_lines = (total_credit_lines * s.uniform(0.25, 0.75)).round().max(1.0);
        let total_credit_limit = round_to(s.log_normal(11.9, 0.8), 10.0);
        let total_credit_utilized = round_to(total_credit_limit * s.uniform(0.05, 0.9), 10.0);
        let num_historical_failed_to_pay = s.count(&failed);
        let public_record_bankrupt = if s.chance(0.12) { 1.0 } else { 0.0 };
        let earliest_credit_line = s.uniform(1965.0, 2015.0).floor();
        let verified_income = s.pick(VERIFIED);
        let loan_purpose = s.pick(PURPOSES);
        let term = if s.chance(0.33) { 60.0 } else { 36.0 };
        let loan_amount = round_to(s.uniform(1000.0, 40000.0), 25.0);

        let verified_effect = match verified_income {
            "Verified" => 1.6,
            "Source Verified" => 0.7,
            _ => 0.0,
        };
        let purpose_effect = match loan_purpose {
            "credit_card" => -1.0,
            "small_business" => 2.2,
            "medical" | "vacation" => 0.9,
            _ => 0.0,
        };
        let utilization = total_credit_utilized / total_credit_limit.max(1.0);
        let interest_rate = (9.0
            + 3.4 * (term - 36.0) / 24.0
            + 0.55 * inquiries_last_12m
            + 0.09 * debt_to_income
            + 1.4 * delinq_2y
            + 1.8 * num_historical_failed_to_pay
            + 0.9 * public_record_bankrupt
            + 2.5 * utilization
            - 0.6 * (annual_income / 50_000.0).ln()
            + 0.03 * (earliest_credit_line - 1995.0)
            + verified_effect
            + purpose_effect
            + s.normal(0.0, 2.5))
        .clamp(MIN_RATE, MAX_RATE);
        let interest_rate = (interest_rate * 100.0).round() / 100.0;

        let band = (((interest_rate - MIN_RATE) / (MAX_RATE - MIN_RATE)) * 6.999).floor() as usize;
        let grade = GRADES[band.min(GRADES.len() - 1)];
        let sub_grade = format!("{grade}{}", 1 + (s.uniform(0.0, 5.0) as usize).min(4));
        let monthly = installment(loan_amount, interest_rate, term);
        let months_paid = s.uniform(0.0, 4.0).floor();
        let paid_total = round_to(monthly * months_paid, 0.01);
        let paid_interest = round_to(loan_amount * interest_rate / 100.0 / 12.0 * months_paid, 0.01);
        let loan_status = if s.chance(0.93) {
            "Current"
        } else if s.chance(0.5) {
            "Fully Paid"
        } else {
            "Late (31-120 days)"
        };

        loans.push(Loan {
            emp_title: if s.chance(0.08) { None } else { Some(s.pick(EMP_TITLES)) },
            emp_length: if s.chance(0.08) { None } else { Some(s.uniform(0.0, 11.0).floor().min(10.0)) },
            state: s.pick(STATES),
            homeownership: s.pick(HOMEOWNERSHIP),
            annual_income,
            verified_income,
            debt_to_income: (debt_to_income * 100.0).round() / 100.0,
            annual_income_joint: joint.then(|| annual_income + round_to(s.log_normal(10.6, 0.7), 100.0)),
            application_type: if joint { "joint" } else { "individual" },
            delinq_2y,
            months_since_last_delinq: if delinq_2y > 0.0 || s.chance(0.4) {
                Some(s.uniform(1.0, 120.0).floor())
            } else {
                None
            },
            earliest_credit_line,
            inquiries_last_12m,
            total_credit_lines,
            open_credit_lines,
            total_credit_limit,
            total_credit_utilized,
            num_historical_failed_to_pay,
            accounts_opened_24m: s.count(&opened),
            num_satisfactory_accounts: (open_credit_lines - s.uniform(0.0, 1.5).floor()).max(0.0),
            tax_liens: if s.chance(0.01) { 1.0 } else { 0.0 },
            public_record_bankrupt,
            loan_purpose,
            loan_amount,
            term,
            interest_rate,
            grade,
            sub_grade,
            installment: round_to(monthly, 0.01),
            balance: round_to(loan_amount - (paid_total - paid_interest), 0.01),
            paid_total,
            paid_interest,
            loan_status,
        });
    }

    let num = |name: &str, f: fn(&Loan) -> f64| {
        Column::numeric(name, loans.iter().map(|l| Some(f(l))).collect())
    };
    let num_opt = |name: &str, f: fn(&Loan) -> Option<f64>| Column::numeric(name, loans.iter().map(f).collect());
    let cat = |name: &str, f: fn(&Loan) -> Option<String>| Column::categorical(name, loans.iter().map(f).collect());

    let columns = vec![
        cat("emp_title", |l| l.emp_title.map(String::from)),
        num_opt("emp_length", |l| l.emp_length),
        cat("state", |l| Some(l.state.to_string())),
        cat("homeownership", |l| Some(l.homeownership.to_string())),
        num("annual_income", |l| l.annual_income),
        cat("verified_income", |l| Some(l.verified_income.to_string())),
        num("debt_to_income", |l| l.debt_to_income),
        num_opt("annual_income_joint", |l| l.annual_income_joint),
        cat("application_type", |l| Some(l.application_type.to_string())),
        num("delinq_2y", |l| l.delinq_2y),
        num_opt("months_since_last_delinq", |l| l.months_since_last_delinq),
        num("earliest_credit_line", |l| l.earliest_credit_line),
        num("inquiries_last_12m", |l| l.inquiries_last_12m),
        num("total_credit_lines", |l| l.total_credit_lines),
        num("open_credit_lines", |l| l.open_credit_lines),
        num("total_credit_limit", |l| l.total_credit_limit),
        num("total_credit_utilized", |l| l.total_credit_utilized),
        num("num_historical_failed_to_pay", |l| l.num_historical_failed_to_pay),
        num("accounts_opened_24m", |l| l.accounts_opened_24m),
        num("num_satisfactory_accounts", |l| l.num_satisfactory_accounts),
        num("tax_liens", |l| l.tax_liens),
        num("public_record_bankrupt", |l| l.public_record_bankrupt),
        cat("loan_purpose", |l| Some(l.loan_purpose.to_string())),
        num("loan_amount", |l| l.loan_amount),
        num("term", |l| l.term),
        num("interest_rate", |l| l.interest_rate),
        cat("grade", |l| Some(l.grade.to_string())),
        cat("sub_grade", |l| Some(l.sub_grade.clone())),
        num("installment", |l| l.installment),
        num("balance", |l| l.balance),
        num("paid_total", |l| l.paid_total),
        num("paid_interest", |l| l.paid_interest),
        cat("loan_status", |l| Some(l.loan_status.to_string())),
    ];

    Ok(Dataset::new(columns, "interest_rate")?)
}
