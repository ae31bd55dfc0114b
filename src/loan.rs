use chrono::{DateTime, Utc};
use log::{trace, warn};
use std::{collections::HashMap, fmt};
use uuid::Uuid;

use crate::calendar::MonthYear;
use crate::error::{LoanError, LoanResult};
use crate::format::{format_currency_detailed, format_month_year};

/// Balances below this many currency units are treated as fully repaid.
pub const BALANCE_EPSILON: f64 = 0.01;

/// Longest tenure `validate` accepts.
pub const MAX_TENURE_YEARS: u32 = 100;

/// An extra payment against principal, recorded in `month`/`year`.
/// Its balance reduction takes effect from the following calendar month.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartPayment {
    pub id: Uuid,
    pub month: u32,
    pub year: i32,
    pub amount: f64,
}

impl PartPayment {
    pub fn new(month: u32, year: i32, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            month,
            year,
            amount,
        }
    }

    pub fn paid_in(&self) -> MonthYear {
        MonthYear::new(self.month, self.year)
    }

    pub fn effective_from(&self) -> MonthYear {
        self.paid_in().next()
    }

    pub fn validate(&self) -> LoanResult<()> {
        if !(1..=12).contains(&self.month) {
            return Err(LoanError::InvalidMonth(self.month));
        }
        if !self.amount.is_finite() || self.amount <= 0. {
            return Err(LoanError::InvalidPartPayment(self.amount));
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct LoanProject {
    pub id: Uuid,
    pub name: String,
    pub principal: f64,
    pub annual_rate: f64,
    pub tenure_years: u32,
    pub start_month: u32,
    pub start_year: i32,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub emi_override: Option<f64>,
    // interest paid before EMIs begin (partially disbursed loans); informational only
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub pre_emi_interest: Option<f64>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub pre_emi_month: Option<u32>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub pre_emi_year: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub part_payments: Vec<PartPayment>,
    #[cfg_attr(feature = "serde", serde(with = "chrono::serde::ts_milliseconds"))]
    pub created_at: DateTime<Utc>,
}

impl LoanProject {
    pub fn new(
        name: &str,
        principal: f64,
        annual_rate: f64,
        tenure_years: u32,
        start_month: u32,
        start_year: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            principal,
            annual_rate,
            tenure_years,
            start_month,
            start_year,
            emi_override: None,
            pre_emi_interest: None,
            pre_emi_month: None,
            pre_emi_year: None,
            part_payments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_emi_override(mut self, emi: f64) -> Self {
        self.emi_override = Some(emi);
        self
    }

    pub fn with_part_payment(mut self, month: u32, year: i32, amount: f64) -> Self {
        self.part_payments.push(PartPayment::new(month, year, amount));
        self
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate / 12. / 100.
    }

    pub fn scheduled_months(&self) -> u32 {
        self.tenure_years.saturating_mul(12)
    }

    pub fn start(&self) -> MonthYear {
        MonthYear::new(self.start_month, self.start_year)
    }

    pub fn calculated_emi(&self) -> f64 {
        calculate_emi(self.principal, self.annual_rate, self.tenure_years)
    }

    /// The instalment actually charged each month. An override only counts
    /// when it is strictly positive; zero or negative falls back to the
    /// computed EMI.
    pub fn emi(&self) -> f64 {
        match self.emi_override {
            Some(emi) if emi > 0. => emi,
            _ => self.calculated_emi(),
        }
    }

    /// Checks the preconditions the amortization functions rely on.
    /// The engine itself never calls this.
    pub fn validate(&self) -> LoanResult<()> {
        if !self.principal.is_finite() || self.principal <= 0. {
            return Err(LoanError::InvalidPrincipal(self.principal));
        }
        if !self.annual_rate.is_finite() || self.annual_rate < 0. {
            return Err(LoanError::InvalidRate(self.annual_rate));
        }
        if self.tenure_years == 0 || self.tenure_years > MAX_TENURE_YEARS {
            return Err(LoanError::InvalidTenure(self.tenure_years));
        }
        if !(1..=12).contains(&self.start_month) {
            return Err(LoanError::InvalidMonth(self.start_month));
        }
        if let Some(emi) = self.emi_override {
            if !emi.is_finite() || emi < 0. {
                return Err(LoanError::InvalidEmiOverride(emi));
            }
        }
        if let Some(month) = self.pre_emi_month {
            if !(1..=12).contains(&month) {
                return Err(LoanError::InvalidMonth(month));
            }
        }
        self.part_payments.iter().try_for_each(PartPayment::validate)
    }
}

/// One month of an amortization schedule.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "camelCase")
)]
pub struct AmortizationRow {
    pub month_index: u32,
    pub month: u32,
    pub year: i32,
    /// after any part-payment effect, before interest
    pub opening_balance: f64,
    pub emi: f64,
    pub interest: f64,
    pub principal: f64,
    /// amount paid in this month; its effect lands next month
    pub part_payment: f64,
    pub closing_balance: f64,
}

impl AmortizationRow {
    pub fn period(&self) -> MonthYear {
        MonthYear::new(self.month, self.year)
    }
}

impl fmt::Display for AmortizationRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "month {} ({}), opening {}, emi {}, interest {}, principal {}, part payment {}, closing {}",
            self.month_index + 1,
            format_month_year(self.month, self.year),
            format_currency_detailed(self.opening_balance),
            format_currency_detailed(self.emi),
            format_currency_detailed(self.interest),
            format_currency_detailed(self.principal),
            format_currency_detailed(self.part_payment),
            format_currency_detailed(self.closing_balance)
        )
    }
}

/// Fixed monthly instalment under monthly reducing-balance amortization.
///
/// `tenure_years` must be positive; with zero tenure the result is not a number.
pub fn calculate_emi(principal: f64, annual_rate: f64, tenure_years: u32) -> f64 {
    let rate = annual_rate / 12. / 100.;
    let months = f64::from(tenure_years) * 12.;

    if rate == 0. {
        return principal / months;
    }
    let factor = (1. + rate).powf(months);
    (principal * rate * factor) / (factor - 1.)
}

/// Upper bound on the number of rows `generate_amortization` returns.
pub fn schedule_cap(project: &LoanProject) -> u32 {
    project.scheduled_months().saturating_mul(2)
}

/// True when the schedule stopped at its cap with principal still owing,
/// i.e. the EMI never amortizes the loan.
pub fn is_truncated(project: &LoanProject, rows: &[AmortizationRow]) -> bool {
    rows.len() as u32 >= schedule_cap(project)
        && rows.last().is_some_and(|row| row.closing_balance > 0.)
}

/// Month-by-month schedule for `project`, with or without its part payments.
///
/// Stops once the balance is repaid or after `schedule_cap` months, whichever
/// comes first. A non-amortizing EMI yields a full-length schedule whose
/// balance never reaches zero (see `is_truncated`).
pub fn generate_amortization(
    project: &LoanProject,
    include_part_payments: bool,
) -> Vec<AmortizationRow> {
    let rate = project.monthly_rate();
    let emi = project.emi();
    let cap = schedule_cap(project);

    let (paid_in, effective) = if include_part_payments {
        part_payment_maps(&project.part_payments)
    } else {
        (HashMap::new(), HashMap::new())
    };

    let mut rows: Vec<AmortizationRow> = Vec::new();
    let mut balance = project.principal;
    let mut period = project.start();
    let mut month_index = 0;

    while month_index < cap && balance > BALANCE_EPSILON {
        // part payments made last month reduce the balance before interest accrues
        let pp_effect = effective.get(&period).copied().unwrap_or(0.).min(balance);
        balance = settle(balance - pp_effect);
        if balance == 0. {
            trace!("{} repaid by part payment of {}", period, pp_effect);
            break;
        }

        let interest = balance * rate;
        let mut principal = emi - interest;
        let mut applied_emi = emi;
        if principal > balance {
            principal = balance;
            applied_emi = balance + interest;
        }
        let closing_balance = settle(balance - principal);

        trace!(
            "month {} {}, opening {}, interest {}, principal {}, closing {}",
            month_index,
            period,
            balance,
            interest,
            principal,
            closing_balance
        );

        rows.push(AmortizationRow {
            month_index,
            month: period.month,
            year: period.year,
            opening_balance: balance,
            emi: applied_emi,
            interest,
            principal,
            part_payment: paid_in.get(&period).copied().unwrap_or(0.),
            closing_balance,
        });

        balance = closing_balance;
        period = period.next();
        month_index += 1;
    }

    if balance > BALANCE_EPSILON && month_index == cap {
        warn!(
            "schedule for '{}' stopped after {} months with {:.2} still owing; EMI {:.2} does not amortize the loan",
            project.name, cap, balance, emi
        );
    }
    rows
}

// (paid-in totals for display, effective-month totals for balance reduction)
fn part_payment_maps(
    part_payments: &[PartPayment],
) -> (HashMap<MonthYear, f64>, HashMap<MonthYear, f64>) {
    let mut paid_in = HashMap::new();
    let mut effective = HashMap::new();

    for pp in part_payments {
        *paid_in.entry(pp.paid_in()).or_insert(0.) += pp.amount;
        *effective.entry(pp.effective_from()).or_insert(0.) += pp.amount;
    }
    (paid_in, effective)
}

fn settle(balance: f64) -> f64 {
    if balance < BALANCE_EPSILON {
        0.
    } else {
        balance
    }
}
