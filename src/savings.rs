use log::debug;

use crate::calendar::MonthYear;
use crate::loan::{generate_amortization, AmortizationRow, LoanProject};

/// Interest and tenure with part payments, compared against the plain schedule.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "camelCase")
)]
pub struct SavingsAnalysis {
    pub original_total_interest: f64,
    pub reduced_total_interest: f64,
    pub interest_saved: f64,
    pub original_tenure_months: u32,
    pub reduced_tenure_months: u32,
    pub months_saved: i64,
    // None only when the schedule has no rows at all
    pub original_end_date: Option<MonthYear>,
    pub reduced_end_date: Option<MonthYear>,
}

pub fn calculate_savings(project: &LoanProject) -> SavingsAnalysis {
    let without_pp = generate_amortization(project, false);
    let with_pp = generate_amortization(project, true);

    let original_total_interest = total_interest(&without_pp);
    let reduced_total_interest = total_interest(&with_pp);
    let original_tenure_months = without_pp.len() as u32;
    let reduced_tenure_months = with_pp.len() as u32;

    debug!(
        "savings for '{}': {} -> {} months, interest {:.2} -> {:.2}",
        project.name,
        original_tenure_months,
        reduced_tenure_months,
        original_total_interest,
        reduced_total_interest
    );

    SavingsAnalysis {
        original_total_interest,
        reduced_total_interest,
        interest_saved: original_total_interest - reduced_total_interest,
        original_tenure_months,
        reduced_tenure_months,
        months_saved: i64::from(original_tenure_months) - i64::from(reduced_tenure_months),
        original_end_date: without_pp.last().map(AmortizationRow::period),
        reduced_end_date: with_pp.last().map(AmortizationRow::period),
    }
}

fn total_interest(rows: &[AmortizationRow]) -> f64 {
    rows.iter().map(|row| row.interest).sum()
}

#[cfg(test)]
mod tests {
    use super::calculate_savings;
    use crate::calendar::MonthYear;
    use crate::loan::LoanProject;
    use approx::assert_relative_eq;
    use test_log::test;

    #[test]
    fn test_no_part_payments_saves_nothing() {
        let loan = LoanProject::new("home", 2500000., 8.5, 15, 4, 2022);
        let savings = calculate_savings(&loan);

        assert_eq!(savings.original_tenure_months, 180);
        assert_eq!(savings.reduced_tenure_months, 180);
        assert_eq!(savings.months_saved, 0);
        assert_eq!(savings.interest_saved, 0.);
        assert_eq!(savings.original_end_date, Some(MonthYear::new(3, 2037)));
        assert_eq!(savings.original_end_date, savings.reduced_end_date);
    }

    #[test]
    fn test_part_payment_shortens_loan() {
        let loan = LoanProject::new("home", 1000000., 10., 20, 1, 2024)
            .with_part_payment(12, 2024, 100000.);
        let savings = calculate_savings(&loan);

        assert_eq!(savings.original_tenure_months, 240);
        assert!(savings.reduced_tenure_months < 240);
        assert_eq!(
            savings.months_saved,
            240 - i64::from(savings.reduced_tenure_months)
        );
        assert!(savings.interest_saved > 0.);
        assert_relative_eq!(
            savings.interest_saved,
            savings.original_total_interest - savings.reduced_total_interest
        );
        assert!(savings.reduced_end_date < savings.original_end_date);
    }

    #[test]
    fn test_savings_are_monotonic() {
        let bases = [
            LoanProject::new("home", 4000000., 9.1, 25, 6, 2021),
            LoanProject::new("car", 800000., 11.5, 5, 2, 2023),
            LoanProject::new("interest free", 60000., 0., 1, 10, 2024),
            LoanProject::new("fast payer", 1500000., 7.2, 10, 1, 2024).with_emi_override(40000.),
        ];
        for base in bases {
            let start = base.start();
            for (offset, amount) in [(0, 1.), (3, 5000.), (10, 250000.), (30, 10000000.)] {
                let mut paid_in = start;
                for _ in 0..offset {
                    paid_in = paid_in.next();
                }
                let loan = base.clone().with_part_payment(paid_in.month, paid_in.year, amount);
                let savings = calculate_savings(&loan);

                assert!(savings.reduced_tenure_months <= savings.original_tenure_months);
                assert!(savings.reduced_total_interest <= savings.original_total_interest);
                assert!(savings.months_saved >= 0);
            }
        }
    }
}
