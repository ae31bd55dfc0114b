//! Loan amortization schedules and part-payment savings for personal loan tracking.
//!
//! The engine (`loan`, `savings`, `calendar`) is a set of pure functions over a
//! `LoanProject` snapshot. With the `serde` feature (on by default) the crate
//! also provides a JSON-backed project store and a versioned export format.

pub mod calendar;
pub mod error;
pub mod format;
pub mod loan;
#[cfg(feature = "serde")]
pub mod portable;
pub mod savings;
#[cfg(feature = "serde")]
pub mod store;

pub use calendar::{paid_emis, MonthYear};
pub use error::{LoanError, LoanResult};
pub use loan::{
    calculate_emi, generate_amortization, is_truncated, schedule_cap, AmortizationRow,
    LoanProject, PartPayment,
};
pub use savings::{calculate_savings, SavingsAnalysis};

// verifies that types can be shared across threads
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<LoanProject>();
    is_normal::<AmortizationRow>();
    is_normal::<SavingsAnalysis>();
    is_normal::<LoanError>();
}
