use chrono::{Datelike, NaiveDate};
use std::fmt;

use crate::format::format_month_year;
use crate::loan::LoanProject;

/// A calendar month, ordered year first. Used as the key for part-payment
/// lookups and as the position of each amortization row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonthYear {
    pub year: i32,
    pub month: u32,
}

impl MonthYear {
    pub fn new(month: u32, year: i32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: &NaiveDate) -> Self {
        Self::new(date.month(), date.year())
    }

    /// The following calendar month; December rolls into January of the next year.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self::new(1, self.year + 1)
        } else {
            Self::new(self.month + 1, self.year)
        }
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_month_year(self.month, self.year))
    }
}

/// Number of scheduled EMIs whose month falls on or before `today`'s month.
///
/// Walks the nominal schedule (start month through `tenure_years * 12` months)
/// and stops at the first month in the future. No interest is involved.
pub fn paid_emis(project: &LoanProject, today: &NaiveDate) -> u32 {
    let current = MonthYear::from_date(today);
    let mut pos = project.start();
    let mut count = 0;

    for _ in 0..project.scheduled_months() {
        if pos > current {
            break;
        }
        count += 1;
        pos = pos.next();
    }
    count
}
