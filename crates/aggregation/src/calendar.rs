//! Calendar Deriver: year, month, quarter and July-start fiscal year.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use trade_stats_data::{PeriodKey, TimeGranularity};

/// First month of the fiscal year.
pub const FISCAL_START_MONTH: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarFields {
    pub year: i32,
    pub month: u32,
    pub quarter: u32,
    pub fiscal_year: i32,
}

impl CalendarFields {
    /// Time part of the grouping key for a granularity.
    #[must_use]
    pub const fn period(&self, granularity: TimeGranularity) -> PeriodKey {
        match granularity {
            TimeGranularity::Yearly => PeriodKey::Yearly { year: self.year },
            TimeGranularity::Fiscal => PeriodKey::Fiscal {
                fiscal_year: self.fiscal_year,
            },
            TimeGranularity::Quarterly => PeriodKey::Quarterly {
                year: self.year,
                quarter: self.quarter,
            },
            TimeGranularity::Monthly => PeriodKey::Monthly {
                year: self.year,
                month: self.month,
            },
        }
    }
}

#[must_use]
pub fn derive(date: NaiveDate) -> CalendarFields {
    let year = date.year();
    let month = date.month();
    CalendarFields {
        year,
        month,
        quarter: quarter_of(month),
        fiscal_year: if month >= FISCAL_START_MONTH {
            year + 1
        } else {
            year
        },
    }
}

/// Calendar quarter for months 1..=12 (1-3 -> 1, 4-6 -> 2, 7-9 -> 3, 10-12 -> 4).
#[must_use]
pub const fn quarter_of(month: u32) -> u32 {
    (month.saturating_sub(1)) / 3 + 1
}
