//! Pre-aggregation filters: code prefix, agriculture gate and time window.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::str::FromStr;
use trade_stats_core::{first_of_month, AgricultureConfig};
use trade_stats_data::{pad_code, Dimension, DimensionTable, ReferenceData};

use crate::error::{AggregationError, Result};

/// Resolves a code prefix to the set of matching dimension ids.
///
/// A prefix that matches nothing is an error so that typos in filter
/// arguments surface immediately instead of producing an empty table.
pub fn resolve_prefix(
    dimension: Dimension,
    prefix: &str,
    reference: &ReferenceData,
) -> Result<BTreeSet<i32>> {
    let Some(kind) = dimension.lookup() else {
        return Err(AggregationError::FilterWithoutDimension {
            prefix: prefix.to_string(),
        });
    };

    let ids = reference
        .table(kind)
        .map(|table| table.ids_with_prefix(prefix.trim()))
        .unwrap_or_default();

    if ids.is_empty() {
        return Err(AggregationError::FilterNotFound {
            dimension,
            prefix: prefix.to_string(),
        });
    }
    Ok(ids)
}

/// Agriculture-only gate on 4-digit commodity prefixes.
///
/// A code passes when its first four digits are in the configured set and it
/// does not start with one of the excluded 2-digit chapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgricultureFilter {
    codes: BTreeSet<String>,
    excluded_prefixes: Vec<String>,
}

impl AgricultureFilter {
    /// Combines the configured codes with codes loaded from `codes_file`.
    #[must_use]
    pub fn new(config: &AgricultureConfig, extra_codes: impl IntoIterator<Item = String>) -> Self {
        let codes = config
            .codes
            .iter()
            .cloned()
            .chain(extra_codes)
            .map(|c| pad_code(&c, 4))
            .collect();
        Self {
            codes,
            excluded_prefixes: config.excluded_prefixes.clone(),
        }
    }

    #[must_use]
    pub fn accepts(&self, code: &str) -> bool {
        let code = code.trim();
        let Some(hs4) = code.get(..4) else {
            return false;
        };
        self.codes.contains(hs4)
            && !self
                .excluded_prefixes
                .iter()
                .any(|prefix| code.starts_with(prefix.as_str()))
    }

    /// Ids of every commodity passing the gate.
    #[must_use]
    pub fn allowed_ids(&self, commodities: &DimensionTable) -> BTreeSet<i32> {
        commodities
            .iter()
            .filter(|entry| self.accepts(&entry.code))
            .map(|entry| entry.id)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Inclusive date range applied to the first-of-month record dates.
///
/// Parsed from `"2020"` (one calendar year) or `"<start>+<end>"` where each
/// bound is `YYYY-MM-DD`, `YYYY-MM` or a bare year. A bare start year means
/// January 1, a bare end year means December 31. A start date inside a month
/// is truncated to that month's first day so the month stays included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn parse_bound(value: &str, bound: Bound, raw: &str) -> Result<NaiveDate> {
    let invalid = || AggregationError::InvalidTimeWindow(raw.to_string());
    let value = value.trim();

    if value.len() == 4 && value.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = value.parse().map_err(|_| invalid())?;
        return match bound {
            Bound::Start => NaiveDate::from_ymd_opt(year, 1, 1),
            Bound::End => NaiveDate::from_ymd_opt(year, 12, 31),
        }
        .ok_or_else(invalid);
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(match bound {
            Bound::Start => first_of_month(date),
            Bound::End => date,
        });
    }

    let month_start =
        NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").map_err(|_| invalid())?;
    match bound {
        Bound::Start => Ok(month_start),
        Bound::End => month_start
            .checked_add_months(chrono::Months::new(1))
            .and_then(|d| d.pred_opt())
            .ok_or_else(invalid),
    }
}

impl FromStr for TimeWindow {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = match s.split_once('+') {
            Some((start, end)) => (
                parse_bound(start, Bound::Start, s)?,
                parse_bound(end, Bound::End, s)?,
            ),
            None => {
                let value = s.trim();
                if value.len() != 4 {
                    return Err(AggregationError::InvalidTimeWindow(s.to_string()));
                }
                (
                    parse_bound(value, Bound::Start, s)?,
                    parse_bound(value, Bound::End, s)?,
                )
            }
        };

        if start > end {
            return Err(AggregationError::InvalidTimeWindow(s.to_string()));
        }
        Ok(Self { start, end })
    }
}
