use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a trade record. Every aggregation path branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeFlow {
    Import,
    Export,
}

impl TradeFlow {
    /// Maps the numeric flow id used by the source tables (1 = imports, 2 = exports).
    #[must_use]
    pub const fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Self::Import),
            2 => Some(Self::Export),
            _ => None,
        }
    }

    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Import => 1,
            Self::Export => 2,
        }
    }
}

impl FromStr for TradeFlow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "i" | "import" | "imports" => Ok(Self::Import),
            "2" | "e" | "export" | "exports" => Ok(Self::Export),
            other => Err(anyhow!("Unknown trade flow: {other}")),
        }
    }
}

impl fmt::Display for TradeFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::Export => write!(f, "export"),
        }
    }
}

/// Government feed a fact table was pulled from.
///
/// The institute feed carries commodity and country classifications only;
/// the planning-board feed adds NAICS and customs-district ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSource {
    Institute,
    PlanningBoard,
}

impl TradeSource {
    #[must_use]
    pub const fn has_naics(self) -> bool {
        matches!(self, Self::PlanningBoard)
    }

    #[must_use]
    pub const fn has_district(self) -> bool {
        matches!(self, Self::PlanningBoard)
    }
}

impl FromStr for TradeSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "institute" | "org" => Ok(Self::Institute),
            "planning_board" | "planning-board" | "jp" => Ok(Self::PlanningBoard),
            other => Err(anyhow!("Unknown trade source: {other}")),
        }
    }
}

impl fmt::Display for TradeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Institute => write!(f, "institute"),
            Self::PlanningBoard => write!(f, "planning_board"),
        }
    }
}

/// One raw trade row as handed over by the ingestion collaborator.
///
/// Dimension ids are foreign keys into the classification tables and stay
/// `None` when the source value could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_flow: TradeFlow,
    /// Normalized to the first day of the month
    pub date: NaiveDate,
    pub commodity_id: Option<i32>,
    pub country_id: Option<i32>,
    pub naics_id: Option<i32>,
    pub district_id: Option<i32>,
    pub amount: Decimal,
    pub qty_1: Decimal,
    pub unit_1: Option<String>,
    pub qty_2: Option<Decimal>,
    pub unit_2: Option<String>,
}

impl TradeRecord {
    /// Creates a record with no classification ids and no quantities.
    #[must_use]
    pub fn new(trade_flow: TradeFlow, date: NaiveDate, amount: Decimal) -> Self {
        Self {
            trade_flow,
            date: first_of_month(date),
            commodity_id: None,
            country_id: None,
            naics_id: None,
            district_id: None,
            amount,
            qty_1: Decimal::ZERO,
            unit_1: None,
            qty_2: None,
            unit_2: None,
        }
    }

    #[must_use]
    pub fn with_commodity(mut self, id: i32) -> Self {
        self.commodity_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_country(mut self, id: i32) -> Self {
        self.country_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_naics(mut self, id: i32) -> Self {
        self.naics_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_district(mut self, id: i32) -> Self {
        self.district_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_quantity(mut self, qty: Decimal, unit: &str) -> Self {
        self.qty_1 = qty;
        self.unit_1 = Some(unit.to_string());
        self
    }

    #[must_use]
    pub fn with_second_quantity(mut self, qty: Decimal, unit: Option<&str>) -> Self {
        self.qty_2 = Some(qty);
        self.unit_2 = unit.map(str::to_string);
        self
    }

    #[must_use]
    pub const fn is_import(&self) -> bool {
        matches!(self.trade_flow, TradeFlow::Import)
    }
}

/// Truncates a date to the first day of its month.
#[must_use]
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trade_flow_ids() {
        assert_eq!(TradeFlow::from_id(1), Some(TradeFlow::Import));
        assert_eq!(TradeFlow::from_id(2), Some(TradeFlow::Export));
        assert_eq!(TradeFlow::from_id(3), None);
        assert_eq!(TradeFlow::Export.id(), 2);
    }

    #[test]
    fn test_trade_flow_parse() {
        assert_eq!("Imports".parse::<TradeFlow>().unwrap(), TradeFlow::Import);
        assert_eq!("2".parse::<TradeFlow>().unwrap(), TradeFlow::Export);
        assert!("both".parse::<TradeFlow>().is_err());
    }

    #[test]
    fn test_source_capabilities() {
        assert!(!TradeSource::Institute.has_naics());
        assert!(TradeSource::PlanningBoard.has_naics());
        assert_eq!("jp".parse::<TradeSource>().unwrap(), TradeSource::PlanningBoard);
    }

    #[test]
    fn test_record_date_normalized_to_first_of_month() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();
        let record = TradeRecord::new(TradeFlow::Import, date, dec!(100))
            .with_commodity(7)
            .with_quantity(dec!(10), "kg");

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2021, 3, 1).unwrap());
        assert_eq!(record.commodity_id, Some(7));
        assert_eq!(record.unit_1.as_deref(), Some("kg"));
        assert!(record.is_import());
        assert!(record.qty_2.is_none());
    }
}
