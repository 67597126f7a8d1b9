//! `TradeDataSource` implementations.

use anyhow::Result;
use std::path::PathBuf;
use trade_stats_core::{TradeDataSource, TradeRecord, TradeSource};

use crate::csv_storage::CsvStorage;

/// Reads an already-downloaded extract from a CSV file.
#[derive(Debug, Clone)]
pub struct CsvTradeSource {
    source: TradeSource,
    path: PathBuf,
}

impl CsvTradeSource {
    #[must_use]
    pub fn new(source: TradeSource, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
        }
    }
}

impl TradeDataSource for CsvTradeSource {
    fn source(&self) -> TradeSource {
        self.source
    }

    fn load_records(&self) -> Result<Vec<TradeRecord>> {
        CsvStorage::read_trade_records(&self.path)
    }
}

/// Holds records in memory; used by tests and by callers that build the
/// extract themselves.
#[derive(Debug, Clone)]
pub struct InMemoryTradeSource {
    source: TradeSource,
    records: Vec<TradeRecord>,
}

impl InMemoryTradeSource {
    #[must_use]
    pub const fn new(source: TradeSource, records: Vec<TradeRecord>) -> Self {
        Self { source, records }
    }
}

impl TradeDataSource for InMemoryTradeSource {
    fn source(&self) -> TradeSource {
        self.source
    }

    fn load_records(&self) -> Result<Vec<TradeRecord>> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;
    use trade_stats_core::TradeFlow;

    #[test]
    fn test_in_memory_source() {
        let date = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let source = InMemoryTradeSource::new(
            TradeSource::Institute,
            vec![TradeRecord::new(TradeFlow::Import, date, dec!(5))],
        );

        assert_eq!(source.source(), TradeSource::Institute);
        assert_eq!(source.load_records().unwrap().len(), 1);
    }

    #[test]
    fn test_csv_source_missing_file() {
        let dir = tempdir().unwrap();
        let source = CsvTradeSource::new(TradeSource::PlanningBoard, dir.path().join("none.csv"));
        assert!(source.load_records().is_err());
    }
}
