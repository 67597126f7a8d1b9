use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use csv::{Reader, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use trade_stats_core::{first_of_month, TradeFlow, TradeRecord};

use crate::models::{AggregatedTable, DimensionEntry, DimensionKind, DimensionTable, PriceRow};
use crate::reference_files::clean_code;

/// Raw CSV row of a trade extract, before validation.
#[derive(Debug, Deserialize)]
struct TradeCsvRow {
    trade_flow: String,
    date: String,
    #[serde(default)]
    commodity_id: Option<String>,
    #[serde(default)]
    country_id: Option<String>,
    #[serde(default)]
    naics_id: Option<String>,
    #[serde(default)]
    district_id: Option<String>,
    amount: String,
    #[serde(default)]
    qty_1: Option<String>,
    #[serde(default)]
    unit_1: Option<String>,
    #[serde(default)]
    qty_2: Option<String>,
    #[serde(default)]
    unit_2: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DimensionCsvRow {
    id: i32,
    code: String,
    #[serde(default)]
    description: Option<String>,
}

pub struct CsvStorage;

impl CsvStorage {
    /// Reads a canonical trade extract.
    ///
    /// Format: trade_flow,date,commodity_id,country_id,naics_id,district_id,amount,qty_1,unit_1,qty_2,unit_2
    ///
    /// Only `trade_flow`, `date` and `amount` are required; empty id cells
    /// stay unresolved (`None`).
    ///
    /// # Errors
    /// Returns error if the file cannot be read or a row fails validation
    pub fn read_trade_records(path: impl AsRef<Path>) -> Result<Vec<TradeRecord>> {
        let path = path.as_ref();
        let mut reader = Reader::from_path(path)
            .with_context(|| format!("Failed to open trade extract: {}", path.display()))?;

        let mut records = Vec::new();
        for (index, result) in reader.deserialize::<TradeCsvRow>().enumerate() {
            // header is line 1
            let line = index + 2;
            let row = result.with_context(|| format!("{}:{line}: malformed row", path.display()))?;
            let record = parse_trade_row(row)
                .with_context(|| format!("{}:{line}: invalid trade record", path.display()))?;
            records.push(record);
        }

        tracing::debug!(path = %path.display(), rows = records.len(), "Loaded trade extract");
        Ok(records)
    }

    /// Reads a classification lookup table.
    ///
    /// Format: id,code,description
    ///
    /// # Errors
    /// Returns error if the file cannot be read or a row is malformed
    pub fn read_dimension_table(
        path: impl AsRef<Path>,
        kind: DimensionKind,
    ) -> Result<DimensionTable> {
        let path = path.as_ref();
        let mut reader = Reader::from_path(path)
            .with_context(|| format!("Failed to open {kind} table: {}", path.display()))?;

        let mut table = DimensionTable::new(kind);
        for result in reader.deserialize::<DimensionCsvRow>() {
            let row = result.with_context(|| format!("Malformed {kind} row in {}", path.display()))?;
            table.insert(DimensionEntry {
                id: row.id,
                code: clean_code(&row.code),
                description: row.description.filter(|d| !d.is_empty()),
            });
        }

        tracing::debug!(%kind, entries = table.len(), "Loaded lookup table");
        Ok(table)
    }

    /// Writes an aggregated table using its own column projection.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_aggregated(path: impl AsRef<Path>, table: &AggregatedTable) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut writer = Writer::from_writer(file);

        writer.write_record(&table.columns)?;

        for row in &table.rows {
            let record: Vec<String> = table
                .columns
                .iter()
                .map(|column| row.cell(column).map(|c| c.to_string()).unwrap_or_default())
                .collect();
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Writes the monthly price view.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_prices(path: impl AsRef<Path>, rows: &[PriceRow]) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut writer = Writer::from_writer(file);

        writer.write_record(PriceRow::COLUMNS)?;
        for row in rows {
            writer.write_record(row.to_record())?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn parse_trade_row(row: TradeCsvRow) -> Result<TradeRecord> {
    let trade_flow = TradeFlow::from_str(&row.trade_flow)?;
    let date = parse_month_date(&row.date)?;
    let amount = parse_decimal("amount", &row.amount)?;

    Ok(TradeRecord {
        trade_flow,
        date,
        commodity_id: parse_id("commodity_id", row.commodity_id.as_deref())?,
        country_id: parse_id("country_id", row.country_id.as_deref())?,
        naics_id: parse_id("naics_id", row.naics_id.as_deref())?,
        district_id: parse_id("district_id", row.district_id.as_deref())?,
        amount,
        qty_1: parse_optional_decimal("qty_1", row.qty_1.as_deref())?.unwrap_or(Decimal::ZERO),
        unit_1: non_empty(row.unit_1),
        qty_2: parse_optional_decimal("qty_2", row.qty_2.as_deref())?,
        unit_2: non_empty(row.unit_2),
    })
}

/// Parses `YYYY-MM-DD`, `YYYY-MM` or a `YYYY-MM-DD hh:mm:ss` timestamp and
/// truncates to the first of the month.
pub fn parse_month_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    let date_part = value.get(..10).unwrap_or(value);

    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d"))
        .map_err(|_| anyhow!("Invalid date: {value:?}"))?;

    Ok(first_of_month(date))
}

fn parse_id(column: &str, value: Option<&str>) -> Result<Option<i32>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse::<i32>()
            .map(Some)
            .with_context(|| format!("Invalid {column}: {v:?}")),
    }
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal> {
    let value = value.trim();
    if value.is_empty() {
        bail!("Missing {column}");
    }
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .with_context(|| format!("Invalid {column}: {value:?}"))
}

fn parse_optional_decimal(column: &str, value: Option<&str>) -> Result<Option<Decimal>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_decimal(column, v).map(Some),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
