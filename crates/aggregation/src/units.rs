//! Unit Converter: raw `(quantity, unit)` pairs to kilogram-equivalents.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;
use trade_stats_core::{FactorOp, TradeRecord, UnitConfig, UnitFactor};

use crate::error::{AggregationError, Result};

/// Case-insensitive conversion table built from [`UnitConfig`].
///
/// Unknown codes and missing units pass the quantity through unchanged so
/// volume is never silently lost from totals.
#[derive(Debug, Clone)]
pub struct UnitConverter {
    factors: BTreeMap<String, UnitFactor>,
}

impl UnitConverter {
    /// Builds the converter, rejecting zero divisors.
    ///
    /// Codes that collide once lowercased resolve to the entry that differs
    /// from the built-in default, so `M3` configured over the default `m3`
    /// wins. Two conflicting non-default entries are rejected.
    ///
    /// Logs a warning for every disputed code still present in the table.
    pub fn from_config(config: &UnitConfig) -> Result<Self> {
        let defaults = UnitConfig::default().factors;
        let is_default = |code: &str, factor: &UnitFactor| defaults.get(code) == Some(factor);

        let mut entries: BTreeMap<String, (&str, UnitFactor)> = BTreeMap::new();
        for (code, factor) in &config.factors {
            if factor.op == FactorOp::Divide && factor.factor.is_zero() {
                return Err(AggregationError::DataValidation(format!(
                    "unit '{code}' divides by zero"
                )));
            }
            let key = normalize_code(code);
            match entries.get(&key).copied() {
                Some((_, existing)) if existing == *factor => {}
                Some((existing_code, existing)) => {
                    if is_default(existing_code, &existing) {
                        entries.insert(key, (code.as_str(), *factor));
                    } else if !is_default(code, factor) {
                        return Err(AggregationError::DataValidation(format!(
                            "unit '{code}' conflicts with '{existing_code}'"
                        )));
                    }
                }
                None => {
                    entries.insert(key, (code.as_str(), *factor));
                }
            }
        }
        let factors: BTreeMap<String, UnitFactor> = entries
            .into_iter()
            .map(|(key, (_, factor))| (key, factor))
            .collect();

        for code in &config.disputed {
            if let Some(factor) = factors.get(&normalize_code(code)) {
                warn!(
                    unit = %code,
                    factor = %factor.factor,
                    op = ?factor.op,
                    "Conversion factor is disputed across source revisions, confirm before publishing"
                );
            }
        }

        Ok(Self { factors })
    }

    /// Returns true if the code has an entry in the table.
    #[must_use]
    pub fn is_known(&self, unit: &str) -> bool {
        self.factors.contains_key(&normalize_code(unit))
    }

    #[must_use]
    pub fn factor(&self, unit: &str) -> Option<UnitFactor> {
        self.factors.get(&normalize_code(unit)).copied()
    }

    /// Resolved table entries keyed by lowercased code.
    pub fn factors(&self) -> impl Iterator<Item = (&str, UnitFactor)> {
        self.factors.iter().map(|(code, factor)| (code.as_str(), *factor))
    }

    /// Converts one quantity. `None` or unrecognized units are identity.
    #[must_use]
    pub fn convert(&self, quantity: Decimal, unit: Option<&str>) -> Decimal {
        let Some(factor) = unit.and_then(|u| self.factor(u)) else {
            return quantity;
        };
        match factor.op {
            FactorOp::Multiply => quantity * factor.factor,
            FactorOp::Divide => quantity / factor.factor,
        }
    }

    /// Sum of both quantity pairs of a record.
    ///
    /// A missing second quantity contributes zero. A second quantity without
    /// its own unit is converted with the first unit.
    #[must_use]
    pub fn canonical_quantity(&self, record: &TradeRecord) -> Decimal {
        let first = self.convert(record.qty_1, record.unit_1.as_deref());
        let second = record.qty_2.map_or(Decimal::ZERO, |qty| {
            let unit = record.unit_2.as_deref().or(record.unit_1.as_deref());
            self.convert(qty, unit)
        });
        first + second
    }

    /// Unit codes of a record that are not in the table.
    pub fn unknown_units<'a>(&'a self, record: &'a TradeRecord) -> impl Iterator<Item = &'a str> {
        [record.unit_1.as_deref(), record.unit_2.as_deref()]
            .into_iter()
            .flatten()
            .filter(move |u| !u.trim().is_empty() && !self.is_known(u))
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use trade_stats_core::TradeFlow;

    fn converter() -> UnitConverter {
        UnitConverter::from_config(&UnitConfig::default()).unwrap()
    }

    fn record() -> TradeRecord {
        TradeRecord::new(
            TradeFlow::Import,
            NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
            dec!(100),
        )
    }

    #[test]
    fn test_kg_is_identity_and_case_insensitive() {
        let c = converter();
        assert_eq!(c.convert(dec!(12.5), Some("kg")), dec!(12.5));
        assert_eq!(c.convert(dec!(12.5), Some("KG")), dec!(12.5));
        assert_eq!(c.convert(dec!(12.5), Some(" Kg ")), dec!(12.5));
    }

    #[test]
    fn test_zero_converts_to_zero_for_every_unit() {
        let c = converter();
        for unit in ["kg", "l", "doz", "m3", "t", "kts", "pfl", "gm", "bbl"] {
            assert_eq!(c.convert(Decimal::ZERO, Some(unit)), Decimal::ZERO, "{unit}");
        }
    }

    #[test]
    fn test_default_factors() {
        let c = converter();
        assert_eq!(c.convert(dec!(0.756), Some("doz")), dec!(1));
        assert_eq!(c.convert(dec!(2), Some("t")), dec!(1814.370));
        assert_eq!(c.convert(dec!(1), Some("m3")), dec!(907.1847));
        assert_eq!(c.convert(dec!(1000), Some("pfl")), dec!(789.000));
        assert_eq!(c.convert(dec!(1000), Some("gm")), dec!(1.000));
    }

    #[test]
    fn test_unknown_and_missing_units_pass_through() {
        let c = converter();
        assert_eq!(c.convert(dec!(7), Some("bbl")), dec!(7));
        assert_eq!(c.convert(dec!(7), None), dec!(7));
        assert!(!c.is_known("bbl"));
    }

    #[test]
    fn test_zero_divisor_rejected() {
        let mut config = UnitConfig::default();
        config
            .factors
            .insert("doz".to_string(), UnitFactor::divide(Decimal::ZERO));
        assert!(matches!(
            UnitConverter::from_config(&config),
            Err(AggregationError::DataValidation(_))
        ));
    }

    #[test]
    fn test_config_overrides_disputed_factor() {
        let mut config = UnitConfig::default();
        config
            .factors
            .insert("M3".to_string(), UnitFactor::multiply(dec!(1560)));
        let c = UnitConverter::from_config(&config).unwrap();
        assert_eq!(c.convert(dec!(1), Some("m3")), dec!(1560));
    }

    #[test]
    fn test_uppercase_override_wins_over_default() {
        let mut config = UnitConfig::default();
        config
            .factors
            .insert("GM".to_string(), UnitFactor::multiply(dec!(0.002)));
        let c = UnitConverter::from_config(&config).unwrap();
        assert_eq!(c.convert(dec!(1000), Some("gm")), dec!(2.000));
        assert_eq!(c.convert(dec!(1000), Some("GM")), dec!(2.000));
        assert_eq!(c.factors().filter(|(code, _)| *code == "gm").count(), 1);
        assert!(c.factors().all(|(code, _)| code != "GM"));
    }

    #[test]
    fn test_conflicting_overrides_rejected() {
        let mut config = UnitConfig::default();
        config
            .factors
            .insert("M3".to_string(), UnitFactor::multiply(dec!(1560)));
        config
            .factors
            .insert("m3".to_string(), UnitFactor::multiply(dec!(1000)));
        assert!(matches!(
            UnitConverter::from_config(&config),
            Err(AggregationError::DataValidation(_))
        ));
    }

    #[test]
    fn test_canonical_quantity_sums_both_pairs() {
        let c = converter();
        let r = record()
            .with_quantity(dec!(10), "kg")
            .with_second_quantity(dec!(2), Some("t"));
        assert_eq!(c.canonical_quantity(&r), dec!(1824.370));
    }

    #[test]
    fn test_canonical_quantity_missing_second_pair() {
        let c = converter();
        let r = record().with_quantity(dec!(10), "kg");
        assert_eq!(c.canonical_quantity(&r), dec!(10));
    }

    #[test]
    fn test_second_quantity_defaults_to_first_unit() {
        let c = converter();
        let r = record()
            .with_quantity(dec!(1), "t")
            .with_second_quantity(dec!(1), None);
        assert_eq!(c.canonical_quantity(&r), dec!(1814.370));
    }

    #[test]
    fn test_unknown_units_listed() {
        let c = converter();
        let r = record()
            .with_quantity(dec!(1), "bbl")
            .with_second_quantity(dec!(1), Some("kg"));
        assert_eq!(c.unknown_units(&r).collect::<Vec<_>>(), vec!["bbl"]);
    }
}
