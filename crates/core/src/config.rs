use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub units: UnitConfig,
    pub agriculture: AgricultureConfig,
    pub ingest: IngestConfig,
    pub reference: ReferenceConfig,
    pub output: OutputConfig,
}

/// How a unit factor is applied to a raw quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorOp {
    #[default]
    Multiply,
    Divide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFactor {
    pub factor: Decimal,
    #[serde(default)]
    pub op: FactorOp,
}

impl UnitFactor {
    #[must_use]
    pub const fn multiply(factor: Decimal) -> Self {
        Self {
            factor,
            op: FactorOp::Multiply,
        }
    }

    #[must_use]
    pub const fn divide(factor: Decimal) -> Self {
        Self {
            factor,
            op: FactorOp::Divide,
        }
    }
}

/// Conversion table from source unit codes to kilogram-equivalents.
///
/// Keys are matched case-insensitively. `disputed` lists codes whose factor
/// differs between historical revisions of the source data and still needs
/// domain-expert confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConfig {
    pub factors: BTreeMap<String, UnitFactor>,
    pub disputed: Vec<String>,
}

impl Default for UnitConfig {
    fn default() -> Self {
        let factors = [
            ("kg", UnitFactor::multiply(Decimal::ONE)),
            ("l", UnitFactor::multiply(Decimal::ONE)),
            ("doz", UnitFactor::divide(Decimal::new(756, 3))),
            ("m3", UnitFactor::multiply(Decimal::new(9_071_847, 4))),
            ("t", UnitFactor::multiply(Decimal::new(907_185, 3))),
            ("kts", UnitFactor::multiply(Decimal::ONE)),
            ("pfl", UnitFactor::multiply(Decimal::new(789, 3))),
            ("gm", UnitFactor::multiply(Decimal::new(1, 3))),
        ]
        .into_iter()
        .map(|(code, factor)| (code.to_string(), factor))
        .collect();

        Self {
            factors,
            disputed: vec!["m3".to_string(), "gm".to_string()],
        }
    }
}

/// Agriculture-only gate applied before aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgricultureConfig {
    /// 4-digit commodity prefixes considered agricultural
    pub codes: BTreeSet<String>,
    /// Optional JSON file with additional codes (object values or array)
    pub codes_file: Option<PathBuf>,
    /// 2-digit prefixes excluded even when listed in `codes`
    pub excluded_prefixes: Vec<String>,
}

impl Default for AgricultureConfig {
    fn default() -> Self {
        Self {
            codes: BTreeSet::new(),
            codes_file: None,
            excluded_prefixes: vec!["05".to_string(), "06".to_string(), "14".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Drop rows whose canonical quantity resolves to zero
    pub exclude_zero_quantity: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            exclude_zero_quantity: true,
        }
    }
}

/// Location of the classification lookup tables (`id,code,description` CSVs).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub directory: PathBuf,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data/external"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data/processed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_unit_table() {
        let units = UnitConfig::default();

        assert_eq!(units.factors.len(), 8);
        assert_eq!(units.factors["kg"], UnitFactor::multiply(dec!(1)));
        assert_eq!(units.factors["doz"], UnitFactor::divide(dec!(0.756)));
        assert_eq!(units.factors["m3"].factor, dec!(907.1847));
        assert_eq!(units.factors["t"].factor, dec!(907.185));
        assert_eq!(units.factors["gm"].factor, dec!(0.001));
        assert_eq!(units.disputed, vec!["m3", "gm"]);
    }

    #[test]
    fn test_default_agriculture_exclusions() {
        let agriculture = AgricultureConfig::default();
        assert!(agriculture.codes.is_empty());
        assert_eq!(agriculture.excluded_prefixes, vec!["05", "06", "14"]);
    }

    #[test]
    fn test_unit_factor_deserializes_with_default_op() {
        let factor: UnitFactor = serde_json::from_str(r#"{"factor": 1560}"#).unwrap();
        assert_eq!(factor, UnitFactor::multiply(dec!(1560)));

        let factor: UnitFactor =
            serde_json::from_str(r#"{"factor": "0.756", "op": "divide"}"#).unwrap();
        assert_eq!(factor, UnitFactor::divide(dec!(0.756)));
    }
}
