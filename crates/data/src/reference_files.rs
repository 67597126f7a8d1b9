//! Loading of reference data from the external-data directory.

use anyhow::{bail, Context, Result};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::path::Path;

use crate::csv_storage::CsvStorage;
use crate::models::{DimensionKind, ReferenceData};

/// Loads every `<kind>.csv` lookup table present in `dir`.
///
/// Missing files are skipped; the aggregation call reports a missing table
/// only if the requested dimension needs it.
///
/// # Errors
/// Returns an error if a present file fails to parse.
pub fn load_reference_data(dir: impl AsRef<Path>) -> Result<ReferenceData> {
    let dir = dir.as_ref();
    let mut reference = ReferenceData::new();

    for kind in DimensionKind::all() {
        let path = dir.join(format!("{}.csv", kind.file_stem()));
        if path.exists() {
            reference.insert(CsvStorage::read_dimension_table(&path, kind)?);
        } else {
            tracing::debug!(%kind, path = %path.display(), "No lookup table file");
        }
    }

    Ok(reference)
}

/// Loads agriculture commodity prefixes from a JSON file.
///
/// Accepts either an array or an object whose values are the codes; codes may
/// be numbers or strings and are zero-padded to 4 digits.
///
/// # Errors
/// Returns an error if the file cannot be read or is not an array/object.
pub fn load_agriculture_codes(path: impl AsRef<Path>) -> Result<BTreeSet<String>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read agriculture codes: {}", path.display()))?;
    let json: JsonValue = serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    let values: Vec<&JsonValue> = match &json {
        JsonValue::Array(items) => items.iter().collect(),
        JsonValue::Object(map) => map.values().collect(),
        _ => bail!("Expected an array or object of codes in {}", path.display()),
    };

    let codes = values
        .into_iter()
        .filter_map(|value| match value {
            JsonValue::String(s) => Some(s.trim().to_string()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|code| !code.is_empty())
        .map(|code| pad_code(&code, 4))
        .collect();

    Ok(codes)
}

/// Strips stray quote characters and whitespace from a classification code.
#[must_use]
pub fn clean_code(code: &str) -> String {
    code.chars()
        .filter(|c| *c != '\'' && !c.is_whitespace())
        .collect()
}

/// Cleans a code and left-pads it with zeros.
#[must_use]
pub fn pad_code(code: &str, width: usize) -> String {
    let cleaned = clean_code(code);
    format!("{cleaned:0>width$}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_clean_code() {
        assert_eq!(clean_code("'0101 "), "0101");
        assert_eq!(clean_code("8703"), "8703");
    }

    #[test]
    fn test_pad_code() {
        assert_eq!(pad_code("101", 4), "0101");
        assert_eq!(pad_code("'0101210000", 10), "0101210000");
        assert_eq!(pad_code(" 12 ", 4), "0012");
        assert_eq!(pad_code("87032", 4), "87032");
    }

    #[test]
    fn test_load_agriculture_codes_from_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("code_agr.json");
        std::fs::write(&path, r#"{"0": 101, "1": "0201", "2": 601}"#).unwrap();

        let codes = load_agriculture_codes(&path).unwrap();
        assert_eq!(
            codes,
            BTreeSet::from(["0101".to_string(), "0201".to_string(), "0601".to_string()])
        );
    }

    #[test]
    fn test_load_agriculture_codes_rejects_scalar() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "42").unwrap();
        assert!(load_agriculture_codes(&path).is_err());
    }

    #[test]
    fn test_load_reference_data_skips_missing_files() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("commodity.csv"),
            "id,code,description\n1,0101210000,Horses\n",
        )
        .unwrap();

        let reference = load_reference_data(dir.path()).unwrap();
        assert_eq!(reference.kinds(), vec![DimensionKind::Commodity]);
        assert_eq!(
            reference
                .table(DimensionKind::Commodity)
                .and_then(|t| t.code(1)),
            Some("0101210000")
        );
    }
}
