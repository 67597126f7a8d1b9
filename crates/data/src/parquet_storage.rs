use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Decimal128Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use crate::models::{AggregatedTable, Cell, VALUE_COLUMNS};

const DECIMAL_PRECISION: u8 = 38;
const DECIMAL_SCALE: i8 = 4;

pub struct ParquetStorage;

impl ParquetStorage {
    /// Writes an aggregated table to a Parquet file, one column per entry of
    /// the table's projection.
    ///
    /// Period and id columns are `Int64`, labels `Utf8`, and value columns
    /// `Decimal128(38, 4)`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or if writing to the Parquet file fails.
    pub fn write_aggregated(path: impl AsRef<Path>, table: &AggregatedTable) -> Result<()> {
        let mut fields = Vec::with_capacity(table.columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns.len());

        for column in &table.columns {
            let data_type = column_type(column);
            let cells: Vec<Option<Cell>> = table.rows.iter().map(|r| r.cell(column)).collect();

            let array: ArrayRef = match &data_type {
                DataType::Int64 => Arc::new(Int64Array::from(
                    cells
                        .iter()
                        .map(|c| match c {
                            Some(Cell::Int(v)) => *v,
                            _ => None,
                        })
                        .collect::<Vec<_>>(),
                )),
                DataType::Utf8 => Arc::new(StringArray::from(
                    cells
                        .iter()
                        .map(|c| match c {
                            Some(Cell::Text(v)) => v.clone(),
                            _ => None,
                        })
                        .collect::<Vec<Option<String>>>(),
                )),
                DataType::Decimal128(..) => Arc::new(
                    Decimal128Array::from(
                        cells
                            .iter()
                            .map(|c| match c {
                                Some(Cell::Amount(v)) => Some(to_i128(*v)),
                                _ => None,
                            })
                            .collect::<Vec<_>>(),
                    )
                    .with_precision_and_scale(DECIMAL_PRECISION, DECIMAL_SCALE)?,
                ),
                other => bail!("Unsupported column type {other:?} for {column}"),
            };

            fields.push(Field::new(column, data_type, true));
            arrays.push(array);
        }

        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), arrays)?;

        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create Parquet file: {}", path.display()))?;
        let props = WriterProperties::builder()
            .set_compression(parquet::basic::Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;

        writer.write(&batch)?;
        writer.close()?;

        Ok(())
    }
}

fn column_type(column: &str) -> DataType {
    if VALUE_COLUMNS.contains(&column) {
        DataType::Decimal128(DECIMAL_PRECISION, DECIMAL_SCALE)
    } else if column.ends_with("_id") || matches!(column, "year" | "fiscal_year" | "quarter" | "month") {
        DataType::Int64
    } else {
        DataType::Utf8
    }
}

/// Mantissa of `value` at the fixed Parquet scale.
fn to_i128(value: Decimal) -> i128 {
    let mut scaled = value.round_dp(DECIMAL_SCALE as u32);
    scaled.rescale(DECIMAL_SCALE as u32);
    scaled.mantissa()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AggregatedRow, Dimension, DimensionKind, DimensionLabel, PeriodKey, TimeGranularity,
    };
    use parquet::file::reader::{FileReader, SerializedFileReader};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_column_types() {
        assert_eq!(column_type("year"), DataType::Int64);
        assert_eq!(column_type("hts_id"), DataType::Int64);
        assert_eq!(column_type("cty_code"), DataType::Utf8);
        assert_eq!(column_type("net_qty"), DataType::Decimal128(38, 4));
    }

    #[test]
    fn test_to_i128_rescales() {
        assert_eq!(to_i128(dec!(1.5)), 15_000);
        assert_eq!(to_i128(dec!(-60)), -600_000);
        assert_eq!(to_i128(dec!(1.23456)), 12_346);
    }

    #[test]
    fn test_write_aggregated_parquet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agg.parquet");
        let table = AggregatedTable {
            granularity: TimeGranularity::Monthly,
            dimension: Dimension::Commodity,
            columns: ["year", "month", "hts_id", "hts_code", "imports", "exports"]
                .into_iter()
                .map(String::from)
                .collect(),
            rows: vec![AggregatedRow {
                period: PeriodKey::Monthly {
                    year: 2021,
                    month: 3,
                },
                dimension: Some(DimensionLabel {
                    kind: DimensionKind::Commodity,
                    id: Some(1),
                    code: None,
                    description: None,
                }),
                imports: dec!(100),
                exports: Decimal::ZERO,
                qty_imports: dec!(10),
                qty_exports: Decimal::ZERO,
                net_exports: dec!(-100),
                net_qty: dec!(-10),
            }],
        };

        ParquetStorage::write_aggregated(&path, &table).unwrap();

        let reader = SerializedFileReader::new(File::open(&path).unwrap()).unwrap();
        let metadata = reader.metadata();
        assert_eq!(metadata.file_metadata().num_rows(), 1);
        assert_eq!(metadata.file_metadata().schema_descr().num_columns(), 6);
    }
}
