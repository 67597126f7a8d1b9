use crate::records::{TradeRecord, TradeSource};
use anyhow::Result;

/// Collaborator that hands over an already-materialized raw record stream.
///
/// Downloading, scraping and persistence live behind this seam; the
/// aggregation side only needs the records and which feed they came from.
pub trait TradeDataSource {
    fn source(&self) -> TradeSource;

    /// Loads every raw record the collaborator holds.
    ///
    /// # Errors
    /// Returns an error if the underlying extract cannot be read.
    fn load_records(&self) -> Result<Vec<TradeRecord>>;
}
