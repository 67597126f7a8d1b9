//! Aggregation Engine.
//!
//! [`aggregate`] is the pure core: group each flow by the selector's
//! columns, outer-join imports with exports, derive the net columns and
//! attach lookup labels. [`TradeAggregator`] wraps it with the injected data
//! source and the pre-aggregation filters.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};
use trade_stats_core::{IngestConfig, TradeDataSource};
use trade_stats_data::{
    AggregatedRow, AggregatedTable, DimensionKind, DimensionLabel, DimensionTable, PeriodKey,
    ReferenceData,
};

use crate::error::{AggregationError, Result};
use crate::filters::{resolve_prefix, AgricultureFilter, TimeWindow};
use crate::normalize::FactTable;
use crate::reconcile::{outer_join, FlowTotals};
use crate::selector::{AggregationDescriptor, Selector};
use crate::units::UnitConverter;

/// Decimal places kept on summed quantities.
pub const QTY_DECIMALS: u32 = 2;

type GroupKey = (PeriodKey, Option<i32>);

/// Aggregates a fact table for one selector.
///
/// Output rows are sorted by time columns, then dimension id with
/// unresolved ids first. Dimension ids missing from the lookup table keep
/// their row with empty labels.
///
/// # Errors
/// `UnsupportedDimension` when the table's source lacks the dimension,
/// `DataValidation` when the dimension's lookup table was not loaded.
pub fn aggregate(
    facts: &FactTable,
    selector: Selector,
    reference: &ReferenceData,
) -> Result<AggregatedTable> {
    selector.validate_for(facts.source)?;
    let descriptor = selector.descriptor();
    let lookup = lookup_table(&descriptor, reference)?;

    let mut imports: BTreeMap<GroupKey, FlowTotals> = BTreeMap::new();
    let mut exports: BTreeMap<GroupKey, FlowTotals> = BTreeMap::new();
    for row in &facts.rows {
        let key = (
            row.calendar.period(selector.granularity),
            row.dimension_id(selector.dimension),
        );
        let side = if row.is_import() {
            &mut imports
        } else {
            &mut exports
        };
        side.entry(key).or_default().add(row.amount, row.qty);
    }

    let rows: Vec<AggregatedRow> = outer_join(&imports, &exports)
        .into_iter()
        .map(|joined| {
            let (period, id) = joined.key;
            let qty_imports = joined.imports.qty.round_dp(QTY_DECIMALS);
            let qty_exports = joined.exports.qty.round_dp(QTY_DECIMALS);
            AggregatedRow {
                period,
                dimension: lookup.map(|table| label(table, id)),
                imports: joined.imports.amount,
                exports: joined.exports.amount,
                qty_imports,
                qty_exports,
                net_exports: joined.net_exports(),
                net_qty: qty_exports - qty_imports,
            }
        })
        .collect();

    let table = AggregatedTable {
        granularity: selector.granularity,
        dimension: selector.dimension,
        columns: descriptor.output_columns(),
        rows,
    };

    let unresolved = table.unresolved_rows().count();
    if unresolved > 0 {
        warn!(
            selector = %selector,
            rows = unresolved,
            "Dimension ids without a lookup match"
        );
    }
    info!(
        selector = %selector,
        source = %facts.source,
        facts = facts.len(),
        rows = table.len(),
        "Aggregated"
    );

    Ok(table)
}

fn lookup_table<'a>(
    descriptor: &AggregationDescriptor,
    reference: &'a ReferenceData,
) -> Result<Option<&'a DimensionTable>> {
    let Some(kind) = descriptor.lookup else {
        return Ok(None);
    };
    reference.table(kind).map(Some).ok_or_else(|| {
        AggregationError::DataValidation(format!(
            "no {kind} lookup table loaded for dimension '{}'",
            descriptor.selector.dimension
        ))
    })
}

fn label(table: &DimensionTable, id: Option<i32>) -> DimensionLabel {
    let entry = id.and_then(|id| table.get(id));
    DimensionLabel {
        kind: table.kind(),
        id,
        code: entry.map(|e| e.code.clone()),
        description: entry.and_then(|e| e.description.clone()),
    }
}

/// One aggregation call: selector plus optional filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationRequest {
    pub selector: Selector,
    /// Code prefix matched against the selector dimension's lookup table
    pub filter: Option<String>,
    pub agriculture_only: bool,
    pub time: Option<TimeWindow>,
    /// Grouping by the external classification hierarchy
    pub group_by_hierarchy: bool,
}

impl AggregationRequest {
    #[must_use]
    pub const fn new(selector: Selector) -> Self {
        Self {
            selector,
            filter: None,
            agriculture_only: false,
            time: None,
            group_by_hierarchy: false,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, prefix: impl Into<String>) -> Self {
        self.filter = Some(prefix.into());
        self
    }

    #[must_use]
    pub const fn with_agriculture_only(mut self, enabled: bool) -> Self {
        self.agriculture_only = enabled;
        self
    }

    #[must_use]
    pub const fn with_time(mut self, window: TimeWindow) -> Self {
        self.time = Some(window);
        self
    }

    #[must_use]
    pub const fn with_group_by_hierarchy(mut self, enabled: bool) -> Self {
        self.group_by_hierarchy = enabled;
        self
    }
}

/// Runs aggregation requests against an injected trade data source.
pub struct TradeAggregator<S> {
    source: S,
    reference: ReferenceData,
    converter: UnitConverter,
    ingest: IngestConfig,
    agriculture: Option<AgricultureFilter>,
}

impl<S: TradeDataSource> TradeAggregator<S> {
    #[must_use]
    pub fn new(source: S, reference: ReferenceData, converter: UnitConverter) -> Self {
        Self {
            source,
            reference,
            converter,
            ingest: IngestConfig::default(),
            agriculture: None,
        }
    }

    #[must_use]
    pub fn with_ingest(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }

    #[must_use]
    pub fn with_agriculture(mut self, filter: AgricultureFilter) -> Self {
        self.agriculture = Some(filter);
        self
    }

    #[must_use]
    pub const fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Loads the source records and builds the canonical fact table.
    pub fn fact_table(&self) -> Result<FactTable> {
        let records = self
            .source
            .load_records()
            .map_err(|e| AggregationError::Source(format!("{e:#}")))?;
        Ok(FactTable::from_records(
            self.source.source(),
            &records,
            &self.converter,
            &self.ingest,
        ))
    }

    /// Loads the source and runs one request.
    pub fn run(&self, request: &AggregationRequest) -> Result<AggregatedTable> {
        self.validate(request)?;
        let facts = self.fact_table()?;
        self.run_on(&facts, request)
    }

    /// Runs one request against an already built fact table.
    ///
    /// # Errors
    /// Selector, filter and agriculture validation errors, before any
    /// grouping happens.
    pub fn run_on(&self, facts: &FactTable, request: &AggregationRequest) -> Result<AggregatedTable> {
        self.validate(request)?;
        let selector = request.selector;

        let prefix_ids = request
            .filter
            .as_deref()
            .map(|prefix| resolve_prefix(selector.dimension, prefix, &self.reference))
            .transpose()?;
        let agriculture_ids = if request.agriculture_only {
            Some(self.agriculture_ids()?)
        } else {
            None
        };

        let filtered = facts.filtered(|row| {
            let by_prefix = prefix_ids.as_ref().map_or(true, |ids| {
                row.dimension_id(selector.dimension)
                    .is_some_and(|id| ids.contains(&id))
            });
            let by_agriculture = agriculture_ids.as_ref().map_or(true, |ids| {
                row.commodity_id.is_some_and(|id| ids.contains(&id))
            });
            let by_time = request.time.map_or(true, |window| window.contains(row.date));
            by_prefix && by_agriculture && by_time
        });

        debug!(
            selector = %selector,
            filter = ?request.filter,
            agriculture_only = request.agriculture_only,
            time = ?request.time,
            before = facts.len(),
            after = filtered.len(),
            "Applied filters"
        );

        aggregate(&filtered, selector, &self.reference)
    }

    fn validate(&self, request: &AggregationRequest) -> Result<()> {
        if request.group_by_hierarchy {
            return Err(AggregationError::NotImplemented(
                "aggregation grouped by classification hierarchy",
            ));
        }
        request.selector.validate_for(self.source.source())
    }

    fn agriculture_ids(&self) -> Result<BTreeSet<i32>> {
        let filter = self.agriculture.as_ref().filter(|f| !f.is_empty()).ok_or_else(|| {
            AggregationError::DataValidation("agriculture filter has no codes configured".into())
        })?;
        let commodities = self
            .reference
            .table(DimensionKind::Commodity)
            .ok_or_else(|| {
                AggregationError::DataValidation(
                    "agriculture filter needs the commodity lookup table".into(),
                )
            })?;
        let ids = filter.allowed_ids(commodities);
        debug!(codes = filter.len(), commodities = ids.len(), "Agriculture gate");
        Ok(ids)
    }
}
