//! Unit normalization and multi-dimensional re-aggregation of trade records.
//!
//! Raw records become a canonical fact table (`normalize`) through the
//! `units` and `calendar` derivations. The `engine` groups that table by a
//! `(granularity, dimension)` selector, reconciles imports with exports and
//! attaches lookup labels. `price` builds the unit-price view on top.

pub mod calendar;
pub mod engine;
pub mod error;
pub mod filters;
pub mod normalize;
pub mod price;
pub mod reconcile;
pub mod selector;
pub mod units;

// Re-export the engine surface
pub use engine::{aggregate, AggregationRequest, TradeAggregator, QTY_DECIMALS};
pub use error::{AggregationError, Result};
pub use normalize::{FactRow, FactTable};
pub use selector::{dispatch_table, AggregationDescriptor, Selector};

// Re-export leaf components
pub use calendar::{derive, quarter_of, CalendarFields, FISCAL_START_MONTH};
pub use filters::{resolve_prefix, AgricultureFilter, TimeWindow};
pub use price::{dense_rank, price_view};
pub use reconcile::{outer_join, FlowTotals, Reconciled};
pub use units::UnitConverter;
