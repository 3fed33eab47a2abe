//! `lanebook-alloc`: per-market financial allocation engine for shipment ledgers.
//!
//! Pure engine crate: receives pre-loaded leg records, returns per-market
//! revenue/cost/unit totals plus reconciliation warnings. No CLI dependency.

pub mod aggregate;
pub mod allocate;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod facility;
pub mod group;
pub mod load;
pub mod model;
pub mod trend;
pub mod validate;

pub use config::AllocConfig;
pub use engine::{run, run_sharded};
pub use error::AllocError;
pub use load::load_csv_legs;
pub use model::{AllocResult, Category, LegRecord, LogicalShipment, MarketCode, MarketTotals, Warning, WarningKind};
