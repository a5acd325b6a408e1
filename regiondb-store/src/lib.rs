//! SQLite-backed relational store for regiondb.
//!
//! Two halves:
//!
//! - [`division`]: the `divisions` table — schema, inserts, the batched
//!   re-parent/delete writes of the collapse pass, the recursive-CTE depth
//!   query that drives aggregation scheduling, and the guarded atomic
//!   aggregate write.
//! - [`source`]: the read-only GADM-style input table — data-table
//!   discovery, record streaming, and the one-shot geometry-by-UID preload.
//!
//! The store opens in WAL mode with a busy timeout so that the aggregation
//! phase's per-worker connections serialize cleanly against each other.
//! Every worker writes a disjoint set of rows, so contention is limited to
//! SQLite's single-writer lock.

pub mod division;
pub mod error;
pub mod source;

pub use division::{
    DepthGroup, Division, DivisionStore, GeometryColumns, PendingDivision, StoreStats,
};
pub use error::{Result, StoreError};
pub use source::SourceTable;
