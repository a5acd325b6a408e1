//! Record model and level resolution for regiondb.
//!
//! This crate defines the shape of a GADM-style boundary record — one flat
//! row encoding a full administrative path via sparse, semantically fixed
//! columns — and the resolver that decides, per record, which levels become
//! real tree nodes.
//!
//! It is pure logic: no I/O, no store types. The hierarchy builder in
//! `regiondb-pipeline` consumes [`resolve`]'s output to materialize
//! divisions.
//!
//! # Modules
//!
//! - [`record`]: the [`BoundaryRecord`] row type and the fixed [`Level`] order
//! - [`resolve`]: per-record level resolution with skip rules and the
//!   terminal-update signal

pub mod record;
pub mod resolve;

pub use record::{BoundaryRecord, Level};
pub use resolve::{resolve, ResolvedNode, ResolvedRecord, Terminal};
