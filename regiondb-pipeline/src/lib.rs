//! The regiondb ingestion and aggregation pipeline.
//!
//! Two entry points, matching the two phases of the system's life:
//!
//! - [`run_import`]: stream the flat source table into the normalized
//!   division tree (resolve, build, single-child collapse).
//! - [`run_aggregate`]: compute the missing internal-node geometries
//!   bottom-up, one depth level at a time, in parallel within each level.
//!
//! Both are idempotent in effect: importing into a fresh database twice
//! yields the same tree, and re-running aggregation only ever touches
//! divisions still missing their geometry.
//!
//! # Modules
//!
//! - [`builder`]: tree materialization from resolved records
//! - [`collapse`]: same-named single-child collapse
//! - [`depth`]: bottom-up scheduling by tree depth
//! - [`aggregate`]: per-division merge, simplify, persist
//! - [`parallel`]: per-level worker fan-out and cancellation
//! - [`error`]: error types

pub mod aggregate;
pub mod builder;
pub mod collapse;
pub mod depth;
pub mod error;
pub mod parallel;

pub use aggregate::{aggregate_division, AggregateConfig, AggregateOutcome};
pub use builder::{BuildSummary, HierarchyBuilder, TreeArena};
pub use collapse::{collapse_single_children, CollapseSummary};
pub use error::{PipelineError, Result};
pub use parallel::{aggregate_all, aggregate_level, CancelToken, LevelTally};

use regiondb_store::{DivisionStore, SourceTable};
use std::path::Path;
use tracing::{info, info_span};

/// Import options.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Carry leaf geometries from the source (disable for a structure-only
    /// import).
    pub include_geometry: bool,
    /// Run the single-child collapse after the build.
    pub collapse: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            include_geometry: true,
            collapse: true,
        }
    }
}

/// Counters reported after a full import.
#[derive(Debug, Default, Clone)]
pub struct ImportSummary {
    pub records: u64,
    pub divisions: u64,
    pub terminal_updates: u64,
    pub skipped_geometries: u64,
    pub collapsed: u64,
}

/// Import the source table at `source_path` into the division database at
/// `db_path`.
pub fn run_import(
    db_path: &Path,
    source_path: &Path,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let span = info_span!("import");
    let _guard = span.enter();

    let source = SourceTable::open(source_path)?;
    let store = DivisionStore::open(db_path)?;
    info!(
        table = source.table_name(),
        records = source.record_count()?,
        "import started"
    );

    let geometries = if options.include_geometry {
        Some(source.load_geometries()?)
    } else {
        None
    };

    let build_span = info_span!("build_tree");
    let (mut arena, build) = {
        let _guard = build_span.enter();
        let mut builder = HierarchyBuilder::new(&store, geometries.as_ref())?;
        source.for_each_record(|record| builder.process_record(&record))?;
        builder.finish()?
    };
    info!(
        records = build.records,
        divisions = build.divisions,
        terminal_updates = build.terminal_updates,
        skipped_geometries = build.skipped_geometries,
        "tree built"
    );

    let collapsed = if options.collapse {
        let collapse_span = info_span!("collapse");
        let _guard = collapse_span.enter();
        collapse_single_children(&store, &mut arena)?.collapsed
    } else {
        0
    };

    info!(divisions = arena.live_count(), collapsed, "import finished");
    Ok(ImportSummary {
        records: build.records,
        divisions: build.divisions,
        terminal_updates: build.terminal_updates,
        skipped_geometries: build.skipped_geometries,
        collapsed,
    })
}

/// Counters reported after an aggregation run.
#[derive(Debug, Default, Clone)]
pub struct AggregateSummary {
    pub merged: u64,
    pub no_children: u64,
    pub stale: u64,
    pub failed: u64,
    pub cancelled: bool,
}

/// Compute every missing aggregate geometry in the database at `db_path`.
pub fn run_aggregate(
    db_path: &Path,
    config: &AggregateConfig,
    cancel: &CancelToken,
) -> Result<AggregateSummary> {
    let span = info_span!("aggregate");
    let _guard = span.enter();

    let tally = aggregate_all(db_path, config, cancel)?;
    let summary = AggregateSummary {
        merged: tally.merged,
        no_children: tally.no_children,
        stale: tally.stale,
        failed: tally.failed,
        cancelled: cancel.is_cancelled(),
    };
    info!(
        merged = summary.merged,
        no_children = summary.no_children,
        stale = summary.stale,
        failed = summary.failed,
        cancelled = summary.cancelled,
        "aggregation finished"
    );
    Ok(summary)
}
