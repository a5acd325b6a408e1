//! Aggregation scheduling by tree depth.
//!
//! Aggregates must be computed bottom-up: a parent's boundary is the union
//! of its children's, so every child geometry has to exist before the parent
//! is attempted. Grouping the pending divisions by depth and processing the
//! deepest group first guarantees that, and because no two divisions at the
//! same depth are related, a whole group can run in parallel.

use crate::error::Result;
use regiondb_store::{DepthGroup, DivisionStore};
use tracing::info;

/// Plan the aggregation run: every division still missing aggregate
/// geometry, grouped by depth, deepest first.
///
/// The selection re-derives pending work from the store each time, so an
/// interrupted run resumes from whatever the previous one durably wrote.
pub fn schedule(store: &DivisionStore) -> Result<Vec<DepthGroup>> {
    let groups = store.pending_aggregates()?;
    let total: usize = groups.iter().map(|g| g.divisions.len()).sum();
    info!(
        levels = groups.len(),
        pending = total,
        "aggregation plan ready"
    );
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::HierarchyBuilder;
    use regiondb_core::{BoundaryRecord, Level};
    use rustc_hash::FxHashMap;
    use tempfile::TempDir;

    #[test]
    fn deepest_level_comes_first_and_levels_are_disjoint() {
        let dir = TempDir::new().unwrap();
        let store = DivisionStore::open(&dir.path().join("divisions.db")).unwrap();
        let mut geoms = FxHashMap::default();
        geoms.insert(1, "MULTIPOLYGON(((0 0,1 0,1 1,0 1,0 0)))".to_string());
        let mut builder = HierarchyBuilder::new(&store, Some(&geoms)).unwrap();
        builder
            .process_record(
                &BoundaryRecord::new()
                    .with_level(Level::Continent, "Europe")
                    .with_level(Level::Country, "Malta")
                    .with_level(Level::Name1, "Valletta")
                    .with_uid(1),
            )
            .unwrap();
        builder.finish().unwrap();

        let groups = schedule(&store).unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups[0].depth > groups[1].depth);
        assert_eq!(groups[0].divisions[0].name, "Malta");
        assert_eq!(groups[1].divisions[0].name, "Europe");
    }
}
