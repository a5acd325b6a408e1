//! Tree build from the flat record stream.
//!
//! Records arrive as independent rows; the builder materializes the division
//! tree by walking each record's resolved node chain root-to-leaf, reusing
//! already-created divisions along the way. Deduplication is by full path
//! (the joined chain of names from the root), not by bare name, so two
//! regions that share a name under different parents stay distinct.
//!
//! Inserts run inside batches that commit every few thousand records, which
//! keeps transaction size bounded on full-planet inputs.

use crate::error::Result;
use regiondb_core::{resolve, BoundaryRecord, Terminal};
use regiondb_geom::{display_variants, parse_multi_polygon};
use regiondb_store::{DivisionStore, GeometryColumns};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

const COMMIT_INTERVAL: u64 = 10_000;

/// One division in the in-memory mirror of the tree. The mirror exists so
/// the collapse pass can walk parent/child structure without re-querying.
#[derive(Debug)]
pub(crate) struct TreeNode {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) parent: Option<usize>,
    pub(crate) deleted: bool,
}

/// In-memory mirror of the division tree, indexed in creation order.
/// Creation order is topological: a node's parent always has a smaller
/// index.
#[derive(Debug, Default)]
pub struct TreeArena {
    pub(crate) nodes: Vec<TreeNode>,
}

impl TreeArena {
    /// Number of live (non-deleted) divisions.
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.deleted).count()
    }
}

/// Counters reported after the build phase.
#[derive(Debug, Default, Clone)]
pub struct BuildSummary {
    pub records: u64,
    pub divisions: u64,
    pub terminal_updates: u64,
    pub skipped_geometries: u64,
}

/// Builds the division tree from resolved records.
pub struct HierarchyBuilder<'a> {
    store: &'a DivisionStore,
    geometries: Option<&'a FxHashMap<i64, String>>,
    paths: FxHashMap<String, usize>,
    arena: TreeArena,
    summary: BuildSummary,
}

impl<'a> HierarchyBuilder<'a> {
    /// Start a build. `geometries` is the UID-keyed WKT preload; `None`
    /// imports structure only.
    pub fn new(
        store: &'a DivisionStore,
        geometries: Option<&'a FxHashMap<i64, String>>,
    ) -> Result<Self> {
        store.begin_batch()?;
        Ok(Self {
            store,
            geometries,
            paths: FxHashMap::default(),
            arena: TreeArena::default(),
            summary: BuildSummary::default(),
        })
    }

    /// Process one record: create any missing divisions along its chain and
    /// apply its terminal action.
    pub fn process_record(&mut self, record: &BoundaryRecord) -> Result<()> {
        self.summary.records += 1;

        let resolved = resolve(record);
        if resolved.terminal == Terminal::Empty {
            debug!(record = self.summary.records, "empty record skipped");
            self.maybe_commit()?;
            return Ok(());
        }

        let last = resolved.nodes.len() - 1;
        let mut path = String::new();
        let mut parent: Option<usize> = None;

        for (i, node) in resolved.nodes.iter().enumerate() {
            if !path.is_empty() {
                path.push('_');
            }
            path.push_str(&node.name);

            if let Some(&existing) = self.paths.get(&path) {
                parent = Some(existing);
                continue;
            }

            let is_leaf = resolved.terminal == Terminal::LeafNode && i == last;
            let uid = if is_leaf { record.uid } else { None };
            let geometry = if is_leaf {
                uid.and_then(|u| self.leaf_geometry(u, &node.name))
            } else {
                None
            };

            let parent_id = parent.map(|p| self.arena.nodes[p].id);
            let id = self.store.insert_division(
                &node.name,
                parent_id,
                node.has_children,
                uid,
                geometry.as_ref().map(|g| GeometryColumns {
                    geom: &g.0,
                    simplified_low: &g.1,
                    simplified_medium: &g.2,
                }),
            )?;

            let idx = self.arena.nodes.len();
            self.arena.nodes.push(TreeNode {
                id,
                name: node.name.clone(),
                parent,
                deleted: false,
            });
            self.paths.insert(path.clone(), idx);
            self.summary.divisions += 1;
            parent = Some(idx);
        }

        if resolved.terminal == Terminal::UpdateExisting {
            self.apply_terminal_update(record, parent)?;
        }

        self.maybe_commit()
    }

    /// Finish the build, committing the trailing batch.
    pub fn finish(self) -> Result<(TreeArena, BuildSummary)> {
        self.store.commit_batch()?;
        Ok((self.arena, self.summary))
    }

    /// Attach a no-subdivision country's uid and geometry to the deepest
    /// division of its chain. Without a geometry the division stays internal
    /// and the attach is skipped, so the aggregator fills it in later.
    fn apply_terminal_update(
        &mut self,
        record: &BoundaryRecord,
        deepest: Option<usize>,
    ) -> Result<()> {
        let (Some(idx), Some(uid)) = (deepest, record.uid) else {
            return Ok(());
        };
        let name = self.arena.nodes[idx].name.clone();
        let Some(geometry) = self.leaf_geometry(uid, &name) else {
            return Ok(());
        };
        self.store.attach_terminal(
            self.arena.nodes[idx].id,
            uid,
            GeometryColumns {
                geom: &geometry.0,
                simplified_low: &geometry.1,
                simplified_medium: &geometry.2,
            },
        )?;
        self.summary.terminal_updates += 1;
        Ok(())
    }

    /// Look up and validate a leaf geometry, returning the stored WKT plus
    /// its two display variants. Unparsable geometry is logged and dropped;
    /// the division is still created, just without geometry.
    fn leaf_geometry(&mut self, uid: i64, name: &str) -> Option<(String, String, String)> {
        let wkt = self.geometries?.get(&uid)?;
        match parse_multi_polygon(wkt) {
            Ok(geom) => {
                let (low, medium) = display_variants(&geom);
                Some((wkt.clone(), low, medium))
            }
            Err(err) => {
                warn!(uid, name, %err, "unparsable source geometry, division kept without it");
                self.summary.skipped_geometries += 1;
                None
            }
        }
    }

    fn maybe_commit(&self) -> Result<()> {
        if self.summary.records % COMMIT_INTERVAL == 0 {
            self.store.commit_batch()?;
            self.store.begin_batch()?;
            debug!(records = self.summary.records, "batch committed");
        }
        Ok(())
    }
}
