//! Single-child collapse.
//!
//! GADM chains often repeat a name through several levels when a unit has no
//! real intermediate subdivision (city-states are the usual case). After the
//! build, any division whose only child carries the same name is redundant:
//! the child is re-parented to the grandparent and the redundant parent
//! deleted. Chains collapse fully because nodes are visited in creation
//! order, which is topological, so a re-parented child sees its updated
//! parent pointer before it is examined as a parent itself. The deepest
//! division of a chain is the one that survives, and it is the one carrying
//! the uid and geometry.
//!
//! All re-parent updates are applied as one transaction, then all deletes as
//! another, so a crash between the two leaves no orphans.

use crate::builder::TreeArena;
use crate::error::{PipelineError, Result};
use regiondb_store::DivisionStore;
use tracing::{debug, info};

/// Counters reported after the collapse phase.
#[derive(Debug, Default, Clone)]
pub struct CollapseSummary {
    pub collapsed: u64,
}

/// Collapse every same-named single-child pair in the tree, applying the
/// structural changes to the store in two batched transactions.
pub fn collapse_single_children(
    store: &DivisionStore,
    arena: &mut TreeArena,
) -> Result<CollapseSummary> {
    // Direct children of every node, by arena index.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); arena.nodes.len()];
    for (idx, node) in arena.nodes.iter().enumerate() {
        if let Some(parent) = node.parent {
            children[parent].push(idx);
        }
    }

    let mut reparents: Vec<(Option<i64>, i64)> = Vec::new();
    let mut deletes: Vec<i64> = Vec::new();

    for idx in 0..arena.nodes.len() {
        if arena.nodes[idx].deleted {
            continue;
        }
        let &[child] = children[idx].as_slice() else {
            continue;
        };
        if arena.nodes[child].name != arena.nodes[idx].name {
            continue;
        }

        let grandparent = arena.nodes[idx].parent;
        if let Some(g) = grandparent {
            // Creation order is topological, so a re-parent target can never
            // have been collapsed away before its descendants are visited.
            if arena.nodes[g].deleted {
                return Err(PipelineError::Consistency(format!(
                    "re-parent target {} for division {} was already deleted",
                    arena.nodes[g].id, arena.nodes[child].id
                )));
            }
        }
        arena.nodes[child].parent = grandparent;
        arena.nodes[idx].deleted = true;

        let grandparent_id = grandparent.map(|g| arena.nodes[g].id);
        reparents.push((grandparent_id, arena.nodes[child].id));
        deletes.push(arena.nodes[idx].id);
        debug!(
            parent = %arena.nodes[idx].name,
            child_id = arena.nodes[child].id,
            "single-child pair collapsed"
        );
    }

    if !reparents.is_empty() {
        store.apply_reparent(&reparents)?;
        store.apply_deletes(&deletes)?;
    }
    info!(collapsed = deletes.len(), "single-child collapse finished");

    Ok(CollapseSummary {
        collapsed: deletes.len() as u64,
    })
}
