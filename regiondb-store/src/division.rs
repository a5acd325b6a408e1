//! The `divisions` table.
//!
//! One row per administrative division. `parent_id` forms a forest;
//! `gadm_uid` is set only on leaves; `geom` holds full-resolution WKT and is
//! written exactly once (at insert for leaves, by the aggregator for
//! internal nodes), with pre-simplified low/medium display variants written
//! alongside it.

use crate::error::{Result, StoreError};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS divisions (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    parent_id INTEGER REFERENCES divisions(id),
    has_children INTEGER NOT NULL,
    gadm_uid INTEGER UNIQUE,
    geom TEXT,
    geom_simplified_low TEXT,
    geom_simplified_medium TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_divisions_parent ON divisions(parent_id);
CREATE INDEX IF NOT EXISTS idx_divisions_name ON divisions(name);
";

/// Full-resolution geometry plus its pre-simplified display variants, all
/// WKT. Written together so a division's geometry columns are always
/// mutually consistent.
#[derive(Debug, Clone, Copy)]
pub struct GeometryColumns<'a> {
    pub geom: &'a str,
    pub simplified_low: &'a str,
    pub simplified_medium: &'a str,
}

/// One division row (geometry variants omitted).
#[derive(Debug, Clone)]
pub struct Division {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub has_children: bool,
    pub gadm_uid: Option<i64>,
    pub geom: Option<String>,
}

/// A division still missing aggregate geometry.
#[derive(Debug, Clone)]
pub struct PendingDivision {
    pub id: i64,
    pub name: String,
}

/// All pending divisions at one tree depth.
#[derive(Debug, Clone)]
pub struct DepthGroup {
    pub depth: i64,
    pub divisions: Vec<PendingDivision>,
}

/// Database statistics for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_divisions: u64,
    pub root_divisions: u64,
    pub leaf_divisions: u64,
    pub with_geometry: u64,
    pub missing_aggregates: u64,
}

/// Handle on the divisions database. One connection; workers that need
/// parallel access each open their own store on the same path.
pub struct DivisionStore {
    conn: Connection,
}

impl DivisionStore {
    /// Open (creating if needed) the divisions database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::Connectivity {
            path: path.display().to_string(),
            source,
        })?;

        // WAL lets the aggregation workers' connections interleave; the busy
        // timeout covers the single-writer lock handoff between commits.
        let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.busy_timeout(Duration::from_secs(30))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert a division, returning its id.
    pub fn insert_division(
        &self,
        name: &str,
        parent_id: Option<i64>,
        has_children: bool,
        gadm_uid: Option<i64>,
        geometry: Option<GeometryColumns<'_>>,
    ) -> Result<i64> {
        let id = match geometry {
            Some(g) => self.conn.query_row(
                "INSERT INTO divisions
                     (name, parent_id, has_children, gadm_uid,
                      geom, geom_simplified_low, geom_simplified_medium)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING id",
                params![
                    name,
                    parent_id,
                    has_children,
                    gadm_uid,
                    g.geom,
                    g.simplified_low,
                    g.simplified_medium
                ],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                "INSERT INTO divisions (name, parent_id, has_children, gadm_uid)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id",
                params![name, parent_id, has_children, gadm_uid],
                |row| row.get(0),
            )?,
        };
        Ok(id)
    }

    /// Terminal update: attach a leaf's uid and geometry to an existing
    /// division and mark it childless. Used when a record turns out to be a
    /// country with no further subdivision.
    pub fn attach_terminal(
        &self,
        id: i64,
        gadm_uid: i64,
        geometry: GeometryColumns<'_>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE divisions
             SET gadm_uid = ?1,
                 geom = ?2,
                 geom_simplified_low = ?3,
                 geom_simplified_medium = ?4,
                 has_children = 0,
                 updated_at = datetime('now')
             WHERE id = ?5",
            params![
                gadm_uid,
                geometry.geom,
                geometry.simplified_low,
                geometry.simplified_medium,
                id
            ],
        )?;
        Ok(())
    }

    /// Start a bulk-insert batch. Paired with [`commit_batch`](Self::commit_batch);
    /// the tree build commits every few thousand records to bound
    /// transaction size.
    pub fn begin_batch(&self) -> Result<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    /// Commit the current bulk-insert batch.
    pub fn commit_batch(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    /// Apply the collapse pass's re-parent updates as one transaction.
    pub fn apply_reparent(&self, updates: &[(Option<i64>, i64)]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE divisions SET parent_id = ?1, updated_at = datetime('now') WHERE id = ?2",
            )?;
            for (new_parent, id) in updates {
                stmt.execute(params![new_parent, id])?;
            }
        }
        tx.commit()?;
        Ok(updates.len())
    }

    /// Apply the collapse pass's deletions as one transaction.
    pub fn apply_deletes(&self, ids: &[i64]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM divisions WHERE id = ?1")?;
            for id in ids {
                stmt.execute(params![id])?;
            }
        }
        tx.commit()?;
        Ok(ids.len())
    }

    /// All divisions still missing aggregate geometry, grouped by tree
    /// depth, deepest group first.
    ///
    /// Depth is computed by a recursive walk from the roots, so two
    /// divisions in the same group are never in an ancestor/descendant
    /// relationship — which is what makes a group safe to process
    /// concurrently.
    pub fn pending_aggregates(&self) -> Result<Vec<DepthGroup>> {
        let mut stmt = self.conn.prepare(
            "WITH RECURSIVE division_depth(id, depth) AS (
                 SELECT id, 0 FROM divisions WHERE parent_id IS NULL
                 UNION ALL
                 SELECT d.id, dd.depth + 1
                 FROM divisions d
                 JOIN division_depth dd ON d.parent_id = dd.id
             )
             SELECT dd.id, d.name, dd.depth
             FROM division_depth dd
             JOIN divisions d ON d.id = dd.id
             WHERE d.has_children = 1 AND d.geom IS NULL
             ORDER BY dd.depth DESC, dd.id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut groups: Vec<DepthGroup> = Vec::new();
        for row in rows {
            let (id, name, depth) = row?;
            match groups.last_mut() {
                Some(group) if group.depth == depth => {
                    group.divisions.push(PendingDivision { id, name });
                }
                _ => groups.push(DepthGroup {
                    depth,
                    divisions: vec![PendingDivision { id, name }],
                }),
            }
        }
        Ok(groups)
    }

    /// The WKT geometries of a division's direct children, in stable id
    /// order (stable input order keeps the merge deterministic).
    pub fn children_geometries(&self, id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT geom FROM divisions
             WHERE parent_id = ?1 AND geom IS NOT NULL
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![id], |row| row.get::<_, String>(0))?;
        let mut geoms = Vec::new();
        for row in rows {
            geoms.push(row?);
        }
        Ok(geoms)
    }

    /// Persist an aggregate geometry as one atomic write.
    ///
    /// Guarded: a division that is (or has become) a leaf, or that already
    /// has geometry, is never overwritten — the update is a no-op and
    /// `false` is returned.
    pub fn write_aggregate(&self, id: i64, geometry: GeometryColumns<'_>) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE divisions
             SET geom = ?1,
                 geom_simplified_low = ?2,
                 geom_simplified_medium = ?3,
                 updated_at = datetime('now')
             WHERE id = ?4 AND has_children = 1 AND geom IS NULL",
            params![
                geometry.geom,
                geometry.simplified_low,
                geometry.simplified_medium,
                id
            ],
        )?;
        Ok(rows > 0)
    }

    /// Fetch one division.
    pub fn get(&self, id: i64) -> Result<Option<Division>> {
        let division = self
            .conn
            .query_row(
                "SELECT id, name, parent_id, has_children, gadm_uid, geom
                 FROM divisions WHERE id = ?1",
                params![id],
                row_to_division,
            )
            .optional()?;
        Ok(division)
    }

    /// All divisions with the given name, in id order. Mostly for tests and
    /// diagnostics.
    pub fn divisions_named(&self, name: &str) -> Result<Vec<Division>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, parent_id, has_children, gadm_uid, geom
             FROM divisions WHERE name = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![name], row_to_division)?;
        let mut divisions = Vec::new();
        for row in rows {
            divisions.push(row?);
        }
        Ok(divisions)
    }

    /// Ids of a division's direct children, in id order.
    pub fn children_ids(&self, id: i64) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM divisions WHERE parent_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![id], |row| row.get(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    /// Database statistics for the stats report.
    pub fn stats(&self) -> Result<StoreStats> {
        let count = |sql: &str| -> Result<u64> {
            Ok(self.conn.query_row(sql, [], |row| row.get::<_, i64>(0))? as u64)
        };
        Ok(StoreStats {
            total_divisions: count("SELECT COUNT(*) FROM divisions")?,
            root_divisions: count("SELECT COUNT(*) FROM divisions WHERE parent_id IS NULL")?,
            leaf_divisions: count("SELECT COUNT(*) FROM divisions WHERE has_children = 0")?,
            with_geometry: count("SELECT COUNT(*) FROM divisions WHERE geom IS NOT NULL")?,
            missing_aggregates: count(
                "SELECT COUNT(*) FROM divisions WHERE has_children = 1 AND geom IS NULL",
            )?,
        })
    }
}

fn row_to_division(row: &rusqlite::Row<'_>) -> rusqlite::Result<Division> {
    Ok(Division {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
        has_children: row.get(3)?,
        gadm_uid: row.get(4)?,
        geom: row.get(5)?,
    })
}
