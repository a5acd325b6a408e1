//! Read-only access to the GADM-style source table.
//!
//! The input database carries exactly one data table whose name is not known
//! in advance (GADM releases change it between versions), plus assorted
//! metadata and spatial-index side tables. Discovery filters those out and
//! verifies the survivor has the expected column set before any row is read.

use crate::error::{Result, StoreError};
use regiondb_core::{BoundaryRecord, Level};
use rusqlite::{Connection, OpenFlags};
use rustc_hash::FxHashMap;
use std::path::Path;
use tracing::{debug, info};

const UID_COLUMN: &str = "UID";
const GEOM_COLUMN: &str = "geom_wkt";

// Side-table prefixes that never hold boundary records.
const EXCLUDED_PREFIXES: &[&str] = &["sqlite_", "rtree_", "idx_", "gidx_", "gpkg_"];

/// A verified handle on the source data table.
#[derive(Debug)]
pub struct SourceTable {
    conn: Connection,
    table: String,
}

impl SourceTable {
    /// Open `path` read-only, discover the data table, and verify its
    /// columns.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            StoreError::SourceFormat(format!("cannot open source database {}: {e}", path.display()))
        })?;

        let table = discover_table(&conn)?;
        verify_columns(&conn, &table)?;
        info!(table = %table, "source table discovered");
        Ok(Self { conn, table })
    }

    /// Name of the discovered data table.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Total number of records.
    pub fn record_count(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Preload every record's geometry, keyed by UID.
    ///
    /// Geometries are looked up once per record during the tree build; a
    /// single scan up front is far cheaper than a query per record.
    pub fn load_geometries(&self) -> Result<FxHashMap<i64, String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {UID_COLUMN}, {GEOM_COLUMN} FROM \"{}\" WHERE {GEOM_COLUMN} IS NOT NULL",
            self.table
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut geometries = FxHashMap::default();
        for row in rows {
            let (uid, wkt) = row?;
            geometries.insert(uid, wkt);
        }
        debug!(count = geometries.len(), "geometries preloaded");
        Ok(geometries)
    }

    /// Stream every record through `f` in table order, returning the number
    /// visited. Geometry is not carried on the record; callers use the
    /// preloaded UID map.
    pub fn for_each_record<E, F>(&self, mut f: F) -> std::result::Result<u64, E>
    where
        E: From<StoreError>,
        F: FnMut(BoundaryRecord) -> std::result::Result<(), E>,
    {
        let columns: Vec<String> = Level::ALL.iter().map(|l| l.column().to_string()).collect();
        let sql = format!(
            "SELECT {}, {UID_COLUMN} FROM \"{}\"",
            columns.join(", "),
            self.table
        );
        let mut stmt = self.conn.prepare(&sql).map_err(StoreError::from)?;
        let mut rows = stmt.query([]).map_err(StoreError::from)?;

        let mut count = 0u64;
        while let Some(row) = rows.next().map_err(StoreError::from)? {
            let mut record = BoundaryRecord::new();
            for (i, level) in Level::ALL.iter().enumerate() {
                if let Some(name) = row
                    .get::<_, Option<String>>(i)
                    .map_err(StoreError::from)?
                {
                    record.set_level(*level, name);
                }
            }
            record.uid = row
                .get::<_, Option<i64>>(Level::ALL.len())
                .map_err(StoreError::from)?;
            f(record)?;
            count += 1;
        }
        Ok(count)
    }
}

/// Find the single data table, skipping SQLite internals and spatial-index
/// side tables.
fn discover_table(conn: &Connection) -> Result<String> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let names = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut candidates = Vec::new();
    for name in names {
        let name = name?;
        let lower = name.to_ascii_lowercase();
        if EXCLUDED_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            continue;
        }
        candidates.push(name);
    }

    match candidates.len() {
        0 => Err(StoreError::SourceFormat(
            "no data table found in source database".to_string(),
        )),
        1 => Ok(candidates.remove(0)),
        _ => Err(StoreError::SourceFormat(format!(
            "expected one data table, found {}: {}",
            candidates.len(),
            candidates.join(", ")
        ))),
    }
}

/// Require every level column plus UID and geometry to be present.
fn verify_columns(conn: &Connection, table: &str) -> Result<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut present = Vec::new();
    for name in names {
        present.push(name?);
    }

    let mut missing: Vec<&str> = Level::ALL
        .iter()
        .map(|l| l.column())
        .filter(|c| !present.iter().any(|p| p == c))
        .collect();
    for required in [UID_COLUMN, GEOM_COLUMN] {
        if !present.iter().any(|p| p == required) {
            missing.push(required);
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(StoreError::SourceFormat(format!(
            "table {table} is missing required columns: {}",
            missing.join(", ")
        )))
    }
}
