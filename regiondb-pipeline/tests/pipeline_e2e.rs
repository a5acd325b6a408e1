//! End-to-end runs over a small synthetic source database.

use regiondb_pipeline::{
    aggregate_division, run_aggregate, run_import, AggregateConfig, AggregateOutcome,
    CancelToken, ImportOptions,
};
use regiondb_store::DivisionStore;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LEVEL_COLUMNS: [&str; 12] = [
    "CONTINENT",
    "SUBCONT",
    "SOVEREIGN",
    "GOVERNEDBY",
    "COUNTRY",
    "REGION",
    "NAME_0",
    "NAME_1",
    "NAME_2",
    "NAME_3",
    "NAME_4",
    "NAME_5",
];

struct SourceRow {
    levels: Vec<(&'static str, &'static str)>,
    uid: i64,
    wkt: Option<String>,
}

fn square(x: f64, y: f64) -> String {
    format!(
        "MULTIPOLYGON((({x} {y},{x1} {y},{x1} {y1},{x} {y1},{x} {y})))",
        x = x,
        y = y,
        x1 = x + 1.0,
        y1 = y + 1.0
    )
}

fn write_source(dir: &Path, rows: &[SourceRow]) -> PathBuf {
    let path = dir.join("source.db");
    let conn = Connection::open(&path).unwrap();
    let cols: Vec<String> = LEVEL_COLUMNS.iter().map(|c| format!("{c} TEXT")).collect();
    conn.execute_batch(&format!(
        "CREATE TABLE gadm_410 ({}, UID INTEGER, geom_wkt TEXT)",
        cols.join(", ")
    ))
    .unwrap();

    for row in rows {
        let mut columns: Vec<&str> = row.levels.iter().map(|(c, _)| *c).collect();
        columns.push("UID");
        columns.push("geom_wkt");
        let placeholders: Vec<String> =
            (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO gadm_410 ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = row
            .levels
            .iter()
            .map(|(_, v)| Box::new(v.to_string()) as Box<dyn rusqlite::ToSql>)
            .collect();
        params.push(Box::new(row.uid));
        params.push(Box::new(row.wkt.clone()));
        conn.execute(&sql, rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())))
            .unwrap();
    }
    path
}

fn world_rows() -> Vec<SourceRow> {
    vec![
        // Samoa: country with no subdivision. NAME_0 repeats COUNTRY, so the
        // row's uid and geometry land on the Samoa division itself.
        SourceRow {
            levels: vec![
                ("CONTINENT", "Oceania"),
                ("COUNTRY", "Samoa"),
                ("NAME_0", "Samoa"),
            ],
            uid: 1,
            wkt: Some(square(100.0, 0.0)),
        },
        // Germany with a city-state chain repeating "Berlin" twice.
        SourceRow {
            levels: vec![
                ("CONTINENT", "Europe"),
                ("COUNTRY", "Germany"),
                ("NAME_1", "Berlin"),
                ("NAME_2", "Berlin"),
            ],
            uid: 2,
            wkt: Some(square(0.0, 0.0)),
        },
        SourceRow {
            levels: vec![
                ("CONTINENT", "Europe"),
                ("COUNTRY", "Germany"),
                ("NAME_1", "Bayern"),
            ],
            uid: 3,
            wkt: Some(square(1.0, 0.0)),
        },
        SourceRow {
            levels: vec![
                ("CONTINENT", "Europe"),
                ("COUNTRY", "Germany"),
                ("NAME_1", "Sachsen"),
            ],
            uid: 4,
            wkt: Some(square(2.0, 0.0)),
        },
        // Greenland under GOVERNEDBY Denmark (SOVEREIGN empty).
        SourceRow {
            levels: vec![
                ("CONTINENT", "North America"),
                ("GOVERNEDBY", "Denmark"),
                ("COUNTRY", "Greenland"),
                ("NAME_1", "Sermersooq"),
            ],
            uid: 5,
            wkt: Some(square(50.0, 50.0)),
        },
    ]
}

#[test]
fn full_import_builds_the_expected_tree() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), &world_rows());
    let db = dir.path().join("divisions.db");

    let summary = run_import(&db, &source, &ImportOptions::default()).unwrap();
    assert_eq!(summary.records, 5);
    assert_eq!(summary.terminal_updates, 1);
    assert_eq!(summary.collapsed, 1);
    assert_eq!(summary.skipped_geometries, 0);

    let store = DivisionStore::open(&db).unwrap();

    // Samoa carries its own geometry and is a leaf.
    let samoa = &store.divisions_named("Samoa").unwrap()[0];
    assert!(!samoa.has_children);
    assert_eq!(samoa.gadm_uid, Some(1));
    assert!(samoa.geom.is_some());

    // The Berlin chain collapsed: one Berlin, directly under Germany, with
    // the leaf's uid and geometry.
    let berlins = store.divisions_named("Berlin").unwrap();
    assert_eq!(berlins.len(), 1);
    let germany = &store.divisions_named("Germany").unwrap()[0];
    assert_eq!(berlins[0].parent_id, Some(germany.id));
    assert_eq!(berlins[0].gadm_uid, Some(2));

    // Germany has exactly its three states as children.
    assert_eq!(store.children_ids(germany.id).unwrap().len(), 3);

    // The governing-country chain is materialized above Greenland.
    let denmark = &store.divisions_named("Denmark").unwrap()[0];
    let greenland = &store.divisions_named("Greenland").unwrap()[0];
    assert_eq!(greenland.parent_id, Some(denmark.id));
}

#[test]
fn aggregation_fills_every_internal_node_bottom_up() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), &world_rows());
    let db = dir.path().join("divisions.db");
    run_import(&db, &source, &ImportOptions::default()).unwrap();

    let config = AggregateConfig {
        workers: 2,
        ..AggregateConfig::default()
    };
    let summary = run_aggregate(&db, &config, &CancelToken::new()).unwrap();
    assert_eq!(summary.failed, 0);
    assert!(!summary.cancelled);

    let store = DivisionStore::open(&db).unwrap();
    let stats = store.stats().unwrap();
    assert_eq!(stats.missing_aggregates, 0);
    assert_eq!(stats.with_geometry, stats.total_divisions);

    // Germany's boundary is the union of three adjacent states: one shell.
    let germany = &store.divisions_named("Germany").unwrap()[0];
    let geom = germany.geom.as_deref().unwrap();
    assert!(geom.starts_with("MULTIPOLYGON"));
}

#[test]
fn aggregation_rerun_is_byte_identical_and_leaf_safe() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), &world_rows());
    let db = dir.path().join("divisions.db");
    run_import(&db, &source, &ImportOptions::default()).unwrap();

    let config = AggregateConfig::default();
    run_aggregate(&db, &config, &CancelToken::new()).unwrap();

    let store = DivisionStore::open(&db).unwrap();
    let snapshot: Vec<(i64, Option<String>)> = ["Europe", "Germany", "Berlin", "Samoa"]
        .iter()
        .map(|name| {
            let d = &store.divisions_named(name).unwrap()[0];
            (d.id, d.geom.clone())
        })
        .collect();
    drop(store);

    let rerun = run_aggregate(&db, &config, &CancelToken::new()).unwrap();
    assert_eq!(rerun.merged, 0);

    let store = DivisionStore::open(&db).unwrap();
    for (id, geom) in snapshot {
        assert_eq!(store.get(id).unwrap().unwrap().geom, geom);
    }
}

#[test]
fn partially_aggregated_store_completes_on_rerun() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), &world_rows());
    let db = dir.path().join("divisions.db");
    run_import(&db, &source, &ImportOptions::default()).unwrap();

    // Aggregate one deepest division by hand, as if a previous run was
    // interrupted right after it committed.
    let config = AggregateConfig::default();
    let store = DivisionStore::open(&db).unwrap();
    let pending = store.pending_aggregates().unwrap();
    let done = pending[0].divisions[0].clone();
    let outcome = aggregate_division(&store, done.id, &done.name, &config.stages).unwrap();
    assert!(matches!(outcome, AggregateOutcome::Merged { .. }));
    let partial_geom = store.get(done.id).unwrap().unwrap().geom.unwrap();
    let still_missing = store.stats().unwrap().missing_aggregates;
    assert!(still_missing > 0);
    drop(store);

    // The next full run picks up exactly the remaining divisions and
    // leaves the already-computed one untouched.
    let summary = run_aggregate(&db, &config, &CancelToken::new()).unwrap();
    assert_eq!(summary.merged, still_missing);
    assert_eq!(summary.failed, 0);

    let store = DivisionStore::open(&db).unwrap();
    assert_eq!(store.stats().unwrap().missing_aggregates, 0);
    assert_eq!(store.get(done.id).unwrap().unwrap().geom.unwrap(), partial_geom);
}

#[test]
fn import_into_fresh_database_is_reproducible() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), &world_rows());

    let db_a = dir.path().join("a.db");
    let db_b = dir.path().join("b.db");
    run_import(&db_a, &source, &ImportOptions::default()).unwrap();
    run_import(&db_b, &source, &ImportOptions::default()).unwrap();

    let store_a = DivisionStore::open(&db_a).unwrap();
    let store_b = DivisionStore::open(&db_b).unwrap();
    let stats_a = store_a.stats().unwrap();
    let stats_b = store_b.stats().unwrap();
    assert_eq!(stats_a.total_divisions, stats_b.total_divisions);
    assert_eq!(stats_a.leaf_divisions, stats_b.leaf_divisions);

    for name in ["Samoa", "Germany", "Berlin", "Greenland"] {
        let a = &store_a.divisions_named(name).unwrap()[0];
        let b = &store_b.divisions_named(name).unwrap()[0];
        assert_eq!(a.gadm_uid, b.gadm_uid);
        assert_eq!(a.has_children, b.has_children);
        assert_eq!(a.geom, b.geom);
    }
}

#[test]
fn structure_only_import_skips_geometry() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), &world_rows());
    let db = dir.path().join("divisions.db");

    let options = ImportOptions {
        include_geometry: false,
        ..ImportOptions::default()
    };
    let summary = run_import(&db, &source, &options).unwrap();
    // Without geometry the Samoa terminal update cannot attach.
    assert_eq!(summary.terminal_updates, 0);

    let store = DivisionStore::open(&db).unwrap();
    assert_eq!(store.stats().unwrap().with_geometry, 0);
}

#[test]
fn missing_source_geometry_leaves_parent_pending() {
    let dir = TempDir::new().unwrap();
    let rows = vec![
        SourceRow {
            levels: vec![("COUNTRY", "Malta"), ("NAME_1", "Valletta")],
            uid: 1,
            wkt: None,
        },
        SourceRow {
            levels: vec![("COUNTRY", "Malta"), ("NAME_1", "Gozo")],
            uid: 2,
            wkt: Some(square(0.0, 0.0)),
        },
    ];
    let source = write_source(dir.path(), &rows);
    let db = dir.path().join("divisions.db");
    run_import(&db, &source, &ImportOptions::default()).unwrap();

    let summary = run_aggregate(&db, &AggregateConfig::default(), &CancelToken::new()).unwrap();
    // Malta still aggregates from the one child that has geometry.
    assert_eq!(summary.merged, 1);
    let store = DivisionStore::open(&db).unwrap();
    let malta = &store.divisions_named("Malta").unwrap()[0];
    assert!(malta.geom.is_some());
}
