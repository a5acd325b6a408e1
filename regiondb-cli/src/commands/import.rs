use crate::error::{CliError, CliResult};
use regiondb_pipeline::{run_import, ImportOptions};
use std::path::Path;

pub fn run(source: &Path, db: &Path, no_geometry: bool, no_collapse: bool) -> CliResult<()> {
    if !source.exists() {
        return Err(CliError::Input(format!(
            "source database not found: {}",
            source.display()
        )));
    }

    let options = ImportOptions {
        include_geometry: !no_geometry,
        collapse: !no_collapse,
    };
    let summary = run_import(db, source, &options)?;

    println!(
        "imported {} records into {} divisions ({} collapsed, {} terminal updates)",
        summary.records, summary.divisions, summary.collapsed, summary.terminal_updates
    );
    if summary.skipped_geometries > 0 {
        println!(
            "warning: {} source geometries were unparsable and skipped",
            summary.skipped_geometries
        );
    }
    Ok(())
}
