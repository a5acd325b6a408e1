use crate::error::{CliError, CliResult};
use regiondb_store::DivisionStore;
use std::path::Path;

pub fn run(db: &Path) -> CliResult<()> {
    if !db.exists() {
        return Err(CliError::Input(format!(
            "division database not found: {}",
            db.display()
        )));
    }

    let store = DivisionStore::open(db)?;
    let stats = store.stats()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
