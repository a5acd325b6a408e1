use crate::error::{CliError, CliResult};
use regiondb_pipeline::{run_aggregate, AggregateConfig, CancelToken};
use std::path::Path;

pub fn run(db: &Path, workers: usize) -> CliResult<()> {
    if workers == 0 {
        return Err(CliError::Usage("--workers must be at least 1".into()));
    }
    if !db.exists() {
        return Err(CliError::Input(format!(
            "division database not found: {}",
            db.display()
        )));
    }

    let config = AggregateConfig {
        workers,
        ..AggregateConfig::default()
    };

    // Ctrl+C requests cooperative cancellation: workers stop at the next
    // division boundary and progress so far stays durable.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())
            .map_err(|e| CliError::Input(format!("cannot install interrupt handler: {e}")))?;
    }

    let summary = run_aggregate(db, &config, &cancel)?;

    if summary.cancelled {
        println!("interrupted; re-run to resume from the remaining divisions");
    }
    println!(
        "aggregated {} divisions ({} left pending, {} already present, {} failed)",
        summary.merged, summary.no_children, summary.stale, summary.failed
    );
    if summary.failed > 0 {
        return Err(CliError::Input(format!(
            "{} divisions failed geometry processing; re-run after fixing the inputs",
            summary.failed
        )));
    }
    Ok(())
}
