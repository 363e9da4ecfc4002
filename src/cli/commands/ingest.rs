//! Ingest command implementation.

use super::open_store;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::ingest::Ingestor;
use anyhow::Result;
use std::path::PathBuf;

/// Run the ingest command.
pub async fn run_ingest(path: &str, force: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let store = open_store(&settings)?;
    let ingestor = Ingestor::new(store.clone());
    let path = PathBuf::from(shellexpand::tilde(path).to_string());

    let spinner = Output::spinner(&format!("Indexing {}...", path.display()));
    let result = ingestor.ingest_path(&path, force).await;
    spinner.finish_and_clear();

    let reports = match result {
        Ok(reports) => reports,
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    };

    for report in &reports {
        if report.skipped {
            Output::info(&format!("Skipped {} (already indexed, use --force to re-index)", report.course_title));
        } else {
            Output::success(&format!("Indexed {} ({} chunks)", report.course_title, report.chunks_indexed));
        }
    }

    println!();
    Output::kv("Courses in catalog", &store.course_count().await?.to_string());
    Output::kv("Chunks in store", &store.chunk_count().await?.to_string());

    Ok(())
}
