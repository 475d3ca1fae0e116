//! JSON report output.
//!
//! # Output Structure
//!
//! Reports are organized by the UTC date of the run:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 081502.json
//!     └── 174233.json
//! ```

use crate::models::{BatchResult, StreamEvent};
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize a [`BatchResult`] as pretty-printed JSON.
pub fn to_pretty_json(batch: &BatchResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(batch)
}

/// One NDJSON line for a progress message.
pub fn progress_line(message: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string(&StreamEvent::Progress { message })
}

/// The final NDJSON line carrying every site result and the summary.
pub fn complete_line(batch: &BatchResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(&StreamEvent::Complete {
        results: &batch.results,
        summary: &batch.summary,
    })
}

/// Write a [`BatchResult`] under `{json_output_dir}/{date}/{time}.json`.
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_batch(batch: &BatchResult, json_output_dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let json = to_pretty_json(batch)?;

    let day_dir = PathBuf::from(json_output_dir).join(batch.generated_at.format("%Y-%m-%d").to_string());
    info!(dir = %day_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&day_dir).await {
        error!(dir = %day_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = day_dir.join(format!("{}.json", batch.generated_at.format("%H%M%S")));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON report");
    Ok(path)
}
