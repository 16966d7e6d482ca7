use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::compare::{
    compare_attachments_csv, compare_feedback_csv, render_report, SnapshotComparison,
};

#[derive(Debug, Clone)]
pub struct CompareCommandConfig {
    pub feedback_1: PathBuf,
    pub feedback_2: PathBuf,
    pub attachments_1: PathBuf,
    pub attachments_2: PathBuf,
    pub label_1: String,
    pub label_2: String,
    /// Detail CSV of the ids exclusive to either side.
    pub output_csv: Option<PathBuf>,
    /// Full comparison as JSON.
    pub json_out: Option<PathBuf>,
}

/// Compare two snapshots and return the rendered text report.
pub fn run_compare(cfg: CompareCommandConfig) -> Result<String> {
    let feedback = compare_feedback_csv(&cfg.feedback_1, &cfg.feedback_2, &cfg.label_1, &cfg.label_2)?;
    let attachments = compare_attachments_csv(
        &cfg.attachments_1,
        &cfg.attachments_2,
        &cfg.label_1,
        &cfg.label_2,
    )?;
    let report = render_report(&feedback, &attachments, cfg.output_csv.as_deref())?;

    if let Some(path) = &cfg.json_out {
        let full = SnapshotComparison {
            feedback,
            attachments,
        };
        let body = serde_json::to_string_pretty(&full)?;
        fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), "compare: wrote JSON comparison");
    }
    Ok(report)
}
