use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use hys_client::{fetch_feedback, FeedbackPageSource, FeedbackQuery, HysClient};
use tracing::info;

use crate::dataset::{
    dedup_rows, write_attachments_csv, write_feedback_csv, write_fetch_summary, write_raw_json,
    FetchSummary,
};
use crate::normalization::extract_feedback_and_attachments;

pub const RAW_JSON_FILE: &str = "feedback_raw.json";
pub const FEEDBACK_CSV_FILE: &str = "feedback.csv";
pub const ATTACHMENTS_CSV_FILE: &str = "attachments.csv";
pub const SUMMARY_FILE: &str = "fetch_summary.json";

#[derive(Debug, Clone)]
pub struct FetchCommandConfig {
    pub publication_id: i64,
    pub out_dir: PathBuf,
    pub page_size: u32,
    pub language: String,
    pub max_pages: Option<u32>,
    /// Overrides `HYS_BASE_URL` and the built-in default.
    pub base_url: Option<String>,
}

impl FetchCommandConfig {
    fn query(&self) -> FeedbackQuery {
        FeedbackQuery {
            page_size: self.page_size,
            language: self.language.clone(),
            max_pages: self.max_pages,
            ..FeedbackQuery::new(self.publication_id)
        }
    }
}

pub async fn run_fetch(cfg: FetchCommandConfig) -> Result<FetchSummary> {
    let client = HysClient::new(super::client_config(cfg.base_url.as_deref()))?;
    info!(
        publication_id = cfg.publication_id,
        endpoint = %client.config().feedback_endpoint(),
        "fetch: starting"
    );
    fetch_into_dir(&client, &cfg).await
}

/// Retrieve every feedback item for the publication and write the raw dump,
/// both normalized tables and a run summary into `cfg.out_dir`.
pub async fn fetch_into_dir<S>(source: &S, cfg: &FetchCommandConfig) -> Result<FetchSummary>
where
    S: FeedbackPageSource + ?Sized,
{
    let items = fetch_feedback(source, &cfg.query())
        .await
        .with_context(|| format!("fetch feedback for publication {}", cfg.publication_id))?;

    let normalized = extract_feedback_and_attachments(&items);
    let feedback = dedup_rows(normalized.feedback);
    let attachments = dedup_rows(normalized.attachments);

    let out = cfg.out_dir.as_path();
    fs::create_dir_all(out).with_context(|| format!("create {}", out.display()))?;
    write_raw_json(&out.join(RAW_JSON_FILE), &items)?;
    write_feedback_csv(&out.join(FEEDBACK_CSV_FILE), &feedback)?;
    write_attachments_csv(&out.join(ATTACHMENTS_CSV_FILE), &attachments)?;

    let summary = FetchSummary {
        publication_id: cfg.publication_id,
        language: cfg.language.clone(),
        page_size: cfg.page_size,
        max_pages: cfg.max_pages,
        raw_items: items.len(),
        feedback_rows: feedback.len(),
        attachment_rows: attachments.len(),
        fetched_at: Utc::now(),
    };
    write_fetch_summary(&out.join(SUMMARY_FILE), &summary)?;
    log_outputs(out, &summary);
    Ok(summary)
}

fn log_outputs(out: &Path, summary: &FetchSummary) {
    info!(
        out_dir = %out.display(),
        raw_items = summary.raw_items,
        feedback_rows = summary.feedback_rows,
        attachment_rows = summary.attachment_rows,
        "fetch: wrote dataset"
    );
}
