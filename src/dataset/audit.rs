use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record of one `fetch` run, written next to the tables it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchSummary {
    pub publication_id: i64,
    pub language: String,
    pub page_size: u32,
    pub max_pages: Option<u32>,
    pub raw_items: usize,
    pub feedback_rows: usize,
    pub attachment_rows: usize,
    pub fetched_at: DateTime<Utc>,
}

fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, value)
        .with_context(|| format!("serialize {}", path.display()))?;
    out.write_all(b"\n")?;
    out.flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// Unmodified API records, kept for audit. Non-ASCII text is written as-is.
pub fn write_raw_json(path: &Path, items: &[Value]) -> Result<()> {
    write_json_pretty(path, items)
}

pub fn write_fetch_summary(path: &Path, summary: &FetchSummary) -> Result<()> {
    write_json_pretty(path, summary)
}
