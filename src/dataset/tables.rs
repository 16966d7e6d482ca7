use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::StringRecord;
use serde::Serialize;

use super::records::{AttachmentRecord, FeedbackRecord, ATTACHMENT_COLUMNS, FEEDBACK_COLUMNS};

/// The join column every table must carry.
pub const JOIN_COLUMN: &str = "feedback_id";

/// Column positions of a CSV header, looked up by name.
struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_string(), i))
            .collect();
        Self { positions }
    }

    fn has(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// Trimmed cell value; missing columns and empty cells read as `None`.
    fn cell(&self, row: &StringRecord, column: &str) -> Option<String> {
        let idx = *self.positions.get(column)?;
        row.get(idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

fn read_rows(path: &Path) -> Result<(HeaderIndex, Vec<StringRecord>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let headers = rdr
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .clone();
    let index = HeaderIndex::new(&headers);
    if !index.has(JOIN_COLUMN) {
        bail!("CSV {} missing '{}' column", path.display(), JOIN_COLUMN);
    }
    let rows = rdr
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("parse {}", path.display()))?;
    Ok((index, rows))
}

/// Load `feedback.csv`. Fails if the `feedback_id` column is absent; any
/// other column may be missing.
pub fn read_feedback_csv(path: &Path) -> Result<Vec<FeedbackRecord>> {
    let (index, rows) = read_rows(path)?;
    Ok(rows
        .iter()
        .map(|row| FeedbackRecord {
            feedback_id: index.cell(row, "feedback_id"),
            user_type: index.cell(row, "userType"),
            author: index.cell(row, "author"),
            country: index.cell(row, "country"),
            created: index.cell(row, "created"),
        })
        .collect())
}

/// Load `attachments.csv`. Fails if the `feedback_id` column is absent.
pub fn read_attachments_csv(path: &Path) -> Result<Vec<AttachmentRecord>> {
    let (index, rows) = read_rows(path)?;
    Ok(rows
        .iter()
        .map(|row| AttachmentRecord {
            feedback_id: index.cell(row, "feedback_id"),
            document_id: index.cell(row, "document_id"),
            file_name: index.cell(row, "file_name"),
            user_type: index.cell(row, "userType"),
        })
        .collect())
}

fn write_rows<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

pub fn write_feedback_csv(path: &Path, rows: &[FeedbackRecord]) -> Result<()> {
    write_rows(path, &FEEDBACK_COLUMNS, rows)
}

pub fn write_attachments_csv(path: &Path, rows: &[AttachmentRecord]) -> Result<()> {
    write_rows(path, &ATTACHMENT_COLUMNS, rows)
}
