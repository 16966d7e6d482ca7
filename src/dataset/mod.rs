//! Tabular form of a feedback dataset: the normalized records, their CSV
//! files, and the raw audit artefacts written by `fetch`.
//!
//! These files are the only thing passed between pipeline stages
//! (fetch → download → organize → compare).

pub mod audit;
pub mod records;
pub mod tables;

pub use audit::{write_fetch_summary, write_raw_json, FetchSummary};
pub use records::{
    dedup_rows, user_type_allowed, AttachmentRecord, FeedbackRecord, ATTACHMENT_COLUMNS,
    FEEDBACK_COLUMNS,
};
pub use tables::{
    read_attachments_csv, read_feedback_csv, write_attachments_csv, write_feedback_csv,
    JOIN_COLUMN,
};
