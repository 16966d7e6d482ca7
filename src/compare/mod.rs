//! Snapshot comparison of two fetched datasets.

pub mod engine;
pub mod model;
pub mod report;

pub use engine::{compare_attachments, compare_attachments_csv, compare_feedback, compare_feedback_csv};
pub use model::{
    AttachmentComparison, AttachmentIdDelta, CountChange, FeedbackComparison, IdDelta,
    SnapshotComparison,
};
pub use report::{render_report, write_detail_csv};
