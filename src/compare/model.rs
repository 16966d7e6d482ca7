//! Comparison output types.
//!
//! Maps are `BTreeMap` and id lists are sorted ascending so that reports and
//! serialized output are deterministic.

use std::collections::BTreeMap;

use serde::Serialize;

/// Ids present on one side only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdDelta {
    pub count: usize,
    pub ids: Vec<String>,
}

/// Feedback-level comparison of two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackComparison {
    pub label_1: String,
    pub label_2: String,
    /// Row counts, duplicates and id-less rows included
    pub total_1: usize,
    pub total_2: usize,
    pub only_in_1: IdDelta,
    pub only_in_2: IdDelta,
    pub common: usize,
    /// Rows per `userType`; rows without one are not counted
    pub user_types_1: BTreeMap<String, usize>,
    pub user_types_2: BTreeMap<String, usize>,
}

/// Feedback ids that have attachments on one side only, with how many
/// attachments they account for there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachmentIdDelta {
    pub count: usize,
    pub ids: Vec<String>,
    pub attachment_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountChange {
    pub before: usize,
    pub after: usize,
}

/// Attachment-level comparison of two snapshots, keyed by feedback id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentComparison {
    pub label_1: String,
    pub label_2: String,
    pub total_attachments_1: usize,
    pub total_attachments_2: usize,
    pub feedback_with_attachments_1: usize,
    pub feedback_with_attachments_2: usize,
    pub only_in_1: AttachmentIdDelta,
    pub only_in_2: AttachmentIdDelta,
    /// Ids on both sides whose attachment count differs
    pub changes: BTreeMap<String, CountChange>,
}

/// Both halves of a comparison, as written by `compare --json-out`.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotComparison {
    pub feedback: FeedbackComparison,
    pub attachments: AttachmentComparison,
}
