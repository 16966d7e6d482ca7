use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Result;
use tracing::info;

use super::model::{
    AttachmentComparison, AttachmentIdDelta, CountChange, FeedbackComparison, IdDelta,
};
use crate::dataset::{read_attachments_csv, read_feedback_csv, AttachmentRecord, FeedbackRecord};

/// Ids taking part in set algebra. Rows with no id are left out.
fn id_set(rows: &[FeedbackRecord]) -> BTreeSet<&str> {
    rows.iter().filter_map(|r| r.feedback_id.as_deref()).collect()
}

fn user_type_counts(rows: &[FeedbackRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for user_type in rows.iter().filter_map(|r| r.user_type.as_deref()) {
        *counts.entry(user_type.to_string()).or_insert(0) += 1;
    }
    counts
}

fn attachments_per_feedback(rows: &[AttachmentRecord]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for fid in rows.iter().filter_map(|r| r.feedback_id.as_deref()) {
        *counts.entry(fid).or_insert(0) += 1;
    }
    counts
}

fn owned_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    ids.into_iter().map(str::to_string).collect()
}

/// Set algebra over feedback ids plus the `userType` distribution per side.
pub fn compare_feedback(
    rows_1: &[FeedbackRecord],
    rows_2: &[FeedbackRecord],
    label_1: &str,
    label_2: &str,
) -> FeedbackComparison {
    let ids_1 = id_set(rows_1);
    let ids_2 = id_set(rows_2);
    let only_in_1 = owned_ids(ids_1.difference(&ids_2).copied());
    let only_in_2 = owned_ids(ids_2.difference(&ids_1).copied());
    let common = ids_1.intersection(&ids_2).count();

    FeedbackComparison {
        label_1: label_1.to_string(),
        label_2: label_2.to_string(),
        total_1: rows_1.len(),
        total_2: rows_2.len(),
        only_in_1: IdDelta {
            count: only_in_1.len(),
            ids: only_in_1,
        },
        only_in_2: IdDelta {
            count: only_in_2.len(),
            ids: only_in_2,
        },
        common,
        user_types_1: user_type_counts(rows_1),
        user_types_2: user_type_counts(rows_2),
    }
}

/// Attachment counts per feedback id on each side, the ids exclusive to
/// either side, and every common id whose count changed.
pub fn compare_attachments(
    rows_1: &[AttachmentRecord],
    rows_2: &[AttachmentRecord],
    label_1: &str,
    label_2: &str,
) -> AttachmentComparison {
    let counts_1 = attachments_per_feedback(rows_1);
    let counts_2 = attachments_per_feedback(rows_2);

    let exclusive = |mine: &BTreeMap<&str, usize>, other: &BTreeMap<&str, usize>| {
        let ids: Vec<&str> = mine
            .keys()
            .filter(|fid| !other.contains_key(*fid))
            .copied()
            .collect();
        AttachmentIdDelta {
            count: ids.len(),
            attachment_count: ids.iter().map(|fid| mine[fid]).sum(),
            ids: owned_ids(ids),
        }
    };

    let changes: BTreeMap<String, CountChange> = counts_1
        .iter()
        .filter_map(|(fid, &before)| {
            let &after = counts_2.get(fid)?;
            (before != after).then(|| (fid.to_string(), CountChange { before, after }))
        })
        .collect();

    AttachmentComparison {
        label_1: label_1.to_string(),
        label_2: label_2.to_string(),
        total_attachments_1: rows_1.len(),
        total_attachments_2: rows_2.len(),
        feedback_with_attachments_1: counts_1.len(),
        feedback_with_attachments_2: counts_2.len(),
        only_in_1: exclusive(&counts_1, &counts_2),
        only_in_2: exclusive(&counts_2, &counts_1),
        changes,
    }
}

/// Load two `feedback.csv` snapshots (both must carry `feedback_id`) and compare them.
pub fn compare_feedback_csv(
    csv_1: &Path,
    csv_2: &Path,
    label_1: &str,
    label_2: &str,
) -> Result<FeedbackComparison> {
    let rows_1 = read_feedback_csv(csv_1)?;
    let rows_2 = read_feedback_csv(csv_2)?;
    let cmp = compare_feedback(&rows_1, &rows_2, label_1, label_2);
    info!(
        total_1 = cmp.total_1,
        total_2 = cmp.total_2,
        common = cmp.common,
        only_in_1 = cmp.only_in_1.count,
        only_in_2 = cmp.only_in_2.count,
        "feedback snapshots compared"
    );
    Ok(cmp)
}

/// Load two `attachments.csv` snapshots (both must carry `feedback_id`) and compare them.
pub fn compare_attachments_csv(
    csv_1: &Path,
    csv_2: &Path,
    label_1: &str,
    label_2: &str,
) -> Result<AttachmentComparison> {
    let rows_1 = read_attachments_csv(csv_1)?;
    let rows_2 = read_attachments_csv(csv_2)?;
    let cmp = compare_attachments(&rows_1, &rows_2, label_1, label_2);
    info!(
        total_1 = cmp.total_attachments_1,
        total_2 = cmp.total_attachments_2,
        changed = cmp.changes.len(),
        "attachment snapshots compared"
    );
    Ok(cmp)
}
