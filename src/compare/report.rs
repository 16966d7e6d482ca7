use std::path::Path;

use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Serialize;

use super::model::{AttachmentComparison, FeedbackComparison};

const RULE_WIDTH: usize = 80;
/// Changed ids listed in the text report before the "... and N more" line.
pub const CHANGED_LIST_LIMIT: usize = 20;
/// Ids per side written to the detail CSV.
pub const DETAIL_CSV_LIMIT: usize = 50;

#[derive(Debug, Serialize)]
struct DetailRow<'a> {
    feedback_id: &'a str,
    status: String,
    phase_1_present: bool,
    phase_2_present: bool,
}

fn detail_rows(f: &FeedbackComparison) -> Vec<DetailRow<'_>> {
    let side_1 = f.only_in_1.ids.iter().take(DETAIL_CSV_LIMIT).map(|id| DetailRow {
        feedback_id: id,
        status: format!("Only in {}", f.label_1),
        phase_1_present: true,
        phase_2_present: false,
    });
    let side_2 = f.only_in_2.ids.iter().take(DETAIL_CSV_LIMIT).map(|id| DetailRow {
        feedback_id: id,
        status: format!("Only in {}", f.label_2),
        phase_1_present: false,
        phase_2_present: true,
    });
    side_1.chain(side_2).collect()
}

/// Write up to [`DETAIL_CSV_LIMIT`] exclusive ids per side. Nothing is
/// written when neither side has exclusive ids; returns the rows written.
pub fn write_detail_csv(path: &Path, f: &FeedbackComparison) -> Result<usize> {
    let rows = detail_rows(f);
    if rows.is_empty() {
        return Ok(0);
    }
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("open {}", path.display()))?;
    for row in &rows {
        wtr.serialize(row)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(rows.len())
}

/// Render the comparison as fixed-order text sections. When `detail_csv` is
/// given the detail CSV is written too and its path noted in the report.
pub fn render_report(
    f: &FeedbackComparison,
    a: &AttachmentComparison,
    detail_csv: Option<&Path>,
) -> Result<String> {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut lines: Vec<String> = Vec::new();

    lines.push(heavy.clone());
    lines.push(format!("COMPARISON REPORT: {} vs {}", f.label_1, f.label_2));
    lines.push(heavy.clone());
    lines.push(String::new());

    lines.push("FEEDBACK SUMMARY".into());
    lines.push(light.clone());
    lines.push(format!("{}: {} entries", f.label_1, f.total_1));
    lines.push(format!("{}: {} entries", f.label_2, f.total_2));
    lines.push(format!("Common feedback_ids: {}", f.common));
    lines.push(format!("Only in {}: {}", f.label_1, f.only_in_1.count));
    lines.push(format!("Only in {}: {}", f.label_2, f.only_in_2.count));
    lines.push(String::new());

    if !f.user_types_1.is_empty() || !f.user_types_2.is_empty() {
        lines.push("USER TYPE DISTRIBUTION".into());
        lines.push(light.clone());
        for (label, dist) in [(&f.label_1, &f.user_types_1), (&f.label_2, &f.user_types_2)] {
            lines.push(format!("{label}:"));
            lines.extend(dist.iter().map(|(t, n)| format!("  {t}: {n}")));
        }
        lines.push(String::new());
    }

    lines.push("ATTACHMENT SUMMARY".into());
    lines.push(light.clone());
    lines.push(format!(
        "{}: {} total, {} feedback",
        a.label_1, a.total_attachments_1, a.feedback_with_attachments_1
    ));
    lines.push(format!(
        "{}: {} total, {} feedback",
        a.label_2, a.total_attachments_2, a.feedback_with_attachments_2
    ));
    lines.push(String::new());

    lines.push("ATTACHMENT CHANGES".into());
    lines.push(light);
    lines.push(format!(
        "Feedback only in {}: {} ({} attachments)",
        a.label_1, a.only_in_1.count, a.only_in_1.attachment_count
    ));
    lines.push(format!(
        "Feedback only in {}: {} ({} attachments)",
        a.label_2, a.only_in_2.count, a.only_in_2.attachment_count
    ));
    lines.push(format!("Attachment count changes: {} feedback", a.changes.len()));
    lines.push(String::new());

    if !a.changes.is_empty() {
        lines.push("CHANGED FEEDBACK (attachment count):".into());
        lines.extend(
            a.changes
                .iter()
                .take(CHANGED_LIST_LIMIT)
                .map(|(fid, c)| format!("  {fid}: {} → {}", c.before, c.after)),
        );
        if a.changes.len() > CHANGED_LIST_LIMIT {
            lines.push(format!("  ... and {} more", a.changes.len() - CHANGED_LIST_LIMIT));
        }
    }
    lines.push(String::new());

    if let Some(path) = detail_csv {
        if write_detail_csv(path, f)? > 0 {
            lines.push(format!("Detailed comparison saved to: {}", path.display()));
        }
    }

    lines.push(heavy);
    Ok(lines.iter().join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::engine::{compare_attachments, compare_feedback};
    use crate::dataset::{AttachmentRecord, FeedbackRecord};

    fn fb(id: impl Into<String>, user_type: &str) -> FeedbackRecord {
        FeedbackRecord {
            feedback_id: Some(id.into()),
            user_type: Some(user_type.into()),
            ..Default::default()
        }
    }

    fn att(fid: impl Into<String>) -> AttachmentRecord {
        AttachmentRecord {
            feedback_id: Some(fid.into()),
            ..Default::default()
        }
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let f = compare_feedback(
            &[fb("A", "NGO"), fb("B", "COMPANY")],
            &[fb("B", "COMPANY"), fb("C", "NGO")],
            "March",
            "June",
        );
        let a = compare_attachments(&[att("A"), att("B")], &[att("B"), att("B")], "March", "June");
        let text = render_report(&f, &a, None).unwrap();

        let order = [
            "COMPARISON REPORT: March vs June",
            "FEEDBACK SUMMARY",
            "USER TYPE DISTRIBUTION",
            "ATTACHMENT SUMMARY",
            "ATTACHMENT CHANGES",
            "CHANGED FEEDBACK (attachment count):",
        ];
        let positions: Vec<usize> = order.iter().map(|s| text.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");

        assert!(text.contains("Common feedback_ids: 1"));
        assert!(text.contains("Only in March: 1"));
        assert!(text.contains("March:\n  COMPANY: 1\n  NGO: 1"));
        assert!(text.contains("March: 2 total, 2 feedback"));
        assert!(text.contains("Feedback only in March: 1 (1 attachments)"));
        assert!(text.contains("  B: 1 → 2"));
        assert!(text.starts_with(&"=".repeat(80)));
        assert!(text.ends_with(&"=".repeat(80)));
    }

    #[test]
    fn user_type_section_omitted_without_types() {
        let f = compare_feedback(&[FeedbackRecord::default()], &[], "a", "b");
        let a = compare_attachments(&[], &[], "a", "b");
        let text = render_report(&f, &a, None).unwrap();
        assert!(!text.contains("USER TYPE DISTRIBUTION"));
        assert!(!text.contains("CHANGED FEEDBACK"));
    }

    #[test]
    fn changed_list_is_capped_at_twenty() {
        let before: Vec<AttachmentRecord> = (0..25).map(|i| att(format!("id{i:02}"))).collect();
        let after: Vec<AttachmentRecord> = before.iter().chain(before.iter()).cloned().collect();
        let f = compare_feedback(&[], &[], "a", "b");
        let a = compare_attachments(&before, &after, "a", "b");
        let text = render_report(&f, &a, None).unwrap();

        let listed = text.lines().filter(|l| l.contains(": 1 → 2")).count();
        assert_eq!(listed, CHANGED_LIST_LIMIT);
        assert!(text.contains("  id19: 1 → 2"));
        assert!(!text.contains("  id20: 1 → 2"));
        assert!(text.contains("  ... and 5 more"));
    }

    #[test]
    fn detail_csv_caps_each_side_at_fifty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("details.csv");
        let side_1: Vec<FeedbackRecord> = (0..200).map(|i| fb(format!("p1-{i:03}"), "NGO")).collect();
        let side_2: Vec<FeedbackRecord> = (0..3).map(|i| fb(format!("p2-{i}"), "NGO")).collect();
        let f = compare_feedback(&side_1, &side_2, "Phase 1", "Phase 2");
        let a = compare_attachments(&[], &[], "Phase 1", "Phase 2");

        let text = render_report(&f, &a, Some(&path)).unwrap();
        assert!(text.contains("Only in Phase 1: 200"));
        assert!(text.contains(&format!("Detailed comparison saved to: {}", path.display())));

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            rdr.headers().unwrap(),
            vec!["feedback_id", "status", "phase_1_present", "phase_2_present"]
        );
        let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 53);
        assert_eq!(&rows[0][0], "p1-000");
        assert_eq!(&rows[49][0], "p1-049");
        assert_eq!(&rows[0][1], "Only in Phase 1");
        assert_eq!((&rows[0][2], &rows[0][3]), ("true", "false"));
        assert_eq!((&rows[50][2], &rows[50][3]), ("false", "true"));
    }

    #[test]
    fn no_detail_csv_when_nothing_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("details.csv");
        let f = compare_feedback(&[fb("A", "NGO")], &[fb("A", "NGO")], "a", "b");
        let a = compare_attachments(&[], &[], "a", "b");
        let text = render_report(&f, &a, Some(&path)).unwrap();
        assert!(!path.exists());
        assert!(!text.contains("Detailed comparison saved"));
    }
}
