use serde_json::{Map, Value};
use tracing::debug;

use super::aliases::FieldAliases;
use crate::dataset::{AttachmentRecord, FeedbackRecord};

const FEEDBACK_ID: FieldAliases = FieldAliases::new(&["id", "feedbackId"]);
const USER_TYPE: FieldAliases = FieldAliases::new(&["userType"]);
const AUTHOR: FieldAliases = FieldAliases::new(&["author"]);
const COUNTRY: FieldAliases = FieldAliases::new(&["country"]);
const CREATED: FieldAliases = FieldAliases::new(&["createdDate", "created"]);
const ATTACHMENT_LIST: FieldAliases = FieldAliases::new(&["attachments", "documents"]);
const DOCUMENT_ID: FieldAliases = FieldAliases::new(&["documentId", "id"]);
const FILE_NAME: FieldAliases = FieldAliases::new(&["fileName", "name"]);

/// Both relational tables derived from one batch of raw items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFeedback {
    pub feedback: Vec<FeedbackRecord>,
    pub attachments: Vec<AttachmentRecord>,
}

/// Flatten raw API items into feedback rows and attachment rows.
///
/// Every input item yields exactly one feedback row, in input order.
/// Attachment rows come from the first list found under `attachments` or
/// `documents` and inherit the parent's id and `userType`.
pub fn extract_feedback_and_attachments(items: &[Value]) -> NormalizedFeedback {
    let empty = Map::new();
    let mut out = NormalizedFeedback::default();

    for item in items {
        let obj = item.as_object().unwrap_or(&empty);
        let feedback = FeedbackRecord {
            feedback_id: FEEDBACK_ID.scalar(obj),
            user_type: USER_TYPE.scalar(obj),
            author: AUTHOR.scalar(obj),
            country: COUNTRY.scalar(obj),
            created: CREATED.scalar(obj),
        };

        if let Some(docs) = ATTACHMENT_LIST.list(obj) {
            for doc in docs {
                let Some(doc) = doc.as_object() else {
                    debug!(feedback_id = ?feedback.feedback_id, "skipping non-object attachment entry");
                    continue;
                };
                out.attachments.push(AttachmentRecord {
                    feedback_id: feedback.feedback_id.clone(),
                    document_id: DOCUMENT_ID.scalar(doc),
                    file_name: FILE_NAME.scalar(doc),
                    user_type: feedback.user_type.clone(),
                });
            }
        }

        out.feedback.push(feedback);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_is_preferred_over_feedback_id() {
        let out = extract_feedback_and_attachments(&[json!({
            "id": 503089,
            "feedbackId": 999,
            "userType": "NGO",
            "createdDate": "2023/05/01 12:00:00",
            "created": "ignored"
        })]);
        let fb = &out.feedback[0];
        assert_eq!(fb.feedback_id.as_deref(), Some("503089"));
        assert_eq!(fb.created.as_deref(), Some("2023/05/01 12:00:00"));
        assert_eq!(fb.user_type.as_deref(), Some("NGO"));
    }

    #[test]
    fn legacy_aliases_are_used_when_current_absent() {
        let out = extract_feedback_and_attachments(&[json!({
            "feedbackId": "F-1",
            "created": "2020-01-01"
        })]);
        assert_eq!(out.feedback[0].feedback_id.as_deref(), Some("F-1"));
        assert_eq!(out.feedback[0].created.as_deref(), Some("2020-01-01"));
    }

    #[test]
    fn documents_and_attachments_give_same_rows() {
        let current = json!({
            "id": 1,
            "userType": "TRADE_UNION",
            "attachments": [{ "documentId": "d1", "fileName": "a.pdf" }]
        });
        let legacy = json!({
            "id": 1,
            "userType": "TRADE_UNION",
            "documents": [{ "id": "d1", "name": "a.pdf" }]
        });
        let a = extract_feedback_and_attachments(&[current]);
        let b = extract_feedback_and_attachments(&[legacy]);
        assert_eq!(a.attachments, b.attachments);
        assert_eq!(
            a.attachments[0],
            AttachmentRecord {
                feedback_id: Some("1".into()),
                document_id: Some("d1".into()),
                file_name: Some("a.pdf".into()),
                user_type: Some("TRADE_UNION".into()),
            }
        );
    }

    #[test]
    fn items_without_attachments_keep_their_feedback_row() {
        let out = extract_feedback_and_attachments(&[
            json!({ "id": 1 }),
            json!({ "id": 2, "attachments": "not-a-list" }),
            json!({ "id": 3, "attachments": [] }),
            json!("garbage"),
        ]);
        assert_eq!(out.feedback.len(), 4);
        assert!(out.attachments.is_empty());
        assert_eq!(out.feedback[3], FeedbackRecord::default());
    }

    #[test]
    fn many_attachments_per_item_in_order() {
        let out = extract_feedback_and_attachments(&[json!({
            "id": 7,
            "attachments": [
                { "documentId": "x", "fileName": "one.pdf" },
                "bogus",
                { "id": "y" }
            ]
        })]);
        assert_eq!(out.attachments.len(), 2);
        assert_eq!(out.attachments[1].document_id.as_deref(), Some("y"));
        assert_eq!(out.attachments[1].file_name, None);
        assert_eq!(out.attachments[1].user_type, None);
    }
}
