use std::hash::Hash;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

pub const FEEDBACK_COLUMNS: [&str; 5] = ["feedback_id", "userType", "author", "country", "created"];
pub const ATTACHMENT_COLUMNS: [&str; 4] = ["feedback_id", "document_id", "file_name", "userType"];

/// One normalized feedback submission (a row of `feedback.csv`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub feedback_id: Option<String>,
    #[serde(rename = "userType")]
    pub user_type: Option<String>,
    pub author: Option<String>,
    pub country: Option<String>,
    pub created: Option<String>,
}

/// One attachment reference (a row of `attachments.csv`). `user_type` is
/// copied from the parent feedback item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub feedback_id: Option<String>,
    pub document_id: Option<String>,
    pub file_name: Option<String>,
    #[serde(rename = "userType")]
    pub user_type: Option<String>,
}

/// Drop exact duplicate rows, keeping the first occurrence of each.
pub fn dedup_rows<T>(rows: impl IntoIterator<Item = T>) -> Vec<T>
where
    T: Eq + Hash,
{
    rows.into_iter().collect::<IndexSet<T>>().into_iter().collect()
}

/// Whether `user_type` passes an optional allow-list. Without a list every
/// row passes; with one, rows lacking a user type are rejected.
pub fn user_type_allowed(user_type: Option<&str>, allow: Option<&[String]>) -> bool {
    match allow {
        None => true,
        Some(list) if list.is_empty() => true,
        Some(list) => user_type.is_some_and(|t| list.iter().any(|a| a == t)),
    }
}
