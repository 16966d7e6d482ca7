pub mod aliases;
pub mod feedback;

pub use feedback::{extract_feedback_and_attachments, NormalizedFeedback};
