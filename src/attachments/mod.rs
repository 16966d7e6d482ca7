pub mod download;
pub mod organize;

pub use download::{
    download_attachments, download_attachments_from_csv, DownloadOptions, DownloadSummary,
};
pub use organize::{
    organize_by_user_type, AttachmentTableLookup, FeedbackIdStrategy, FilenamePrefix,
    OrganizeOptions, TransferMode,
};
