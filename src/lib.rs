//! Retrieval and analysis of public feedback submitted to EU "Have Your Say"
//! consultations.
//!
//! The pipeline runs in four stages that hand data to each other through
//! files: [`cli::fetch`] pulls every feedback item for a publication and writes
//! the normalized tables, [`cli::download`] fetches the attachments listed
//! there, [`cli::organize`] groups downloaded files by submitter type, and
//! [`cli::compare`] diffs two snapshots of the tables.

pub mod attachments;
pub mod cli;
pub mod compare;
pub mod dataset;
pub mod logging;
pub mod normalization;

pub mod util {
    pub mod env;
}

pub use hys_client;
