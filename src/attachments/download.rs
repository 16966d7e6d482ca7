use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hys_client::DocumentSource;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dataset::{read_attachments_csv, user_type_allowed, AttachmentRecord};

const PROGRESS_EVERY: usize = 25;

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub out_dir: PathBuf,
    pub language: String,
    pub only_user_types: Option<Vec<String>>,
    pub skip_existing: bool,
}

impl DownloadOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            language: "EN".into(),
            only_user_types: None,
            skip_existing: true,
        }
    }
}

/// Rows skipped because the file already existed are in neither count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub failed: usize,
}

/// Local file name for a row: the final component of `file_name`, else the
/// document id.
pub fn target_file_name(file_name: Option<&str>, document_id: &str) -> String {
    file_name
        .and_then(|name| Path::new(name.trim()).file_name())
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| document_id.to_string())
}

/// Fetch every attachment row that passes the `userType` filter into
/// `opts.out_dir`. A failing row is counted and the batch carries on.
pub async fn download_attachments<S>(
    source: &S,
    rows: &[AttachmentRecord],
    opts: &DownloadOptions,
) -> Result<DownloadSummary>
where
    S: DocumentSource + ?Sized,
{
    fs::create_dir_all(&opts.out_dir)
        .with_context(|| format!("create {}", opts.out_dir.display()))?;

    let selected: Vec<&AttachmentRecord> = rows
        .iter()
        .filter(|r| user_type_allowed(r.user_type.as_deref(), opts.only_user_types.as_deref()))
        .collect();
    info!(
        rows = rows.len(),
        selected = selected.len(),
        out_dir = %opts.out_dir.display(),
        "downloading attachments"
    );

    let mut summary = DownloadSummary::default();
    for (i, row) in selected.iter().enumerate() {
        if i > 0 && i % PROGRESS_EVERY == 0 {
            info!(
                done = i,
                total = selected.len(),
                downloaded = summary.downloaded,
                failed = summary.failed,
                "download progress"
            );
        }

        let Some(document_id) = row.document_id.as_deref().map(str::trim).filter(|d| !d.is_empty())
        else {
            warn!(feedback_id = ?row.feedback_id, "attachment row has no document_id");
            summary.failed += 1;
            continue;
        };

        let out_path = opts
            .out_dir
            .join(target_file_name(row.file_name.as_deref(), document_id));
        if opts.skip_existing && out_path.exists() {
            debug!(path = %out_path.display(), "already downloaded; skipping");
            continue;
        }

        match fetch_to_file(source, document_id, &opts.language, &out_path).await {
            Ok(bytes) => {
                debug!(document_id, bytes, path = %out_path.display(), "saved attachment");
                summary.downloaded += 1;
            }
            Err(e) => {
                warn!(document_id, error = %format!("{e:#}"), "attachment download failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        downloaded = summary.downloaded,
        failed = summary.failed,
        "attachment download finished"
    );
    Ok(summary)
}

async fn fetch_to_file<S>(
    source: &S,
    document_id: &str,
    language: &str,
    out_path: &Path,
) -> Result<usize>
where
    S: DocumentSource + ?Sized,
{
    let body = source
        .fetch_document(document_id, language)
        .await
        .with_context(|| format!("fetch document {document_id}"))?;
    fs::write(out_path, &body).with_context(|| format!("write {}", out_path.display()))?;
    Ok(body.len())
}

/// [`download_attachments`] over the rows of an `attachments.csv`.
pub async fn download_attachments_from_csv<S>(
    source: &S,
    attachments_csv: &Path,
    opts: &DownloadOptions,
) -> Result<DownloadSummary>
where
    S: DocumentSource + ?Sized,
{
    let rows = read_attachments_csv(attachments_csv)?;
    download_attachments(source, &rows, opts).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use hys_client::HysError;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeDocuments {
        failing: HashSet<String>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeDocuments {
        fn failing(ids: &[&str]) -> Self {
            Self {
                failing: ids.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentSource for FakeDocuments {
        async fn fetch_document(&self, document_id: &str, language: &str) -> Result<Bytes, HysError> {
            self.calls
                .lock()
                .unwrap()
                .push((document_id.to_string(), language.to_string()));
            if self.failing.contains(document_id) {
                return Err(HysError::Http {
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(Bytes::from(format!("bytes of {document_id}")))
        }
    }

    fn row(doc: Option<&str>, name: Option<&str>, user_type: Option<&str>) -> AttachmentRecord {
        AttachmentRecord {
            feedback_id: Some("1".into()),
            document_id: doc.map(Into::into),
            file_name: name.map(Into::into),
            user_type: user_type.map(Into::into),
        }
    }

    #[tokio::test]
    async fn missing_document_id_fails_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeDocuments::default();
        let rows = vec![row(None, Some("a.pdf"), None), row(Some("  "), None, None)];

        let summary = download_attachments(&source, &rows, &DownloadOptions::new(dir.path()))
            .await
            .unwrap();
        assert_eq!(summary, DownloadSummary { downloaded: 0, failed: 2 });
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn writes_files_and_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeDocuments::failing(&["bad"]);
        let rows = vec![
            row(Some("d1"), Some("first.pdf"), Some("NGO")),
            row(Some("bad"), Some("broken.pdf"), Some("NGO")),
            row(Some("d3"), None, Some("NGO")),
        ];
        let mut opts = DownloadOptions::new(dir.path());
        opts.language = "FR".into();

        let summary = download_attachments(&source, &rows, &opts).await.unwrap();
        assert_eq!(summary, DownloadSummary { downloaded: 2, failed: 1 });
        assert_eq!(
            std::fs::read_to_string(dir.path().join("first.pdf")).unwrap(),
            "bytes of d1"
        );
        assert!(dir.path().join("d3").is_file());
        assert!(!dir.path().join("broken.pdf").exists());
        assert!(source.calls().iter().all(|(_, lang)| lang == "FR"));
    }

    #[tokio::test]
    async fn skip_existing_counts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("have.pdf"), "old").unwrap();
        let source = FakeDocuments::default();
        let rows = vec![row(Some("d1"), Some("have.pdf"), None)];

        let summary = download_attachments(&source, &rows, &DownloadOptions::new(dir.path()))
            .await
            .unwrap();
        assert_eq!(summary, DownloadSummary::default());
        assert!(source.calls().is_empty());

        let mut opts = DownloadOptions::new(dir.path());
        opts.skip_existing = false;
        let summary = download_attachments(&source, &rows, &opts).await.unwrap();
        assert_eq!(summary.downloaded, 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("have.pdf")).unwrap(),
            "bytes of d1"
        );
    }

    #[tokio::test]
    async fn user_type_filter_excludes_rows_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeDocuments::default();
        let rows = vec![
            row(Some("d1"), Some("ngo.pdf"), Some("NGO")),
            row(Some("d2"), Some("co.pdf"), Some("COMPANY")),
            row(None, Some("none.pdf"), None),
        ];
        let mut opts = DownloadOptions::new(dir.path());
        opts.only_user_types = Some(vec!["NGO".into()]);

        let summary = download_attachments(&source, &rows, &opts).await.unwrap();
        assert_eq!(summary, DownloadSummary { downloaded: 1, failed: 0 });
        assert_eq!(source.calls(), vec![("d1".to_string(), "EN".to_string())]);
    }

    #[test]
    fn file_names_cannot_escape_out_dir() {
        assert_eq!(target_file_name(Some("../../etc/passwd"), "d"), "passwd");
        assert_eq!(target_file_name(Some(""), "d9"), "d9");
        assert_eq!(target_file_name(Some(".."), "d9"), "d9");
        assert_eq!(target_file_name(None, "d9"), "d9");
        assert_eq!(target_file_name(Some("Position paper.pdf"), "d"), "Position paper.pdf");
    }
}
