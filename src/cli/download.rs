use std::path::PathBuf;

use anyhow::Result;
use hys_client::{DocumentSource, HysClient};
use tracing::info;

use crate::attachments::{download_attachments_from_csv, DownloadOptions, DownloadSummary};

#[derive(Debug, Clone)]
pub struct DownloadCommandConfig {
    pub attachments_csv: PathBuf,
    pub out_dir: PathBuf,
    pub language: String,
    /// Restrict to these `userType` values; empty means all.
    pub only_user_types: Vec<String>,
    pub skip_existing: bool,
    pub base_url: Option<String>,
}

impl DownloadCommandConfig {
    fn options(&self) -> DownloadOptions {
        DownloadOptions {
            language: self.language.clone(),
            only_user_types: (!self.only_user_types.is_empty())
                .then(|| self.only_user_types.clone()),
            skip_existing: self.skip_existing,
            ..DownloadOptions::new(&self.out_dir)
        }
    }
}

pub async fn run_download(cfg: DownloadCommandConfig) -> Result<DownloadSummary> {
    let client = HysClient::new(super::client_config(cfg.base_url.as_deref()))?;
    download_with(&client, &cfg).await
}

pub async fn download_with<S>(source: &S, cfg: &DownloadCommandConfig) -> Result<DownloadSummary>
where
    S: DocumentSource + ?Sized,
{
    let summary = download_attachments_from_csv(source, &cfg.attachments_csv, &cfg.options()).await?;
    info!(
        downloaded = summary.downloaded,
        failed = summary.failed,
        out_dir = %cfg.out_dir.display(),
        "download: finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use hys_client::HysError;
    use std::fs;

    struct EchoDocuments;

    #[async_trait]
    impl DocumentSource for EchoDocuments {
        async fn fetch_document(&self, document_id: &str, language: &str) -> Result<Bytes, HysError> {
            Ok(Bytes::from(format!("{document_id}/{language}")))
        }
    }

    #[tokio::test]
    async fn filters_by_user_type_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("attachments.csv");
        fs::write(
            &csv_path,
            "feedback_id,document_id,file_name,userType\n\
             1,d1,one.pdf,NGO\n\
             2,d2,two.pdf,COMPANY\n\
             3,d3,,NGO\n",
        )
        .unwrap();
        let out = dir.path().join("files");
        let cfg = DownloadCommandConfig {
            attachments_csv: csv_path,
            out_dir: out.clone(),
            language: "FR".into(),
            only_user_types: vec!["NGO".into()],
            skip_existing: true,
            base_url: None,
        };

        let summary = download_with(&EchoDocuments, &cfg).await.unwrap();
        assert_eq!(summary, DownloadSummary { downloaded: 2, failed: 0 });
        assert_eq!(fs::read_to_string(out.join("one.pdf")).unwrap(), "d1/FR");
        assert_eq!(fs::read_to_string(out.join("d3")).unwrap(), "d3/FR");
        assert!(!out.join("two.pdf").exists());
    }

    #[test]
    fn empty_filter_means_everything() {
        let cfg = DownloadCommandConfig {
            attachments_csv: "a.csv".into(),
            out_dir: "out".into(),
            language: "EN".into(),
            only_user_types: vec![],
            skip_existing: false,
            base_url: None,
        };
        let opts = cfg.options();
        assert!(opts.only_user_types.is_none());
        assert!(!opts.skip_existing);
    }
}
