use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::info;

use crate::attachments::{
    organize_by_user_type, AttachmentTableLookup, FeedbackIdStrategy, FilenamePrefix,
    OrganizeOptions, TransferMode,
};
use crate::dataset::{read_attachments_csv, read_feedback_csv};

/// How a downloaded file is traced back to its feedback id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OrganizeStrategy {
    /// Look the file name up in `attachments.csv`
    #[default]
    Table,
    /// Use the file name text before the first `_`
    Prefix,
}

#[derive(Debug, Clone)]
pub struct OrganizeCommandConfig {
    pub attachments_dir: PathBuf,
    pub feedback_csv: PathBuf,
    /// Required by [`OrganizeStrategy::Table`].
    pub attachments_csv: Option<PathBuf>,
    pub out_dir: PathBuf,
    pub only_user_types: Vec<String>,
    pub move_files: bool,
    pub strategy: OrganizeStrategy,
}

pub fn run_organize(cfg: OrganizeCommandConfig) -> Result<usize> {
    let feedback = read_feedback_csv(&cfg.feedback_csv)?;
    let strategy: Box<dyn FeedbackIdStrategy> = match (cfg.strategy, &cfg.attachments_csv) {
        (OrganizeStrategy::Table, Some(csv)) => {
            let lookup = AttachmentTableLookup::from_rows(&read_attachments_csv(csv)?);
            info!(file_names = lookup.len(), "organize: loaded attachment table");
            Box::new(lookup)
        }
        (OrganizeStrategy::Table, None) => {
            bail!("the table strategy needs --attachments-csv")
        }
        (OrganizeStrategy::Prefix, _) => Box::new(FilenamePrefix),
    };

    let opts = OrganizeOptions {
        only_user_types: (!cfg.only_user_types.is_empty()).then(|| cfg.only_user_types.clone()),
        mode: if cfg.move_files {
            TransferMode::Move
        } else {
            TransferMode::Copy
        },
        ..OrganizeOptions::new(&cfg.out_dir)
    };
    organize_by_user_type(&cfg.attachments_dir, &feedback, strategy.as_ref(), &opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn fixture(root: &Path) -> OrganizeCommandConfig {
        let files = root.join("downloads");
        fs::create_dir_all(&files).unwrap();
        fs::write(files.join("11_report.pdf"), "a").unwrap();
        fs::write(files.join("letter.pdf"), "b").unwrap();
        fs::write(
            root.join("feedback.csv"),
            "feedback_id,userType\n11,NGO\n12,COMPANY\n",
        )
        .unwrap();
        fs::write(
            root.join("attachments.csv"),
            "feedback_id,document_id,file_name,userType\n12,d2,letter.pdf,COMPANY\n",
        )
        .unwrap();
        OrganizeCommandConfig {
            attachments_dir: files,
            feedback_csv: root.join("feedback.csv"),
            attachments_csv: Some(root.join("attachments.csv")),
            out_dir: root.join("by_type"),
            only_user_types: vec![],
            move_files: false,
            strategy: OrganizeStrategy::Table,
        }
    }

    #[test]
    fn table_strategy_uses_attachment_rows() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = fixture(dir.path());
        assert_eq!(run_organize(cfg.clone()).unwrap(), 1);
        assert!(cfg.out_dir.join("COMPANY").join("letter.pdf").exists());
        assert!(cfg.attachments_dir.join("letter.pdf").exists());
    }

    #[test]
    fn prefix_strategy_moves_files() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = OrganizeCommandConfig {
            attachments_csv: None,
            move_files: true,
            strategy: OrganizeStrategy::Prefix,
            ..fixture(dir.path())
        };
        assert_eq!(run_organize(cfg.clone()).unwrap(), 1);
        assert!(cfg.out_dir.join("NGO").join("11_report.pdf").exists());
        assert!(!cfg.attachments_dir.join("11_report.pdf").exists());
    }

    #[test]
    fn table_strategy_without_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = OrganizeCommandConfig {
            attachments_csv: None,
            ..fixture(dir.path())
        };
        let err = run_organize(cfg).unwrap_err();
        assert!(err.to_string().contains("--attachments-csv"));
    }
}
