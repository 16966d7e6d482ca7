use std::collections::HashMap;
use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::download::target_file_name;
use crate::dataset::{user_type_allowed, AttachmentRecord, FeedbackRecord};

const PROGRESS_EVERY: usize = 25;

/// Resolves which feedback a downloaded file belongs to.
pub trait FeedbackIdStrategy {
    fn feedback_id_for(&self, file_name: &str) -> Option<String>;
}

/// Looks the file name up in `attachments.csv`, keyed by the name the
/// downloader saves each row under. Later rows override earlier rows for the
/// same file name.
#[derive(Debug, Clone, Default)]
pub struct AttachmentTableLookup {
    by_file_name: HashMap<String, String>,
}

impl AttachmentTableLookup {
    pub fn from_rows(rows: &[AttachmentRecord]) -> Self {
        let by_file_name = rows
            .iter()
            .filter_map(|r| Some((saved_file_name(r)?, r.feedback_id.clone()?)))
            .collect();
        Self { by_file_name }
    }

    pub fn len(&self) -> usize {
        self.by_file_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_file_name.is_empty()
    }
}

/// Local name of a downloaded row; the raw `file_name` when there is no
/// document id to fall back on.
fn saved_file_name(row: &AttachmentRecord) -> Option<String> {
    match row.document_id.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(document_id) => Some(target_file_name(row.file_name.as_deref(), document_id)),
        None => row.file_name.clone(),
    }
}

impl FeedbackIdStrategy for AttachmentTableLookup {
    fn feedback_id_for(&self, file_name: &str) -> Option<String> {
        self.by_file_name.get(file_name).cloned()
    }
}

/// Takes the text before the first `_` of the file name as the feedback id.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenamePrefix;

impl FeedbackIdStrategy for FilenamePrefix {
    fn feedback_id_for(&self, file_name: &str) -> Option<String> {
        let (prefix, _) = file_name.split_once('_')?;
        let prefix = prefix.trim();
        (!prefix.is_empty()).then(|| prefix.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferMode {
    #[default]
    Copy,
    Move,
}

#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub out_dir: PathBuf,
    pub only_user_types: Option<Vec<String>>,
    pub mode: TransferMode,
}

impl OrganizeOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            only_user_types: None,
            mode: TransferMode::Copy,
        }
    }
}

/// `feedback_id -> userType`, skipping rows lacking either value. Later rows win.
pub fn user_types_by_feedback(rows: &[FeedbackRecord]) -> HashMap<String, String> {
    rows.iter()
        .filter_map(|r| Some((r.feedback_id.clone()?, r.user_type.clone()?)))
        .collect()
}

/// A `userType` made safe to use as one directory name.
fn user_type_dir(user_type: &str) -> String {
    let cleaned: String = user_type
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Sort the regular files of `attachments_dir` into `{out_dir}/{userType}/`.
///
/// Files whose feedback id or `userType` cannot be resolved, or whose type
/// is filtered out, are left alone. A file that fails to transfer is logged
/// and skipped. Returns the number of files placed.
pub fn organize_by_user_type(
    attachments_dir: &Path,
    feedback: &[FeedbackRecord],
    strategy: &dyn FeedbackIdStrategy,
    opts: &OrganizeOptions,
) -> Result<usize> {
    fs::create_dir_all(&opts.out_dir)
        .with_context(|| format!("create {}", opts.out_dir.display()))?;
    let user_types = user_types_by_feedback(feedback);

    let mut files: Vec<PathBuf> = fs::read_dir(attachments_dir)
        .with_context(|| format!("read {}", attachments_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    info!(
        files = files.len(),
        known_feedback = user_types.len(),
        mode = ?opts.mode,
        "organizing attachments by userType"
    );

    let mut organized = 0usize;
    let mut unmatched = 0usize;
    let mut failed = 0usize;
    for (i, path) in files.iter().enumerate() {
        if i > 0 && i % PROGRESS_EVERY == 0 {
            info!(done = i, total = files.len(), organized, "organize progress");
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            unmatched += 1;
            continue;
        };
        let Some(user_type) = strategy
            .feedback_id_for(name)
            .and_then(|fid| user_types.get(&fid))
        else {
            debug!(file = name, "no feedback/userType mapping; leaving in place");
            unmatched += 1;
            continue;
        };
        if !user_type_allowed(Some(user_type.as_str()), opts.only_user_types.as_deref()) {
            continue;
        }

        let target_dir = opts.out_dir.join(user_type_dir(user_type));
        let target = target_dir.join(name);
        let result = fs::create_dir_all(&target_dir)
            .with_context(|| format!("create {}", target_dir.display()))
            .and_then(|_| transfer(path, &target, opts.mode));
        match result {
            Ok(()) => organized += 1,
            Err(e) => {
                warn!(file = name, error = %format!("{e:#}"), "organize failed");
                failed += 1;
            }
        }
    }

    info!(organized, unmatched, failed, "organize finished");
    Ok(organized)
}

fn transfer(src: &Path, dst: &Path, mode: TransferMode) -> Result<()> {
    match mode {
        TransferMode::Copy => copy_with_times(src, dst),
        TransferMode::Move => move_file(src, dst),
    }
}

/// Copy contents and permissions, then carry the access/modification times over.
fn copy_with_times(src: &Path, dst: &Path) -> Result<()> {
    if fs::metadata(dst).is_ok_and(|m| m.permissions().readonly()) {
        fs::remove_file(dst).with_context(|| format!("remove read-only {}", dst.display()))?;
    }
    fs::copy(src, dst).with_context(|| format!("copy {} -> {}", src.display(), dst.display()))?;
    let meta = fs::metadata(src).with_context(|| format!("stat {}", src.display()))?;
    let mut times = FileTimes::new();
    if let Ok(t) = meta.accessed() {
        times = times.set_accessed(t);
    }
    if let Ok(t) = meta.modified() {
        times = times.set_modified(t);
    }
    // timestamps need ownership, not write access; the copy may be read-only
    File::open(dst)
        .and_then(|f| f.set_times(times))
        .with_context(|| format!("set times on {}", dst.display()))?;
    Ok(())
}

fn move_file(src: &Path, dst: &Path) -> Result<()> {
    if let Err(e) = fs::rename(src, dst) {
        if !src.is_file() {
            return Err(e).with_context(|| format!("move {} -> {}", src.display(), dst.display()));
        }
        // rename cannot cross filesystems
        debug!(src = %src.display(), error = %e, "rename failed; copying instead");
        copy_with_times(src, dst)?;
        fs::remove_file(src).with_context(|| format!("remove {}", src.display()))?;
    }
    Ok(())
}
