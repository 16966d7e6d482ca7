use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::HysClient;
use crate::error::HysError;

/// One feedback item exactly as the API returned it.
pub type RawFeedbackItem = Value;

/// Where a page's item list may live, newest API shape first.
const PAGE_ITEM_PATHS: &[&[&str]] = &[&["content"], &["_embedded", "feedback"]];

#[derive(Clone, Debug)]
pub struct FeedbackQuery {
    pub publication_id: i64,
    pub page_size: u32,
    pub language: String,
    pub max_pages: Option<u32>,
}

impl FeedbackQuery {
    pub fn new(publication_id: i64) -> Self {
        Self {
            publication_id,
            page_size: 100,
            language: "EN".into(),
            max_pages: None,
        }
    }

    fn page(&self, page: u32) -> PageRequest {
        PageRequest {
            publication_id: self.publication_id,
            size: self.page_size,
            page,
            language: self.language.clone(),
        }
    }
}

/// Query parameters of a single listing call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub publication_id: i64,
    pub size: u32,
    pub page: u32,
    pub language: String,
}

impl PageRequest {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("publicationId", self.publication_id.to_string()),
            ("size", self.size.to_string()),
            ("page", self.page.to_string()),
            ("language", self.language.clone()),
        ]
    }
}

#[async_trait]
pub trait FeedbackPageSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Value, HysError>;
}

#[async_trait]
impl FeedbackPageSource for HysClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Value, HysError> {
        let url = self.config().feedback_endpoint();
        self.get_json(&url, &request.query_pairs(), self.config().timeout)
            .await
    }
}

/// Items of one listing page: the first candidate path holding a non-empty
/// array wins. Unknown shapes give an empty page.
pub fn extract_page_items(page: &Value) -> &[Value] {
    for path in PAGE_ITEM_PATHS {
        let mut cur = Some(page);
        for key in path.iter() {
            cur = cur.and_then(|v| v.as_object()).and_then(|o| o.get(*key));
        }
        if let Some(items) = cur.and_then(|v| v.as_array()) {
            if !items.is_empty() {
                return items.as_slice();
            }
        }
    }
    &[]
}

/// `totalPages` as advertised by the page, if it reads as a non-negative integer.
pub fn advertised_total_pages(page: &Value) -> Option<u64> {
    match page.get("totalPages")? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Walk the listing from page 0 until an empty page, the `max_pages` cap,
/// or the advertised `totalPages`, in that order of precedence.
///
/// A request that still fails after the client's retries aborts the whole
/// walk; items gathered from earlier pages are discarded.
pub async fn fetch_feedback<S>(
    source: &S,
    query: &FeedbackQuery,
) -> Result<Vec<RawFeedbackItem>, HysError>
where
    S: FeedbackPageSource + ?Sized,
{
    let mut feedback: Vec<RawFeedbackItem> = Vec::new();
    let mut page: u32 = 0;

    loop {
        let request = query.page(page);
        let data = match source.fetch_page(&request).await {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    publication_id = query.publication_id,
                    page,
                    discarded = feedback.len(),
                    error = %e,
                    "feedback page failed; aborting retrieval"
                );
                return Err(e);
            }
        };

        let items = extract_page_items(&data);
        if items.is_empty() {
            info!(page, total = feedback.len(), "empty page; retrieval complete");
            break;
        }
        feedback.extend(items.iter().cloned());
        info!(
            publication_id = query.publication_id,
            page,
            items = items.len(),
            total = feedback.len(),
            "fetched feedback page"
        );

        let total_pages = advertised_total_pages(&data);
        page += 1;
        if query.max_pages.is_some_and(|max| page >= max) {
            info!(page, "max_pages reached");
            break;
        }
        if total_pages.is_some_and(|total| u64::from(page) >= total) {
            info!(page, "advertised totalPages reached");
            break;
        }
    }

    Ok(feedback)
}
