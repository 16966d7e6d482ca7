use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::{HysConfig, MAX_ATTEMPTS};
use crate::error::HysError;

/// Anything that can hand back the bytes of a published document.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch_document(&self, document_id: &str, language: &str) -> Result<Bytes, HysError>;
}

/// `{base}/api/document/{document_id}?language={language}`, with the id
/// encoded as a single path segment.
pub fn build_document_url(
    base_url: &str,
    document_id: &str,
    language: &str,
) -> Result<String, HysError> {
    let raw = format!(
        "{}/api/document/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(document_id)
    );
    let mut url = Url::parse(&raw)?;
    url.query_pairs_mut().append_pair("language", language);
    Ok(url.to_string())
}

fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

#[derive(Clone)]
pub struct HysClient {
    http: Client,
    cfg: Arc<HysConfig>,
}

impl HysClient {
    pub fn new(cfg: HysConfig) -> Result<Self, HysError> {
        let cfg = cfg.normalized();
        let http = Client::builder().user_agent(cfg.user_agent.clone()).build()?;
        Ok(Self {
            http,
            cfg: Arc::new(cfg),
        })
    }

    pub fn config(&self) -> &HysConfig {
        &self.cfg
    }

    /// GET a JSON document. Transient failures are retried; a body that is
    /// not valid JSON is returned as an error straight away.
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Value, HysError> {
        let body = self.get_with_retry(url, query, timeout).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// GET raw bytes (document download).
    pub async fn download(&self, url: &str, timeout: Duration) -> Result<Bytes, HysError> {
        self.get_with_retry(url, &[], timeout).await
    }

    async fn get_with_retry(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Bytes, HysError> {
        let max_attempts = self.cfg.retry_attempts.clamp(1, MAX_ATTEMPTS);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let delay = self.cfg.backoff_delay(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.get_once(url, query, timeout, attempt).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    warn!(attempt, max_attempts, url = %url, error = %e, "hys get failed; will retry");
                }
                Err(e) => {
                    if e.is_transient() {
                        warn!(attempt, url = %url, error = %e, "hys get failed; attempts exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn get_once(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
        attempt: u32,
    ) -> Result<Bytes, HysError> {
        let t0 = Instant::now();
        let mut req = self.http.get(url).timeout(timeout);
        if !query.is_empty() {
            req = req.query(query);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        debug!(
            url = %url,
            attempt,
            status = status.as_u16(),
            body_len = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "hys get response"
        );

        if !status.is_success() {
            let sample = truncate_for_log(String::from_utf8_lossy(&body).into_owned(), 512);
            return Err(HysError::Http {
                status: status.as_u16(),
                body: sample,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl DocumentSource for HysClient {
    async fn fetch_document(&self, document_id: &str, language: &str) -> Result<Bytes, HysError> {
        let url = build_document_url(&self.cfg.base_url, document_id, language)?;
        self.download(&url, self.cfg.download_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_url_shape() {
        let url = build_document_url(
            "https://ec.europa.eu/info/law/better-regulation/",
            "090166e5d1a6b2c3",
            "EN",
        )
        .unwrap();
        assert_eq!(
            url,
            "https://ec.europa.eu/info/law/better-regulation/api/document/090166e5d1a6b2c3?language=EN"
        );
    }

    #[test]
    fn document_id_cannot_add_path_segments() {
        let url = build_document_url("http://localhost:1", "a/../b", "FR").unwrap();
        assert!(url.ends_with("/api/document/a%2F..%2Fb?language=FR"), "{url}");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let s = truncate_for_log("ééééé".to_string(), 3);
        assert_eq!(s, "é…");
        assert_eq!(truncate_for_log("short".into(), 10), "short");
    }
}
