use thiserror::Error;

#[derive(Error, Debug)]
pub enum HysError {
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("network: {0}")]
    Net(#[from] reqwest::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("url: {0}")]
    Url(#[from] url::ParseError),
    #[error("other: {0}")]
    Other(String),
}

impl HysError {
    /// Whether another attempt could plausibly succeed: network failures,
    /// timeouts and any non-2xx status. Decode and URL errors are final.
    pub fn is_transient(&self) -> bool {
        matches!(self, HysError::Http { .. } | HysError::Net(_))
    }
}
