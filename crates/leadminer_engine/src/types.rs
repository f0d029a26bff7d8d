/// A downloaded document and where it actually came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    /// URL after redirects; archive.org download links usually hop to a mirror.
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The host answered but refused to serve the document.
    pub fn is_blocked(&self) -> bool {
        matches!(self.kind, FailureKind::HttpStatus(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureKind {
    #[error("invalid document url")]
    InvalidUrl,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("download timed out")]
    Timeout,
    #[error("too many redirects")]
    RedirectLimitExceeded,
    #[error("document too large (limit {max_bytes} bytes, got {actual:?})")]
    TooLarge { max_bytes: u64, actual: Option<u64> },
    #[error("not a pdf document (content type {content_type:?})")]
    NotPdf { content_type: Option<String> },
    #[error("network error")]
    Network,
}
