use thiserror::Error;

/// Failure of one unit of work in a fetch cycle
///
/// None of these are propagated to the host; they end up in the log and in
/// `PipelineState::Aborted` / `DownloadOutcome`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Empty surface list or missing/placeholder access key
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    /// List response not decodable into photo records, or empty
    #[error("failed to parse photo list: {0}")]
    Parse(String),

    #[error("failed to decode image from {url}: {reason}")]
    ImageDecode { url: String, reason: String },

    /// The surface's owner dropped it before the download finished
    #[error("surface {0} no longer exists")]
    SurfaceGone(usize),

    #[error("a fetch cycle is already in flight")]
    CycleInFlight,
}

/// Network-level failure reported by a `Transport`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("{0}")]
    Network(String),

    /// The server answered, but not with a 2xx
    #[error("HTTP {status}")]
    Status { status: u16, body: String },
}

impl TransportError {
    /// Raw response body, when the server sent one
    pub fn body(&self) -> Option<&str> {
        match self {
            TransportError::Status { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest's message embeds the request URL, query string and key included
        TransportError::Network(err.without_url().to_string())
    }
}
