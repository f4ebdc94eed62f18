use thiserror::Error;

/// Invalid search filter or runtime settings. Fatal before any crawling starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("filter has no areas configured")]
    EmptyAreas,

    #[error("area {0} has no sub-areas")]
    EmptySubAreas(String),

    #[error("filter has no listing kinds configured")]
    EmptyKinds,

    #[error("{field} range is decreasing: {min} > {max}")]
    DecreasingRange {
        field: &'static str,
        min: u32,
        max: u32,
    },

    #[error("no URL template for search mode {0}")]
    NoTemplate(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One listing element could not be used. Logged and skipped.
#[derive(Debug, Error)]
pub enum ExtractionWarning {
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("no listing id in link {0:?}")]
    BadLink(String),
}

/// A single failed fetch attempt. Always retryable.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("page source error: {0}")]
    Source(String),

    #[error("body too short ({len} chars)")]
    BodyTooShort { len: usize },

    #[error("error page: {0}")]
    ErrorPage(String),
}

/// A page could not be fetched. Contained at the page/URL level.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("invalid url {url:?}: {reason}")]
    InvalidInput { url: String, reason: String },

    #[error("giving up on {url} after {attempts} attempts: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: AttemptError,
    },
}

/// Unexpected failure escaping the per-URL loop. The run reports no result.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    #[error("critical crawl error: {0}")]
    Critical(String),
}

/// Message transport failures. Logged; the run's ids are not recorded.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Ledger file failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ledger io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to replace ledger: {0}")]
    Persist(#[from] tempfile::PersistError),
}
