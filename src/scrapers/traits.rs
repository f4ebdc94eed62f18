use crate::error::FetchFailure;
use anyhow::Result;
use async_trait::async_trait;

/// Raw page loading primitive (a browser, or a fake in tests)
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Load `url` and return the rendered HTML
    async fn load(&self, url: &str) -> Result<String>;

    /// Name used in logs
    fn source_name(&self) -> &'static str;
}

/// Fetches a page, handling retries itself. Callers treat a failure as "page unavailable".
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchFailure>;
}
