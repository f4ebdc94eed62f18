use crate::error::{AttemptError, FetchFailure};
use crate::scrapers::document::PageDocument;
use crate::scrapers::traits::{PageFetcher, PageSource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Bounded retry policy for page fetches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed delay between attempts, in milliseconds
    pub delay_ms: u64,
    /// Bodies shorter than this (in characters) are treated as failed loads
    pub min_body_len: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 2000,
            min_body_len: 500,
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// [`PageFetcher`] that retries a [`PageSource`] according to a [`RetryPolicy`]
pub struct RetryingFetcher<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: PageSource> RetryingFetcher<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    async fn attempt(&self, url: &str) -> Result<String, AttemptError> {
        let html = self
            .source
            .load(url)
            .await
            .map_err(|e| AttemptError::Source(format!("{e:#}")))?;
        check_body(&html, self.policy.min_body_len)?;
        Ok(html)
    }
}

#[async_trait]
impl<S: PageSource> PageFetcher for RetryingFetcher<S> {
    async fn fetch(&self, url: &str) -> Result<String, FetchFailure> {
        validate_url(url)?;

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            debug!("Fetching {} via {} (attempt {}/{})", url, self.source.source_name(), attempt, max_attempts);
            match self.attempt(url).await {
                Ok(html) => {
                    debug!("Fetched {} chars from {}", html.chars().count(), url);
                    return Ok(html);
                }
                Err(e) if attempt >= max_attempts => {
                    return Err(FetchFailure::Exhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    warn!("Attempt {}/{} for {} failed: {}", attempt, max_attempts, url, e);
                    tokio::time::sleep(self.policy.delay()).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn validate_url(url: &str) -> Result<(), FetchFailure> {
    let invalid = |reason: String| FetchFailure::InvalidInput {
        url: url.to_string(),
        reason,
    };
    if url.trim().is_empty() {
        return Err(invalid("empty url".to_string()));
    }
    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", parsed.scheme())));
    }
    Ok(())
}

/// Soft failure checks on a loaded body
fn check_body(html: &str, min_len: usize) -> Result<(), AttemptError> {
    let len = html.chars().count();
    if len < min_len {
        return Err(AttemptError::BodyTooShort { len });
    }
    if let Some(title) = PageDocument::parse(html).title() {
        let lower = title.to_lowercase();
        if lower.contains("404") || lower.contains("error") {
            return Err(AttemptError::ErrorPage(title));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays scripted responses, then keeps returning the last one
    struct ScriptedSource {
        responses: Mutex<VecDeque<anyhow::Result<String>>>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(responses: Vec<anyhow::Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn load(&self, _url: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.pop_front().unwrap()
            } else {
                match responses.front() {
                    Some(Ok(html)) => Ok(html.clone()),
                    Some(Err(e)) => Err(anyhow::anyhow!("{e}")),
                    None => Err(anyhow::anyhow!("no response scripted")),
                }
            }
        }

        fn source_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn good_page() -> String {
        format!("<html><head><title>租屋</title></head><body>{}</body></html>", "x".repeat(600))
    }

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            delay_ms: 0,
            min_body_len: 500,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let source = ScriptedSource::new(vec![
            Err(anyhow::anyhow!("timeout")),
            Ok("<html>short</html>".to_string()),
            Ok(good_page()),
        ]);
        let fetcher = RetryingFetcher::new(source, quick_policy());

        let html = fetcher.fetch("https://rent.591.com.tw/list?region=1").await.unwrap();
        assert_eq!(html, good_page());
        assert_eq!(fetcher.source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let source = ScriptedSource::new(vec![Err(anyhow::anyhow!("connection reset"))]);
        let fetcher = RetryingFetcher::new(source, quick_policy());

        let err = fetcher.fetch("https://rent.591.com.tw/list").await.unwrap_err();
        match err {
            FetchFailure::Exhausted { attempts, last_error, .. } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last_error, AttemptError::Source(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(fetcher.source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn error_page_title_is_retried() {
        let not_found = format!("<html><head><title>404 Not Found</title></head><body>{}</body></html>", "x".repeat(600));
        let source = ScriptedSource::new(vec![Ok(not_found)]);
        let fetcher = RetryingFetcher::new(source, quick_policy());

        let err = fetcher.fetch("https://rent.591.com.tw/list").await.unwrap_err();
        assert!(matches!(
            err,
            FetchFailure::Exhausted { last_error: AttemptError::ErrorPage(_), .. }
        ));
    }

    #[tokio::test]
    async fn invalid_url_is_not_retried() {
        let source = ScriptedSource::new(vec![Ok(good_page())]);
        let fetcher = RetryingFetcher::new(source, quick_policy());

        for url in ["", "   ", "not a url", "ftp://rent.591.com.tw/list"] {
            let err = fetcher.fetch(url).await.unwrap_err();
            assert!(matches!(err, FetchFailure::InvalidInput { .. }), "{url:?}");
        }
        assert_eq!(fetcher.source.calls.load(Ordering::SeqCst), 0);
    }
}
