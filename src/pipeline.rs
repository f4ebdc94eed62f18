use crate::config::Config;
use crate::crawler::Crawler;
use crate::notify::message::compose;
use crate::notify::{Dispatched, Dispatcher};
use crate::scrapers::browser::BrowserSource;
use crate::scrapers::fetch::RetryingFetcher;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::urls::generate_urls;
use crate::store::DedupStore;
use anyhow::{Context, Result};
use chrono::Local;
use tracing::{error, info, warn};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing could be checked; distinct from "nothing new"
    Unavailable,
    /// The report went out (or was logged in dry-run mode) and its ids were recorded
    Delivered { new: usize, chunks: usize, dry_run: bool },
    /// The report could not be sent; its ids stay unrecorded
    DeliveryFailed { new: usize },
}

/// Launch a browser and run one crawl-dedup-deliver cycle
pub async fn run_once(config: &Config, dispatcher: &Dispatcher) -> Result<RunOutcome> {
    let urls = generate_urls(&config.filter).context("Invalid search filter")?;
    let mut store = DedupStore::load(&config.runtime.ledger_path)
        .with_context(|| format!("Failed to load ledger {}", config.runtime.ledger_path.display()))?;

    let settings = config.browser.clone();
    let launched = tokio::task::spawn_blocking(move || BrowserSource::launch(&settings))
        .await
        .context("Browser launch task panicked")?;
    let source = match launched {
        Ok(source) => source,
        Err(e) => {
            error!("Could not start browser: {:#}", e);
            return Ok(RunOutcome::Unavailable);
        }
    };

    let fetcher = RetryingFetcher::new(source, config.retry.clone());
    Ok(execute(config, &urls, &fetcher, &mut store, dispatcher).await)
}

/// Crawl `urls`, deliver listings not in `store`, and record them once delivered
pub async fn execute(
    config: &Config,
    urls: &[String],
    fetcher: &dyn PageFetcher,
    store: &mut DedupStore,
    dispatcher: &Dispatcher,
) -> RunOutcome {
    let crawler = Crawler::new(fetcher, &config.runtime, config.filter.recency_window_hours);
    let Some(result) = crawler.run(urls).await else {
        warn!("Could not check any listings this run");
        return RunOutcome::Unavailable;
    };

    let fresh = store.new_ids(result.ids());
    info!(
        "{} listings found, {} new, {} already delivered",
        result.len(),
        fresh.len(),
        result.len() - fresh.len()
    );

    let listings = fresh.iter().filter_map(|id| result.get(id));
    let entries = compose(&config.filter, listings, Local::now());

    let dispatched = match dispatcher.dispatch(&entries).await {
        Ok(dispatched) => dispatched,
        Err(e) => {
            error!("Delivery failed, {} listings not recorded: {}", fresh.len(), e);
            return RunOutcome::DeliveryFailed { new: fresh.len() };
        }
    };

    if let Err(e) = store.record(fresh.iter().cloned()) {
        error!("Delivered but failed to update ledger {}: {}", store.path().display(), e);
    }

    let (chunks, dry_run) = match dispatched {
        Dispatched::Sent { chunks } => (chunks, false),
        Dispatched::DryRun { chunks } => (chunks, true),
    };
    RunOutcome::Delivered {
        new: fresh.len(),
        chunks,
        dry_run,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeOptions;
    use crate::error::{AttemptError, FetchFailure};
    use crate::notify::testing::RecordingNotifier;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;

    const URL: &str = "https://rent.591.com.tw/list?region=1&section=5&kind=2";

    struct StaticFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchFailure> {
            self.pages.get(url).cloned().ok_or_else(|| FetchFailure::Exhausted {
                url: url.to_string(),
                attempts: 1,
                last_error: AttemptError::Source("offline".to_string()),
            })
        }
    }

    fn results_page(ids: &[&str]) -> StaticFetcher {
        let items: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<div class="item">
                         <div class="item-info-title"><a class="link v-middle" href="https://rent.591.com.tw/{id}">物件 {id}</a></div>
                         <div class="item-info-txt role-name"><span class="line">10分鐘內更新</span></div>
                       </div>"#
                )
            })
            .collect();
        let html = format!(r#"<html><body>{items}<div class="empty"></div></body></html>"#);
        StaticFetcher {
            pages: HashMap::from([(URL.to_string(), html)]),
        }
    }

    fn config(ledger: &Path, dry_run: bool) -> Config {
        Config {
            runtime: RuntimeOptions {
                dry_run,
                page_delay_ms: 0,
                ledger_path: ledger.to_path_buf(),
                ..RuntimeOptions::default()
            },
            ..Config::default()
        }
    }

    fn dispatcher(notifier: &RecordingNotifier, dry_run: bool) -> Dispatcher {
        Dispatcher::new(Some(Box::new(notifier.clone())), dry_run, 4000)
    }

    #[tokio::test]
    async fn second_run_delivers_only_unseen_listing() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("pushed_ids.json");
        let config = config(&ledger, false);
        let notifier = RecordingNotifier::default();
        let dispatcher = dispatcher(&notifier, false);
        let urls = vec![URL.to_string()];

        let mut store = DedupStore::load(&ledger).unwrap();
        let first = execute(&config, &urls, &results_page(&["A", "B"]), &mut store, &dispatcher).await;
        assert_eq!(first, RunOutcome::Delivered { new: 2, chunks: 1, dry_run: false });

        let mut store = DedupStore::load(&ledger).unwrap();
        let second = execute(&config, &urls, &results_page(&["A", "B", "C"]), &mut store, &dispatcher).await;
        assert_eq!(second, RunOutcome::Delivered { new: 1, chunks: 1, dry_run: false });

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].contains("https://rent.591.com.tw/C"));
        assert!(!sent[1].contains("https://rent.591.com.tw/A"));
        assert!(!sent[1].contains("https://rent.591.com.tw/B"));
    }

    #[tokio::test]
    async fn dry_run_skips_transport_but_updates_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("pushed_ids.json");
        let config = config(&ledger, true);
        let notifier = RecordingNotifier::default();
        let dispatcher = dispatcher(&notifier, true);

        let mut store = DedupStore::load(&ledger).unwrap();
        let outcome = execute(&config, &[URL.to_string()], &results_page(&["A"]), &mut store, &dispatcher).await;

        assert_eq!(outcome, RunOutcome::Delivered { new: 1, chunks: 1, dry_run: true });
        assert!(notifier.sent().is_empty());
        assert!(DedupStore::load(&ledger).unwrap().contains("A"));
    }

    #[tokio::test]
    async fn failed_delivery_leaves_ledger_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("pushed_ids.json");
        let config = config(&ledger, false);
        let notifier = RecordingNotifier {
            fail_from: Some(0),
            ..RecordingNotifier::default()
        };
        let dispatcher = dispatcher(&notifier, false);

        let mut store = DedupStore::load(&ledger).unwrap();
        let outcome = execute(&config, &[URL.to_string()], &results_page(&["A"]), &mut store, &dispatcher).await;

        assert_eq!(outcome, RunOutcome::DeliveryFailed { new: 1 });
        assert!(!ledger.exists());
        assert!(!store.contains("A"));
    }

    #[tokio::test]
    async fn unreachable_site_is_unavailable_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("pushed_ids.json");
        let config = config(&ledger, false);
        let notifier = RecordingNotifier::default();
        let dispatcher = dispatcher(&notifier, false);
        let offline = StaticFetcher { pages: HashMap::new() };

        let mut store = DedupStore::load(&ledger).unwrap();
        let outcome = execute(&config, &[URL.to_string()], &offline, &mut store, &dispatcher).await;

        assert_eq!(outcome, RunOutcome::Unavailable);
        assert!(notifier.sent().is_empty());
        assert!(!ledger.exists());
    }

    #[tokio::test]
    async fn nothing_new_is_still_a_successful_report() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("pushed_ids.json");
        std::fs::write(&ledger, r#"{"pushed_ids": ["A"]}"#).unwrap();
        let config = config(&ledger, false);
        let notifier = RecordingNotifier::default();
        let dispatcher = dispatcher(&notifier, false);

        let mut store = DedupStore::load(&ledger).unwrap();
        let outcome = execute(&config, &[URL.to_string()], &results_page(&["A"]), &mut store, &dispatcher).await;

        assert_eq!(outcome, RunOutcome::Delivered { new: 0, chunks: 1, dry_run: false });
        assert!(notifier.sent()[0].contains("沒有新物件"));
    }
}
