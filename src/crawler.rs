use crate::config::RuntimeOptions;
use crate::error::{CrawlError, FetchFailure};
use crate::models::{Listing, RunResult};
use crate::scrapers::document::PageDocument;
use crate::scrapers::rent591::ListingExtractor;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::urls::page_url;
use indexmap::IndexMap;
use std::time::Duration;
use tracing::{error, info, warn};

/// Why pagination of one search URL ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The site reported no (more) results
    EmptyMarker,
    /// `max_pages` pages were visited
    PageCap,
    /// The next page could not be fetched; earlier pages are kept
    FetchFailed,
}

/// Normal listings gathered across the pages of one search URL
#[derive(Debug)]
pub struct Pagination {
    pub listings: IndexMap<String, Listing>,
    pub pages_visited: u32,
    pub stop: StopReason,
}

/// What one page contributed to pagination
struct PageScan {
    listings: Option<IndexMap<String, Listing>>,
    empty_marker: bool,
}

/// Crawls every search URL of a run, strictly one page at a time
pub struct Crawler<'a> {
    fetcher: &'a dyn PageFetcher,
    options: &'a RuntimeOptions,
    window_hours: u32,
}

impl<'a> Crawler<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, options: &'a RuntimeOptions, window_hours: u32) -> Self {
        Self {
            fetcher,
            options,
            window_hours,
        }
    }

    /// Crawl all `urls` into one run result.
    ///
    /// `None` means nothing could be checked, which callers must not confuse
    /// with an empty result.
    pub async fn run(&self, urls: &[String]) -> Option<RunResult> {
        match self.try_run(urls).await {
            Ok(result) => {
                info!("✅ Crawled {} listings from {} URLs", result.len(), urls.len());
                Some(result)
            }
            Err(e) => {
                error!("Crawl produced no result: {}", e);
                None
            }
        }
    }

    async fn try_run(&self, urls: &[String]) -> Result<RunResult, CrawlError> {
        let extractor = ListingExtractor::new()?;
        info!("Start crawling {} URLs", urls.len());

        let mut result = RunResult::new();
        let mut reachable = 0;
        for (idx, url) in urls.iter().enumerate() {
            info!("[{}/{}] {}", idx + 1, urls.len(), url);
            match self.crawl_url(&extractor, url).await {
                Ok(listings) => {
                    reachable += 1;
                    result.merge(listings);
                }
                Err(e) => warn!("Skipping unavailable URL: {}", e),
            }
        }

        if reachable == 0 && !urls.is_empty() {
            return Err(CrawlError::Critical(format!("none of {} URLs could be fetched", urls.len())));
        }
        Ok(result)
    }

    /// Recommended listings from the first page, then normal listings across pages
    async fn crawl_url(
        &self,
        extractor: &ListingExtractor,
        url: &str,
    ) -> Result<IndexMap<String, Listing>, FetchFailure> {
        let html = self.fetcher.fetch(url).await?;

        let (recommended, first) = {
            let page = PageDocument::parse(&html);
            let recommended = if self.options.fetch_recommended {
                extractor.recommended(&page)
            } else {
                None
            };
            (recommended, self.scan(extractor, &page))
        };

        let mut listings = recommended.unwrap_or_default();
        if self.options.fetch_normal {
            let pagination = self.paginate(extractor, url, first).await;
            info!(
                "Collected {} normal listings over {} pages ({:?})",
                pagination.listings.len(),
                pagination.pages_visited,
                pagination.stop
            );
            listings.extend(pagination.listings);
        }

        Ok(listings)
    }

    /// Walk successive pages of `url`, starting from its already fetched first page
    async fn paginate(&self, extractor: &ListingExtractor, url: &str, first: PageScan) -> Pagination {
        let max_pages = self.options.max_pages.max(1);
        let delay = Duration::from_millis(self.options.page_delay_ms);

        let mut listings = IndexMap::new();
        let mut page = 1;
        let mut scan = first;
        let stop = loop {
            if let Some(batch) = scan.listings.take() {
                listings.extend(batch);
            }
            info!("Crawled page {}", page);

            if scan.empty_marker {
                break StopReason::EmptyMarker;
            }
            if page >= max_pages {
                info!("Reached page cap ({}) for {}", max_pages, url);
                break StopReason::PageCap;
            }

            page += 1;
            tokio::time::sleep(delay).await;
            match self.fetcher.fetch(&page_url(url, page)).await {
                Ok(html) => scan = self.scan(extractor, &PageDocument::parse(&html)),
                Err(e) => {
                    warn!("Stopping pagination at page {}: {}", page, e);
                    page -= 1;
                    break StopReason::FetchFailed;
                }
            }
        };

        Pagination {
            listings,
            pages_visited: page,
            stop,
        }
    }

    fn scan(&self, extractor: &ListingExtractor, page: &PageDocument) -> PageScan {
        PageScan {
            listings: extractor.normal(page, self.window_hours),
            empty_marker: extractor.is_empty_marker(page),
        }
    }
}
