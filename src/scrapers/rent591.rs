use crate::error::{CrawlError, ExtractionWarning};
use crate::models::{absolute_link, listing_id_from_link, Listing, ListingCategory};
use crate::scrapers::document::{self, PageDocument};
use crate::scrapers::recency::is_new_listing;
use crate::scrapers::urls::BASE_URL;
use indexmap::IndexMap;
use scraper::{ElementRef, Selector};
use tracing::{debug, info, warn};

const RECOMMEND_ITEM: &str = "div.recommend-ware";
const RECOMMEND_TITLE: &str = "a.title";
const RECOMMEND_PRICE: &str = "div.price-info";
const RECOMMEND_AREA: &str = "span.area";

const NORMAL_ITEM: &str = ".item";
const NORMAL_TITLE: &str = ".item-info-title a.link.v-middle";
const NORMAL_TIME: &str = "div.item-info-txt.role-name span.line";

const EMPTY_MARKER: &str = ".empty";

/// Listing extractor for 591 search result pages
pub struct ListingExtractor {
    recommend_item: Selector,
    recommend_title: Selector,
    recommend_price: Selector,
    recommend_area: Selector,
    normal_item: Selector,
    normal_title: Selector,
    normal_time: Selector,
    empty_marker: Selector,
}

impl ListingExtractor {
    pub fn new() -> Result<Self, CrawlError> {
        Ok(Self {
            recommend_item: document::compile(RECOMMEND_ITEM)?,
            recommend_title: document::compile(RECOMMEND_TITLE)?,
            recommend_price: document::compile(RECOMMEND_PRICE)?,
            recommend_area: document::compile(RECOMMEND_AREA)?,
            normal_item: document::compile(NORMAL_ITEM)?,
            normal_title: document::compile(NORMAL_TITLE)?,
            normal_time: document::compile(NORMAL_TIME)?,
            empty_marker: document::compile(EMPTY_MARKER)?,
        })
    }

    /// Featured listings. `None` when the page has none.
    pub fn recommended(&self, page: &PageDocument) -> Option<IndexMap<String, Listing>> {
        let mut listings = IndexMap::new();

        for (idx, element) in page.select(&self.recommend_item).enumerate() {
            match self.parse_recommended(element) {
                Ok(listing) => {
                    debug!("Recommended {}: {}", listing.id, listing.title);
                    listings.insert(listing.id.clone(), listing);
                }
                Err(e) => warn!("Skipped recommended listing {}: {}", idx, e),
            }
        }

        info!("Found {} recommended listings", listings.len());
        (!listings.is_empty()).then_some(listings)
    }

    /// Normal listings posted within the recency window. `None` when nothing qualifies.
    pub fn normal(&self, page: &PageDocument, window_hours: u32) -> Option<IndexMap<String, Listing>> {
        let mut listings = IndexMap::new();
        let mut stale = 0;

        for (idx, element) in page.select(&self.normal_item).enumerate() {
            match self.parse_normal(element) {
                Ok(listing) if is_new_listing(&listing.posted_at_text, window_hours) => {
                    debug!("Normal {}: {} ({})", listing.id, listing.title, listing.posted_at_text);
                    listings.insert(listing.id.clone(), listing);
                }
                Ok(_) => stale += 1,
                Err(e) => warn!("Skipped normal listing {}: {}", idx, e),
            }
        }

        info!("Found {} new normal listings ({} older)", listings.len(), stale);
        (!listings.is_empty()).then_some(listings)
    }

    /// Whether the page shows the "no results" marker
    pub fn is_empty_marker(&self, page: &PageDocument) -> bool {
        page.contains(&self.empty_marker)
    }

    fn parse_recommended(&self, element: ElementRef<'_>) -> Result<Listing, ExtractionWarning> {
        let title_el = document::first(element, &self.recommend_title)
            .ok_or(ExtractionWarning::MissingField("title"))?;
        let title = Some(document::text(title_el))
            .filter(|t| !t.is_empty())
            .ok_or(ExtractionWarning::MissingField("title"))?;
        let price = document::first_text(element, &self.recommend_price)
            .ok_or(ExtractionWarning::MissingField("price"))?;
        let area = document::first_text(element, &self.recommend_area)
            .ok_or(ExtractionWarning::MissingField("area"))?;
        let (id, link) = link_and_id(title_el)?;

        Ok(Listing {
            id,
            title,
            link,
            price: Some(format!("{price}元")),
            area: Some(area),
            posted_at_text: String::new(),
            category: ListingCategory::Recommended,
        })
    }

    fn parse_normal(&self, element: ElementRef<'_>) -> Result<Listing, ExtractionWarning> {
        let title_el = document::first(element, &self.normal_title)
            .ok_or(ExtractionWarning::MissingField("title"))?;
        let title = Some(document::text(title_el))
            .filter(|t| !t.is_empty())
            .ok_or(ExtractionWarning::MissingField("title"))?;
        let posted_at_text = document::first_text(element, &self.normal_time)
            .ok_or(ExtractionWarning::MissingField("posted time"))?;
        let (id, link) = link_and_id(title_el)?;

        Ok(Listing {
            id,
            title,
            link,
            price: None,
            area: None,
            posted_at_text,
            category: ListingCategory::Normal,
        })
    }
}

fn link_and_id(anchor: ElementRef<'_>) -> Result<(String, String), ExtractionWarning> {
    let href = document::attr(anchor, "href").ok_or(ExtractionWarning::MissingField("link"))?;
    let link = absolute_link(href, BASE_URL).ok_or_else(|| ExtractionWarning::BadLink(href.to_string()))?;
    let id = listing_id_from_link(&link).ok_or_else(|| ExtractionWarning::BadLink(href.to_string()))?;
    Ok((id, link))
}
