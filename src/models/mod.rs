use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// Where on the results page a listing was found
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ListingCategory {
    /// Featured listings shown outside the paginated results
    Recommended,
    Normal,
}

/// One rental ad scraped from a search results page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    /// Trailing path segment of the detail page URL
    pub id: String,
    pub title: String,
    pub link: String,
    pub price: Option<String>,
    pub area: Option<String>,
    pub posted_at_text: String,
    pub category: ListingCategory,
}

impl Listing {
    /// Text block sent for this listing. Never contains a blank line.
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(5);
        let title = collapse_whitespace(&self.title);
        match self.category {
            ListingCategory::Recommended => lines.push(format!("【推薦】{title}")),
            ListingCategory::Normal => lines.push(title),
        }
        if let Some(price) = &self.price {
            lines.push(format!("租金：{}", collapse_whitespace(price)));
        }
        if let Some(area) = &self.area {
            lines.push(format!("坪數：{}", collapse_whitespace(area)));
        }
        let posted = collapse_whitespace(&self.posted_at_text);
        if !posted.is_empty() {
            lines.push(format!("更新：{posted}"));
        }
        lines.push(collapse_whitespace(&self.link));

        lines.retain(|line| !line.is_empty());
        lines.join("\n")
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Absolute link for an href found on a results page
pub fn absolute_link(href: &str, base: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(String::from)
}

/// Listing id from the last non-empty path segment of its link.
///
/// Assumes detail pages keep the `/<id>` URL shape.
pub fn listing_id_from_link(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

/// Listings gathered during one crawl, keyed by id in first-seen order
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    listings: IndexMap<String, Listing>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of listings; a repeated id keeps its position but takes the newer record
    pub fn merge(&mut self, batch: IndexMap<String, Listing>) {
        self.listings.extend(batch);
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.listings.keys().map(String::as_str)
    }

    pub fn get(&self, id: &str) -> Option<&Listing> {
        self.listings.get(id)
    }

    pub fn listings(&self) -> impl Iterator<Item = &Listing> {
        self.listings.values()
    }
}
