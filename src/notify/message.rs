use crate::models::Listing;
use crate::scrapers::types::SearchFilter;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;

const RULE: &str = "-----------------------";

/// Entries for one run report: header, one block per listing, footer.
///
/// Each entry is self-contained so the chunker can keep it whole.
pub fn compose<'a, Tz, I>(filter: &SearchFilter, listings: I, now: DateTime<Tz>) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
    I: IntoIterator<Item = &'a Listing>,
{
    let mut entries = vec![header(filter, now)];
    let before = entries.len();
    entries.extend(listings.into_iter().map(Listing::render));
    if entries.len() == before {
        entries.push("沒有新物件".to_string());
    }
    entries.push(format!("{RULE}\n爬蟲結束，請查看租屋資訊！"));
    entries
}

fn header<Tz>(filter: &SearchFilter, now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let (min_rent, max_rent) = filter.rent_range;
    let (min_size, max_size) = filter.size_range;
    [
        format!("現在時間: {}", now.format("%Y-%m-%d %H:%M")),
        format!("搜尋模式: {}", filter.mode.label()),
        format!("租金區間: {min_rent}~{max_rent}元"),
        format!("坪數: {min_size}~{max_size}坪"),
        format!("租屋類型: {}", filter.kind_names().join("、")),
        format!("更新物件: {}小時內", filter.recency_window_hours),
        RULE.to_string(),
    ]
    .join("\n")
}
