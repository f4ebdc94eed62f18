use crate::error::ConfigError;
use crate::scrapers::types::{SearchFilter, SearchMode};

pub const BASE_URL: &str = "https://rent.591.com.tw";

const LIST_URL: &str = "https://rent.591.com.tw/list";

/// Expand a filter into one search URL per (area, kind) pair.
///
/// Order follows the filter: areas first, then kinds within each area.
pub fn generate_urls(filter: &SearchFilter) -> Result<Vec<String>, ConfigError> {
    filter.validate()?;

    let mut urls = Vec::with_capacity(filter.areas.len() * filter.kinds.len());
    for (area, subs) in &filter.areas {
        let location = location_query(filter, area, &subs.join(","))?;
        for kind in &filter.kinds {
            urls.push(format!(
                "{LIST_URL}?{location}&kind={kind}&{rest}",
                rest = common_query(filter),
            ));
        }
    }

    Ok(urls)
}

/// Append a page number to a search URL
pub fn page_url(url: &str, page: u32) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}page={page}")
}

fn location_query(filter: &SearchFilter, area: &str, subs: &str) -> Result<String, ConfigError> {
    match filter.mode {
        SearchMode::ByDistrict => Ok(format!("region={area}&section={subs}")),
        SearchMode::ByMetro => {
            let region = filter
                .metro_region
                .as_deref()
                .ok_or_else(|| ConfigError::NoTemplate(format!("{} without metro_region", filter.mode)))?;
            Ok(format!("region={region}&metro={area}&station={subs}"))
        }
    }
}

fn common_query(filter: &SearchFilter) -> String {
    let (min_rent, max_rent) = filter.rent_range;
    let (min_size, max_size) = filter.size_range;

    let mut query = format!(
        "price={min_rent}$_{max_rent}$&acreage={min_size}$_{max_size}$&other=newPost&sort=posttime_desc"
    );
    if !filter.notice_flags.is_empty() {
        let notice: Vec<&str> = filter.notice_flags.iter().map(|f| f.query_value()).collect();
        query.push_str("&notice=");
        query.push_str(&notice.join(","));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::types::NoticeFlag;
    use indexmap::IndexMap;

    fn single_area_filter() -> SearchFilter {
        let mut areas = IndexMap::new();
        areas.insert("1".to_string(), vec!["5".to_string()]);
        SearchFilter {
            areas,
            kinds: vec!["2".to_string()],
            rent_range: (8000, 14000),
            size_range: (7, 20),
            ..SearchFilter::default()
        }
    }

    #[test]
    fn one_area_one_kind_gives_one_url() {
        let urls = generate_urls(&single_area_filter()).unwrap();
        assert_eq!(urls.len(), 1);

        let url = &urls[0];
        assert!(url.contains("region=1"));
        assert!(url.contains("section=5"));
        assert!(url.contains("kind=2"));
        assert!(url.contains("price=8000$_14000$"));
        assert!(url.contains("acreage=7$_20$"));
        assert!(url.contains("sort=posttime_desc"));
        assert!(!url.contains("notice="));
    }

    #[test]
    fn default_filter_orders_by_area_then_kind() {
        let urls = generate_urls(&SearchFilter::default()).unwrap();
        assert_eq!(urls.len(), 4);
        assert!(urls[0].contains("region=1&section=5,7,12") && urls[0].contains("kind=2"));
        assert!(urls[1].contains("region=1&section=5,7,12") && urls[1].contains("kind=3"));
        assert!(urls[2].contains("region=3&section=34,37,38") && urls[2].contains("kind=2"));
        assert!(urls[3].contains("region=3") && urls[3].contains("kind=3"));
    }

    #[test]
    fn notice_flags_are_joined() {
        let filter = SearchFilter {
            notice_flags: vec![NoticeFlag::NotCoverOnly, NoticeFlag::BoyOnly],
            ..single_area_filter()
        };
        let urls = generate_urls(&filter).unwrap();
        assert!(urls[0].ends_with("&notice=not_cover,boy"));
    }

    #[test]
    fn metro_mode_uses_station_template() {
        let mut areas = IndexMap::new();
        areas.insert("162".to_string(), vec!["4198".to_string(), "4199".to_string()]);
        let filter = SearchFilter {
            mode: SearchMode::ByMetro,
            areas,
            metro_region: Some("1".to_string()),
            ..single_area_filter()
        };
        let urls = generate_urls(&filter).unwrap();
        assert!(urls[0].contains("region=1&metro=162&station=4198,4199"));
    }

    #[test]
    fn metro_mode_without_region_is_a_config_error() {
        let filter = SearchFilter {
            mode: SearchMode::ByMetro,
            metro_region: None,
            ..single_area_filter()
        };
        assert!(matches!(generate_urls(&filter), Err(ConfigError::NoTemplate(_))));
    }

    #[test]
    fn invalid_filter_is_rejected_before_generation() {
        let filter = SearchFilter {
            kinds: Vec::new(),
            ..single_area_filter()
        };
        assert!(matches!(generate_urls(&filter), Err(ConfigError::EmptyKinds)));
    }

    #[test]
    fn page_url_appends_page_param() {
        assert_eq!(page_url("https://x/list?a=1", 3), "https://x/list?a=1&page=3");
        assert_eq!(page_url("https://x/list", 2), "https://x/list?page=2");
    }
}
