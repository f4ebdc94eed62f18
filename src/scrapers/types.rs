use crate::error::ConfigError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How `areas` keys and values are interpreted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Keys are city region ids, values are district (section) ids
    #[default]
    #[serde(rename = "district")]
    ByDistrict,
    /// Keys are metro line ids, values are station ids
    #[serde(rename = "metro")]
    ByMetro,
}

impl SearchMode {
    pub fn label(&self) -> &'static str {
        match self {
            SearchMode::ByDistrict => "行政區",
            SearchMode::ByMetro => "捷運站",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::ByDistrict => write!(f, "district"),
            SearchMode::ByMetro => write!(f, "metro"),
        }
    }
}

/// Extra constraints the site exposes as `notice=` flags
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NoticeFlag {
    /// Excludes rooftop additions
    NotCoverOnly,
    AnySex,
    BoyOnly,
}

impl NoticeFlag {
    pub fn query_value(&self) -> &'static str {
        match self {
            NoticeFlag::NotCoverOnly => "not_cover",
            NoticeFlag::AnySex => "all_sex",
            NoticeFlag::BoyOnly => "boy",
        }
    }
}

/// Human readable name of a listing-type code
pub fn kind_name(code: &str) -> &str {
    match code {
        "1" => "整層住家",
        "2" => "獨立套房",
        "3" => "分租套房",
        "4" => "雅房",
        "8" => "車位",
        "24" => "其他",
        other => other,
    }
}

/// Search parameters for rental scraping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilter {
    pub mode: SearchMode,
    /// Region (or metro line) id to ordered sub-area ids
    pub areas: IndexMap<String, Vec<String>>,
    /// Listing-type codes, see [`kind_name`]
    pub kinds: Vec<String>,
    /// Monthly rent in NTD, inclusive
    pub rent_range: (u32, u32),
    /// Floor area in ping, inclusive
    pub size_range: (u32, u32),
    pub recency_window_hours: u32,
    pub notice_flags: Vec<NoticeFlag>,
    /// Region id used by metro searches
    pub metro_region: Option<String>,
}

impl Default for SearchFilter {
    fn default() -> Self {
        let mut areas = IndexMap::new();
        // Taipei City
        areas.insert(
            "1".to_string(),
            vec!["5".to_string(), "7".to_string(), "12".to_string()],
        );
        // New Taipei City
        areas.insert(
            "3".to_string(),
            vec!["34".to_string(), "37".to_string(), "38".to_string()],
        );

        Self {
            mode: SearchMode::ByDistrict,
            areas,
            kinds: vec!["2".to_string(), "3".to_string()],
            rent_range: (8000, 14000),
            size_range: (7, 20),
            recency_window_hours: 4,
            notice_flags: Vec::new(),
            metro_region: None,
        }
    }
}

impl SearchFilter {
    /// Check the invariants every other component relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.areas.is_empty() {
            return Err(ConfigError::EmptyAreas);
        }
        if let Some((area, _)) = self.areas.iter().find(|(_, subs)| subs.is_empty()) {
            return Err(ConfigError::EmptySubAreas(area.clone()));
        }
        if self.kinds.is_empty() {
            return Err(ConfigError::EmptyKinds);
        }
        check_range("rent", self.rent_range)?;
        check_range("size", self.size_range)?;
        if self.mode == SearchMode::ByMetro && self.metro_region.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::NoTemplate(format!("{} without metro_region", self.mode)));
        }
        Ok(())
    }

    pub fn kind_names(&self) -> Vec<&str> {
        self.kinds.iter().map(|k| kind_name(k)).collect()
    }
}

fn check_range(field: &'static str, (min, max): (u32, u32)) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::DecreasingRange { field, min, max });
    }
    Ok(())
}
