use regex::Regex;
use std::sync::LazyLock;

static HOURS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*小時").unwrap());

/// Decide whether a posted-time text such as "12分鐘內更新" or "3小時內更新" is new.
///
/// Minutes are always new, hours are new within `window_hours`, anything else
/// (days, weeks, malformed text) is not.
pub fn is_new_listing(time_text: &str, window_hours: u32) -> bool {
    if time_text.contains("分鐘") {
        return true;
    }

    HOURS
        .captures(time_text)
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .map(|hours| hours <= u64::from(window_hours))
        .unwrap_or(false)
}
