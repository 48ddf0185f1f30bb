//! Cache key derivation
//!
//! Both key kinds embed the UTC date, so entries roll over at midnight UTC
//! even when their TTL would keep them alive longer.

use chrono::{DateTime, Utc};
use rankscope_common::hash::content_hash;
use rankscope_common::time::date_bucket;

/// Key for a scraped page: `page:{sha256(url)}:{YYYY-MM-DD}`
pub fn page_key(url: &str, at: DateTime<Utc>) -> String {
    format!("page:{}:{}", content_hash(url), date_bucket(at))
}

/// Key for a search lookup: `serp:{keyword}:{location}:{gl}:{hl}:{YYYY-MM-DD}`
pub fn search_key(keyword: &str, location: &str, gl: &str, hl: &str, at: DateTime<Utc>) -> String {
    format!(
        "serp:{}:{}:{}:{}:{}",
        keyword,
        location,
        gl,
        hl,
        date_bucket(at)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_page_key_hashes_url_and_includes_utc_date() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 0).unwrap();
        let key = page_key("https://a.example/x", at);
        assert_eq!(
            key,
            format!("page:{}:2024-03-09", content_hash("https://a.example/x"))
        );
        assert!(!key.contains("a.example"));
    }

    #[test]
    fn test_keys_roll_over_at_midnight() {
        let before = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_ne!(
            search_key("crm", "United States", "us", "en", before),
            search_key("crm", "United States", "us", "en", after)
        );
    }

    #[test]
    fn test_search_key_layout() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        assert_eq!(
            search_key("best crm", "United States", "us", "en", at),
            "serp:best crm:United States:us:en:2024-01-02"
        );
    }
}
