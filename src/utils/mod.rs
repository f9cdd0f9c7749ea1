//! Utility helpers

pub mod logger;

use chrono::{NaiveTime, Utc};

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Millis range [start, end) covering the current UTC calendar day
pub fn today_utc_range() -> (i64, i64) {
    let start = Utc::now()
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp_millis();
    (start, start + 86_400_000)
}

/// Today's UTC date in ISO format (YYYY-MM-DD)
pub fn today_utc_iso() -> String {
    Utc::now().date_naive().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_range_spans_one_day_and_contains_now() {
        let (start, end) = today_utc_range();
        assert_eq!(end - start, 86_400_000);
        let now = now_millis();
        assert!(start <= now && now < end);
    }
}
