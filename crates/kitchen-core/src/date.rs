//! 日期解析

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::{KitchenError, Result};

/// 解析日期（接受 `YYYY-MM-DD` 或 RFC 3339 時間戳）
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| KitchenError::InvalidDate(value.to_string()))
}

/// 解析時間戳（純日期視為當日 00:00 UTC）
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| KitchenError::InvalidDate(value.to_string()))
}

/// 日期加減天數（超出可表示範圍時回傳 InvalidDate）
pub fn shift_date(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| KitchenError::InvalidDate(format!("{} {:+} 天", date, days)))
}

/// 時間戳加減天數（超出可表示範圍時回傳 InvalidDate）
pub fn shift_timestamp(at: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|delta| at.checked_add_signed(delta))
        .ok_or_else(|| KitchenError::InvalidDate(format!("{} {:+} 天", at.to_rfc3339(), days)))
}
