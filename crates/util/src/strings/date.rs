use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateStyle {
    /// `Jan 5, 2024`
    MonthFirst,
    /// `5 Jan 2024`
    DayFirst,
}

impl DateStyle {
    fn for_locale(locale: &str) -> Self {
        match locale.to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-ca" => DateStyle::MonthFirst,
            "en-gb" | "en-au" | "en-ie" | "en-nz" | "en-in" => DateStyle::DayFirst,
            other => {
                debug!(locale = other, "unsupported locale, formatting as en-US");
                DateStyle::MonthFirst
            }
        }
    }
}

/// Format as numeric year, short month and numeric day, in UTC.
///
/// `en-US` style is `Jan 5, 2024` and `en-GB` style is `5 Jan 2024`. Other
/// locales fall back to `en-US`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use grabbag_util::strings::format_date;
///
/// let when = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
/// assert_eq!(format_date(&when, "en-US"), "Jan 5, 2024");
/// assert_eq!(format_date(&when, "en-GB"), "5 Jan 2024");
/// ```
pub fn format_date(when: &DateTime<Utc>, locale: &str) -> String {
    match DateStyle::for_locale(locale) {
        DateStyle::MonthFirst => when.format("%b %-d, %Y").to_string(),
        DateStyle::DayFirst => when.format("%-d %b %Y").to_string(),
    }
}

/// Format epoch milliseconds; `None` when out of range.
pub fn format_date_millis(millis: i64, locale: &str) -> Option<String> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|when| format_date(&when, locale))
}

/// Format an RFC 3339 timestamp or a `YYYY-MM-DD` date; `None` when the text
/// is not a date.
pub fn format_date_str(text: &str, locale: &str) -> Option<String> {
    parse_date(text).map(|when| format_date(&when, locale))
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(when) = DateTime::parse_from_rfc3339(text) {
        return Some(when.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
