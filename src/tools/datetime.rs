use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::erx::{self, Erx, Fault};

pub struct Now;

pub enum Format {
    Rfc3339,
    DateTime,
    DatetimeWithTimeZone,
}

pub const FORMAT_DATETIME: &'static str = "%Y-%m-%d %H:%M:%S";
pub const FORMAT_DATETIME_WITH_TIMEZONE: &'static str = "%Y-%m-%d %H:%M:%S %z";

impl Format {
    /// parse with this format, naive layouts are taken as UTC
    pub fn parse(&self, datetime: &str) -> Option<DateTime<FixedOffset>> {
        match self {
            Format::Rfc3339 => DateTime::parse_from_rfc3339(datetime).ok(),
            Format::DatetimeWithTimeZone => DateTime::parse_from_str(datetime, FORMAT_DATETIME_WITH_TIMEZONE).ok(),
            Format::DateTime => NaiveDateTime::parse_from_str(datetime, FORMAT_DATETIME).ok().map(|naive| Utc.from_utc_datetime(&naive).fixed_offset()),
        }
    }

    /// try every known format, server timestamps are RFC 3339 (`2014-09-11T22:36:44.349Z`)
    pub fn parse_any(datetime: &str) -> erx::ResultE<DateTime<FixedOffset>> {
        let datetime = datetime.trim();
        [Format::Rfc3339, Format::DatetimeWithTimeZone, Format::DateTime]
            .iter()
            .find_map(|format| format.parse(datetime))
            .ok_or_else(|| Erx::with_fault(Fault::Malformed, &format!("unrecognized timestamp '{}'", datetime)))
    }

    /// render the way the server does, milliseconds and `Z`
    pub fn render(datetime: &DateTime<FixedOffset>) -> String {
        datetime.with_timezone(&Utc).to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

impl Now {
    pub fn stamp() -> String {
        Format::render(&Utc::now().fixed_offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_server_timestamp() {
        let parsed = Format::parse_any("2014-09-11T22:36:44.349Z").unwrap();
        assert_eq!(parsed.year(), 2014);
        assert_eq!(parsed.hour(), 22);
        assert_eq!(parsed.timestamp_subsec_millis(), 349);
        assert_eq!(Format::render(&parsed), "2014-09-11T22:36:44.349Z");
    }

    #[test]
    fn test_parse_fallback_layouts() {
        let zoned = Format::parse_any("2020-01-02 03:04:05 +0200").unwrap();
        assert_eq!(zoned.offset().local_minus_utc(), 7200);

        let naive = Format::parse_any("2020-01-02 03:04:05").unwrap();
        assert_eq!(naive.offset().local_minus_utc(), 0);
        assert_eq!(naive.day(), 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = Format::parse_any("yesterday").unwrap_err();
        assert_eq!(err.fault(), Fault::Malformed);
    }

    #[test]
    fn test_now_stamp_parses_back() {
        assert!(Format::parse_any(&Now::stamp()).is_ok());
    }
}
