//! Record access for domain extraction
//!
//! Records arrive as JSONL. Only two things are read from a record: the URL
//! and an optional timestamp.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// A record that may carry a URL and a timestamp
pub trait UrlRecord {
    /// The raw URL of the record, if present
    fn url(&self) -> Option<&str>;

    /// When the record was captured, if known
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// A bare URL string is a record without a timestamp
impl UrlRecord for str {
    fn url(&self) -> Option<&str> {
        Some(self)
    }
}

impl UrlRecord for String {
    fn url(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

/// Field names used to read URL and timestamp from JSON records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    /// Field holding the record URL
    pub url_field: String,

    /// Fields tried in order for the capture timestamp
    pub timestamp_fields: Vec<String>,
}

impl Default for RecordFields {
    fn default() -> Self {
        Self {
            url_field: "url".to_string(),
            timestamp_fields: vec!["timestamp".to_string(), "date".to_string()],
        }
    }
}

/// A decoded JSON record paired with the field names to read it with
#[derive(Debug)]
pub struct JsonRecord<'a> {
    value: Value,
    fields: &'a RecordFields,
}

impl<'a> JsonRecord<'a> {
    /// Decodes one JSONL line
    ///
    /// # Returns
    ///
    /// * `Ok(JsonRecord)` - The line is valid JSON
    /// * `Err(serde_json::Error)` - The line is not JSON
    pub fn from_slice(line: &[u8], fields: &'a RecordFields) -> Result<Self, serde_json::Error> {
        let value = serde_json::from_slice(line)?;
        Ok(Self { value, fields })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl UrlRecord for JsonRecord<'_> {
    fn url(&self) -> Option<&str> {
        self.value.get(&self.fields.url_field)?.as_str()
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.fields
            .timestamp_fields
            .iter()
            .filter_map(|field| self.value.get(field)?.as_str())
            .find_map(parse_timestamp)
    }
}

/// Parses a record timestamp
///
/// Accepts RFC 3339 (`2024-03-01T12:00:00Z`), a naive date-time
/// (`2024-03-01T12:00:00` or with a space separator, read as UTC) and a plain
/// date (`2024-03-01`, read as midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_json_record_reads_url() {
        let fields = RecordFields::default();
        let record = JsonRecord::from_slice(br#"{"url":"https://a.com/x","text":"hi"}"#, &fields).unwrap();
        assert_eq!(record.url(), Some("https://a.com/x"));
        assert_eq!(record.timestamp(), None);
    }

    #[test]
    fn test_json_record_missing_or_non_string_url() {
        let fields = RecordFields::default();
        let record = JsonRecord::from_slice(br#"{"text":"no url"}"#, &fields).unwrap();
        assert_eq!(record.url(), None);

        let record = JsonRecord::from_slice(br#"{"url":42}"#, &fields).unwrap();
        assert_eq!(record.url(), None);
    }

    #[test]
    fn test_json_record_custom_url_field() {
        let fields = RecordFields {
            url_field: "source".to_string(),
            ..RecordFields::default()
        };
        let record = JsonRecord::from_slice(br#"{"source":"https://b.org/"}"#, &fields).unwrap();
        assert_eq!(record.url(), Some("https://b.org/"));
    }

    #[test]
    fn test_timestamp_falls_back_to_date_field() {
        let fields = RecordFields::default();
        let record =
            JsonRecord::from_slice(br#"{"url":"https://a.com","date":"2023-07-04"}"#, &fields).unwrap();
        let ts = record.timestamp().unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2023, 7, 4));
    }

    #[test]
    fn test_timestamp_field_preferred_over_date() {
        let fields = RecordFields::default();
        let record = JsonRecord::from_slice(
            br#"{"url":"https://a.com","timestamp":"2024-01-02T03:04:05Z","date":"2020-01-01"}"#,
            &fields,
        )
        .unwrap();
        assert_eq!(record.timestamp().unwrap().year(), 2024);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let fields = RecordFields::default();
        assert!(JsonRecord::from_slice(b"{not json", &fields).is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01T12:00:00+02:00").is_some());
        assert!(parse_timestamp("2024-03-01T12:00:00").is_some());
        assert!(parse_timestamp("2024-03-01 12:00:00").is_some());
        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_str_is_a_record() {
        assert_eq!("https://a.com".url(), Some("https://a.com"));
        assert_eq!("https://a.com".timestamp(), None);
    }
}
