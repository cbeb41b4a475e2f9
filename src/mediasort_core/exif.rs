use crate::mediasort_core::error::{MediasortError, Result};
use serde::Deserialize;
use std::path::PathBuf;
use time::PrimitiveDateTime;

/// Date format requested from exiftool with `-d`.
pub const EXIFTOOL_DATE_ARG: &str = "%Y-%m-%d %H:%M:%S";

/// Date format of the normalized exiftool output.
const CAPTURE_DATE_FORMAT: &[time::format_description::FormatItem] =
    time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Date tags in order of preference, most authoritative first.
pub const DATE_TAGS: [&str; 7] = [
    "SubSecCreateDate",
    "SubSecDateTimeOriginal",
    "CreateDate",
    "DateTimeOriginal",
    "MediaCreateDate",
    "TrackCreateDate",
    "ModifyDate",
];

/// Date fields returned by exiftool for a single file.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct DateRecord {
    #[serde(default)]
    pub source_file: Option<PathBuf>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub_sec_create_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub_sec_date_time_original: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub create_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_time_original: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub media_create_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub track_create_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub modify_date: Option<String>,
}

/// exiftool prints a bare number for some malformed dates (e.g. `0`).
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

impl DateRecord {
    /// Tag values paired with their names, in preference order.
    pub fn in_preference_order(&self) -> [(&'static str, Option<&str>); 7] {
        [
            (DATE_TAGS[0], self.sub_sec_create_date.as_deref()),
            (DATE_TAGS[1], self.sub_sec_date_time_original.as_deref()),
            (DATE_TAGS[2], self.create_date.as_deref()),
            (DATE_TAGS[3], self.date_time_original.as_deref()),
            (DATE_TAGS[4], self.media_create_date.as_deref()),
            (DATE_TAGS[5], self.track_create_date.as_deref()),
            (DATE_TAGS[6], self.modify_date.as_deref()),
        ]
    }

    /// Resolve the capture date: the first tag that is present and parses.
    pub fn resolve(&self) -> Option<PrimitiveDateTime> {
        for (tag, value) in self.in_preference_order() {
            let Some(value) = value else {
                continue;
            };
            match parse_capture_date(value) {
                Ok(date) => return Some(date),
                Err(e) => log::debug!("Ignoring {} value {:?}: {}", tag, value, e),
            }
        }
        None
    }
}

/// Parse a date string from exiftool, dropping sub-seconds and timezone offsets.
///
/// Returns `None` when the remaining text is not `YYYY-MM-DD HH:MM:SS`.
pub fn parse_date_string(date_str: &str) -> Option<PrimitiveDateTime> {
    parse_capture_date(date_str).ok()
}

fn parse_capture_date(date_str: &str) -> Result<PrimitiveDateTime> {
    let normalized = strip_date_suffixes(date_str);
    if normalized.is_empty() {
        return Err(MediasortError::InvalidDateFormat("empty date".to_string()));
    }

    PrimitiveDateTime::parse(normalized, CAPTURE_DATE_FORMAT)
        .map_err(|e| MediasortError::InvalidDateFormat(e.to_string()))
}

fn strip_date_suffixes(date_str: &str) -> &str {
    let mut s = date_str.trim();

    // Sub-second precision, e.g. "14:30:45.123"
    if let Some((head, _)) = s.split_once('.') {
        s = head;
    }

    if let Some((head, _)) = s.split_once('+') {
        s = head;
    } else if s.matches('-').count() > 2 {
        // The date itself carries two dashes; an extra one in the time part is an offset.
        if let Some(space_idx) = s.find(' ').filter(|&i| i > 0) {
            let time_part = &s[space_idx + 1..];
            if let Some(dash_idx) = time_part.find('-') {
                s = &s[..space_idx + 1 + dash_idx];
            }
        }
    }

    s.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_parse_clean_date() {
        assert_eq!(
            parse_date_string("2023-10-15 14:30:45"),
            Some(datetime!(2023-10-15 14:30:45))
        );
        assert_eq!(
            parse_date_string("  2023-10-15 14:30:45  "),
            Some(datetime!(2023-10-15 14:30:45))
        );
    }

    #[test]
    fn test_parse_subsecond_precision() {
        assert_eq!(
            parse_date_string("2023-10-15 14:30:45.123"),
            Some(datetime!(2023-10-15 14:30:45))
        );
        assert_eq!(
            parse_date_string("2023-10-15 14:30:45.123456+02:00"),
            Some(datetime!(2023-10-15 14:30:45))
        );
    }

    #[test]
    fn test_parse_timezone_offsets() {
        let expected = Some(datetime!(2023-10-15 14:30:45));
        assert_eq!(parse_date_string("2023-10-15 14:30:45+05:00"), expected);
        assert_eq!(parse_date_string("2023-10-15 14:30:45+0000"), expected);
        assert_eq!(parse_date_string("2023-10-15 14:30:45-05:00"), expected);
        assert_eq!(parse_date_string("2023-10-15 14:30:45-0800"), expected);
    }

    #[test]
    fn test_parse_invalid_dates() {
        assert_eq!(parse_date_string("2023-13-45 14:30:45"), None);
        assert_eq!(parse_date_string("0000:00:00 00:00:00"), None);
        assert_eq!(parse_date_string("not a date"), None);
        assert_eq!(parse_date_string(""), None);
        assert_eq!(parse_date_string("   "), None);
    }

    #[test]
    fn test_resolve_prefers_earlier_tags() {
        let record = DateRecord {
            create_date: Some("2021-01-02 03:04:05".to_string()),
            modify_date: Some("2022-06-07 08:09:10".to_string()),
            ..Default::default()
        };
        assert_eq!(record.resolve(), Some(datetime!(2021-01-02 03:04:05)));
    }

    #[test]
    fn test_resolve_skips_malformed_tags() {
        let record = DateRecord {
            sub_sec_create_date: Some("0000:00:00 00:00:00".to_string()),
            date_time_original: Some("garbage".to_string()),
            track_create_date: Some("2019-07-01 12:00:00".to_string()),
            ..Default::default()
        };
        assert_eq!(record.resolve(), Some(datetime!(2019-07-01 12:00:00)));
    }

    #[test]
    fn test_resolve_nothing_present() {
        assert_eq!(DateRecord::default().resolve(), None);
    }

    #[test]
    fn test_deserialize_exiftool_entry() {
        let json = r#"{
            "SourceFile": "/photos/a.jpg",
            "SubSecCreateDate": "2023-10-15 14:30:45.12+02:00",
            "ModifyDate": 0
        }"#;
        let record: DateRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.source_file, Some(PathBuf::from("/photos/a.jpg")));
        assert_eq!(record.modify_date.as_deref(), Some("0"));
        assert_eq!(record.resolve(), Some(datetime!(2023-10-15 14:30:45)));
    }

    #[test]
    fn test_preference_order_matches_tag_list() {
        let record = DateRecord::default();
        let names: Vec<&str> = record
            .in_preference_order()
            .iter()
            .map(|(tag, _)| *tag)
            .collect();
        assert_eq!(names, DATE_TAGS);
    }
}
