//! Accepted textual forms for temporal parameters.
//!
//! Each temporal primitive admits a fixed list of formats, tried in order;
//! the first that parses wins. Zone-bearing forms are normalized to UTC.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// A successfully classified temporal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Temporal {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Instant(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy)]
enum Pattern {
    DateOnly(&'static str),
    Local(&'static str),
    Zoned(&'static str),
}

/// One admissible input format: the label shown in error messages and the
/// strftime pattern used to parse it.
#[derive(Debug, Clone, Copy)]
pub struct DateFormat {
    label: &'static str,
    pattern: Pattern,
}

impl DateFormat {
    pub fn label(&self) -> &'static str {
        self.label
    }

    fn parse(&self, text: &str) -> Option<Temporal> {
        match self.pattern {
            Pattern::DateOnly(pattern) => NaiveDate::parse_from_str(text, pattern)
                .ok()
                .map(Temporal::Date),
            Pattern::Local(pattern) => NaiveDateTime::parse_from_str(text, pattern)
                .ok()
                .map(Temporal::DateTime),
            Pattern::Zoned(pattern) => DateTime::parse_from_str(text, pattern)
                .ok()
                .map(|value| Temporal::Instant(value.with_timezone(&Utc))),
        }
    }
}

const FORMATS: [DateFormat; 7] = [
    DateFormat {
        label: "yyyy-MM-dd",
        pattern: Pattern::DateOnly("%Y-%m-%d"),
    },
    DateFormat {
        label: "yyyy-MM-dd HH:mm:ss",
        pattern: Pattern::Local("%Y-%m-%d %H:%M:%S"),
    },
    DateFormat {
        label: "yyyy-MM-dd HH:mm:ss.SSS",
        pattern: Pattern::Local("%Y-%m-%d %H:%M:%S%.3f"),
    },
    DateFormat {
        label: "yyyy-MM-dd'T'HH:mm:ss",
        pattern: Pattern::Local("%Y-%m-%dT%H:%M:%S"),
    },
    DateFormat {
        label: "yyyy-MM-dd'T'HH:mm:ss.SSS",
        pattern: Pattern::Local("%Y-%m-%dT%H:%M:%S%.3f"),
    },
    DateFormat {
        label: "yyyy-MM-dd HH:mm:ssZ",
        pattern: Pattern::Zoned("%Y-%m-%d %H:%M:%S%z"),
    },
    DateFormat {
        label: "yyyy-MM-dd'T'HH:mm:ssZ",
        pattern: Pattern::Zoned("%Y-%m-%dT%H:%M:%S%z"),
    },
];

/// All forms accepted for `Date`.
pub fn date_formats() -> &'static [DateFormat] {
    &FORMATS
}

/// `DateTime` drops the date-only form; a bare calendar date is not a point
/// in time.
pub fn date_time_formats() -> &'static [DateFormat] {
    &FORMATS[1..]
}

/// `StrictDate` accepts the calendar-date form and nothing else.
pub fn strict_date_formats() -> &'static [DateFormat] {
    &FORMATS[..1]
}

pub fn parse_with(formats: &[DateFormat], text: &str) -> Option<Temporal> {
    formats.iter().find_map(|format| format.parse(text))
}

pub fn labels(formats: &[DateFormat]) -> String {
    formats
        .iter()
        .map(DateFormat::label)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Timelike;

    #[test]
    fn test_every_date_form_parses() {
        let inputs = [
            "2020-07-14",
            "2020-07-14 15:18:23",
            "2020-07-14 15:18:23.123",
            "2020-07-14T15:18:23",
            "2020-07-14T15:18:23.123",
            "2020-07-14 15:18:23+0000",
            "2020-07-14T15:18:23-0300",
        ];
        for input in inputs {
            assert!(
                parse_with(date_formats(), input).is_some(),
                "failed on {}",
                input
            );
        }
    }

    #[test]
    fn test_zoned_input_is_normalized_to_utc() {
        let parsed = parse_with(date_formats(), "2020-07-14T15:18:23-0300");
        let Some(Temporal::Instant(instant)) = parsed else {
            panic!("expected an instant");
        };
        assert_eq!(instant.hour(), 18);
        assert_eq!(instant.minute(), 18);
        assert_eq!(instant.second(), 23);
    }

    #[test]
    fn test_date_time_rejects_bare_date() {
        assert_matches!(parse_with(date_time_formats(), "2020-07-14"), None);
        assert_matches!(
            parse_with(date_time_formats(), "2020-07-14 15:18:23"),
            Some(Temporal::DateTime(_))
        );
    }

    #[test]
    fn test_strict_date_rejects_time_bearing_forms() {
        assert_matches!(
            parse_with(strict_date_formats(), "2020-07-14"),
            Some(Temporal::Date(_))
        );
        assert_matches!(parse_with(strict_date_formats(), "2020-07-14 15:18:23"), None);
    }

    #[test]
    fn test_labels_render_in_declaration_order() {
        assert_eq!(labels(strict_date_formats()), "yyyy-MM-dd");
        assert!(labels(date_formats()).starts_with("yyyy-MM-dd, yyyy-MM-dd HH:mm:ss"));
    }
}
