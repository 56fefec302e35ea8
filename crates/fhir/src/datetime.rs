//! FHIR dateTime ingestion at its permitted precision levels.
//!
//! FHIR allows `YYYY`, `YYYY-MM`, `YYYY-MM-DD` and full timestamps with or
//! without an offset. Values are widened to a UTC instant (missing parts
//! resolve to the start of the period, offset-less times are taken as UTC) and
//! serialised back as RFC 3339.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Parse one FHIR dateTime string into a UTC instant.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    // Partial dates widen to the start of the period they name.
    let widened = match raw.len() {
        4 => format!("{raw}-01-01"),
        7 => format!("{raw}-01"),
        _ => raw.to_string(),
    };
    if let Ok(date) = NaiveDate::parse_from_str(&widened, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }
    Err(format!("'{raw}' is not a valid FHIR dateTime"))
}

/// Serde adapter for optional FHIR dateTime fields.
///
/// Pair with `#[serde(default, skip_serializing_if = "Option::is_none")]`.
pub mod optional {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(instant) => {
                serializer.serialize_str(&instant.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => super::parse(&raw).map(Some).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn accepts_full_rfc3339() {
        let instant = parse("2024-03-01T10:30:00+01:00").expect("parse");
        assert_eq!(instant.hour(), 9);
    }

    #[test]
    fn accepts_offsetless_datetime_as_utc() {
        let instant = parse("2024-03-01T10:30:00").expect("parse");
        assert_eq!(instant.to_rfc3339(), "2024-03-01T10:30:00+00:00");
    }

    #[test]
    fn accepts_partial_dates() {
        assert_eq!(
            parse("2024-03-01").expect("date").to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
        assert_eq!(
            parse("2024-03").expect("month").to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
        assert_eq!(
            parse("2024").expect("year").to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("yesterday").is_err());
        assert!(parse("2024-13-40").is_err());
    }
}
