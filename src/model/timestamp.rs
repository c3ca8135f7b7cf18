//! Worker-reported timestamps
//!
//! Workers report `last_update` as RFC 3339 text in whatever offset and
//! precision they use. The text is kept verbatim so a report reads back
//! exactly as it was sent; the parsed instant is used for ordering and the
//! Unix projection on the job board.

use chrono::{DateTime, FixedOffset, ParseError, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An RFC 3339 timestamp that remembers its original spelling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    instant: DateTime<FixedOffset>,
    text: String,
}

impl Timestamp {
    /// Parse RFC 3339 text, keeping it as given
    pub fn parse(text: impl Into<String>) -> Result<Self, ParseError> {
        let text = text.into();
        let instant = DateTime::parse_from_rfc3339(&text)?;
        Ok(Self { instant, text })
    }

    /// The instant, in the offset the worker reported
    pub fn instant(&self) -> DateTime<FixedOffset> {
        self.instant
    }

    /// Unix seconds
    pub fn timestamp(&self) -> i64 {
        self.instant.timestamp()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Timestamp {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Timestamp {
    type Error = ParseError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse(text)
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.text
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            instant: DateTime::<FixedOffset>::from(dt),
            text: dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self {
            instant: dt,
            text: dt.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_offset_and_precision_survive_json() {
        let json = r#""2024-05-01T16:00:00.5+08:00""#;
        let ts: Timestamp = serde_json::from_str(json).unwrap();

        assert_eq!(ts.instant().offset().local_minus_utc(), 8 * 3600);
        assert_eq!(
            ts.timestamp(),
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap().timestamp()
        );
        assert_eq!(serde_json::to_string(&ts).unwrap(), json);
    }

    #[test]
    fn test_utc_z_suffix_is_kept() {
        let ts: Timestamp = "2024-05-01T08:00:00Z".parse().unwrap();
        assert_eq!(ts.to_string(), "2024-05-01T08:00:00Z");
    }

    #[test]
    fn test_rejects_non_rfc3339() {
        assert!(serde_json::from_str::<Timestamp>(r#""yesterday""#).is_err());
        assert!(Timestamp::parse("2024-05-01 08:00").is_err());
    }

    #[test]
    fn test_from_utc() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let ts = Timestamp::from(dt);
        assert_eq!(ts.as_str(), "2024-03-01T12:30:00Z");
        assert_eq!(ts.timestamp(), dt.timestamp());
    }
}
