//! Wall-clock timestamps as stored in the database and shown to users.
//!
//! Every timestamp is a naive server-local time rendered as
//! `YYYY-MM-DD HH:MM:SS`. The string form sorts lexically in time order, so
//! the store can `ORDER BY` the text column directly.

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serializer};

use crate::{Error, Result};

/// Canonical storage and display format.
pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Additional layouts accepted from forms (`datetime-local` inputs omit
/// seconds and use a `T` separator).
const INPUT_FORMATS: &[&str] =
  &[FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// The current server-local time, truncated to whole seconds.
pub fn now() -> NaiveDateTime {
  let now = Local::now().naive_local();
  now.with_nanosecond(0).unwrap_or(now)
}

pub fn format(dt: NaiveDateTime) -> String { dt.format(FORMAT).to_string() }

/// Parse a timestamp in the canonical format.
pub fn parse(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, FORMAT)
    .map_err(|_| Error::InvalidTimestamp(s.to_owned()))
}

/// Parse a user-supplied timestamp.
///
/// Accepts the canonical format, the HTML `datetime-local` layouts, and a bare
/// date (interpreted as midnight). Blank input yields `None`.
pub fn parse_input(s: &str) -> Result<Option<NaiveDateTime>> {
  let s = s.trim();
  if s.is_empty() {
    return Ok(None);
  }
  for layout in INPUT_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, layout) {
      return Ok(Some(dt));
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(Some)
    .ok_or_else(|| Error::InvalidTimestamp(s.to_owned()))
}

// ─── serde helpers ───────────────────────────────────────────────────────────

pub fn serialize<S: Serializer>(
  dt: &NaiveDateTime,
  serializer: S,
) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(&format(*dt))
}

pub fn deserialize<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> Result<NaiveDateTime, D::Error> {
  let s = String::deserialize(deserializer)?;
  parse(&s).map_err(serde::de::Error::custom)
}

/// `#[serde(with = "snote_core::timestamp::optional")]` for `Option` fields.
pub mod optional {
  use chrono::NaiveDateTime;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(
    dt: &Option<NaiveDateTime>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    match dt {
      Some(dt) => serializer.serialize_some(&super::format(*dt)),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<NaiveDateTime>, D::Error> {
    Option::<String>::deserialize(deserializer)?
      .map(|s| super::parse(&s))
      .transpose()
      .map_err(serde::de::Error::custom)
  }
}
