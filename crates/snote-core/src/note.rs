//! Notes — the user-authored annotations attached to a stock.

use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, stock::placeholder_name};

/// The two kinds of note a user can write.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum NoteType {
  /// A short label, e.g. "AI server supply chain".
  Tag,
  /// A longer narrative about the company.
  Story,
}

impl NoteType {
  /// Parse the wire form (`TAG` / `STORY`), mapping failure to
  /// [`Error::InvalidNoteType`].
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::InvalidNoteType(s.to_owned()))
  }
}

/// A persisted note joined with the name of its stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
  pub id:         i64,
  pub stock_code: String,
  pub stock_name: String,
  pub note_type:  NoteType,
  pub content:    String,
  /// Free-text citation of where the information came from.
  #[serde(rename = "ref")]
  pub reference:  Option<String>,
  /// When the cited source was observed.
  #[serde(with = "crate::timestamp::optional", default)]
  pub ref_time:   Option<NaiveDateTime>,
  #[serde(with = "crate::timestamp")]
  pub created_at: NaiveDateTime,
  #[serde(with = "crate::timestamp::optional", default)]
  pub updated_at: Option<NaiveDateTime>,
}

/// Input to [`crate::store::NoteStore::add_note`].
/// `created_at` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewNote {
  pub stock_code: String,
  /// Display name for the stock; empty or equal to the code means unknown.
  pub stock_name: Option<String>,
  pub note_type:  NoteType,
  pub content:    String,
  pub reference:  Option<String>,
  pub ref_time:   Option<NaiveDateTime>,
}

impl NewNote {
  /// Convenience constructor with all optional fields unset.
  pub fn new(
    stock_code: impl Into<String>,
    note_type: NoteType,
    content: impl Into<String>,
  ) -> Self {
    Self {
      stock_code: stock_code.into(),
      stock_name: None,
      note_type,
      content: content.into(),
      reference: None,
      ref_time: None,
    }
  }

  pub fn with_stock_name(mut self, name: impl Into<String>) -> Self {
    self.stock_name = Some(name.into());
    self
  }

  /// Reject input that must never reach the database.
  pub fn validate(&self) -> Result<()> {
    if self.stock_code.trim().is_empty() {
      return Err(Error::MissingField("stock_code"));
    }
    if self.content.trim().is_empty() {
      return Err(Error::MissingField("content"));
    }
    Ok(())
  }

  /// The caller's stock name, unless it is missing, blank, or just repeats
  /// the code.
  pub fn supplied_stock_name(&self) -> Option<&str> {
    self
      .stock_name
      .as_deref()
      .map(str::trim)
      .filter(|name| !name.is_empty() && *name != self.stock_code)
  }

  /// The stock name to store for a new stock row.
  pub fn resolved_stock_name(&self) -> String {
    self
      .supplied_stock_name()
      .map(str::to_owned)
      .unwrap_or_else(|| placeholder_name(&self.stock_code))
  }
}

/// The editable subset of a note. `stock_code` is fixed at creation.
#[derive(Debug, Clone)]
pub struct NoteEdit {
  pub note_type: NoteType,
  pub content:   String,
  pub reference: Option<String>,
  pub ref_time:  Option<NaiveDateTime>,
}

impl NoteEdit {
  pub fn validate(&self) -> Result<()> {
    if self.content.trim().is_empty() {
      return Err(Error::MissingField("content"));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn note_type_parses_wire_form_only() {
    assert_eq!(NoteType::parse("TAG").unwrap(), NoteType::Tag);
    assert_eq!(NoteType::parse("STORY").unwrap(), NoteType::Story);
    assert!(matches!(
      NoteType::parse("MEMO"),
      Err(Error::InvalidNoteType(s)) if s == "MEMO"
    ));
    assert!(NoteType::parse("tag").is_err());
  }

  #[test]
  fn note_type_displays_uppercase() {
    assert_eq!(NoteType::Story.to_string(), "STORY");
    assert_eq!(NoteType::Tag.as_ref(), "TAG");
  }

  #[test]
  fn placeholder_used_when_name_repeats_code() {
    let n = NewNote::new("2330", NoteType::Tag, "x").with_stock_name("2330");
    assert_eq!(n.resolved_stock_name(), "股票2330");

    let n = NewNote::new("2330", NoteType::Tag, "x").with_stock_name("  ");
    assert_eq!(n.resolved_stock_name(), "股票2330");

    let n = NewNote::new("2330", NoteType::Tag, "x").with_stock_name("台積電");
    assert_eq!(n.resolved_stock_name(), "台積電");
  }

  #[test]
  fn blank_content_fails_validation() {
    let n = NewNote::new("2330", NoteType::Tag, "   ");
    assert!(matches!(n.validate(), Err(Error::MissingField("content"))));
  }

  #[test]
  fn note_serialises_ref_key() {
    let note = Note {
      id:         1,
      stock_code: "2330".into(),
      stock_name: "台積電".into(),
      note_type:  NoteType::Tag,
      content:    "護國神山".into(),
      reference:  Some("年報".into()),
      ref_time:   None,
      created_at: crate::timestamp::parse("2024-01-02 03:04:05").unwrap(),
      updated_at: None,
    };
    let json = serde_json::to_value(&note).unwrap();
    assert_eq!(json["ref"], "年報");
    assert_eq!(json["note_type"], "TAG");
    assert_eq!(json["created_at"], "2024-01-02 03:04:05");
    assert!(json["updated_at"].is_null());
  }
}
