//! HTML page rendering.
//!
//! Pages are emitted with `quick-xml`'s writer, so all text and attribute
//! values are escaped. Void elements are written self-closing.

use std::io;

use chrono::NaiveDateTime;
use quick_xml::{
  Writer,
  events::{BytesEnd, BytesStart, BytesText, Event},
};
use snote_core::{
  note::{Note, NoteType},
  query::{NoteQuery, SortBy, SortOrder},
  timestamp,
};

use crate::flash::Flash;

const STYLE: &str = "
body { font-family: sans-serif; max-width: 64rem; margin: 2rem auto; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #ddd; padding: .4rem; text-align: left; vertical-align: top; }
.flash { padding: .6rem; margin-bottom: 1rem; }
.flash-success { background: #e6f4ea; }
.flash-error { background: #fce8e6; }
form.inline { display: inline; }
label { display: block; margin-top: .5rem; }
";

const SORT_COLUMNS: &[(SortBy, &str)] = &[
  (SortBy::CreatedAt, "建立時間"),
  (SortBy::StockCode, "股票代碼"),
  (SortBy::StockName, "股票名稱"),
  (SortBy::NoteType, "筆記類型"),
];

const NOTE_TYPES: &[(NoteType, &str)] =
  &[(NoteType::Tag, "標籤 TAG"), (NoteType::Story, "故事 STORY")];

// ─── Writer ──────────────────────────────────────────────────────────────────

type Attrs<'a> = &'a [(&'a str, &'a str)];

/// A thin element-level wrapper over [`quick_xml::Writer`].
pub struct Html {
  writer: Writer<Vec<u8>>,
}

impl Html {
  fn new(title: &str) -> io::Result<Self> {
    let mut h = Self { writer: Writer::new(Vec::new()) };
    h.writer
      .write_event(Event::DocType(BytesText::from_escaped("html")))?;
    h.open("html", &[("lang", "zh-Hant")])?;
    h.open("head", &[])?;
    h.empty("meta", &[("charset", "utf-8")])?;
    h.text_elem("title", &[], title)?;
    h.text_elem("style", &[], STYLE)?;
    h.close("head")?;
    h.open("body", &[])?;
    Ok(h)
  }

  fn open(&mut self, tag: &str, attrs: Attrs<'_>) -> io::Result<&mut Self> {
    let mut el = BytesStart::new(tag);
    el.extend_attributes(attrs.iter().copied());
    self.writer.write_event(Event::Start(el))?;
    Ok(self)
  }

  fn close(&mut self, tag: &str) -> io::Result<&mut Self> {
    self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(self)
  }

  fn empty(&mut self, tag: &str, attrs: Attrs<'_>) -> io::Result<&mut Self> {
    let mut el = BytesStart::new(tag);
    el.extend_attributes(attrs.iter().copied());
    self.writer.write_event(Event::Empty(el))?;
    Ok(self)
  }

  fn text(&mut self, text: &str) -> io::Result<&mut Self> {
    self.writer.write_event(Event::Text(BytesText::new(text)))?;
    Ok(self)
  }

  /// `<tag attrs>text</tag>`; always written as a start/end pair so that
  /// `<textarea>` and friends stay valid HTML when empty.
  fn text_elem(&mut self, tag: &str, attrs: Attrs<'_>, text: &str) -> io::Result<&mut Self> {
    self.open(tag, attrs)?.text(text)?.close(tag)
  }

  fn finish(mut self) -> io::Result<Vec<u8>> {
    self.close("body")?.close("html")?;
    Ok(self.writer.into_inner())
  }

  fn flash(&mut self, flash: Option<&Flash>) -> io::Result<&mut Self> {
    if let Some(f) = flash {
      let class = format!("flash flash-{}", f.kind.as_str());
      self.text_elem("div", &[("class", class.as_str()), ("role", "alert")], &f.message)?;
    }
    Ok(self)
  }

  fn select<T: PartialEq + Copy>(
    &mut self,
    name: &str,
    options: &[(T, &str)],
    selected: T,
    value: impl Fn(T) -> String,
  ) -> io::Result<&mut Self> {
    self.open("select", &[("name", name), ("id", name)])?;
    for (opt, label) in options {
      let v = value(*opt);
      if *opt == selected {
        self.text_elem("option", &[("value", v.as_str()), ("selected", "selected")], label)?;
      } else {
        self.text_elem("option", &[("value", v.as_str())], label)?;
      }
    }
    self.close("select")
  }

  fn labelled_input(
    &mut self,
    label: &str,
    name: &str,
    kind: &str,
    value: &str,
    extra: Attrs<'_>,
  ) -> io::Result<&mut Self> {
    self.text_elem("label", &[("for", name)], label)?;
    let mut attrs = vec![("type", kind), ("name", name), ("id", name), ("value", value)];
    attrs.extend_from_slice(extra);
    self.empty("input", &attrs)
  }
}

fn datetime_local(dt: Option<NaiveDateTime>) -> String {
  dt.map(|d| d.format("%Y-%m-%dT%H:%M").to_string()).unwrap_or_default()
}

fn display_ts(dt: Option<NaiveDateTime>) -> String {
  dt.map(timestamp::format).unwrap_or_default()
}

// ─── Index ───────────────────────────────────────────────────────────────────

/// The note list with search, sort and add forms.
///
/// `notice` is shown when the list could not be loaded.
pub fn index(
  notes: &[Note],
  query: &NoteQuery,
  flash: Option<&Flash>,
  notice: Option<&str>,
) -> io::Result<Vec<u8>> {
  let mut h = Html::new("股票筆記")?;
  h.text_elem("h1", &[], "股票筆記")?;
  h.flash(flash)?;
  if let Some(n) = notice {
    h.text_elem("div", &[("class", "flash flash-error")], n)?;
  }

  // Search and sort.
  h.open("form", &[("method", "get"), ("action", "/")])?;
  h.labelled_input(
    "搜尋",
    "search",
    "search",
    query.search_term().unwrap_or_default(),
    &[("placeholder", "代碼、名稱、內容或來源")],
  )?;
  h.select("sort_by", SORT_COLUMNS, query.sort_by, |s| s.to_string())?;
  h.select(
    "sort_order",
    &[(SortOrder::Desc, "新到舊 / 大到小"), (SortOrder::Asc, "舊到新 / 小到大")],
    query.sort_order,
    |o| o.to_string(),
  )?;
  h.text_elem("button", &[("type", "submit")], "套用")?;
  h.close("form")?;

  // Add.
  h.text_elem("h2", &[], "新增筆記")?;
  h.open("form", &[("method", "post"), ("action", "/add")])?;
  h.labelled_input("股票代碼", "stock_code", "text", "", &[("required", "required"), ("autocomplete", "off")])?;
  h.labelled_input("股票名稱", "stock_name", "text", "", &[])?;
  h.text_elem("label", &[("for", "note_type")], "筆記類型")?;
  h.select("note_type", NOTE_TYPES, NoteType::Tag, |t| t.to_string())?;
  h.text_elem("label", &[("for", "content")], "內容")?;
  h.text_elem("textarea", &[("name", "content"), ("id", "content"), ("rows", "4"), ("required", "required")], "")?;
  h.labelled_input("來源", "ref", "text", "", &[])?;
  h.labelled_input("來源時間", "ref_time", "datetime-local", "", &[])?;
  h.text_elem("button", &[("type", "submit")], "新增")?;
  h.close("form")?;

  // List.
  h.text_elem("h2", &[], &format!("筆記列表（{} 筆）", notes.len()))?;
  if notes.is_empty() {
    h.text_elem("p", &[], "尚無筆記")?;
  } else {
    h.open("table", &[])?.open("thead", &[])?.open("tr", &[])?;
    for col in ["代碼", "名稱", "類型", "內容", "來源", "來源時間", "建立時間", "更新時間", ""] {
      h.text_elem("th", &[], col)?;
    }
    h.close("tr")?.close("thead")?.open("tbody", &[])?;
    for note in notes {
      note_row(&mut h, note)?;
    }
    h.close("tbody")?.close("table")?;
  }

  // Import.
  h.text_elem("h2", &[], "匯入股票清單")?;
  h.open("form", &[("method", "post"), ("action", "/admin/import-stocks")])?;
  h.labelled_input("CSV 路徑", "csv_path", "text", "data/example_stocks.csv", &[])?;
  h.text_elem("button", &[("type", "submit")], "匯入")?;
  h.close("form")?;

  h.finish()
}

fn note_row(h: &mut Html, note: &Note) -> io::Result<()> {
  h.open("tr", &[])?;
  h.text_elem("td", &[], &note.stock_code)?;
  h.text_elem("td", &[], &note.stock_name)?;
  h.text_elem("td", &[], note.note_type.as_ref())?;
  h.text_elem("td", &[], &note.content)?;
  h.text_elem("td", &[], note.reference.as_deref().unwrap_or_default())?;
  h.text_elem("td", &[], &display_ts(note.ref_time))?;
  h.text_elem("td", &[], &timestamp::format(note.created_at))?;
  h.text_elem("td", &[], &display_ts(note.updated_at))?;

  let edit = format!("/edit/{}", note.id);
  let delete = format!("/delete/{}", note.id);
  h.open("td", &[])?;
  h.text_elem("a", &[("href", edit.as_str())], "編輯")?;
  h.text(" ")?;
  h.open("form", &[("class", "inline"), ("method", "post"), ("action", delete.as_str())])?;
  h.text_elem("button", &[("type", "submit")], "刪除")?;
  h.close("form")?;
  h.close("td")?;
  h.close("tr")?;
  Ok(())
}

// ─── Edit ────────────────────────────────────────────────────────────────────

pub fn edit(note: &Note, flash: Option<&Flash>) -> io::Result<Vec<u8>> {
  let title = format!("編輯筆記 - {} {}", note.stock_code, note.stock_name);
  let mut h = Html::new(&title)?;
  h.text_elem("h1", &[], &title)?;
  h.flash(flash)?;

  let action = format!("/edit/{}", note.id);
  h.open("form", &[("method", "post"), ("action", action.as_str())])?;
  h.text_elem("label", &[("for", "note_type")], "筆記類型")?;
  h.select("note_type", NOTE_TYPES, note.note_type, |t| t.to_string())?;
  h.text_elem("label", &[("for", "content")], "內容")?;
  h.text_elem(
    "textarea",
    &[("name", "content"), ("id", "content"), ("rows", "6"), ("required", "required")],
    &note.content,
  )?;
  h.labelled_input("來源", "ref", "text", note.reference.as_deref().unwrap_or_default(), &[])?;
  h.labelled_input("來源時間", "ref_time", "datetime-local", &datetime_local(note.ref_time), &[])?;
  h.text_elem("button", &[("type", "submit")], "儲存")?;
  h.text(" ")?;
  h.text_elem("a", &[("href", "/")], "取消")?;
  h.close("form")?;

  h.finish()
}
