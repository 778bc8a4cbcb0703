pub mod add;
pub mod delete;
pub mod edit;
pub mod import;
pub mod index;

use axum::{
  Form, Json,
  extract::{
    FromRequest, Path, Request,
    rejection::{FormRejection, PathRejection},
  },
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::{Deserialize, de::DeserializeOwned};
use snote_core::{
  note::{NewNote, NoteEdit, NoteType},
  timestamp,
};

use crate::{
  AppState,
  error::Error,
  flash::{self, Flash},
};

pub(super) const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";

/// Whether the caller wants a JSON reply instead of a redirect: a JSON body
/// or an `Accept` header naming `application/json`.
pub(super) fn wants_json(headers: &HeaderMap) -> bool {
  let has = |name: header::HeaderName| {
    headers
      .get(name)
      .and_then(|v| v.to_str().ok())
      .is_some_and(|v| v.contains("application/json"))
  };
  has(header::CONTENT_TYPE) || has(header::ACCEPT)
}

/// A rendered page. Clears the flash cookie when a notice was shown.
pub(super) fn html_page(body: Vec<u8>, consumed_flash: bool) -> Response {
  let mut res = ([(header::CONTENT_TYPE, CONTENT_TYPE_HTML)], body).into_response();
  if consumed_flash {
    res.headers_mut().insert(header::SET_COOKIE, flash::clear_cookie());
  }
  res
}

/// `303 See Other` to `location`, carrying `notice` to the next page view.
pub(super) fn redirect_to<S, R>(
  state: &AppState<S, R>,
  location: &str,
  notice: Flash,
) -> Response {
  let mut res = (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response();
  if let Some(cookie) = flash::set_cookie(&state.flash_key, &notice) {
    res.headers_mut().insert(header::SET_COOKIE, cookie);
  }
  res
}

pub(super) fn redirect_home<S, R>(state: &AppState<S, R>, notice: Flash) -> Response {
  redirect_to(state, "/", notice)
}

// ─── Extraction ──────────────────────────────────────────────────────────────

const BAD_FORM: &str = "表單格式錯誤";

/// The note id from the path. An id that is not an integer names no note.
pub(super) fn note_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, Error> {
  id.map(|Path(id)| id)
    .map_err(|_| Error::NotFound("筆記不存在".to_owned()))
}

/// An urlencoded form body, with axum's rejection turned into a notice.
pub(super) fn form_body<T>(form: Result<Form<T>, FormRejection>) -> Result<T, Error> {
  form.map(|Form(value)| value).map_err(|e| {
    tracing::debug!(error = %e, "form body rejected");
    Error::Invalid(BAD_FORM.to_owned())
  })
}

/// A request body read as JSON when `Content-Type` says so, and as an
/// urlencoded form otherwise. JSON errors keep axum's message for API
/// callers; form errors become a notice.
pub struct FormOrJson<T>(pub T);

impl<T, St> FromRequest<St> for FormOrJson<T>
where
  T: DeserializeOwned,
  St: Send + Sync,
{
  type Rejection = Error;

  async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
    let is_json = req
      .headers()
      .get(header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .is_some_and(|v| v.starts_with("application/json"));

    if is_json {
      let Json(value) = Json::<T>::from_request(req, state)
        .await
        .map_err(|e| Error::Invalid(e.body_text()))?;
      Ok(Self(value))
    } else {
      form_body(Form::<T>::from_request(req, state).await).map(Self)
    }
  }
}

// ─── Note input ──────────────────────────────────────────────────────────────

/// Note fields as submitted by the add and edit forms, or as a JSON body.
/// Everything is optional so that validation, not deserialisation, reports
/// what is missing.
#[derive(Debug, Default, Deserialize)]
pub struct NoteInput {
  pub stock_code: Option<String>,
  pub stock_name: Option<String>,
  pub note_type:  Option<String>,
  pub content:    Option<String>,
  #[serde(rename = "ref")]
  pub reference:  Option<String>,
  pub ref_time:   Option<String>,
}

fn trimmed(s: &Option<String>) -> Option<String> {
  s.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
}

impl NoteInput {
  fn note_type(&self) -> Result<NoteType, Error> {
    let raw = trimmed(&self.note_type)
      .ok_or_else(|| Error::Invalid("請選擇筆記類型".to_owned()))?;
    NoteType::parse(&raw).map_err(|_| Error::Invalid("無效的筆記類型".to_owned()))
  }

  fn content(&self) -> Result<String, Error> {
    trimmed(&self.content).ok_or_else(|| Error::Invalid("請輸入筆記內容".to_owned()))
  }

  fn ref_time(&self) -> Result<Option<chrono::NaiveDateTime>, Error> {
    timestamp::parse_input(self.ref_time.as_deref().unwrap_or_default())
      .map_err(|_| Error::Invalid("來源時間格式錯誤".to_owned()))
  }

  /// Validate as a new note; checks run in form order.
  pub fn into_new_note(self) -> Result<NewNote, Error> {
    let stock_code = trimmed(&self.stock_code)
      .ok_or_else(|| Error::Invalid("請輸入股票代碼".to_owned()))?;
    let note_type = self.note_type()?;
    let content = self.content()?;
    let ref_time = self.ref_time()?;

    Ok(NewNote {
      stock_code,
      stock_name: trimmed(&self.stock_name),
      note_type,
      content,
      reference: trimmed(&self.reference),
      ref_time,
    })
  }

  /// Validate as an edit; `stock_code` and `stock_name` are ignored.
  pub fn into_edit(self) -> Result<NoteEdit, Error> {
    Ok(NoteEdit {
      note_type: self.note_type()?,
      content:   self.content()?,
      reference: trimmed(&self.reference),
      ref_time:  self.ref_time()?,
    })
  }
}
