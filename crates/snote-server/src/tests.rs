//! Router-level tests: pages, form flows and flash round trips against an
//! in-memory SQLite store.

use std::{io, sync::Arc};

use axum::{
  Router,
  body::Body,
  http::{Request, Response, StatusCode, header},
};
use base64::Engine as _;
use serde_json::{Value, json};
use snote_core::{
  note::{NewNote, Note, NoteEdit, NoteType},
  query::NoteQuery,
  remote::RemoteStockSearch,
  stock::{ImportSummary, Stock, StockRecord, StockSuggestion},
  store::NoteStore,
};
use snote_store_sqlite::{DatabaseConfig, LazyStore, SqliteStore};
use tower::ServiceExt as _;

use crate::{AppState, ServerConfig, auth::AdminAuth, hash_password, router};

// ─── Fixtures ────────────────────────────────────────────────────────────────

struct NoRemote;

impl RemoteStockSearch for NoRemote {
  async fn search(&self, _: &str, _: usize) -> Vec<StockSuggestion> { Vec::new() }
}

fn config() -> ServerConfig {
  ServerConfig { secret_key: Some("test-secret".into()), ..ServerConfig::default() }
}

async fn app_with(config: ServerConfig) -> (Router, Arc<SqliteStore>) {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let state = AppState::new(store, NoRemote, config);
  let store = state.store.clone();
  (router(state), store)
}

async fn app() -> (Router, Arc<SqliteStore>) { app_with(config()).await }

async fn seed(store: &SqliteStore, code: &str, content: &str) -> Note {
  store
    .add_note(NewNote {
      stock_code: code.into(),
      stock_name: Some("台積電".into()),
      note_type:  NoteType::Tag,
      content:    content.into(),
      reference:  None,
      ref_time:   None,
    })
    .await
    .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
  app.clone().oneshot(req).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
  Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
    .body(Body::from(body.to_owned()))
    .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

async fn text(res: Response<Body>) -> String {
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  String::from_utf8(bytes.to_vec()).unwrap()
}

async fn json_body(res: Response<Body>) -> Value {
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

fn location(res: &Response<Body>) -> &str {
  res.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

/// The `name=value` pair of the flash cookie set by `res`.
fn flash_cookie(res: &Response<Body>) -> String {
  let set = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
  set.split(';').next().unwrap().to_owned()
}

/// Follow a redirect with the flash cookie and return the rendered page.
async fn follow(app: &Router, res: Response<Body>) -> String {
  assert_eq!(res.status(), StatusCode::SEE_OTHER);
  let req = Request::builder()
    .uri(location(&res))
    .header(header::COOKIE, flash_cookie(&res))
    .body(Body::empty())
    .unwrap();
  let page = send(app, req).await;
  assert_eq!(page.status(), StatusCode::OK);
  text(page).await
}

// ─── Index ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn index_lists_notes_escaped() {
  let (app, store) = app().await;
  seed(&store, "2330", "<b>法說會</b>").await;

  let res = send(&app, get("/")).await;
  assert_eq!(res.status(), StatusCode::OK);
  assert!(
    res.headers()[header::CONTENT_TYPE]
      .to_str()
      .unwrap()
      .starts_with("text/html")
  );
  assert!(res.headers().get(header::SET_COOKIE).is_none());

  let html = text(res).await;
  assert!(html.contains("&lt;b&gt;法說會&lt;/b&gt;"));
  assert!(html.contains("筆記列表（1 筆）"));
}

#[tokio::test]
async fn index_applies_search() {
  let (app, store) = app().await;
  seed(&store, "2330", "晶圓代工").await;
  seed(&store, "2317", "組裝").await;

  let html = text(send(&app, get("/?search=2317&sort_by=stock_code&sort_order=asc")).await).await;
  assert!(html.contains("組裝"));
  assert!(!html.contains("晶圓代工"));
}

#[tokio::test]
async fn index_survives_store_failure() {
  let state = AppState::new(DownStore, NoRemote, config());
  let app = router(state);

  let res = send(&app, get("/")).await;
  assert_eq!(res.status(), StatusCode::OK);
  let html = text(res).await;
  assert!(html.contains("加載數據時發生錯誤"));
  assert!(html.contains("尚無筆記"));
}

#[tokio::test]
async fn tampered_flash_cookie_is_ignored() {
  let (app, _) = app().await;
  let forged = base64::engine::general_purpose::URL_SAFE_NO_PAD
    .encode(br#"{"kind":"success","message":"forged"}"#);
  let req = Request::builder()
    .uri("/")
    .header(header::COOKIE, format!("snote_flash={forged}.AAAA"))
    .body(Body::empty())
    .unwrap();

  let res = send(&app, req).await;
  assert_eq!(res.status(), StatusCode::OK);
  assert!(res.headers().get(header::SET_COOKIE).is_none());
  assert!(!text(res).await.contains("forged"));
}

// ─── Add ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_redirects_with_notice_shown_once() {
  let (app, store) = app().await;

  // 台積電, percent-encoded.
  let res = send(
    &app,
    post_form(
      "/add",
      "stock_code=2330&stock_name=%E5%8F%B0%E7%A9%8D%E9%9B%BB&note_type=TAG&content=AI+demand",
    ),
  )
  .await;
  assert_eq!(location(&res), "/");

  let cookie = flash_cookie(&res);
  let req = Request::builder()
    .uri("/")
    .header(header::COOKIE, &cookie)
    .body(Body::empty())
    .unwrap();
  let page = send(&app, req).await;
  let cleared = page.headers()[header::SET_COOKIE].to_str().unwrap().to_owned();
  assert!(cleared.contains("Max-Age=0"));

  let html = text(page).await;
  assert!(html.contains("成功添加筆記: 2330"));
  assert!(html.contains("AI demand"));

  let notes = store.list_notes(&NoteQuery::default()).await.unwrap();
  assert_eq!(notes.len(), 1);
  assert_eq!(notes[0].stock_name, "台積電");
}

#[tokio::test]
async fn add_rejects_bad_input_without_writing() {
  let (app, store) = app().await;

  let res = send(&app, post_form("/add", "stock_code=2330&note_type=MEMO&content=x")).await;
  assert!(follow(&app, res).await.contains("無效的筆記類型"));

  let res = send(&app, post_form("/add", "stock_code=2330&note_type=STORY&content=+")).await;
  assert!(follow(&app, res).await.contains("請輸入筆記內容"));

  let res = send(&app, post_form("/add", "note_type=TAG&content=x")).await;
  assert!(follow(&app, res).await.contains("請輸入股票代碼"));

  assert!(store.list_notes(&NoteQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn add_without_form_content_type_flashes() {
  let (app, store) = app().await;
  let req = Request::builder()
    .method("POST")
    .uri("/add")
    .body(Body::from("stock_code=2330&note_type=TAG&content=x"))
    .unwrap();
  let res = send(&app, req).await;
  assert_eq!(location(&res), "/");
  assert!(follow(&app, res).await.contains("表單格式錯誤"));
  assert!(store.list_notes(&NoteQuery::default()).await.unwrap().is_empty());
}

// ─── Edit ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn edit_form_is_prefilled() {
  let (app, store) = app().await;
  let note = seed(&store, "2330", "原始內容").await;

  let res = send(&app, get(&format!("/edit/{}", note.id))).await;
  assert_eq!(res.status(), StatusCode::OK);
  let html = text(res).await;
  assert!(html.contains("原始內容</textarea>"));
  assert!(html.contains("編輯筆記 - 2330 台積電"));
}

#[tokio::test]
async fn edit_form_for_missing_note_redirects_home() {
  let (app, _) = app().await;
  let res = send(&app, get("/edit/999")).await;
  assert_eq!(location(&res), "/");
  assert!(follow(&app, res).await.contains("筆記不存在"));
}

#[tokio::test]
async fn edit_submit_json() {
  let (app, store) = app().await;
  let note = seed(&store, "2330", "舊").await;
  let uri = format!("/edit/{}", note.id);

  let res = send(
    &app,
    post_json(&uri, json!({ "note_type": "STORY", "content": "新", "ref": "年報" })),
  )
  .await;
  assert_eq!(res.status(), StatusCode::OK);
  let body = json_body(res).await;
  assert_eq!(body["success"], true);
  assert_eq!(body["note"]["content"], "新");
  assert_eq!(body["note"]["note_type"], "STORY");

  let stored = store.get_note(note.id).await.unwrap().unwrap();
  assert_eq!(stored.reference.as_deref(), Some("年報"));
  assert!(stored.updated_at.is_some());

  let res = send(&app, post_json(&uri, json!({ "note_type": "MEMO", "content": "x" }))).await;
  assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  let body = json_body(res).await;
  assert_eq!(body["success"], false);
  assert_eq!(body["error"], "無效的筆記類型");

  let res = send(&app, post_json("/edit/999", json!({ "note_type": "TAG", "content": "x" }))).await;
  assert_eq!(res.status(), StatusCode::NOT_FOUND);
  assert_eq!(json_body(res).await["success"], false);
}

#[tokio::test]
async fn edit_submit_form() {
  let (app, store) = app().await;
  let note = seed(&store, "2330", "舊").await;
  let uri = format!("/edit/{}", note.id);

  let res = send(&app, post_form(&uri, "note_type=STORY&content=%E6%96%B0")).await;
  assert_eq!(location(&res), "/");
  assert!(follow(&app, res).await.contains("筆記已更新: 2330"));
  assert_eq!(store.get_note(note.id).await.unwrap().unwrap().content, "新");

  let res = send(&app, post_form(&uri, "note_type=STORY&content=")).await;
  assert_eq!(location(&res), uri);
  assert!(follow(&app, res).await.contains("請輸入筆記內容"));
  assert_eq!(store.get_note(note.id).await.unwrap().unwrap().content, "新");
}

#[tokio::test]
async fn malformed_edit_id_is_treated_as_missing() {
  let (app, _) = app().await;

  let res = send(&app, get("/edit/abc")).await;
  assert_eq!(location(&res), "/");
  assert!(follow(&app, res).await.contains("筆記不存在"));

  let res = send(&app, post_json("/edit/abc", json!({ "note_type": "TAG", "content": "x" }))).await;
  assert_eq!(res.status(), StatusCode::NOT_FOUND);
  let body = json_body(res).await;
  assert_eq!(body["success"], false);
  assert_eq!(body["error"], "筆記不存在");

  let res = send(&app, post_form("/edit/abc", "note_type=TAG&content=x")).await;
  assert_eq!(location(&res), "/");
  assert!(follow(&app, res).await.contains("筆記不存在"));
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_json_and_form() {
  let (app, store) = app().await;
  let a = seed(&store, "2330", "a").await;
  let b = seed(&store, "2317", "b").await;

  let req = Request::builder()
    .method("POST")
    .uri(format!("/delete/{}", a.id))
    .header(header::ACCEPT, "application/json")
    .body(Body::empty())
    .unwrap();
  let res = send(&app, req).await;
  assert_eq!(res.status(), StatusCode::OK);
  assert_eq!(json_body(res).await, json!({ "success": true }));

  let req = Request::builder()
    .method("POST")
    .uri(format!("/delete/{}", a.id))
    .header(header::ACCEPT, "application/json")
    .body(Body::empty())
    .unwrap();
  assert_eq!(send(&app, req).await.status(), StatusCode::NOT_FOUND);

  let res = send(&app, post_form(&format!("/delete/{}", b.id), "")).await;
  assert!(follow(&app, res).await.contains("筆記已刪除"));

  assert!(store.list_notes(&NoteQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_delete_id_is_json_404() {
  let (app, _) = app().await;
  let req = Request::builder()
    .method("POST")
    .uri("/delete/abc")
    .header(header::ACCEPT, "application/json")
    .body(Body::empty())
    .unwrap();
  let res = send(&app, req).await;
  assert_eq!(res.status(), StatusCode::NOT_FOUND);
  let body = json_body(res).await;
  assert_eq!(body["success"], false);
  assert_eq!(body["error"], "筆記不存在");
}

// ─── Admin import ────────────────────────────────────────────────────────────

fn csv_file() -> tempfile::NamedTempFile {
  let file = tempfile::NamedTempFile::new().unwrap();
  std::fs::write(
    file.path(),
    "stock_code,stock_name,industry\n2330,台積電,半導體業\n2317,鴻海,\n,缺代碼,\n",
  )
  .unwrap();
  file
}

fn import_body(file: &tempfile::NamedTempFile) -> String {
  // Temp paths are plain ASCII; only `/` needs no escaping in a form value.
  format!("csv_path={}", file.path().display())
}

#[tokio::test]
async fn import_reports_counts() {
  let (app, store) = app().await;
  let file = csv_file();

  let res = send(&app, post_form("/admin/import-stocks", &import_body(&file))).await;
  assert!(follow(&app, res).await.contains("匯入完成：新增或更新 2 筆，更新 0 筆，略過 1 筆"));

  let stock = store.get_stock("2330").await.unwrap().unwrap();
  assert_eq!(stock.industry.as_deref(), Some("半導體業"));
}

#[tokio::test]
async fn import_needs_a_readable_path() {
  let (app, _) = app().await;

  let res = send(&app, post_form("/admin/import-stocks", "csv_path=+")).await;
  assert!(follow(&app, res).await.contains("請輸入 CSV 路徑"));

  let res = send(&app, post_form("/admin/import-stocks", "csv_path=/no/such/file.csv")).await;
  assert!(follow(&app, res).await.contains("讀取 CSV 檔案失敗"));
}

#[tokio::test]
async fn import_requires_admin_when_configured() {
  let hash = hash_password("hunter2").unwrap();
  let cfg = ServerConfig {
    admin: Some(AdminAuth { username: "admin".into(), password_hash: hash }),
    ..config()
  };
  let (app, store) = app_with(cfg).await;
  let file = csv_file();

  let res = send(&app, post_form("/admin/import-stocks", &import_body(&file))).await;
  assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  assert!(store.get_stock("2330").await.unwrap().is_none());

  let creds = base64::engine::general_purpose::STANDARD.encode("admin:hunter2");
  let req = Request::builder()
    .method("POST")
    .uri("/admin/import-stocks")
    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
    .header(header::AUTHORIZATION, format!("Basic {creds}"))
    .body(Body::from(import_body(&file)))
    .unwrap();
  let res = send(&app, req).await;
  assert_eq!(res.status(), StatusCode::SEE_OTHER);
  assert!(store.get_stock("2330").await.unwrap().is_some());
}

#[tokio::test]
async fn unparsable_admin_hash_is_a_server_error() {
  let cfg = ServerConfig {
    admin: Some(AdminAuth { username: "admin".into(), password_hash: "plaintext".into() }),
    ..config()
  };
  let (app, store) = app_with(cfg).await;
  let file = csv_file();

  let creds = base64::engine::general_purpose::STANDARD.encode("admin:plaintext");
  let req = Request::builder()
    .method("POST")
    .uri("/admin/import-stocks")
    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
    .header(header::AUTHORIZATION, format!("Basic {creds}"))
    .body(Body::from(import_body(&file)))
    .unwrap();
  let res = send(&app, req).await;
  assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
  assert!(!res.headers().contains_key(header::WWW_AUTHENTICATE));
  assert!(store.get_stock("2330").await.unwrap().is_none());
}

// ─── API merge ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn api_routes_are_mounted() {
  let (app, store) = app().await;
  seed(&store, "2330", "x").await;

  let res = send(&app, get("/health")).await;
  assert_eq!(res.status(), StatusCode::OK);
  assert_eq!(json_body(res).await["database"], "connected");

  let res = send(&app, get("/api/notes")).await;
  assert_eq!(json_body(res).await["total"], 1);

  let res = send(&app, get("/search-stocks?q=2330")).await;
  let hits = json_body(res).await;
  assert_eq!(hits[0]["code"], "2330");
}

// ─── Unreachable database ────────────────────────────────────────────────────

#[tokio::test]
async fn serves_degraded_until_database_opens() {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("missing").join("snote.db");
  let store = LazyStore::new(DatabaseConfig::new(db.clone()));
  let app = router(AppState::new(store, NoRemote, config()));

  let res = send(&app, get("/")).await;
  assert_eq!(res.status(), StatusCode::OK);
  assert!(text(res).await.contains("加載數據時發生錯誤"));

  let res = send(&app, get("/health")).await;
  assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
  assert_eq!(json_body(res).await["status"], "unhealthy");

  let res = send(&app, get("/api/notes")).await;
  assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(json_body(res).await["success"], false);

  std::fs::create_dir(dir.path().join("missing")).unwrap();
  let res = send(&app, get("/health")).await;
  assert_eq!(res.status(), StatusCode::OK);
}

// ─── Failing store ───────────────────────────────────────────────────────────

struct DownStore;

fn down() -> io::Error { io::Error::other("database is down") }

impl NoteStore for DownStore {
  type Error = io::Error;

  async fn add_note(&self, _: NewNote) -> io::Result<Note> { Err(down()) }
  async fn list_notes(&self, _: &NoteQuery) -> io::Result<Vec<Note>> { Err(down()) }
  async fn get_note(&self, _: i64) -> io::Result<Option<Note>> { Err(down()) }
  async fn update_note(&self, _: i64, _: NoteEdit) -> io::Result<bool> { Err(down()) }
  async fn delete_note(&self, _: i64) -> io::Result<bool> { Err(down()) }
  async fn search_stocks(&self, _: &str, _: usize) -> io::Result<Vec<Stock>> { Err(down()) }
  async fn get_stock(&self, _: &str) -> io::Result<Option<Stock>> { Err(down()) }
  async fn import_stocks(&self, _: Vec<StockRecord>) -> io::Result<ImportSummary> { Err(down()) }
  async fn init_common_stocks(&self) -> io::Result<bool> { Err(down()) }
  async fn ping(&self) -> io::Result<()> { Err(down()) }
}
