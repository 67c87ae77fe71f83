//! HTTP routes over the folder layout and the pipeline.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use scanroute_core::routing::{is_supported, resolve};
use scanroute_core::{Classification, Pipeline, Preview, Profile};

use crate::error::{ApiError, ApiResult};
use crate::files::{safe_file_name, FileMetadata, FileStatus, Folder, FolderStats, Folders, ProcessedResult};
use crate::worker::BatchTrigger;

/// Characters of extracted text echoed back by `/api/process-sync`.
const TEXT_PREVIEW_CHARS: usize = 500;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub folders: Arc<Folders>,
    pub pipeline: Arc<Pipeline>,
    pub trigger: BatchTrigger,
    pub profile: Profile,
    pub tesseract_available: bool,
    pub max_upload_bytes: usize,
}

/// Every route [`router`] registers, for `/_routes`.
const ROUTES: &[(&str, &[&str])] = &[
    ("/", &["GET"]),
    ("/_routes", &["GET"]),
    ("/health", &["GET"]),
    ("/upload", &["POST"]),
    ("/api/files/upload", &["POST"]),
    ("/api/files/list", &["GET"]),
    ("/api/files/:filename", &["GET"]),
    ("/api/files/:filename/metadata", &["GET"]),
    ("/search", &["GET"]),
    ("/stats", &["GET"]),
    ("/status/:filename", &["GET"]),
    ("/results/:filename", &["GET"]),
    ("/trigger-ocr", &["POST"]),
    ("/api/process-sync", &["POST"]),
    ("/ocr-text", &["POST"]),
];

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/", get(root))
        .route("/_routes", get(list_routes))
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/api/files/upload", post(upload))
        .route("/api/files/list", get(list_files))
        .route("/api/files/:filename", get(download))
        .route("/api/files/:filename/metadata", get(metadata))
        .route("/search", get(search))
        .route("/stats", get(stats))
        .route("/status/:filename", get(status))
        .route("/results/:filename", get(results))
        .route("/trigger-ocr", post(trigger_ocr))
        .route("/api/process-sync", post(process_sync))
        .route("/ocr-text", post(ocr_text))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "scanroute document router is running"
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub time: chrono::DateTime<Utc>,
    pub scan_dir: String,
    pub profile: Profile,
    pub tesseract_available: bool,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "healthy",
        time: Utc::now(),
        scan_dir: state.folders.dir(Folder::Scan).display().to_string(),
        profile: state.profile,
        tesseract_available: state.tesseract_available,
    })
}

/// Check an uploaded filename: a bare name with a routable extension.
pub fn validate_upload_name(filename: &str) -> ApiResult<&str> {
    let name = safe_file_name(filename)?;
    if !is_supported(name) {
        return Err(ApiError::BadRequest(
            "Invalid file type. Allowed: pdf, png, jpg, jpeg".to_string(),
        ));
    }
    Ok(name)
}

/// Pull the `file` field out of a multipart body.
async fn read_file_field(mut multipart: Multipart) -> ApiResult<(String, Bytes)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("No filename provided".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        return Ok((filename, data));
    }
    Err(ApiError::BadRequest("No file provided".to_string()))
}

/// Write an upload into the scan folder under a free name.
pub async fn store_upload(folders: &Folders, filename: &str, data: &[u8]) -> ApiResult<String> {
    let name = validate_upload_name(filename)?;
    let scan_dir = folders.dir(Folder::Scan);
    let stored = resolve(scan_dir, name);
    tokio::fs::write(scan_dir.join(&stored), data).await?;
    info!("Stored upload {} as {}", filename, stored);
    Ok(stored)
}

async fn upload(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Json<Value>> {
    let (filename, data) = read_file_field(multipart).await?;
    let stored = store_upload(&state.folders, &filename, &data).await?;
    Ok(Json(json!({ "status": "uploaded", "filename": stored })))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

async fn list_files(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Json<Vec<String>> {
    let folder = query.status.as_deref().map(Folder::from_query);
    Json(state.folders.list(folder))
}

fn content_type_for(name: &str) -> &'static str {
    let ext = FsPath::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

async fn download(State(state): State<AppState>, Path(filename): Path<String>) -> ApiResult<Response> {
    let (_, path) = state
        .folders
        .find(&filename)?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;
    let bytes = tokio::fs::read(&path).await?;
    let disposition = format!("attachment; filename=\"{filename}\"");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn metadata(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Json<FileMetadata>> {
    state.folders.metadata(&filename).map(Json)
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Json<Vec<String>> {
    Json(state.folders.search(&query.q))
}

async fn stats(State(state): State<AppState>) -> Json<FolderStats> {
    Json(state.folders.stats())
}

async fn status(State(state): State<AppState>, Path(filename): Path<String>) -> Json<FileStatus> {
    Json(state.folders.status_of(&filename))
}

async fn results(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Json<ProcessedResult>> {
    state.folders.processed_result(&filename).map(Json)
}

async fn trigger_ocr(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    if !state.trigger.request() {
        return Err(ApiError::Internal("Batch worker is not running".to_string()));
    }
    Ok(Json(json!({
        "status": "accepted",
        "message": "Batch queued for the scan folder",
    })))
}

/// Extraction result for a document that was not moved.
#[derive(Debug, Serialize)]
pub struct SyncResult {
    pub filename: String,
    pub text: String,
    pub name: Option<String>,
    pub name_label: Option<&'static str>,
    pub account: Option<String>,
    pub account_label: Option<&'static str>,
    pub classification: Classification,
    pub destination: &'static str,
    pub proposed_filename: String,
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Run the pipeline's preview over an upload held in a scratch directory.
async fn preview_scratch(pipeline: Arc<Pipeline>, filename: &str, data: &[u8]) -> ApiResult<(String, Preview)> {
    let name = validate_upload_name(filename)?.to_string();
    let workdir = tempfile::tempdir()?;
    let path = workdir.path().join(&name);
    tokio::fs::write(&path, data).await?;

    let preview = tokio::task::spawn_blocking(move || pipeline.preview(&path))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| {
            warn!("Preview of {} failed: {}", name, e);
            ApiError::Internal(e.to_string())
        })?;
    drop(workdir);
    Ok((name, preview))
}

/// Extract and decide for an uploaded document without routing it.
pub async fn preview_upload(pipeline: Arc<Pipeline>, filename: &str, data: &[u8]) -> ApiResult<SyncResult> {
    let (name, preview) = preview_scratch(pipeline, filename, data).await?;

    let fields = preview.fields;
    Ok(SyncResult {
        filename: name,
        text: truncate_chars(&preview.text, TEXT_PREVIEW_CHARS),
        name_label: fields.name.as_ref().map(|m| m.label.text),
        name: fields.name.map(|m| m.value),
        account_label: fields.account.as_ref().map(|m| m.label.text),
        account: fields.account.map(|m| m.value),
        destination: preview.decision.destination.as_str(),
        classification: preview.decision.classification,
        proposed_filename: preview.decision.desired_filename,
    })
}

async fn process_sync(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Json<SyncResult>> {
    let (filename, data) = read_file_field(multipart).await?;
    preview_upload(state.pipeline.clone(), &filename, &data).await.map(Json)
}

#[derive(Debug, Serialize)]
pub struct ExtractedText {
    pub filename: String,
    pub text: String,
}

/// Full extracted text of an upload, nothing else.
pub async fn text_of_upload(pipeline: Arc<Pipeline>, filename: &str, data: &[u8]) -> ApiResult<ExtractedText> {
    let (filename, preview) = preview_scratch(pipeline, filename, data).await?;
    Ok(ExtractedText {
        filename,
        text: preview.text,
    })
}

async fn ocr_text(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Json<ExtractedText>> {
    let (filename, data) = read_file_field(multipart).await?;
    text_of_upload(state.pipeline.clone(), &filename, &data).await.map(Json)
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RouteInfo {
    pub path: &'static str,
    pub methods: Vec<&'static str>,
}

/// Registered routes, sorted by path, with their methods.
pub fn route_table() -> Vec<RouteInfo> {
    let mut routes: Vec<RouteInfo> = ROUTES
        .iter()
        .map(|&(path, methods)| RouteInfo {
            path,
            methods: methods.to_vec(),
        })
        .collect();
    routes.sort_by_key(|r| r.path);
    routes
}

async fn list_routes() -> Json<Value> {
    let routes = route_table();
    Json(json!({ "count": routes.len(), "routes": routes }))
}
