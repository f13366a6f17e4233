//! Request handlers for the checklist endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::header::{CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, Method};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

use mobile_check_core::{ChecklistPayload, EntryId, Error, Result};
use mobile_check_telemetry::Timer;

use crate::api::{IdQuery, StoreDataResponse, UploadRequest, UploadResponse};
use crate::page;
use crate::server::{error_response, AppState, ErrorFormat, ServerConfig};

/// Path of the checklist page, relative to the base URL.
pub const MOBILE_CHECK_PATH: &str = "/api/mobile-check";

/// The parts of an upload request the service looks at.
#[derive(Debug, Default)]
struct UploadParts {
    data: Option<serde_json::Value>,
    file: Option<UploadedFile>,
}

/// An uploaded file. Only its description is kept.
#[derive(Debug)]
struct UploadedFile {
    name: Option<String>,
    size: usize,
}

// === Upload ===

pub(crate) async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
) -> Response {
    let timer = Timer::start("upload");
    let response = match accept_upload(&state, &headers, request).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(&state, &e, ErrorFormat::Json),
    };
    timer.stop();
    response
}

async fn accept_upload(
    state: &Arc<AppState>,
    headers: &HeaderMap,
    request: Request,
) -> Result<UploadResponse> {
    let is_multipart = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let parts = if is_multipart {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| Error::invalid_payload(e.body_text()))?;
        read_multipart(multipart).await?
    } else {
        let Json(body) = Json::<UploadRequest>::from_request(request, state)
            .await
            .map_err(|e| Error::invalid_payload(e.body_text()))?;
        UploadParts {
            data: body.data,
            file: None,
        }
    };

    if is_multipart && state.config.require_upload_file && parts.file.is_none() {
        return Err(Error::missing("file"));
    }
    if let Some(file) = &parts.file {
        tracing::debug!(
            file_name = file.name.as_deref().unwrap_or("<unnamed>"),
            size = file.size,
            "Upload carried a file; ignoring its contents"
        );
    }

    let data = parts.data.ok_or_else(|| Error::missing("data"))?;
    let payload = ChecklistPayload::from_value(data)?;
    let id = state.store.put(payload.to_value()).await?;

    state.metrics.record_upload();
    tracing::info!(
        id = %id,
        items = payload.len(),
        backend = state.store.backend_name(),
        "Checklist stored"
    );

    Ok(UploadResponse {
        url: checklist_url(&base_url(&state.config, headers), &id),
    })
}

async fn read_multipart(mut multipart: Multipart) -> Result<UploadParts> {
    let mut parts = UploadParts::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_payload(e.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("data") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::invalid_payload(e.body_text()))?;
                parts.data = Some(serde_json::Value::String(text));
            },
            Some("file") => {
                let file_name = field.file_name().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::invalid_payload(e.body_text()))?;
                parts.file = Some(UploadedFile {
                    name: file_name,
                    size: bytes.len(),
                });
            },
            _ => {},
        }
    }

    Ok(parts)
}

/// Resolves the base URL that upload links point at.
///
/// A configured public URL wins, then the request's `Host` header, then the
/// listen address.
pub(crate) fn base_url(config: &ServerConfig, headers: &HeaderMap) -> String {
    if let Some(url) = &config.public_url {
        return url.clone();
    }

    headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|host| !host.is_empty())
        .map_or_else(
            || format!("http://{}", config.addr),
            |host| format!("http://{host}"),
        )
}

/// Builds the link to an entry's checklist page.
pub fn checklist_url(base: &str, id: &EntryId) -> String {
    format!("{}{MOBILE_CHECK_PATH}?id={id}", base.trim_end_matches('/'))
}

// === Retrieval ===

pub(crate) async fn mobile_check(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
) -> Response {
    match render_entry(&state, &id_query(query)).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_response(&state, &e, ErrorFormat::Text),
    }
}

async fn render_entry(state: &AppState, query: &IdQuery) -> Result<String> {
    let id = parse_id(query)?;
    let entry = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| Error::not_found(id.to_string()))?;

    let payload = ChecklistPayload::from_stored(&entry.payload)?;
    let html = page::render_checklist(&payload, &state.config.report_email)?;

    // Only a page that rendered consumes the entry; a concurrent viewer that
    // lost the race sees it as gone.
    if state.config.consume_on_view && state.store.take(&id).await?.is_none() {
        return Err(Error::not_found(id.to_string()));
    }

    state.metrics.record_view();
    tracing::info!(
        id = %id,
        items = payload.len(),
        consumed = state.config.consume_on_view,
        "Checklist page rendered"
    );

    Ok(html)
}

pub(crate) async fn get_data(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
) -> Response {
    match take_entry(&state, &id_query(query)).await {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => error_response(&state, &e, ErrorFormat::Json),
    }
}

async fn take_entry(state: &AppState, query: &IdQuery) -> Result<serde_json::Value> {
    let id = parse_id(query)?;
    let entry = state
        .store
        .take(&id)
        .await?
        .ok_or_else(|| Error::not_found(id.to_string()))?;

    state.metrics.record_fetch();
    tracing::info!(id = %id, "Payload fetched and removed");

    Ok(entry.payload)
}

/// Unwraps the query string. A query that does not parse (a repeated `id`,
/// say) carries no usable identifier and falls through to not found.
fn id_query(query: std::result::Result<Query<IdQuery>, QueryRejection>) -> IdQuery {
    match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable id query");
            IdQuery::default()
        },
    }
}

/// Reads the identifier from the query. Anything that is not a valid
/// identifier cannot name an entry, so it is reported as not found.
fn parse_id(query: &IdQuery) -> Result<EntryId> {
    let raw = query.id.as_deref().unwrap_or_default();
    EntryId::parse(raw).ok_or_else(|| Error::not_found(raw))
}

// === Serverless-style store ===

pub(crate) async fn store_data(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match store_body(&state, &body).await {
        Ok(id) => Json(StoreDataResponse { id: id.to_string() }).into_response(),
        Err(e) => error_response(&state, &e, ErrorFormat::Json),
    }
}

async fn store_body(state: &AppState, body: &[u8]) -> Result<EntryId> {
    let payload: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| Error::invalid_payload(format!("body is not valid JSON: {e}")))?;
    let id = state.store.put(payload).await?;

    state.metrics.record_upload();
    tracing::info!(id = %id, backend = state.store.backend_name(), "Payload stored");

    Ok(id)
}

pub(crate) async fn method_not_allowed(State(state): State<Arc<AppState>>, method: Method) -> Response {
    let err = Error::MethodNotAllowed {
        method: method.to_string(),
    };
    error_response(&state, &err, ErrorFormat::Text)
}
