//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::{adapters::exporter_for, web::state::AppState};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use doc_studio_core::{
    domain::{Document, DocumentKind, Identity},
    editor::stored_export_payload,
    store::StoreStats,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        list_documents_handler,
        export_document_handler,
        clear_documents_handler,
        profile_handler,
    ),
    components(
        schemas(DocumentResponse, ProfileResponse, StatsResponse)
    ),
    tags(
        (name = "Document Studio API", description = "Stored documents, profile statistics and downloads.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A stored document, in the same shape the browser keeps locally.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    id: String,
    name: String,
    /// `summary` or `presentation`.
    #[serde(rename = "type")]
    kind: String,
    /// The file name or pasted text the document was generated from.
    content: String,
    result: String,
    created_at: DateTime<Utc>,
    user_id: String,
}

impl From<&Document> for DocumentResponse {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.to_string(),
            name: doc.name.clone(),
            kind: doc.kind.to_string(),
            content: doc.source.clone(),
            result: doc.result.clone(),
            created_at: doc.created_at,
            user_id: doc.owner_id.clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    total: usize,
    summaries: usize,
    presentations: usize,
    /// Storage usage shown on the profile page, capped at 100.
    usage_percent: f64,
}

impl From<StoreStats> for StatsResponse {
    fn from(stats: StoreStats) -> Self {
        Self {
            total: stats.total,
            summaries: stats.summaries,
            presentations: stats.presentations,
            usage_percent: stats.usage_percent,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    id: String,
    name: Option<String>,
    email: Option<String>,
    stats: StatsResponse,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListDocumentsQuery {
    /// Only return documents of this kind.
    #[param(value_type = Option<String>)]
    kind: Option<DocumentKind>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// `txt`, `docx` or `pptx`.
    format: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "The service is up"))
)]
pub async fn health_handler() -> &'static str {
    "OK"
}

/// List the caller's stored documents, oldest first.
#[utoipa::path(
    get,
    path = "/documents",
    params(
        ListDocumentsQuery,
        ("x-user-id" = String, Header, description = "The opaque key of the signed-in user.")
    ),
    responses(
        (status = 200, description = "The caller's documents", body = [DocumentResponse]),
        (status = 401, description = "Missing x-user-id header")
    )
)]
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<DocumentResponse>>, (StatusCode, String)> {
    let documents = app_state
        .stores
        .clone()
        .with_store_blocking(identity.id, move |store| {
            let documents: Vec<&Document> = match query.kind {
                Some(kind) => store.list_by_kind(kind),
                None => store.documents().iter().collect(),
            };
            documents
                .into_iter()
                .map(DocumentResponse::from)
                .collect::<Vec<_>>()
        })
        .await
        .map_err(storage_task_failed)?;
    Ok(Json(documents))
}

/// Download a stored document in the requested format.
#[utoipa::path(
    get,
    path = "/documents/{id}/export",
    params(
        ("id" = String, Path, description = "The document id."),
        ExportQuery,
        ("x-user-id" = String, Header, description = "The opaque key of the signed-in user.")
    ),
    responses(
        (status = 200, description = "The encoded file"),
        (status = 400, description = "Unsupported format"),
        (status = 404, description = "No such document for this user"),
        (status = 500, description = "The document could not be encoded")
    )
)]
pub async fn export_document_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let adapter = exporter_for(&query.format).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("Unsupported export format '{}'", query.format),
        )
    })?;

    let lookup = id.clone();
    let document = app_state
        .stores
        .clone()
        .with_store_blocking(identity.id, move |store| store.get(&lookup).cloned())
        .await
        .map_err(storage_task_failed)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Document {} not found", id)))?;

    let artifact = stored_export_payload(&document)
        .map_err(|e| e.to_string())
        .and_then(|payload| adapter.export(&payload).map_err(|e| e.to_string()))
        .map_err(|e| {
            error!(document = %id, "Failed to export stored document: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to export document".to_string(),
            )
        })?;

    info!(document = %id, format = adapter.format(), "Stored document exported.");
    Ok((
        [
            (header::CONTENT_TYPE, artifact.media_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.file_name),
            ),
        ],
        artifact.bytes,
    ))
}

/// Delete every stored document of the caller.
#[utoipa::path(
    delete,
    path = "/documents",
    params(("x-user-id" = String, Header, description = "The opaque key of the signed-in user.")),
    responses(
        (status = 204, description = "All documents deleted"),
        (status = 500, description = "Storage could not be cleared")
    )
)]
pub async fn clear_documents_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<StatusCode, (StatusCode, String)> {
    let fault = app_state
        .stores
        .clone()
        .with_store_blocking(identity.id.clone(), |store| {
            store.clear();
            store.take_fault()
        })
        .await
        .map_err(storage_task_failed)?;
    match fault {
        None => Ok(StatusCode::NO_CONTENT),
        Some(fault) => {
            warn!(owner = %identity.id, "Failed to clear documents: {}", fault);
            Err((StatusCode::INTERNAL_SERVER_ERROR, fault.to_string()))
        }
    }
}

/// The caller's identity and document statistics.
#[utoipa::path(
    get,
    path = "/profile",
    params(
        ("x-user-id" = String, Header, description = "The opaque key of the signed-in user."),
        ("x-user-name" = Option<String>, Header, description = "Display name."),
        ("x-user-email" = Option<String>, Header, description = "Email address.")
    ),
    responses(
        (status = 200, description = "Profile and statistics", body = ProfileResponse),
        (status = 500, description = "Storage could not be read")
    )
)]
pub async fn profile_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let stats = app_state
        .stores
        .clone()
        .with_store_blocking(identity.id.clone(), |store| store.stats())
        .await
        .map_err(storage_task_failed)?;
    Ok(Json(ProfileResponse {
        id: identity.id,
        name: identity.name,
        email: identity.email,
        stats: stats.into(),
    }))
}

fn storage_task_failed(e: tokio::task::JoinError) -> (StatusCode, String) {
    error!("Document storage task failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Document storage is unavailable".to_string(),
    )
}
