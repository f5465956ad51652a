use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::company::find_company;
use crate::models::document::{find_document, list_company_documents};
use crate::public::schemas::{CompanyRequest, CrawlRequest, DocumentResponse};
use crate::public::service::{self, UploadedFile};
use crate::state::AppState;

/// GET /public/dependencies
pub async fn handle_dependencies(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let json = service::fetch_dependencies(&state).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], json))
}

/// POST /public/crawl
pub async fn handle_crawl(
    State(state): State<AppState>,
    Json(req): Json<CrawlRequest>,
) -> Result<(StatusCode, Json<CompanyRequest>), AppError> {
    let company = service::crawl(&state, req).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// POST /public/classify
pub async fn handle_classify(
    State(state): State<AppState>,
    Json(req): Json<CompanyRequest>,
) -> Result<(StatusCode, Json<CompanyRequest>), AppError> {
    let company = service::classify(&state, req).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// POST /public/policy
/// Returns the pending document; poll GET /public/documents/:id for completion.
pub async fn handle_create_policy(
    State(state): State<AppState>,
    Json(req): Json<CompanyRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    let document = service::create_policy(&state, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse::from_row(document, &state.config)),
    ))
}

/// GET /public/documents/:id
pub async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = find_document(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))?;
    Ok(Json(DocumentResponse::from_row(document, &state.config)))
}

/// GET /public/companies/:id/documents
pub async fn handle_list_documents(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    if find_company(&state.db, company_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Company {company_id} not found")));
    }
    let documents = list_company_documents(&state.db, company_id).await?;
    Ok(Json(
        documents
            .into_iter()
            .map(|d| DocumentResponse::from_row(d, &state.config))
            .collect(),
    ))
}

/// Body-limit failures become 413; anything else is a malformed request.
fn multipart_error(error: MultipartError, limit: usize, context: &str) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Uploads are limited to {limit} bytes"))
    } else {
        AppError::Validation(format!("{context}: {error}"))
    }
}

/// POST /public/companies/:id/documents
/// Multipart body with a single `file` field holding a PDF.
pub async fn handle_upload_document(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    let limit = state.config.max_upload_bytes;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit, "Invalid multipart body"))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, limit, "Could not read the uploaded file"))?;
        upload = Some(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }
    let file = upload.ok_or_else(|| AppError::Validation("A `file` field is required".to_string()))?;

    let document = service::upload_document(&state, company_id, file).await?;
    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse::from_row(document, &state.config)),
    ))
}
