use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::document::{find_document, DocumentRow, PDF_MIME_TYPE};
use crate::policy::storage::download_pdf;
use crate::state::AppState;

/// Filename for `Content-Disposition`, without quotes or path separators.
fn attachment_name(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| !matches!(c, '"' | '\\' | '/' | '\r' | '\n'))
        .collect()
}

/// File name of a completed document; anything else is a 409.
fn downloadable_file(document: DocumentRow) -> Result<String, AppError> {
    if !document.is_completed() {
        return Err(AppError::Conflict(format!(
            "Document {} is {}",
            document.id,
            document.status.as_deref().unwrap_or("not ready")
        )));
    }
    document
        .filename
        .ok_or_else(|| AppError::Conflict(format!("Document {} has no file", document.id)))
}

/// GET /downloads/documents/:id
pub async fn handle_download_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = find_document(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))?;

    let filename = downloadable_file(document)?;
    let bytes = download_pdf(&state.s3, &state.config.s3_bucket, &filename).await?;
    Ok((
        [
            (header::CONTENT_TYPE, PDF_MIME_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", attachment_name(&filename)),
            ),
        ],
        bytes,
    ))
}
