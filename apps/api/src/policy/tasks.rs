//! Background generation of a quality policy document.

use std::path::Path;

use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::company::find_company;
use crate::models::document::{
    find_document, mark_document_completed, mark_document_failed, DocumentRow,
};
use crate::notify::Attachment;
use crate::policy::generator::generate_policy_template;
use crate::policy::storage::upload_pdf;
use crate::policy::templates::{EMAIL_POLICY, PRINT_POLICY};
use crate::state::AppState;

/// `file://` URL of the static directory, used by the PDF renderer to
/// resolve the stylesheet and images.
pub fn static_base_path(static_dir: &Path) -> String {
    let absolute = std::fs::canonicalize(static_dir).unwrap_or_else(|_| static_dir.to_path_buf());
    format!("file://{}", absolute.display())
}

/// Runs the whole generation for `document_id`. Failures are stored on the
/// document before being returned.
pub async fn generate_policy(state: &AppState, document_id: Uuid) -> Result<DocumentRow, AppError> {
    match run(state, document_id).await {
        Ok(document) => {
            info!("Policy document {document_id} completed");
            Ok(document)
        }
        Err(e) => {
            error!("Policy document {document_id} failed: {e}");
            if let Err(db_err) = mark_document_failed(&state.db, document_id, &e.to_string()).await {
                error!("Could not mark document {document_id} as failed: {db_err}");
            }
            Err(e)
        }
    }
}

async fn run(state: &AppState, document_id: Uuid) -> Result<DocumentRow, AppError> {
    let document = find_document(&state.db, document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {document_id} not found")))?;

    let company = find_company(&state.db, document.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {} not found", document.company_id)))?;

    let contact_email = company
        .contact_email
        .clone()
        .ok_or_else(|| AppError::Validation("Company contact email not found".to_string()))?;

    let filename = document
        .filename
        .clone()
        .unwrap_or_else(|| format!("doc-{}.pdf", document.id.simple()));

    let template = state
        .templates
        .source(PRINT_POLICY)
        .map_err(|e| AppError::Render(e.to_string()))?;
    let generated = generate_policy_template(&state.llm, &template).await?;

    let html = state
        .templates
        .render_source(
            "policy.html",
            &generated,
            json!({
                "company": &company,
                "document": &document,
                "base_path": static_base_path(&state.config.static_dir),
                "address_line": company.address_line(),
                "issued_on": document.date_created.format("%Y-%m-%d").to_string(),
            }),
        )
        .map_err(|e| AppError::Render(e.to_string()))?;

    let pdf = state
        .pdf_renderer
        .render(&html)
        .await
        .map_err(|e| AppError::Render(e.to_string()))?;
    info!("Rendered policy {filename} ({} bytes)", pdf.len());

    let download_url = upload_pdf(
        &state.s3,
        &state.config.s3_endpoint,
        &state.config.s3_bucket,
        &filename,
        pdf.clone(),
    )
    .await?;

    state
        .email
        .send(
            EMAIL_POLICY,
            &contact_email,
            &state.config.policy_email_subject,
            json!({
                "company": &company,
                "document": &document,
                "document_url": state.config.document_url(document.id),
            }),
            &[Attachment {
                filename: filename.clone(),
                content: pdf,
            }],
        )
        .await
        .map_err(|e| AppError::Email(e.to_string()))?;

    Ok(mark_document_completed(&state.db, document.id, &html, &download_url).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_base_path_is_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let base = static_base_path(dir.path());
        assert!(base.starts_with("file:///"));
        assert!(!base.ends_with('/'));
    }

    #[test]
    fn test_missing_static_dir_kept_as_given() {
        assert_eq!(
            static_base_path(Path::new("/nonexistent/static")),
            "file:///nonexistent/static"
        );
    }
}
