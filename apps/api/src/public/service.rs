//! Business logic behind the `/public` routes.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{ActionStatus, AppError};
use crate::models::company::{find_company, insert_company, CompanyRow};
use crate::models::document::{
    insert_document, DocumentRow, DocumentSource, DocumentStatus, PDF_MIME_TYPE,
};
use crate::models::industry::list_industries;
use crate::models::scope::list_scopes;
use crate::policy::queue;
use crate::policy::storage::upload_pdf;
use crate::public::schemas::{CompanyRequest, CrawlRequest, DependencyResponse};
use crate::state::AppState;

pub const DEPENDENCIES_CACHE_KEY: &str = "public:dependencies";

/// Characters used for document short ids; no look-alikes (0/O, 1/l/I).
pub const SHORT_ID_ALPHABET: &str = "23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const SHORT_ID_LENGTH: usize = 12;

/// 12-character id for file names, drawn from a random UUID.
pub fn short_id() -> String {
    short_id_from(Uuid::new_v4().as_u128())
}

pub fn short_id_from(mut value: u128) -> String {
    let alphabet = SHORT_ID_ALPHABET.as_bytes();
    let base = alphabet.len() as u128;
    (0..SHORT_ID_LENGTH)
        .map(|_| {
            let c = alphabet[(value % base) as usize] as char;
            value /= base;
            c
        })
        .collect()
}

pub fn policy_document_name(company_name: &str, created: DateTime<Utc>) -> String {
    format!(
        "Quality Policy - {company_name} - {}.pdf",
        created.format("%Y-%m-%d %H-%M-%S")
    )
}

async fn cached_dependencies(state: &AppState) -> redis::RedisResult<Option<String>> {
    let mut conn = state.redis.get_multiplexed_async_connection().await?;
    redis::cmd("GET")
        .arg(DEPENDENCIES_CACHE_KEY)
        .query_async(&mut conn)
        .await
}

async fn cache_dependencies(state: &AppState, json: &str) -> redis::RedisResult<()> {
    let mut conn = state.redis.get_multiplexed_async_connection().await?;
    redis::cmd("SET")
        .arg(DEPENDENCIES_CACHE_KEY)
        .arg(json)
        .arg("EX")
        .arg(state.config.dependencies_cache_ttl_secs)
        .query_async::<_, ()>(&mut conn)
        .await
}

/// Removes the cached dependencies so the next read goes to the database.
pub async fn invalidate_dependencies_cache(redis: &redis::Client) -> redis::RedisResult<()> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    redis::cmd("DEL")
        .arg(DEPENDENCIES_CACHE_KEY)
        .query_async::<_, ()>(&mut conn)
        .await
}

/// Returns the cached value, or runs `load` on a miss or a cache error. The
/// flag is `true` when the value came from `load` and should be cached.
async fn read_through<F, Fut>(
    cached: redis::RedisResult<Option<String>>,
    load: F,
) -> Result<(String, bool), AppError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<String, AppError>>,
{
    match cached {
        Ok(Some(json)) => return Ok((json, false)),
        Ok(None) => {}
        Err(e) => warn!("Dependencies cache unavailable: {e}"),
    }
    Ok((load().await?, true))
}

async fn load_dependencies(state: &AppState) -> Result<String, AppError> {
    let industries = list_industries(&state.db).await?;
    let scopes = list_scopes(&state.db).await?;
    serde_json::to_string(&DependencyResponse::new(industries, scopes))
        .map_err(|e| AppError::Internal(e.into()))
}

/// Countries, industries and scopes as a JSON document, served from Redis
/// when cached.
pub async fn fetch_dependencies(state: &AppState) -> Result<String, AppError> {
    let (json, loaded) = read_through(cached_dependencies(state).await, || {
        load_dependencies(state)
    })
    .await?;
    if loaded {
        if let Err(e) = cache_dependencies(state, &json).await {
            warn!("Could not cache dependencies: {e}");
        }
    }
    Ok(json)
}

/// Error payload echoing the request; `Null` if it cannot be serialized.
fn request_payload<T: Serialize>(request: &T) -> serde_json::Value {
    serde_json::to_value(request).unwrap_or_else(|e| {
        warn!("Could not serialize request for the error payload: {e}");
        serde_json::Value::Null
    })
}

pub async fn crawl(state: &AppState, request: CrawlRequest) -> Result<CompanyRequest, AppError> {
    let url = request.normalized_website()?;
    state.classifier.crawl(&state.db, &url).await.map_err(|e| {
        warn!("Crawl of {url} failed: {e}");
        AppError::Action(
            StatusCode::BAD_REQUEST,
            ActionStatus::failed(
                "WEBSITE_CRAWL_ERROR",
                format!("Could not extract company details from {url}"),
                request_payload(&request),
            ),
        )
    })
}

pub async fn classify(state: &AppState, company: CompanyRequest) -> Result<CompanyRequest, AppError> {
    let company = company.validated()?;
    company.require_classification_input()?;
    state
        .classifier
        .classify(&state.db, company.clone())
        .await
        .map_err(|e| {
            AppError::Action(
                StatusCode::BAD_GATEWAY,
                ActionStatus::error(
                    "CLASSIFICATION_ERROR",
                    format!("Classification failed: {e}"),
                    request_payload(&company),
                ),
            )
        })
}

fn company_row(company: CompanyRequest, now: DateTime<Utc>) -> CompanyRow {
    CompanyRow {
        id: Uuid::new_v4(),
        name: company.name.unwrap_or_default(),
        website: company.website,
        description: company.description,
        industries: company.industries.unwrap_or_default(),
        country: company.country,
        address: company.address.map(Json),
        principal_person: company.principal_person,
        principal_designation: company.principal_designation,
        business_objectives: company.objectives,
        number_of_employees: company.number_of_employees,
        contact_name: company.contact_name,
        contact_email: company.contact_email,
        scopes: company.scopes.unwrap_or_default(),
        date_created: now,
        last_updated: now,
    }
}

/// Persists the company and a pending document, then queues generation.
pub async fn create_policy(state: &AppState, company: CompanyRequest) -> Result<DocumentRow, AppError> {
    let company = company.validated()?;
    company.require_policy_input()?;

    let now = Utc::now();
    let company = company_row(company, now);
    insert_company(&state.db, &company).await?;

    let document = DocumentRow {
        id: Uuid::new_v4(),
        name: policy_document_name(&company.name, now),
        description: Some(format!("ISO compliant policy document for {}", company.name)),
        mime_type: Some(PDF_MIME_TYPE.to_string()),
        source: Some(DocumentSource::Generated.as_str().to_string()),
        content: None,
        filename: Some(format!("doc-{}.pdf", short_id())),
        status: Some(DocumentStatus::Pending.as_str().to_string()),
        error_message: None,
        company_id: company.id,
        download_url: None,
        date_created: now,
        last_updated: now,
    };
    insert_document(&state.db, &document).await?;
    info!("Created policy document {} for company {}", document.id, company.id);

    queue::submit(state, document.id).await;
    Ok(document)
}

/// A PDF received from a client.
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Accepts `application/pdf`, or a `.pdf` name when no type was sent,
    /// and checks the `%PDF` signature.
    pub fn check_pdf(&self) -> Result<(), AppError> {
        if self.bytes.is_empty() {
            return Err(AppError::Validation("The uploaded file is empty".to_string()));
        }
        let declared_pdf = match self.content_type.as_deref() {
            Some(mime) => mime.eq_ignore_ascii_case(PDF_MIME_TYPE),
            None => self
                .file_name
                .as_deref()
                .is_some_and(|n| n.to_ascii_lowercase().ends_with(".pdf")),
        };
        if !declared_pdf || !self.bytes.starts_with(b"%PDF") {
            return Err(AppError::Validation("Only PDF files are accepted".to_string()));
        }
        Ok(())
    }
}

/// Stores an uploaded PDF and its extracted text as a completed document.
pub async fn upload_document(
    state: &AppState,
    company_id: Uuid,
    file: UploadedFile,
) -> Result<DocumentRow, AppError> {
    let company = find_company(&state.db, company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {company_id} not found")))?;
    file.check_pdf()?;

    let bytes = file.bytes;
    let (text, bytes) = tokio::task::spawn_blocking(move || {
        let text = pdf_extract::extract_text_from_mem(&bytes);
        (text, bytes)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?;
    let text = text.map_err(|e| AppError::Validation(format!("The PDF could not be read: {e}")))?;

    let filename = format!("doc-{}.pdf", short_id());
    let download_url = upload_pdf(
        &state.s3,
        &state.config.s3_endpoint,
        &state.config.s3_bucket,
        &filename,
        bytes,
    )
    .await?;

    let now = Utc::now();
    let document = DocumentRow {
        id: Uuid::new_v4(),
        name: file.file_name.unwrap_or_else(|| filename.clone()),
        description: Some(format!("Document uploaded for {}", company.name)),
        mime_type: Some(PDF_MIME_TYPE.to_string()),
        source: Some(DocumentSource::Uploaded.as_str().to_string()),
        content: Some(text),
        filename: Some(filename),
        status: Some(DocumentStatus::Completed.as_str().to_string()),
        error_message: None,
        company_id,
        download_url: Some(download_url),
        date_created: now,
        last_updated: now,
    };
    insert_document(&state.db, &document).await?;
    info!("Stored uploaded document {} for company {company_id}", document.id);
    Ok(document)
}
