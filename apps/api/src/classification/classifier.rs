//! NACE classifier: website extraction and retrieval-augmented classification.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::classification::crawler::WebsiteCrawler;
use crate::classification::prompts::{
    classify_question, context_prompt, crawl_prompt, CLASSIFIER_SYSTEM,
};
use crate::classification::splitter::MarkdownTextSplitter;
use crate::classification::vector_store::{
    self, VectorIndex, VectorStoreError, DEFAULT_COLLECTION,
};
use crate::llm_client::embeddings::EmbeddingClient;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::industry::list_industries;
use crate::models::scope::{count_scopes, existing_scope_codes};
use crate::public::schemas::CompanyRequest;

/// Chunks retrieved as context for a classification.
pub const RETRIEVAL_K: usize = 5;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Could not read NACE document {path}: {source}")]
    Document {
        path: String,
        source: std::io::Error,
    },

    #[error("NACE document {0} produced no chunks")]
    EmptyDocument(String),

    #[error("Unexpected classification output: {0}")]
    UnexpectedOutput(String),
}

pub struct Classifier {
    llm: LlmClient,
    embeddings: EmbeddingClient,
    crawler: WebsiteCrawler,
    document_path: PathBuf,
    collection: String,
    index: OnceCell<VectorIndex>,
}

impl Classifier {
    pub fn new(llm: LlmClient, embeddings: EmbeddingClient, document_path: PathBuf) -> Self {
        Self {
            llm,
            embeddings,
            crawler: WebsiteCrawler::new(),
            document_path,
            collection: DEFAULT_COLLECTION.to_string(),
            index: OnceCell::new(),
        }
    }

    /// Loads the vector index, building and storing it first when the
    /// collection is empty. Runs at most once per process.
    pub async fn initialize(&self, pool: &PgPool) -> Result<&VectorIndex, ClassifierError> {
        self.index
            .get_or_try_init(|| async {
                if !vector_store::collection_exists(pool, &self.collection).await? {
                    self.build_collection(pool).await?;
                }
                Ok::<_, ClassifierError>(VectorIndex::load(pool, &self.collection).await?)
            })
            .await
    }

    async fn build_collection(&self, pool: &PgPool) -> Result<(), ClassifierError> {
        let path = self.document_path.display().to_string();
        info!("Building vector collection '{}' from {path}", self.collection);

        let text = tokio::fs::read_to_string(&self.document_path)
            .await
            .map_err(|source| ClassifierError::Document {
                path: path.clone(),
                source,
            })?;

        let chunks = MarkdownTextSplitter::default().split_text(&text);
        if chunks.is_empty() {
            return Err(ClassifierError::EmptyDocument(path));
        }

        let embeddings = self.embeddings.embed_documents(&chunks).await?;
        vector_store::add_chunks(pool, &self.collection, &chunks, &embeddings).await?;
        Ok(())
    }

    /// Extracts a company profile from its website.
    pub async fn crawl(&self, pool: &PgPool, url: &str) -> Result<CompanyRequest, ClassifierError> {
        let industries: Vec<String> = list_industries(pool)
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();
        let page_text = self.crawler.fetch_text(url).await;
        if page_text.is_none() {
            warn!("Crawling {url} without page text");
        }

        let prompt = crawl_prompt(url, page_text.as_deref(), &industries);
        let extracted: Value = self.llm.call_json(&prompt, CLASSIFIER_SYSTEM).await?;
        Ok(CompanyRequest::from_extracted(&extracted, url))
    }

    /// Returns `company` with `scopes` set to the matching NACE class codes.
    pub async fn classify(
        &self,
        pool: &PgPool,
        mut company: CompanyRequest,
    ) -> Result<CompanyRequest, ClassifierError> {
        let index = self.initialize(pool).await?;

        let question = classify_question(
            company.name.as_deref().unwrap_or_default(),
            company.description.as_deref().unwrap_or_default(),
            company.industries.as_deref().unwrap_or_default(),
        );
        let query = self.embeddings.embed_query(&question).await?;
        let context = index
            .similarity_search(&query, RETRIEVAL_K)
            .into_iter()
            .map(|c| c.content)
            .collect::<Vec<_>>()
            .join("\n");

        let answer: Value = self
            .llm
            .call_json(&context_prompt(&context, &question), CLASSIFIER_SYSTEM)
            .await?;
        let codes = normalize_codes(&answer)
            .ok_or_else(|| ClassifierError::UnexpectedOutput(answer.to_string()))?;

        company.scopes = Some(self.known_codes(pool, codes).await?);
        Ok(company)
    }

    /// Keeps codes present in the scope table, unless the table is not seeded.
    async fn known_codes(&self, pool: &PgPool, codes: Vec<String>) -> Result<Vec<String>, sqlx::Error> {
        if codes.is_empty() || count_scopes(pool).await? == 0 {
            return Ok(filter_known_codes(codes, None));
        }
        let known: HashSet<String> = existing_scope_codes(pool, &codes)
            .await?
            .into_iter()
            .collect();
        Ok(filter_known_codes(codes, Some(&known)))
    }
}

/// Drops codes missing from `known`, keeping order. `None` means there is no
/// scope table to check against and every code is kept.
pub fn filter_known_codes(codes: Vec<String>, known: Option<&HashSet<String>>) -> Vec<String> {
    let Some(known) = known else {
        return codes;
    };
    let total = codes.len();
    let kept: Vec<String> = codes.into_iter().filter(|c| known.contains(c)).collect();
    if kept.len() < total {
        warn!(
            "Dropped {} classification codes unknown to the scope table",
            total - kept.len()
        );
    }
    kept
}

fn class_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z]?\s*([0-9]{2})\.?([0-9]{2})$").expect("valid regex"))
}

/// Normalises one code to `XX.XX`; group or division codes are rejected.
pub fn normalize_code(raw: &str) -> Option<String> {
    let caps = class_code_pattern().captures(raw.trim())?;
    Some(format!("{}.{}", &caps[1], &caps[2]))
}

/// Reads class codes out of the model's answer: an array of strings or of
/// `{"code": ..}` objects, or an object wrapping such an array. Order is
/// kept and duplicates removed. `None` when the shape is not recognised.
pub fn normalize_codes(answer: &Value) -> Option<Vec<String>> {
    let items = match answer {
        Value::Array(items) => items,
        Value::Object(map) => ["codes", "scopes", "classifications"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))?,
        _ => return None,
    };

    let mut seen = HashSet::new();
    let codes = items
        .iter()
        .filter_map(|item| match item {
            Value::String(code) => Some(code.as_str()),
            Value::Object(obj) => obj.get("code").and_then(Value::as_str),
            _ => None,
        })
        .filter_map(normalize_code)
        .filter(|code| seen.insert(code.clone()))
        .collect();
    Some(codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_code_variants() {
        assert_eq!(normalize_code("41.20").as_deref(), Some("41.20"));
        assert_eq!(normalize_code(" 4120 ").as_deref(), Some("41.20"));
        assert_eq!(normalize_code("F41.20").as_deref(), Some("41.20"));
        assert_eq!(normalize_code("41.2"), None);
        assert_eq!(normalize_code("41"), None);
        assert_eq!(normalize_code("XX.XX"), None);
        assert_eq!(normalize_code("४१.२०"), None);
    }

    #[test]
    fn test_normalize_codes_accepts_strings_and_objects() {
        let answer = json!(["41.20", {"code": "42.11", "name": "Roads"}, "41.20", 7, "bogus"]);
        assert_eq!(
            normalize_codes(&answer).unwrap(),
            vec!["41.20".to_string(), "42.11".to_string()]
        );
    }

    #[test]
    fn test_normalize_codes_unwraps_object() {
        let answer = json!({"codes": ["43.21", "43.22"]});
        assert_eq!(normalize_codes(&answer).unwrap(), vec!["43.21", "43.22"]);
    }

    #[test]
    fn test_unknown_codes_are_dropped() {
        let known: HashSet<String> = ["41.20", "43.21"].iter().map(|c| c.to_string()).collect();
        let codes = vec!["43.21".to_string(), "99.99".to_string(), "41.20".to_string()];
        assert_eq!(
            filter_known_codes(codes.clone(), Some(&known)),
            vec!["43.21".to_string(), "41.20".to_string()]
        );
        assert!(filter_known_codes(vec!["99.99".to_string()], Some(&known)).is_empty());
    }

    #[test]
    fn test_codes_kept_without_scope_table() {
        let codes = vec!["99.99".to_string(), "41.20".to_string()];
        assert_eq!(filter_known_codes(codes.clone(), None), codes);
    }

    #[test]
    fn test_normalize_codes_rejects_unknown_shape() {
        assert!(normalize_codes(&json!("41.20")).is_none());
        assert!(normalize_codes(&json!({"answer": "41.20"})).is_none());
    }

    #[test]
    fn test_classify_question_lists_industries() {
        let question = classify_question(
            "ALEC",
            "Builds airports",
            &["construction".to_string(), "real_estate".to_string()],
        );
        assert!(question.contains("Business Name: ALEC"));
        assert!(question.contains("Business Industries: construction, real_estate"));
        let prompt = context_prompt("chunk one\nchunk two", &question);
        assert!(prompt.starts_with("Context:\nchunk one\nchunk two"));
        assert!(prompt.contains("Question:\nGiven the following business information"));
    }

    #[test]
    fn test_crawl_prompt_without_page_text() {
        let prompt = crawl_prompt("https://alec.ae", None, &["construction".to_string()]);
        assert!(prompt.contains("The company URL is: https://alec.ae"));
        assert!(prompt.contains("could not be fetched"));
        assert!(prompt.contains("\nconstruction\n"));
    }
}
