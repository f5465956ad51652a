//! First-time setup: schema, reference data and the vector index.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::classification::Classifier;
use crate::db::{drop_db, init_db};
use crate::models::industry::{insert_industries, IndustryRow};
use crate::models::scope::{upsert_scopes, ScopeRow};
use crate::nace::parser::{parse_nace_activities, validate_nace_activities};
use crate::public::service::invalidate_dependencies_cache;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub industries: u64,
    pub scopes: usize,
    pub chunks: usize,
}

/// Reads `industries.json`, a JSON array of industry names.
pub fn load_industries(path: &Path) -> Result<Vec<IndustryRow>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let names: Vec<String> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    let mut industries: Vec<IndustryRow> = names
        .iter()
        .map(|n| IndustryRow::from_name(n))
        .filter(|i| !i.id.is_empty())
        .collect();
    let mut seen = HashSet::new();
    industries.retain(|i| seen.insert(i.id.clone()));
    Ok(industries)
}

/// Scopes from `scopes.json`, or parsed from the NACE document when that
/// file is absent.
pub fn load_scopes(scopes_path: &Path, nace_document: &Path) -> Result<Vec<ScopeRow>> {
    if scopes_path.exists() {
        let raw = std::fs::read_to_string(scopes_path)
            .with_context(|| format!("reading {}", scopes_path.display()))?;
        return serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", scopes_path.display()));
    }

    warn!(
        "{} not found, parsing scopes from {}",
        scopes_path.display(),
        nace_document.display()
    );
    let text = std::fs::read_to_string(nace_document)
        .with_context(|| format!("reading {}", nace_document.display()))?;
    let scopes = parse_nace_activities(&text);
    let report = validate_nace_activities(&scopes);
    if !report.is_complete() {
        warn!("NACE document is incomplete: {}", report.summary());
    }
    Ok(scopes)
}

/// Drops and recreates the schema, then installs reference data and builds
/// the classifier's vector index. All existing data is lost.
pub async fn initialize_app(
    pool: &PgPool,
    redis: &redis::Client,
    classifier: &Classifier,
    data_dir: &Path,
    nace_document: &Path,
) -> Result<SeedReport> {
    drop_db(pool).await?;
    init_db(pool).await?;

    let industries = load_industries(&data_dir.join("industries.json"))?;
    let industries = insert_industries(pool, &industries).await?;
    info!("Seeded {industries} industries");

    let scopes = load_scopes(&data_dir.join("scopes.json"), nace_document)?;
    let scopes = upsert_scopes(pool, scopes).await?;
    info!("Seeded {scopes} scopes");

    if let Err(e) = invalidate_dependencies_cache(redis).await {
        warn!("Could not clear the dependencies cache: {e}");
    }

    let chunks = classifier
        .initialize(pool)
        .await
        .context("building the classifier index")?
        .len();
    info!("Classifier index ready with {chunks} chunks");

    Ok(SeedReport {
        industries,
        scopes,
        chunks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_industries_slugs_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("industries.json");
        std::fs::write(&path, r#"["Construction", "Construction", "Oil & Gas", "  "]"#).unwrap();
        let industries = load_industries(&path).unwrap();
        let ids: Vec<&str> = industries.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["construction", "oil_gas"]);
        assert_eq!(industries[1].name, "Oil & Gas");
    }

    #[test]
    fn test_bundled_industries_file_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/industries.json");
        let industries = load_industries(&path).unwrap();
        assert!(industries.len() > 20);
        assert!(industries.iter().any(|i| i.id == "construction"));
    }

    #[test]
    fn test_scopes_fall_back_to_nace_document() {
        let dir = tempfile::tempdir().unwrap();
        let nace = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/nace_excerpt.md");
        let scopes = load_scopes(&dir.path().join("scopes.json"), &nace).unwrap();
        assert_eq!(scopes.len(), 6);
        assert_eq!(scopes[0].class_code, "01.11");
    }

    #[test]
    fn test_scopes_json_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scopes.json");
        std::fs::write(
            &path,
            r#"[{
                "class_name": "Construction of residential and non-residential buildings",
                "class_code": "41.20",
                "group_name": "Construction of buildings",
                "group_code": "41.2",
                "division_name": "Construction of buildings",
                "division_code": "41",
                "section_name": "Section F",
                "section_code": "F"
            }]"#,
        )
        .unwrap();
        let scopes = load_scopes(&path, Path::new("/nonexistent.md")).unwrap();
        assert_eq!(scopes.len(), 1);
        assert_eq!(scopes[0].class_code, "41.20");
        assert!(scopes[0].included_activities.is_none());
    }
}
