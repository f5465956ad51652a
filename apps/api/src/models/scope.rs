use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// An included or excluded activity listed under a NACE class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NaceActivity {
    pub activity: String,
    #[serde(default)]
    pub subactivities: Vec<String>,
}

/// A NACE Rev. 2 class together with its group, division and section.
///
/// `id` always equals `class_code`; [`ScopeRow::normalized`] enforces it
/// before every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ScopeRow {
    #[serde(default)]
    pub id: String,

    pub class_name: String,
    pub class_code: String,
    #[serde(default)]
    pub class_description: Option<String>,

    pub group_name: String,
    pub group_code: String,
    #[serde(default)]
    pub group_description: Option<String>,

    pub division_name: String,
    pub division_code: String,
    #[serde(default)]
    pub division_description: Option<String>,

    pub section_name: String,
    pub section_code: String,
    #[serde(default)]
    pub section_description: Option<String>,

    #[serde(default)]
    pub included_activities: Option<Json<Vec<NaceActivity>>>,
    #[serde(default)]
    pub excluded_activities: Option<Json<Vec<NaceActivity>>>,
}

impl ScopeRow {
    /// Trims every text field and derives `id` from `class_code`.
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.class_name,
            &mut self.class_code,
            &mut self.group_name,
            &mut self.group_code,
            &mut self.division_name,
            &mut self.division_code,
            &mut self.section_name,
            &mut self.section_code,
        ] {
            *field = field.trim().to_string();
        }
        for field in [
            &mut self.class_description,
            &mut self.group_description,
            &mut self.division_description,
            &mut self.section_description,
        ] {
            *field = field
                .take()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty());
        }
        self.id = self.class_code.clone();
        self
    }
}

const SCOPE_COLUMNS: &str = "id, class_name, class_code, class_description, \
    group_name, group_code, group_description, \
    division_name, division_code, division_description, \
    section_name, section_code, section_description, \
    included_activities, excluded_activities";

pub async fn list_scopes(pool: &sqlx::PgPool) -> Result<Vec<ScopeRow>, sqlx::Error> {
    sqlx::query_as::<_, ScopeRow>(&format!(
        "SELECT {SCOPE_COLUMNS} FROM scopes ORDER BY class_code"
    ))
    .fetch_all(pool)
    .await
}

/// Returns the subset of `codes` that exist in the scope table.
pub async fn existing_scope_codes(
    pool: &sqlx::PgPool,
    codes: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM scopes WHERE id = ANY($1)")
        .bind(codes)
        .fetch_all(pool)
        .await
}

pub async fn count_scopes(pool: &sqlx::PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM scopes")
        .fetch_one(pool)
        .await
}

/// Inserts or refreshes scopes in a single transaction.
pub async fn upsert_scopes(pool: &sqlx::PgPool, scopes: Vec<ScopeRow>) -> Result<usize, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let count = scopes.len();
    for scope in scopes.into_iter().map(ScopeRow::normalized) {
        sqlx::query(
            r#"
            INSERT INTO scopes
                (id, class_name, class_code, class_description,
                 group_name, group_code, group_description,
                 division_name, division_code, division_description,
                 section_name, section_code, section_description,
                 included_activities, excluded_activities)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO UPDATE SET
                class_name = EXCLUDED.class_name,
                class_description = EXCLUDED.class_description,
                group_name = EXCLUDED.group_name,
                group_code = EXCLUDED.group_code,
                group_description = EXCLUDED.group_description,
                division_name = EXCLUDED.division_name,
                division_code = EXCLUDED.division_code,
                division_description = EXCLUDED.division_description,
                section_name = EXCLUDED.section_name,
                section_code = EXCLUDED.section_code,
                section_description = EXCLUDED.section_description,
                included_activities = EXCLUDED.included_activities,
                excluded_activities = EXCLUDED.excluded_activities,
                last_updated = now()
            "#,
        )
        .bind(&scope.id)
        .bind(&scope.class_name)
        .bind(&scope.class_code)
        .bind(&scope.class_description)
        .bind(&scope.group_name)
        .bind(&scope.group_code)
        .bind(&scope.group_description)
        .bind(&scope.division_name)
        .bind(&scope.division_code)
        .bind(&scope.division_description)
        .bind(&scope.section_name)
        .bind(&scope.section_code)
        .bind(&scope.section_description)
        .bind(&scope.included_activities)
        .bind(&scope.excluded_activities)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(count)
}
