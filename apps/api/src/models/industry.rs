use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct IndustryRow {
    pub id: String,
    pub name: String,
}

impl IndustryRow {
    pub fn from_name(name: &str) -> Self {
        Self {
            id: slugify(name, '_'),
            name: name.trim().to_string(),
        }
    }
}

/// Lowercase ASCII slug: runs of non-alphanumeric characters collapse into
/// one `separator`, which never leads or trails. Non-ASCII letters are dropped.
pub fn slugify(input: &str, separator: char) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push(separator);
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '\'' {
            // "Children's" -> "childrens"
        } else {
            pending_separator = true;
        }
    }
    slug
}

pub async fn list_industries(pool: &sqlx::PgPool) -> Result<Vec<IndustryRow>, sqlx::Error> {
    sqlx::query_as::<_, IndustryRow>("SELECT id, name FROM industries ORDER BY name")
        .fetch_all(pool)
        .await
}

/// Inserts industries, skipping ids that already exist. Returns the number
/// of new rows.
pub async fn insert_industries(
    pool: &sqlx::PgPool,
    industries: &[IndustryRow],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;
    for industry in industries {
        inserted += sqlx::query(
            "INSERT INTO industries (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
        )
        .bind(&industry.id)
        .bind(&industry.name)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }
    tx.commit().await?;
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_punctuation() {
        assert_eq!(slugify("Arts & Entertainment", '_'), "arts_entertainment");
        assert_eq!(slugify("  Oil/Gas -- Energy ", '_'), "oil_gas_energy");
        assert_eq!(slugify("IT Services", '-'), "it-services");
    }

    #[test]
    fn test_slugify_drops_apostrophes() {
        assert_eq!(slugify("Children's Products", '_'), "childrens_products");
    }

    #[test]
    fn test_industry_from_name() {
        let row = IndustryRow::from_name(" Construction ");
        assert_eq!(row.id, "construction");
        assert_eq!(row.name, "Construction");
    }
}
