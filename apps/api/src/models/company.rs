use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Postal address stored as JSONB on the company row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub address_line_1: Option<String>,
    #[serde(default)]
    pub address_line_2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, alias = "postal_code")]
    pub postcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        [
            &self.address_line_1,
            &self.address_line_2,
            &self.city,
            &self.state,
            &self.postcode,
            &self.country,
        ]
        .iter()
        .all(|f| f.is_none())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyRow {
    pub id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub industries: Vec<String>,
    pub country: Option<String>,
    pub address: Option<Json<Address>>,
    pub principal_person: Option<String>,
    pub principal_designation: Option<String>,
    pub business_objectives: Option<String>,
    pub number_of_employees: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub scopes: Vec<String>,
    pub date_created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl CompanyRow {
    /// Joined single-line address, e.g. for the policy letterhead.
    pub fn address_line(&self) -> Option<String> {
        let address = self.address.as_ref()?;
        let parts: Vec<&str> = [
            address.address_line_1.as_deref(),
            address.address_line_2.as_deref(),
            address.city.as_deref(),
            address.state.as_deref(),
            address.postcode.as_deref(),
            address.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

pub async fn find_company(pool: &sqlx::PgPool, id: Uuid) -> Result<Option<CompanyRow>, sqlx::Error> {
    sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_company(pool: &sqlx::PgPool, company: &CompanyRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO companies
            (id, name, website, description, industries, country, address,
             principal_person, principal_designation, business_objectives,
             number_of_employees, contact_name, contact_email, scopes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(company.id)
    .bind(&company.name)
    .bind(&company.website)
    .bind(&company.description)
    .bind(&company.industries)
    .bind(&company.country)
    .bind(&company.address)
    .bind(&company.principal_person)
    .bind(&company.principal_designation)
    .bind(&company.business_objectives)
    .bind(&company.number_of_employees)
    .bind(&company.contact_name)
    .bind(&company.contact_email)
    .bind(&company.scopes)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postal_code_alias_accepted() {
        let address: Address = serde_json::from_value(serde_json::json!({
            "address_line_1": "Sheikh Zayed Road",
            "city": "Dubai",
            "postal_code": "00000",
            "country": "AE"
        }))
        .unwrap();
        assert_eq!(address.postcode.as_deref(), Some("00000"));
        assert!(!address.is_empty());
    }

    #[test]
    fn test_empty_address() {
        assert!(Address::default().is_empty());
    }

    #[test]
    fn test_address_line_skips_blank_parts() {
        let now = Utc::now();
        let company = CompanyRow {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            website: None,
            description: None,
            industries: vec![],
            country: Some("DE".into()),
            address: Some(Json(Address {
                address_line_1: Some("Hauptstr. 1".into()),
                address_line_2: Some("  ".into()),
                city: Some("Berlin".into()),
                postcode: Some("10115".into()),
                ..Default::default()
            })),
            principal_person: None,
            principal_designation: None,
            business_objectives: None,
            number_of_employees: None,
            contact_name: None,
            contact_email: None,
            scopes: vec![],
            date_created: now,
            last_updated: now,
        };
        assert_eq!(
            company.address_line().as_deref(),
            Some("Hauptstr. 1, Berlin, 10115")
        );
    }
}
