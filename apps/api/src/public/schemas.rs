use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::classification::crawler::normalize_website;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::company::Address;
use crate::models::document::DocumentRow;
use crate::models::industry::IndustryRow;
use crate::models::scope::ScopeRow;
use crate::public::countries::{find_country, Country, COUNTRIES};

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
            .expect("valid regex")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && email_pattern().is_match(email)
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_list(values: Option<Vec<String>>) -> Option<Vec<String>> {
    values.map(|list| {
        list.into_iter()
            .filter_map(|v| clean(Some(v)))
            .collect()
    })
}

fn clean_address(address: Option<Address>) -> Option<Address> {
    let address = address?;
    let address = Address {
        address_line_1: clean(address.address_line_1),
        address_line_2: clean(address.address_line_2),
        city: clean(address.city),
        state: clean(address.state),
        postcode: clean(address.postcode),
        country: clean(address.country).map(|c| c.to_ascii_uppercase()),
    };
    (!address.is_empty()).then_some(address)
}

/// First non-null value among `names`.
fn field<'a>(object: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| object.get(name))
        .find(|v| !v.is_null())
}

/// A string, or a number written out as one.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// An array of strings, or a single comma separated string.
fn text_list(value: Option<&Value>) -> Option<Vec<String>> {
    match value? {
        Value::Array(items) => Some(items.iter().filter_map(|v| text(Some(v))).collect()),
        Value::String(s) => Some(s.split(',').map(str::to_string).collect()),
        _ => None,
    }
}

fn lenient_address(value: Option<&Value>) -> Option<Address> {
    match value? {
        Value::String(line) => Some(Address {
            address_line_1: Some(line.clone()),
            ..Default::default()
        }),
        object @ Value::Object(_) => Some(Address {
            address_line_1: text(field(object, &["address_line_1", "street"])),
            address_line_2: text(field(object, &["address_line_2"])),
            city: text(field(object, &["city"])),
            state: text(field(object, &["state", "region"])),
            postcode: text(field(object, &["postcode", "postal_code", "zip"])),
            country: text(field(object, &["country"])),
        }),
        _ => None,
    }
}

/// Reference data for client forms.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyResponse {
    pub countries: Vec<Country>,
    pub industries: Vec<IndustryRow>,
    pub scopes: Vec<ScopeRow>,
}

impl DependencyResponse {
    pub fn new(industries: Vec<IndustryRow>, scopes: Vec<ScopeRow>) -> Self {
        Self {
            countries: COUNTRIES.to_vec(),
            industries,
            scopes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub website: String,
}

impl CrawlRequest {
    /// The website with an `https://` scheme added when missing.
    pub fn normalized_website(&self) -> Result<String, AppError> {
        normalize_website(&self.website).map_err(AppError::Validation)
    }
}

/// Company profile as exchanged with clients: crawl output, classify input
/// and output, and policy request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyRequest {
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub industries: Option<Vec<String>>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub principal_person: Option<String>,
    #[serde(default)]
    pub principal_designation: Option<String>,
    #[serde(default, alias = "business_objectives")]
    pub objectives: Option<String>,
    #[serde(default)]
    pub number_of_employees: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    #[serde(default)]
    pub country: Option<String>,
}

impl CompanyRequest {
    /// Trims every field and turns empty strings into `None`.
    pub fn cleaned(self) -> Self {
        Self {
            website: clean(self.website),
            name: clean(self.name),
            description: clean(self.description),
            industries: clean_list(self.industries),
            address: clean_address(self.address),
            principal_person: clean(self.principal_person),
            principal_designation: clean(self.principal_designation),
            objectives: clean(self.objectives),
            number_of_employees: clean(self.number_of_employees),
            contact_name: clean(self.contact_name),
            contact_email: clean(self.contact_email),
            scopes: clean_list(self.scopes),
            country: clean(self.country).map(|c| c.to_ascii_uppercase()),
        }
    }

    /// Cleans the request and rejects malformed website, country or email.
    pub fn validated(self) -> Result<Self, AppError> {
        let mut company = self.cleaned();
        if let Some(website) = company.website.take() {
            company.website = Some(normalize_website(&website).map_err(AppError::Validation)?);
        }
        if let Some(country) = &company.country {
            if find_country(country).is_none() {
                return Err(AppError::Validation(format!(
                    "'{country}' is not an ISO 3166-1 alpha-2 country code"
                )));
            }
        }
        if let Some(email) = &company.contact_email {
            if !is_valid_email(email) {
                return Err(AppError::Validation(format!(
                    "'{email}' is not a valid email address"
                )));
            }
        }
        Ok(company)
    }

    /// Builds a profile from LLM output. Numbers are accepted where text is
    /// expected, invalid values are dropped instead of rejected, and the
    /// website falls back to the crawled URL.
    pub fn from_extracted(extracted: &Value, crawled_url: &str) -> Self {
        let mut company = CompanyRequest {
            website: text(field(extracted, &["website"])),
            name: text(field(extracted, &["name", "company_name"])),
            description: text(field(extracted, &["description"])),
            industries: text_list(field(extracted, &["industries"])),
            address: lenient_address(field(extracted, &["address"])),
            principal_person: text(field(extracted, &["principal_person"])),
            principal_designation: text(field(extracted, &["principal_designation"])),
            objectives: text(field(extracted, &["objectives", "business_objectives"])),
            number_of_employees: text(field(extracted, &["number_of_employees"])),
            contact_name: text(field(extracted, &["contact_name"])),
            contact_email: text(field(extracted, &["contact_email"])),
            scopes: text_list(field(extracted, &["scopes"])),
            country: text(field(extracted, &["country"])),
        }
        .cleaned();
        company.website = company
            .website
            .and_then(|w| normalize_website(&w).ok())
            .or_else(|| Some(crawled_url.to_string()));
        company.country = company.country.filter(|c| find_country(c).is_some());
        company.contact_email = company.contact_email.filter(|e| is_valid_email(e));
        if let Some(address) = company.address.as_mut() {
            address.country = address.country.take().filter(|c| find_country(c).is_some());
        }
        company
    }

    pub fn require_classification_input(&self) -> Result<(), AppError> {
        if self.name.is_none() && self.description.is_none() {
            return Err(AppError::Validation(
                "A company name or description is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn require_policy_input(&self) -> Result<(), AppError> {
        if self.name.is_none() {
            return Err(AppError::Validation("Company name is required".to_string()));
        }
        if self.contact_email.is_none() {
            return Err(AppError::Validation(
                "A contact email is required to deliver the policy".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub document_url: String,
    pub mime_type: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub filename: Option<String>,
    pub error_message: Option<String>,
    pub company_id: Uuid,
}

impl DocumentResponse {
    pub fn from_row(row: DocumentRow, config: &Config) -> Self {
        Self {
            document_url: config.document_url(row.id),
            id: row.id,
            name: row.name,
            description: row.description,
            mime_type: row.mime_type,
            source: row.source,
            status: row.status,
            filename: row.filename,
            error_message: row.error_message,
            company_id: row.company_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{base_vars, config_from};
    use chrono::Utc;
    use serde_json::json;

    fn company(value: serde_json::Value) -> CompanyRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_cleaned_trims_and_drops_empty() {
        let request = company(json!({
            "name": "  Alec Engineering  ",
            "description": "   ",
            "industries": ["construction", " ", " real_estate "],
            "address": {"city": " ", "postal_code": ""},
            "country": "ae"
        }))
        .cleaned();
        assert_eq!(request.name.as_deref(), Some("Alec Engineering"));
        assert_eq!(request.description, None);
        assert_eq!(
            request.industries,
            Some(vec!["construction".to_string(), "real_estate".to_string()])
        );
        assert_eq!(request.address, None);
        assert_eq!(request.country.as_deref(), Some("AE"));
    }

    #[test]
    fn test_validated_normalizes_website() {
        let request = company(json!({"name": "Acme", "website": "acme.io"}))
            .validated()
            .unwrap();
        assert_eq!(request.website.as_deref(), Some("https://acme.io"));
    }

    #[test]
    fn test_validated_rejects_unknown_country_and_bad_email() {
        let err = company(json!({"name": "Acme", "country": "ZZ"}))
            .validated()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = company(json!({"name": "Acme", "contact_email": "not-an-email"}))
            .validated()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = company(json!({"name": "Acme", "website": "ftp://acme.io"}))
            .validated()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("info@alec.ae"));
        assert!(is_valid_email("first.last+policy@mail.example.co.uk"));
        assert!(!is_valid_email("info@alec"));
        assert!(!is_valid_email("info alec@alec.ae"));
        assert!(!is_valid_email("@alec.ae"));
    }

    #[test]
    fn test_business_objectives_alias() {
        let request = company(json!({"business_objectives": "Deliver quality"}));
        assert_eq!(request.objectives.as_deref(), Some("Deliver quality"));
    }

    #[test]
    fn test_from_extracted_drops_invalid_fields() {
        let extracted = json!({
            "name": "ALEC",
            "website": null,
            "country": "United Arab Emirates",
            "contact_email": "contact at alec dot ae",
            "address": {"city": "Dubai", "country": "UAE", "postal_code": "00000"}
        });
        let request = CompanyRequest::from_extracted(&extracted, "https://alec.ae");
        assert_eq!(request.website.as_deref(), Some("https://alec.ae"));
        assert_eq!(request.country, None);
        assert_eq!(request.contact_email, None);
        let address = request.address.unwrap();
        assert_eq!(address.city.as_deref(), Some("Dubai"));
        assert_eq!(address.postcode.as_deref(), Some("00000"));
        assert_eq!(address.country, None);
    }

    #[test]
    fn test_from_extracted_accepts_loose_types() {
        let extracted = json!({
            "name": "ALEC",
            "number_of_employees": 3500,
            "industries": "construction, real_estate",
            "business_objectives": "Zero harm",
            "address": "Al Quoz, Dubai",
            "country": "ae",
            "scopes": [41.2, "42.99", null]
        });
        let request = CompanyRequest::from_extracted(&extracted, "https://alec.ae");
        assert_eq!(request.number_of_employees.as_deref(), Some("3500"));
        assert_eq!(
            request.industries,
            Some(vec!["construction".to_string(), "real_estate".to_string()])
        );
        assert_eq!(request.objectives.as_deref(), Some("Zero harm"));
        assert_eq!(
            request.address.unwrap().address_line_1.as_deref(),
            Some("Al Quoz, Dubai")
        );
        assert_eq!(request.country.as_deref(), Some("AE"));
        assert_eq!(request.scopes, Some(vec!["41.2".to_string(), "42.99".to_string()]));
    }

    #[test]
    fn test_from_extracted_tolerates_non_object() {
        let request = CompanyRequest::from_extracted(&json!(["not", "a", "profile"]), "https://alec.ae");
        assert_eq!(request.name, None);
        assert_eq!(request.website.as_deref(), Some("https://alec.ae"));
    }

    #[test]
    fn test_required_inputs() {
        assert!(CompanyRequest::default().require_classification_input().is_err());
        let described = CompanyRequest {
            description: Some("Builds airports".into()),
            ..Default::default()
        };
        assert!(described.require_classification_input().is_ok());
        assert!(described.require_policy_input().is_err());

        let complete = CompanyRequest {
            name: Some("ALEC".into()),
            contact_email: Some("info@alec.ae".into()),
            ..Default::default()
        };
        assert!(complete.require_policy_input().is_ok());
    }

    #[test]
    fn test_document_response_carries_url() {
        let config = config_from(&base_vars()).unwrap();
        let now = Utc::now();
        let row = DocumentRow {
            id: Uuid::new_v4(),
            name: "Quality Policy - ALEC.pdf".into(),
            description: None,
            mime_type: Some("application/pdf".into()),
            source: Some("generated".into()),
            content: Some("<html></html>".into()),
            filename: Some("doc-abc.pdf".into()),
            status: Some("pending".into()),
            error_message: None,
            company_id: Uuid::new_v4(),
            download_url: None,
            date_created: now,
            last_updated: now,
        };
        let id = row.id;
        let response = DocumentResponse::from_row(row, &config);
        assert_eq!(response.document_url, config.document_url(id));
        assert!(response.document_url.ends_with(&format!("/downloads/documents/{id}")));
    }

    #[test]
    fn test_dependency_response_lists_all_countries() {
        let response = DependencyResponse::new(vec![], vec![]);
        assert_eq!(response.countries.len(), COUNTRIES.len());
    }
}
