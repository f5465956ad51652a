// Prompt templates for website extraction and NACE classification.
// Placeholders in `{braces}` are replaced before sending.

use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;

/// System prompt for both crawl and classification calls.
pub const CLASSIFIER_SYSTEM: &str =
    "You are an analyst who maps companies to the NACE Rev. 2 classification \
    of economic activities. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences.";

/// Company profile extraction. Replace `{company_url}`, `{page_text}` and `{industries}`.
pub const CRAWL_PROMPT_TEMPLATE: &str = r#"Extract the following information about the company behind the website below and return it as a JSON object:

1. Company Name: the full legal name of the company.
2. Company Description: a brief overview of the company's activities, industry and expertise.
3. Company Industries: an array of the main sectors the company operates in.
4. Company Objectives: the company's mission, vision and core values.
5. Principal Person: the name and designation of the company's primary leader or spokesperson, as `principal_person` and `principal_designation`.
6. Company Address: the primary office location as an object with `address_line_1`, `address_line_2`, `city`, `state`, `country` and `postal_code`. `country` is a 2-letter code. When no state is given, put the region in `state`.
7. Contact Email: the primary contact email of the company.
8. Website: the company's official website URL.
9. Country: the 2-letter code of the country the company is registered in.
10. Number of Employees: a range for the number of employees.

Return this EXACT schema:
{
  "name": "string",
  "description": "string",
  "website": "string",
  "industries": ["string"],
  "objectives": "string",
  "principal_person": "string",
  "principal_designation": "string",
  "address": {
    "address_line_1": "string",
    "address_line_2": "string",
    "city": "string",
    "state": "string",
    "country": "string",
    "postal_code": "string"
  },
  "country": "string",
  "contact_email": "string",
  "number_of_employees": "string"
}

Map every industry to one of the following identifiers:
{industries}

The company URL is: {company_url}

Text found on the website:
"""
{page_text}
"""
"#;

/// Classification question. Replace `{name}`, `{description}` and `{industries}`.
pub const CLASSIFY_PROMPT_TEMPLATE: &str = r#"Given the following business information, determine the most appropriate NACE Rev. 2 classification codes.
Return as many appropriate classifications as possible using the provided context.

Business Name: {name}
Business Description: {description}
Business Industries: {industries}

Based on the NACE Rev. 2 classification context provided:

1. Identify the most appropriate NACE Rev. 2 class codes.
2. Return as many appropriate classifications as possible, and at least 5.
3. Use the class level only (four digits, "XX.XX").

Respond with a JSON array of strings:

["XX.XX", "XX.XX", "XX.XX"]
"#;

/// Retrieval-augmented wrapper. Replace `{context}` and `{question}`.
pub const CONTEXT_PROMPT_TEMPLATE: &str = "Context:\n{context}\n\nQuestion:\n{question}\n";

/// Shown to the model when the website could not be fetched.
pub const PAGE_UNAVAILABLE: &str =
    "(The page could not be fetched. Use only what you reliably know about this URL.)";

pub fn crawl_prompt(company_url: &str, page_text: Option<&str>, industries: &[String]) -> String {
    let prompt = CRAWL_PROMPT_TEMPLATE
        .replace("{company_url}", company_url)
        .replace("{industries}", &industries.join("\n"))
        .replace("{page_text}", page_text.unwrap_or(PAGE_UNAVAILABLE));
    format!("{prompt}\n{NO_INVENTION_INSTRUCTION}")
}

pub fn classify_question(name: &str, description: &str, industries: &[String]) -> String {
    CLASSIFY_PROMPT_TEMPLATE
        .replace("{name}", name)
        .replace("{description}", description)
        .replace("{industries}", &industries.join(", "))
}

pub fn context_prompt(context: &str, question: &str) -> String {
    CONTEXT_PROMPT_TEMPLATE
        .replace("{context}", context)
        .replace("{question}", question)
}
