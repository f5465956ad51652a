//! Embedded HTML templates for the printed policy and its notification email.

use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

pub const PRINT_POLICY: &str = "print/policy.html";
pub const EMAIL_POLICY: &str = "email/policy.html";

/// Attribute marking elements whose text the LLM rewrites.
pub const GENERATED_MARKER: &str = r#"data-ai-content="generated""#;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF renderer failed: {0}")]
    Pdf(String),
}

/// Template environment. `.html` names are auto-escaped.
#[derive(Debug, Clone)]
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.add_template(PRINT_POLICY, include_str!("../../templates/print/policy.html"))?;
        env.add_template(EMAIL_POLICY, include_str!("../../templates/email/policy.html"))?;
        Ok(Self { env })
    }

    /// Raw source of a registered template.
    pub fn source(&self, name: &str) -> Result<String, RenderError> {
        Ok(self.env.get_template(name)?.source().to_string())
    }

    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, RenderError> {
        Ok(self.env.get_template(name)?.render(context)?)
    }

    /// Renders a template source that is not registered, e.g. one rewritten by
    /// the LLM. `name` decides auto-escaping.
    pub fn render_source<S: Serialize>(
        &self,
        name: &str,
        source: &str,
        context: S,
    ) -> Result<String, RenderError> {
        Ok(self.env.render_named_str(name, source, context)?)
    }
}

/// Number of LLM-editable elements in a template.
pub fn count_generated_markers(html: &str) -> usize {
    html.matches(GENERATED_MARKER).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_print_template_has_generated_sections() {
        let templates = Templates::new().unwrap();
        let source = templates.source(PRINT_POLICY).unwrap();
        assert_eq!(count_generated_markers(&source), 5);
        assert!(source.contains("{{ company.name }}"));
    }

    #[test]
    fn test_print_template_renders_company() {
        let templates = Templates::new().unwrap();
        let html = templates
            .render(
                PRINT_POLICY,
                json!({
                    "company": {
                        "name": "Smith & Sons",
                        "scopes": ["41.20", "42.11"],
                        "principal_person": "Jane Smith",
                        "principal_designation": "CEO"
                    },
                    "document": {"filename": "doc-abc.pdf"},
                    "address_line": "1 Main St, Leeds",
                    "issued_on": "2024-12-01",
                    "base_path": "file:///srv/static"
                }),
            )
            .unwrap();
        assert!(html.contains("Smith &amp; Sons"));
        assert!(html.contains("NACE 41.20"));
        assert!(html.contains("file:///srv/static/print.css"));
        assert!(html.contains("Jane Smith"));
    }

    #[test]
    fn test_render_source_escapes_html_names() {
        let templates = Templates::new().unwrap();
        let html = templates
            .render_source("policy.html", "<p>{{ name }}</p>", json!({"name": "<b>x"}))
            .unwrap();
        assert_eq!(html, "<p>&lt;b&gt;x</p>");
    }

    #[test]
    fn test_email_template_renders() {
        let templates = Templates::new().unwrap();
        let html = templates
            .render(
                EMAIL_POLICY,
                json!({
                    "app_name": "LLM Business Classifier",
                    "app_url": "http://localhost:8080",
                    "app_logo_url": "",
                    "company": {"name": "ALEC", "contact_name": "Omar"},
                    "document": {"filename": "doc-abc.pdf"},
                    "document_url": "http://localhost:8080/downloads/documents/1"
                }),
            )
            .unwrap();
        assert!(html.contains("Hello Omar"));
        assert!(html.contains("doc-abc.pdf"));
        assert!(!html.contains("<img"));
    }
}
