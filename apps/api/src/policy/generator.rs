//! LLM rewrite of the policy template's generated sections.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::HTML_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::policy::prompts::policy_prompt;
use crate::policy::templates::count_generated_markers;

/// Max LLM retries when the rewritten template loses its structure.
const MAX_GENERATION_RETRIES: u32 = 2;

/// Checks that `output` is still an HTML document with the same editable
/// sections as the original.
pub fn check_generated_template(expected_markers: usize, output: &str) -> Result<(), String> {
    let lower = output.to_ascii_lowercase();
    if !lower.contains("<html") || !lower.contains("</html>") {
        return Err("output is not a complete HTML document".to_string());
    }
    let found = count_generated_markers(output);
    if found != expected_markers {
        return Err(format!(
            "expected {expected_markers} generated sections, found {found}"
        ));
    }
    Ok(())
}

/// Asks the LLM to rewrite the `data-ai-content="generated"` elements of
/// `template`, keeping everything else intact.
pub async fn generate_policy_template(llm: &LlmClient, template: &str) -> Result<String, AppError> {
    let expected = count_generated_markers(template);
    let prompt = policy_prompt(template);

    for attempt in 0..=MAX_GENERATION_RETRIES {
        let html = llm
            .call_text(&prompt, HTML_ONLY_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Policy generation call failed: {e}")))?;

        match check_generated_template(expected, &html) {
            Ok(()) => {
                info!("Generated policy template ({} characters)", html.len());
                return Ok(html);
            }
            Err(reason) => warn!(
                "Policy generation attempt {}/{}: {reason}, retrying",
                attempt + 1,
                MAX_GENERATION_RETRIES + 1
            ),
        }
    }

    Err(AppError::Llm(format!(
        "Policy generation failed after {} attempts: the template structure was not preserved",
        MAX_GENERATION_RETRIES + 1
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"<html><body>
<p data-ai-content="generated">One</p>
<p data-ai-content="generated">Two</p>
</body></html>"#;

    #[test]
    fn test_accepts_rewritten_sections() {
        let output = TEMPLATE.replace("One", "First rewritten").replace("Two", "Second");
        assert!(check_generated_template(2, &output).is_ok());
    }

    #[test]
    fn test_rejects_lost_markers() {
        let output = TEMPLATE.replacen(r#" data-ai-content="generated""#, "", 1);
        let err = check_generated_template(2, &output).unwrap_err();
        assert!(err.contains("found 1"));
    }

    #[test]
    fn test_rejects_fragment() {
        let err = check_generated_template(0, "<p>Only a fragment</p>").unwrap_err();
        assert!(err.contains("not a complete HTML document"));
    }
}
