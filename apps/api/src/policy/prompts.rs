// Prompt for rewriting the generated sections of the policy template.

/// Replace `{template}` before sending.
pub const POLICY_PROMPT_TEMPLATE: &str = r#"Using the HTML template provided below, produce a new HTML document where:

1. Only the content of elements tagged with `data-ai-content="generated"` is modified.
2. The new text is relevant, meaningful and of approximately the same length as the original, and keeps its original context.
3. All class names, image paths, DOM structure and other attributes (including data-ai-content="generated") stay unchanged.
4. Every template expression such as {{ company.name }} and every {% ... %} block is kept exactly as written.

Return only the modified HTML document, without any additional text or formatting.

Template:
{template}
"#;

pub fn policy_prompt(template: &str) -> String {
    POLICY_PROMPT_TEMPLATE.replace("{template}", template)
}
