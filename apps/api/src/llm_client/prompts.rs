// Prompt fragments shared across services.
// Service-specific prompts live in each service's own prompts.rs.

/// System prompt that enforces raw HTML output.
pub const HTML_ONLY_SYSTEM: &str = "You are a careful technical writer editing HTML documents. \
    You MUST respond with the complete HTML document only. \
    Do NOT wrap the document in markdown code fences. \
    Do NOT include explanations before or after the document.";

/// Instruction appended to prompts that ask for facts about a real company.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Use only information you can attribute to the provided material. \
    For any field that is not available, return null. \
    Do NOT fill fields with placeholders or guesses.";
