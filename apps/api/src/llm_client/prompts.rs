// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction fixing the register of every business letter we produce.
pub const FORMAL_TONE_INSTRUCTION: &str = "\
    Write in a formal business tone. \
    Do NOT use contractions (write \"I am\", never \"I'm\"). \
    Do NOT use slang, emojis or exclamation marks.";
