// Application email pipeline.
// Implements: request normalization, field extraction, prompt construction,
// generation and the templated fallback.
// All LLM calls go through llm_client via the TextGenerator seam.

pub mod composer;
pub mod context;
pub mod fallback;
pub mod handlers;
pub mod normalizer;
pub mod prompts;
