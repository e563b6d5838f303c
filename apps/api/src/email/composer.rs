//! Email Composer: drives extraction, prompt building, generation and fallback.
//!
//! Flow: [extract (raw text only)] → sanitize → build prompts → generate →
//!       validate + post-process, or the fallback template on any failure.
//!
//! Nothing in here returns an error to the caller. Provider failures are logged
//! and replaced by defaults (extraction) or the template (generation).

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::email::context::{
    clean_str, finalize_subject, normalize_body, ApplicationContext, GeneratedEmail,
};
use crate::email::fallback::fallback_email;
use crate::email::prompts::{
    build_extraction_prompt, build_generation_prompt, email_schema, extraction_schema,
    extraction_system, generation_system, EXTRACTION_TEMPERATURE, GENERATION_TEMPERATURE,
};
use crate::llm_client::parse::{parse_completion, ParseError};
use crate::llm_client::{Completion, GenerationRequest, LlmError, TextGenerator};

/// Keys the extraction call is allowed to fill.
const EXTRACTED_KEYS: [&str; 4] = ["name", "jobRole", "company", "location"];

/// What the composer is asked to write from.
#[derive(Debug, Clone)]
pub enum ComposeInput {
    /// Caller-supplied fields, keyed by their wire names.
    Fields(Map<String, Value>),
    /// Free text to run through extraction. `hints` seeds the per-field defaults
    /// (e.g. a role the normalizer already recognized).
    RawText {
        text: String,
        hints: Map<String, Value>,
    },
}

/// Which path produced the email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct ComposedEmail {
    pub context: ApplicationContext,
    pub email: GeneratedEmail,
    pub source: EmailSource,
}

#[derive(Debug, Error)]
enum StageError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("model output missing a usable {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Deserialize)]
struct RawEmail {
    subject: String,
    body: String,
}

#[derive(Clone)]
pub struct EmailComposer {
    llm: Arc<dyn TextGenerator>,
    call_timeout: Duration,
}

impl EmailComposer {
    pub fn new(llm: Arc<dyn TextGenerator>, call_timeout: Duration) -> Self {
        Self { llm, call_timeout }
    }

    pub async fn compose(&self, input: ComposeInput) -> ComposedEmail {
        let fields = match input {
            ComposeInput::Fields(fields) => fields,
            ComposeInput::RawText { text, hints } => self.extract_fields(&text, hints).await,
        };

        let context = ApplicationContext::sanitized_from(&fields);

        match self.generate_email(&context).await {
            Ok(email) => ComposedEmail {
                context,
                email,
                source: EmailSource::Model,
            },
            Err(e) => {
                warn!("Email generation failed, using fallback template: {e}");
                let email = fallback_email(&context);
                ComposedEmail {
                    context,
                    email,
                    source: EmailSource::Fallback,
                }
            }
        }
    }

    /// Recovers name / role / company / location from free text.
    /// Values the model does not provide keep whatever `hints` already held.
    async fn extract_fields(&self, text: &str, mut hints: Map<String, Value>) -> Map<String, Value> {
        let prompt = build_extraction_prompt(text);
        let system = extraction_system();
        let schema = extraction_schema();
        let request = GenerationRequest {
            system: &system,
            prompt: &prompt,
            schema: &schema,
            temperature: EXTRACTION_TEMPERATURE,
        };

        let extracted = self.call(&request).await.and_then(|completion| {
            parse_completion::<Map<String, Value>>(&completion).map_err(StageError::from)
        });

        match extracted {
            Ok(extracted) => {
                for key in EXTRACTED_KEYS {
                    if let Some(value) = extracted.get(key).and_then(clean_str) {
                        hints.insert(key.to_string(), Value::String(value));
                    }
                }
            }
            Err(e) => warn!("Field extraction failed, keeping defaults: {e}"),
        }

        hints
    }

    async fn generate_email(&self, ctx: &ApplicationContext) -> Result<GeneratedEmail, StageError> {
        let prompt = build_generation_prompt(ctx);
        let system = generation_system();
        let schema = email_schema();
        let request = GenerationRequest {
            system: &system,
            prompt: &prompt,
            schema: &schema,
            temperature: GENERATION_TEMPERATURE,
        };

        let completion = self.call(&request).await?;
        let raw: RawEmail = parse_completion(&completion)?;

        let subject = finalize_subject(&raw.subject);
        if subject.is_empty() {
            return Err(StageError::MissingField("subject"));
        }
        let body = normalize_body(&raw.body);
        if body.is_empty() {
            return Err(StageError::MissingField("body"));
        }

        Ok(GeneratedEmail { subject, body })
    }

    async fn call(&self, request: &GenerationRequest<'_>) -> Result<Completion, StageError> {
        match tokio::time::timeout(self.call_timeout, self.llm.generate(request)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(LlmError::Timeout(self.call_timeout).into()),
        }
    }
}
