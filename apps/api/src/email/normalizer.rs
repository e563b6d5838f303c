//! Request Normalizer: turns whatever the caller posted into an `ApplicationContext`.
//!
//! Free text gets a coarse regex pass (role keyword and "at <Company>") and
//! nothing more; structured objects are taken field by field. This stage never fails.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::email::context::{derive_hr_email, ApplicationContext};

/// Multi-word roles come first so "backend developer" wins over "developer".
static RE_JOB_ROLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:full[\s-]?stack|back[\s-]?end|front[\s-]?end|software|web|mobile|data|ml|machine learning|devops|cloud|qa)\s+(?:developer|engineer)|(?:product|project)\s+manager|(?:ui/ux|ui|ux|graphic|product)\s+designer|(?:data|business)\s+(?:analyst|scientist)|developer|engineer|designer|manager|intern|analyst|scientist|consultant)\b",
    )
    .unwrap()
});

static RE_COMPANY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bat\s+([A-Za-z0-9&][A-Za-z0-9& ]*)").unwrap());

/// The posted body, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPayload {
    /// A bare JSON string or `{ "input": "<text>" }`.
    FreeText(String),
    /// Any other object; each known key is optional.
    Structured(Map<String, Value>),
}

impl RequestPayload {
    pub fn classify(body: Value) -> Self {
        match body {
            Value::String(text) => RequestPayload::FreeText(text),
            Value::Object(mut map) => match map.remove("input") {
                Some(Value::String(text)) => RequestPayload::FreeText(text),
                Some(other) => {
                    map.insert("input".to_string(), other);
                    RequestPayload::Structured(map)
                }
                None => RequestPayload::Structured(map),
            },
            // Numbers, arrays, booleans and null carry no usable fields.
            _ => RequestPayload::Structured(Map::new()),
        }
    }
}

/// Normalizer output. `fields` is what was actually recovered from the caller:
/// the posted object for structured input, the regex hits for free text.
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    pub context: ApplicationContext,
    pub fields: Map<String, Value>,
    pub raw_text: Option<String>,
}

pub fn normalize(payload: RequestPayload) -> NormalizedRequest {
    match payload {
        RequestPayload::FreeText(text) => {
            let fields = extract_free_text_fields(&text);
            let mut context = ApplicationContext::default();
            if let Some(role) = fields.get("jobRole").and_then(Value::as_str) {
                context.job_role = role.to_string();
            }
            if let Some(company) = fields.get("company").and_then(Value::as_str) {
                context.company = company.to_string();
            }
            // Same address the composer will write to.
            context.hr_email = derive_hr_email(fields.get("company"));
            NormalizedRequest {
                context,
                fields,
                raw_text: Some(text),
            }
        }
        RequestPayload::Structured(fields) => NormalizedRequest {
            context: ApplicationContext::taken_from(&fields),
            fields,
            raw_text: None,
        },
    }
}

/// Best-effort `jobRole` / `company` recovery from free text. Absent keys mean no match.
pub fn extract_free_text_fields(text: &str) -> Map<String, Value> {
    let mut fields = Map::new();

    if let Some(role) = RE_JOB_ROLE.find(text) {
        fields.insert("jobRole".to_string(), Value::from(role.as_str()));
    }

    let company = RE_COMPANY
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|c| !c.is_empty());
    if let Some(company) = company {
        fields.insert("company".to_string(), Value::from(company));
    }

    fields
}
