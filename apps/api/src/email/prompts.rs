// All LLM prompt constants and output schemas for the email module.
// Reuses cross-cutting fragments from llm_client::prompts.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::json;

use crate::email::context::{
    ApplicationContext, DEFAULT_COMPANY, DEFAULT_JOB_ROLE, DEFAULT_LOCATION, DEFAULT_NAME,
    SUBJECT_MAX_CHARS,
};
use crate::llm_client::prompts::{FORMAL_TONE_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::OutputSchema;

static RE_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").unwrap());

pub const EXTRACTION_TEMPERATURE: f32 = 0.1;
pub const GENERATION_TEMPERATURE: f32 = 0.3;

/// System prompt for recovering applicant fields from free text.
pub const EXTRACTION_SYSTEM: &str = "You are a precise information extractor for job applications. \
    Read the applicant's free-form request and pull out only what is stated. \
    Never guess or invent values.";

/// Extraction prompt template. Replace `{raw_text}` and the `{default_*}` markers before sending.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract the applicant details from the text below.

Return a JSON object with EXACTLY these keys:
{
  "name": "the applicant's full name",
  "jobRole": "the role being applied for",
  "company": "the company being applied to",
  "location": "the applicant's city or country"
}

Rules:
- Use only information present in the text.
- When a value is not stated, use these defaults:
  name = "{default_name}", jobRole = "{default_job_role}", company = "{default_company}", location = "{default_location}".
- Every value must be a plain string.

TEXT:
{raw_text}"#;

/// Behavioral directive for the email generation call.
pub const GENERATION_SYSTEM_PREAMBLE: &str = "You are an expert career assistant who writes job application emails \
    on behalf of applicants.";

/// Email generation prompt template.
/// Replace every `{field}` marker with the sanitized context value.
pub const GENERATION_PROMPT_TEMPLATE: &str = r#"Write a job application email using the details below.

APPLICANT
- Name: {name}
- Email: {user_email}
- Phone: {user_phone}
- Location: {location}
- Education: {education}
- Skills: {skills}

RECIPIENT
- HR contact name: {hr_name}
- HR email: {hr_email}
- Company: {company}
- Company phone: {company_phone}

POSITION
- Role: {job_role}

FORMATTING GUIDELINES:
1. Open with the greeting line "Dear {hr_name}," on its own line.
2. Write 2-3 body paragraphs separated by blank lines:
   - purpose: state the application for the {job_role} role at {company};
   - fit: connect the education and skills above to the role;
   - closing: express interest in an interview and thank the reader.
3. The subject must be under {subject_max} characters and include both the role and the applicant's name.
4. End with a closing salutation (for example "Sincerely,") followed by a signature block, one item per line:
   {name}
   {location}
   {user_email}
   {user_phone}
5. Use only the details above. Do not invent employers, degrees, metrics or dates.

Return a JSON object: {"subject": "...", "body": "..."}"#;

/// Full system prompt for the generation call.
pub fn generation_system() -> String {
    format!("{GENERATION_SYSTEM_PREAMBLE} {FORMAL_TONE_INSTRUCTION} {JSON_ONLY_SYSTEM}")
}

/// Full system prompt for the extraction call.
pub fn extraction_system() -> String {
    format!("{EXTRACTION_SYSTEM} {JSON_ONLY_SYSTEM}")
}

pub fn build_extraction_prompt(raw_text: &str) -> String {
    EXTRACTION_PROMPT_TEMPLATE
        .replace("{default_name}", DEFAULT_NAME)
        .replace("{default_job_role}", DEFAULT_JOB_ROLE)
        .replace("{default_company}", DEFAULT_COMPANY)
        .replace("{default_location}", DEFAULT_LOCATION)
        .replace("{raw_text}", raw_text.trim())
}

/// Fills every `{field}` marker in one pass, so inserted values are never rescanned.
/// Unknown markers are left as they are.
pub fn build_generation_prompt(ctx: &ApplicationContext) -> String {
    let subject_max = SUBJECT_MAX_CHARS.to_string();
    RE_MARKER
        .replace_all(GENERATION_PROMPT_TEMPLATE, |caps: &Captures| {
            let value = match &caps[1] {
                "name" => &ctx.name,
                "user_email" => &ctx.user_email,
                "user_phone" => &ctx.user_phone,
                "location" => &ctx.location,
                "education" => &ctx.education,
                "skills" => &ctx.skills,
                "hr_name" => &ctx.hr_name,
                "hr_email" => &ctx.hr_email,
                "company" => &ctx.company,
                "company_phone" => &ctx.company_phone,
                "job_role" => &ctx.job_role,
                "subject_max" => &subject_max,
                _ => return caps[0].to_string(),
            };
            value.clone()
        })
        .into_owned()
}

/// Four-field schema for the extraction call.
pub fn extraction_schema() -> OutputSchema {
    OutputSchema {
        name: "record_applicant_details",
        description: "Record the applicant details found in the text.",
        json_schema: json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "jobRole": {"type": "string"},
                "company": {"type": "string"},
                "location": {"type": "string"}
            },
            "required": ["name", "jobRole", "company", "location"]
        }),
    }
}

/// Subject/body schema for the generation call.
pub fn email_schema() -> OutputSchema {
    OutputSchema {
        name: "compose_application_email",
        description: "Return the finished application email.",
        json_schema: json!({
            "type": "object",
            "properties": {
                "subject": {"type": "string"},
                "body": {"type": "string"}
            },
            "required": ["subject", "body"]
        }),
    }
}
