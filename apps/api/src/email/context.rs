//! ApplicationContext, the flat applicant/job record every email is built from,
//! plus the field-level sanitizers shared by the normalizer and the composer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_NAME: &str = "Applicant";
pub const DEFAULT_USER_EMAIL: &str = "applicant@example.com";
pub const DEFAULT_USER_PHONE: &str = "Not provided";
pub const DEFAULT_HR_NAME: &str = "HR Manager";
pub const DEFAULT_HR_EMAIL: &str = "hr@company.com";
pub const DEFAULT_JOB_ROLE: &str = "Software Engineer";
pub const DEFAULT_COMPANY: &str = "Your Company";
pub const DEFAULT_COMPANY_PHONE: &str = "Not provided";
pub const DEFAULT_EDUCATION: &str = "Not specified";
pub const DEFAULT_SKILLS: &str = "Not specified";
pub const DEFAULT_LOCATION: &str = "India";

/// Subjects longer than this are cut to `SUBJECT_TRUNCATED_LEN` plus an ellipsis.
pub const SUBJECT_MAX_CHARS: usize = 90;
const SUBJECT_TRUNCATED_LEN: usize = 87;
const ELLIPSIS: &str = "...";

/// Normalized applicant and job attributes. Every field is non-empty once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationContext {
    pub name: String,
    pub user_email: String,
    pub user_phone: String,
    pub hr_name: String,
    pub hr_email: String,
    pub job_role: String,
    pub company: String,
    pub company_phone: String,
    pub education: String,
    pub skills: String,
    pub location: String,
}

impl Default for ApplicationContext {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            user_email: DEFAULT_USER_EMAIL.to_string(),
            user_phone: DEFAULT_USER_PHONE.to_string(),
            hr_name: DEFAULT_HR_NAME.to_string(),
            hr_email: DEFAULT_HR_EMAIL.to_string(),
            job_role: DEFAULT_JOB_ROLE.to_string(),
            company: DEFAULT_COMPANY.to_string(),
            company_phone: DEFAULT_COMPANY_PHONE.to_string(),
            education: DEFAULT_EDUCATION.to_string(),
            skills: DEFAULT_SKILLS.to_string(),
            location: DEFAULT_LOCATION.to_string(),
        }
    }
}

impl ApplicationContext {
    /// Builds a context by running every field of `fields` through `sanitize_field`.
    /// A missing `hrEmail` is derived from the raw `company` value.
    pub fn sanitized_from(fields: &Map<String, Value>) -> Self {
        Self::resolve_with(fields, |value, default| sanitize_field(value, default))
    }

    /// Builds a context taking each field verbatim when it is a non-empty string.
    /// No whitespace cleanup happens here; that is the composer's job.
    pub fn taken_from(fields: &Map<String, Value>) -> Self {
        Self::resolve_with(fields, |value, default| {
            value
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        })
    }

    fn resolve_with(
        fields: &Map<String, Value>,
        pick: impl Fn(Option<&Value>, &str) -> String,
    ) -> Self {
        let field = |key: &str, default: &str| pick(fields.get(key), default);

        let hr_email = match fields.get("hrEmail") {
            Some(v) if clean_str(v).is_some() => pick(Some(v), DEFAULT_HR_EMAIL),
            _ => derive_hr_email(fields.get("company")),
        };

        Self {
            name: field("name", DEFAULT_NAME),
            user_email: field("userEmail", DEFAULT_USER_EMAIL),
            user_phone: field("userPhone", DEFAULT_USER_PHONE),
            hr_name: field("hrName", DEFAULT_HR_NAME),
            hr_email,
            job_role: field("jobRole", DEFAULT_JOB_ROLE),
            company: field("company", DEFAULT_COMPANY),
            company_phone: field("companyPhone", DEFAULT_COMPANY_PHONE),
            education: field("education", DEFAULT_EDUCATION),
            skills: field("skills", DEFAULT_SKILLS),
            location: field("location", DEFAULT_LOCATION),
        }
    }
}

/// Output of the composer: exactly a subject and a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedEmail {
    pub subject: String,
    pub body: String,
}

/// Collapses whitespace runs to single spaces and trims.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The collapsed string, or `None` when the value is not a string or is blank.
pub fn clean_str(value: &Value) -> Option<String> {
    let collapsed = collapse_whitespace(value.as_str()?);
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Whitespace-collapsing trim with a default for missing, blank or non-string values.
pub fn sanitize_field(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(clean_str)
        .unwrap_or_else(|| default.to_string())
}

/// `hr@<company lowercased, whitespace stripped>.com`, or the placeholder address
/// when there is no usable company string.
pub fn derive_hr_email(company: Option<&Value>) -> String {
    let domain: String = company
        .and_then(Value::as_str)
        .map(|c| c.chars().filter(|ch| !ch.is_whitespace()).collect::<String>())
        .unwrap_or_default()
        .to_lowercase();

    if domain.is_empty() {
        DEFAULT_HR_EMAIL.to_string()
    } else {
        format!("hr@{domain}.com")
    }
}

/// Collapses whitespace and caps the subject at `SUBJECT_MAX_CHARS` characters.
pub fn finalize_subject(subject: &str) -> String {
    let subject = collapse_whitespace(subject);
    if subject.chars().count() <= SUBJECT_MAX_CHARS {
        return subject;
    }
    let mut truncated: String = subject.chars().take(SUBJECT_TRUNCATED_LEN).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Converts CRLF / CR line endings to LF and trims the body.
pub fn normalize_body(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}
