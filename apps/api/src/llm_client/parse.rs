//! Parse-or-fallback for model output.
//!
//! Providers are asked for schema-shaped JSON but do not always deliver it.
//! The structured result is tried first; failing that, the first `{` .. last `}`
//! span of the free text is decoded.

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::llm_client::Completion;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("completion carried neither a structured result nor text")]
    NoContent,

    #[error("no JSON object found in model text")]
    NoJsonObject,

    #[error("invalid JSON in model output: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Decodes a completion into `T`, preferring the provider's structured result.
///
/// A structured result that does not fit `T` is not fatal on its own: the text
/// path still gets a chance. The error reported is the last one encountered.
pub fn parse_completion<T: DeserializeOwned>(completion: &Completion) -> Result<T, ParseError> {
    let mut last_error = ParseError::NoContent;

    if let Some(structured) = &completion.structured {
        match serde_json::from_value::<T>(structured.clone()) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = ParseError::InvalidJson(e),
        }
    }

    if let Some(text) = completion.text.as_deref() {
        let Some(object) = extract_json_object(text) else {
            return Err(ParseError::NoJsonObject);
        };
        return serde_json::from_str::<T>(object).map_err(ParseError::InvalidJson);
    }

    Err(last_error)
}

/// Returns the slice from the first `{` through the last `}`, if that span exists.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;

    if start >= end {
        return None;
    }

    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        subject: String,
        body: String,
    }

    fn text(t: &str) -> Completion {
        Completion {
            structured: None,
            text: Some(t.to_string()),
        }
    }

    #[test]
    fn test_extract_json_object_with_prose_and_fences() {
        let input = "Sure!\n```json\n{\"subject\": \"a\", \"body\": \"{b}\"}\n```\nDone.";
        assert_eq!(
            extract_json_object(input),
            Some("{\"subject\": \"a\", \"body\": \"{b}\"}")
        );
    }

    #[test]
    fn test_extract_json_object_none_when_missing_or_reversed() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
        assert_eq!(extract_json_object("{"), None);
    }

    #[test]
    fn test_structured_result_wins_over_text() {
        let completion = Completion {
            structured: Some(json!({"subject": "from tool", "body": "x"})),
            text: Some(r#"{"subject": "from text", "body": "y"}"#.to_string()),
        };
        let pair: Pair = parse_completion(&completion).unwrap();
        assert_eq!(pair.subject, "from tool");
    }

    #[test]
    fn test_mismatched_structured_result_falls_back_to_text() {
        let completion = Completion {
            structured: Some(json!({"subject": 42})),
            text: Some(r#"Result: {"subject": "ok", "body": "fine"}"#.to_string()),
        };
        let pair: Pair = parse_completion(&completion).unwrap();
        assert_eq!(
            pair,
            Pair {
                subject: "ok".to_string(),
                body: "fine".to_string()
            }
        );
    }

    #[test]
    fn test_mismatched_structured_without_text_is_invalid_json() {
        let completion = Completion {
            structured: Some(json!({"subject": 42})),
            text: None,
        };
        let err = parse_completion::<Pair>(&completion).unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(_)));
    }

    #[test]
    fn test_text_without_object_is_no_json_object() {
        let err = parse_completion::<Pair>(&text("I cannot help with that.")).unwrap_err();
        assert!(matches!(err, ParseError::NoJsonObject));
    }

    #[test]
    fn test_truncated_object_is_invalid_json() {
        let err = parse_completion::<Pair>(&text(r#"{"subject": "a", "body": } trailing }"#))
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(_)));
    }

    #[test]
    fn test_empty_completion_is_no_content() {
        let err = parse_completion::<Pair>(&Completion::default()).unwrap_err();
        assert!(matches!(err, ParseError::NoContent));
    }
}
