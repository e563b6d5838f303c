//! Axum route handlers for the Email API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::email::composer::ComposeInput;
use crate::email::context::{ApplicationContext, GeneratedEmail};
use crate::email::normalizer::{normalize, NormalizedRequest, RequestPayload};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateEmailResponse {
    pub success: bool,
    pub parsed_input: ApplicationContext,
    pub generated: GeneratedEmail,
}

/// POST /api/email/generate
///
/// Accepts a JSON string, `{ "input": "<text>" }`, or an object of applicant fields.
/// Always answers with an email; provider trouble only changes which path wrote it.
pub async fn handle_generate_email(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerateEmailResponse>, AppError> {
    let Json(body) = payload?;

    let NormalizedRequest {
        context,
        fields,
        raw_text,
    } = normalize(RequestPayload::classify(body));

    let input = match raw_text {
        Some(text) => ComposeInput::RawText {
            text,
            hints: fields,
        },
        None => ComposeInput::Fields(fields),
    };

    // A panic inside the pipeline surfaces as a 500.
    let composer = state.composer.clone();
    let composed = tokio::spawn(async move { composer.compose(input).await })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("email composition aborted: {e}")))?;

    info!(
        source = ?composed.source,
        role = %composed.context.job_role,
        company = %composed.context.company,
        "Composed application email"
    );

    Ok(Json(GenerateEmailResponse {
        success: true,
        parsed_input: context,
        generated: composed.email,
    }))
}
