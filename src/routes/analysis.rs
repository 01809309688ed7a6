//! Analysis routes: quiz-answer job submission and free-text analysis

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::routes::rate_limit::RATE_LIMIT_MESSAGE;
use crate::routes::validation::{validate_analysis_text, validate_id};
use crate::routes::{error_response, json_response, parse_body};
use crate::server::AppState;
use crate::types::Result;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSubmission {
    pub job_definition_id: String,
    pub job_record_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JobAccepted {
    success: bool,
    message: &'static str,
}

/// POST /api/test/analyze
///
/// Claims a pending job record and kicks off the pipeline in the
/// background; the response returns as soon as the job is claimed.
pub async fn submit_job(state: &AppState, body: Bytes) -> Result<Response<Full<Bytes>>> {
    let request: JobSubmission = parse_body(&body)?;
    let definition_id = validate_id("jobDefinitionId", &request.job_definition_id)?;
    let job_id = validate_id("jobRecordId", &request.job_record_id)?;

    let orchestrator = state.orchestrator()?;
    orchestrator.accept_job(&job_id).await?;
    orchestrator.spawn(definition_id, job_id);

    Ok(json_response(
        StatusCode::OK,
        &JobAccepted {
            success: true,
            message: "Analysis started",
        },
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextAnalysisRequest {
    pub text: Option<String>,
    pub attachments: Option<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextAnalysisResponse {
    success: bool,
    analysis: String,
    /// Null when the best-effort consultation save failed
    consultation_id: Option<String>,
}

/// POST /api/ai/analyze
pub async fn analyze_text(
    state: &AppState,
    user: &AuthUser,
    body: Bytes,
) -> Result<Response<Full<Bytes>>> {
    if !state.rate_limiter.allow(&user.uid).await {
        return Ok(error_response(
            StatusCode::TOO_MANY_REQUESTS,
            RATE_LIMIT_MESSAGE,
        ));
    }

    let request: TextAnalysisRequest = parse_body(&body)?;
    let attachments = request.attachments.unwrap_or_default();
    let text = validate_analysis_text(request.text.as_deref().unwrap_or(""), attachments.len())?;

    let orchestrator = state.orchestrator()?;
    let result = orchestrator
        .analyze_text(&user.uid, &text, &attachments)
        .await?;

    Ok(json_response(
        StatusCode::OK,
        &TextAnalysisResponse {
            success: true,
            analysis: result.analysis,
            consultation_id: result.consultation_id,
        },
    ))
}
