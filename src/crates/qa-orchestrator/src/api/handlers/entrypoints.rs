//! Handlers for the three external submission endpoints. Each is a thin
//! wrapper over `crate::entrypoints`: validate, publish, return the session
//! id — none of them wait on pipeline completion.

use axum::extract::State;
use axum::Json;

use qa_core_utils::DocumentFormat;

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{
    SubmitExecutionRequest, SubmitParseRequest, SubmitResponse, SubmitUiAnalysisRequest,
};
use crate::api::middleware::validate_not_empty;
use crate::api::routes::AppState;
use crate::entrypoints;

fn format_hint(format: DocumentFormat) -> &'static str {
    match format {
        DocumentFormat::Auto => "auto",
        DocumentFormat::OpenApi => "openapi",
        DocumentFormat::Swagger => "swagger",
        DocumentFormat::Postman => "postman",
        DocumentFormat::Pdf => "pdf",
        DocumentFormat::Unknown => "unknown",
    }
}

/// POST /api/v1/parse
pub async fn submit_parse(
    State(state): State<AppState>,
    Json(req): Json<SubmitParseRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    if req.document.is_empty() {
        return Err(ApiError::ValidationError("document must not be empty".to_string()));
    }

    let session_id = entrypoints::submit_parse(
        &state.bus,
        req.document,
        format_hint(req.format),
        req.session_id,
    )
    .await
    .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(SubmitResponse { session_id }))
}

/// POST /api/v1/ui-analysis
pub async fn submit_ui_analysis(
    State(state): State<AppState>,
    Json(req): Json<SubmitUiAnalysisRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    let session_id = entrypoints::submit_ui_analysis(&state.bus, req.payload, req.session_id)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(SubmitResponse { session_id }))
}

/// POST /api/v1/execute
pub async fn submit_execution(
    State(state): State<AppState>,
    Json(req): Json<SubmitExecutionRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    for script in &req.scripts {
        validate_not_empty(&script.name, "script.name")?;
    }

    let session_id =
        entrypoints::submit_execution(&state.bus, req.scripts, req.config, req.session_id)
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(SubmitResponse { session_id }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hint_covers_every_variant() {
        assert_eq!(format_hint(DocumentFormat::OpenApi), "openapi");
        assert_eq!(format_hint(DocumentFormat::Unknown), "unknown");
    }
}
