//! HTTP handlers.

use super::app::AppState;
use crate::analysis::{ClimateSummary, OrgChart};
use crate::error::ApiError;
use crate::models::{ClimateResponse, Employee, HrIndicators, RawAnswers};
use crate::report::{self, ExportOptions, ReportFormat};
use crate::services::diagnosis::{save_hr_diagnosis, HrDiagnosisForm};
use crate::services::portal::{client_portal, ClientPortal};
use crate::services::provisioning::{provision_client_access, AccessRequest};
use crate::services::reports::{self as views, DiscOverview, PortfolioMetrics};
use crate::services::surveys::{self, ClimateAnswers, DiscSubmission};
use crate::services::team::{self, EmployeeForm};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "consultdesk",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a client login. The workflow runs in its own task so a dropped
/// connection cannot interrupt the rollback.
pub async fn create_client_access(
    State(state): State<AppState>,
    payload: Result<Json<AccessRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let backend = Arc::clone(&state.backend);

    let outcome = tokio::spawn(async move {
        provision_client_access(backend.as_ref(), &request).await
    })
    .await
    .map_err(|e| {
        error!("Provisioning task failed: {}", e);
        ApiError::Internal("Provisioning task failed".to_string())
    })?;

    outcome?;
    Ok(Json(json!({ "success": true })))
}

pub async fn org_chart(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<OrgChart>, ApiError> {
    let chart = views::project_org_chart(state.backend.as_ref(), &project_id).await?;
    Ok(Json(chart))
}

pub async fn disc_summary(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<DiscOverview>, ApiError> {
    views::project_disc(state.backend.as_ref(), &project_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No DISC data for project {}", project_id)))
}

pub async fn climate_summary(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ClimateSummary>, ApiError> {
    views::project_climate(state.backend.as_ref(), &project_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "Climate survey not yet launched for project {}",
                project_id
            ))
        })
}

pub async fn submit_climate_response(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    payload: Result<Json<ClimateAnswers>, JsonRejection>,
) -> Result<(StatusCode, Json<ClimateResponse>), ApiError> {
    let Json(answers) = payload?;
    let response =
        surveys::submit_climate_response(state.backend.as_ref(), &project_id, answers).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn save_hr_indicators(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    payload: Result<Json<HrDiagnosisForm>, JsonRejection>,
) -> Result<Json<HrIndicators>, ApiError> {
    let Json(form) = payload?;
    let saved = save_hr_diagnosis(state.backend.as_ref(), &project_id, form).await?;
    Ok(Json(saved))
}

pub async fn portal(
    State(state): State<AppState>,
    Path(auth_user_id): Path<String>,
) -> Result<Json<ClientPortal>, ApiError> {
    let view = client_portal(state.backend.as_ref(), &auth_user_id).await?;
    Ok(Json(view))
}

pub async fn portfolio(State(state): State<AppState>) -> Result<Json<PortfolioMetrics>, ApiError> {
    let metrics = views::portfolio(state.backend.as_ref()).await?;
    Ok(Json(metrics))
}

#[derive(Debug, Deserialize)]
pub struct DiscAnswersBody {
    #[serde(alias = "respostas")]
    pub answers: RawAnswers,
}

pub async fn submit_disc_answers(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    payload: Result<Json<DiscAnswersBody>, JsonRejection>,
) -> Result<Json<DiscSubmission>, ApiError> {
    let Json(body) = payload?;
    let outcome =
        surveys::submit_disc_answers(state.backend.as_ref(), &employee_id, body.answers).await?;
    Ok(Json(outcome))
}

pub async fn create_employee(
    State(state): State<AppState>,
    payload: Result<Json<EmployeeForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    let Json(form) = payload?;
    let employee = team::save_employee(state.backend.as_ref(), None, form).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn update_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    payload: Result<Json<EmployeeForm>, JsonRejection>,
) -> Result<Json<Employee>, ApiError> {
    let Json(form) = payload?;
    let employee = team::save_employee(state.backend.as_ref(), Some(&employee_id), form).await?;
    Ok(Json(employee))
}

pub async fn deactivate_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    team::deactivate_employee(state.backend.as_ref(), &employee_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
}

pub async fn executive_report(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let format = match query.format.as_deref() {
        Some(value) => ReportFormat::parse(value)
            .ok_or_else(|| ApiError::BadRequest(format!("Unsupported report format: {}", value)))?,
        None => state.report.format,
    };

    let assembled = views::assemble(
        state.backend.as_ref(),
        &project_id,
        &state.report.consultancy,
    )
    .await?;

    let options = ExportOptions::from(state.report.as_ref());
    let body = report::render(&assembled, format, &options).map_err(|e| {
        error!("Failed to render report: {}", e);
        ApiError::Internal(format!("Failed to render report: {}", e))
    })?;

    Ok(([(header::CONTENT_TYPE, format.content_type())], body).into_response())
}
