//! Executive report assembly.

use crate::analysis::climate::global_mean;
use crate::analysis::indicators::{self, executive_index};
use crate::analysis::{
    average_traits, build_org_chart, summarize_climate, summarize_team, ClimateSummary, OrgChart,
    TeamDiscSummary, TraitAverages,
};
use crate::backend::Backend;
use crate::error::BackendError;
use crate::models::{Company, HrIndicators, ProgressBand, Project};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Everything the executive report shows about one project.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveReport {
    pub generated_at: DateTime<Utc>,
    pub consultancy: String,
    pub company: Company,
    pub project: Project,
    pub hours_progress: f64,
    pub progress_band: ProgressBand,
    pub indicators: Option<HrIndicators>,
    pub maturity_label: Option<&'static str>,
    pub risk_label: Option<&'static str>,
    pub climate: Option<ClimateSummary>,
    pub disc_traits: Option<TraitAverages>,
    pub team_disc: Option<TeamDiscSummary>,
    pub org_chart: OrgChart,
    pub executive_index: u32,
}

/// Fetch a project's data and build its report.
///
/// The project is read first to learn the company; the remaining reads run
/// concurrently and the first failure cancels the rest.
pub async fn assemble(
    backend: &dyn Backend,
    project_id: &str,
    consultancy: &str,
) -> Result<ExecutiveReport, BackendError> {
    let project = backend.project(project_id).await?;

    let (company, hr, responses, evaluations, employees) = futures::try_join!(
        backend.company(&project.company_id),
        backend.latest_hr_indicators(project_id),
        backend.climate_responses(project_id),
        backend.disc_evaluations(project_id),
        backend.active_employees(&project.company_id),
    )?;

    info!(
        "Assembling report for project {}: {} climate responses, {} evaluations, {} employees",
        project_id,
        responses.len(),
        evaluations.len(),
        employees.len()
    );

    let climate = summarize_climate(&responses);
    let executive_index =
        executive_index(hr.as_ref(), climate.as_ref().map(|c| c.overall_index));

    Ok(ExecutiveReport {
        generated_at: Utc::now(),
        consultancy: consultancy.to_string(),
        hours_progress: project.hours_progress(),
        progress_band: project.progress_band(),
        maturity_label: hr.as_ref().map(|i| indicators::maturity_label(i.maturity)),
        risk_label: hr.as_ref().map(|i| indicators::risk_label(i.labor_risk)),
        indicators: hr,
        climate,
        disc_traits: average_traits(&evaluations),
        team_disc: summarize_team(&employees),
        org_chart: build_org_chart(&employees),
        executive_index,
        company,
        project,
    })
}

/// Org chart of the active employees of a project's company.
pub async fn project_org_chart(
    backend: &dyn Backend,
    project_id: &str,
) -> Result<OrgChart, BackendError> {
    let project = backend.project(project_id).await?;
    let employees = backend.active_employees(&project.company_id).await?;
    Ok(build_org_chart(&employees))
}

/// DISC picture of a project: team profile distribution plus evaluation
/// averages.
#[derive(Debug, Clone, Serialize)]
pub struct DiscOverview {
    pub team: Option<TeamDiscSummary>,
    pub traits: Option<TraitAverages>,
}

/// `None` when neither employees nor evaluations carry DISC data.
pub async fn project_disc(
    backend: &dyn Backend,
    project_id: &str,
) -> Result<Option<DiscOverview>, BackendError> {
    let project = backend.project(project_id).await?;
    let (employees, evaluations) = futures::try_join!(
        backend.active_employees(&project.company_id),
        backend.disc_evaluations(project_id),
    )?;

    let overview = DiscOverview {
        team: summarize_team(&employees),
        traits: average_traits(&evaluations),
    };
    if overview.team.is_none() && overview.traits.is_none() {
        return Ok(None);
    }
    Ok(Some(overview))
}

/// Climate summary of a project, `None` before the first response.
pub async fn project_climate(
    backend: &dyn Backend,
    project_id: &str,
) -> Result<Option<ClimateSummary>, BackendError> {
    backend.project(project_id).await?;
    let responses = backend.climate_responses(project_id).await?;
    Ok(summarize_climate(&responses))
}

/// Consultancy-wide counters across every client project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    /// One report per project.
    pub projects: usize,
    /// Projects with a recorded HR diagnosis.
    pub diagnoses: usize,
    /// Mean climate answer on the 0-10 scale, `None` before any response.
    pub climate_mean: Option<f64>,
    /// Newest first.
    pub recent: Vec<Project>,
}

/// Projects listed in [`PortfolioMetrics::recent`].
const RECENT_PROJECTS: usize = 5;

pub async fn portfolio(backend: &dyn Backend) -> Result<PortfolioMetrics, BackendError> {
    let (mut projects, diagnoses, responses) = futures::try_join!(
        backend.all_projects(),
        backend.hr_indicator_count(),
        backend.all_climate_responses(),
    )?;

    let total = projects.len();
    projects.truncate(RECENT_PROJECTS);
    info!(
        "Portfolio: {} projects, {} diagnoses, {} climate responses",
        total,
        diagnoses,
        responses.len()
    );

    Ok(PortfolioMetrics {
        projects: total,
        diagnoses,
        climate_mean: global_mean(&responses),
        recent: projects,
    })
}
