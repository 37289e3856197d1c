//! Client portal: what a client login sees of its own company.

use crate::analysis::summarize_climate;
use crate::backend::Backend;
use crate::error::BackendError;
use crate::models::{Company, Project};
use serde::Serialize;
use tracing::info;

/// Progress of the consulting work on the client's current project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortalProgress {
    pub project_id: String,
    pub has_diagnosis: bool,
    pub climate_responses: usize,
    /// Overall climate index, once the survey has answers.
    pub climate_index: Option<u32>,
    pub disc_evaluations: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientPortal {
    pub company: Company,
    /// Most recently updated first.
    pub projects: Vec<Project>,
    /// Of the first project, `None` when the company has none.
    pub progress: Option<PortalProgress>,
}

/// Portal view for an auth account linked to a client company.
pub async fn client_portal(
    backend: &dyn Backend,
    auth_user_id: &str,
) -> Result<ClientPortal, BackendError> {
    let user = backend.client_user(auth_user_id).await?;
    let (company, projects) = futures::try_join!(
        backend.company(&user.company_id),
        backend.company_projects(&user.company_id),
    )?;

    let progress = match projects.first() {
        Some(current) => {
            let (hr, responses, evaluations) = futures::try_join!(
                backend.latest_hr_indicators(&current.id),
                backend.climate_responses(&current.id),
                backend.disc_evaluations(&current.id),
            )?;
            Some(PortalProgress {
                project_id: current.id.clone(),
                has_diagnosis: hr.is_some(),
                climate_responses: responses.len(),
                climate_index: summarize_climate(&responses).map(|s| s.overall_rounded()),
                disc_evaluations: evaluations.len(),
            })
        }
        None => None,
    };

    info!(
        "Portal for {} ({}): {} projects",
        user.email,
        company.trade_name,
        projects.len()
    );
    Ok(ClientPortal {
        company,
        projects,
        progress,
    })
}
