//! Access to the backing store.
//!
//! Every read and write goes through the [`Backend`] trait. [`RestBackend`]
//! talks to the hosted REST and auth APIs; [`MemoryBackend`] serves a JSON
//! snapshot in-process.

pub mod memory;
pub mod rest;

pub use memory::{MemoryBackend, Snapshot};
pub use rest::RestBackend;

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::models::{
    AuthUser, ClientUser, ClimateResponse, Company, DiscEvaluation, Employee, EmployeePatch,
    HrIndicators, NewEmployee, Project,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Row and account operations offered by the backing store.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn company(&self, id: &str) -> Result<Company, BackendError>;

    async fn project(&self, id: &str) -> Result<Project, BackendError>;

    /// Most recently created project of a company.
    async fn latest_project_for_company(
        &self,
        company_id: &str,
    ) -> Result<Option<Project>, BackendError>;

    async fn active_employees(&self, company_id: &str) -> Result<Vec<Employee>, BackendError>;

    async fn employee(&self, id: &str) -> Result<Employee, BackendError>;

    async fn insert_employee(&self, employee: &NewEmployee) -> Result<Employee, BackendError>;

    async fn update_employee(&self, id: &str, patch: &EmployeePatch) -> Result<(), BackendError>;

    async fn climate_responses(
        &self,
        project_id: &str,
    ) -> Result<Vec<ClimateResponse>, BackendError>;

    async fn insert_climate_response(&self, response: &ClimateResponse)
        -> Result<(), BackendError>;

    async fn disc_evaluations(&self, project_id: &str)
        -> Result<Vec<DiscEvaluation>, BackendError>;

    async fn insert_disc_evaluation(&self, evaluation: &DiscEvaluation)
        -> Result<(), BackendError>;

    /// Most recent HR indicators recorded for a project.
    async fn latest_hr_indicators(
        &self,
        project_id: &str,
    ) -> Result<Option<HrIndicators>, BackendError>;

    /// Store a project's HR diagnosis: the existing row is updated, or a
    /// new one inserted. Returns the stored row.
    async fn save_hr_indicators(
        &self,
        indicators: &HrIndicators,
    ) -> Result<HrIndicators, BackendError>;

    /// Number of HR diagnoses recorded across all projects.
    async fn hr_indicator_count(&self) -> Result<usize, BackendError>;

    /// Every project, newest first.
    async fn all_projects(&self) -> Result<Vec<Project>, BackendError>;

    /// Projects of a company, most recently updated first.
    async fn company_projects(&self, company_id: &str) -> Result<Vec<Project>, BackendError>;

    async fn all_climate_responses(&self) -> Result<Vec<ClimateResponse>, BackendError>;

    /// Client profile linked to an auth account.
    async fn client_user(&self, auth_user_id: &str) -> Result<ClientUser, BackendError>;

    /// Create a confirmed auth account.
    async fn create_auth_user(&self, email: &str, password: &str)
        -> Result<AuthUser, BackendError>;

    async fn delete_auth_user(&self, user_id: &str) -> Result<(), BackendError>;

    async fn insert_client_user(&self, user: &ClientUser) -> Result<(), BackendError>;
}

/// Open the backend selected by the configuration.
///
/// A snapshot path wins over the REST settings.
pub fn connect(config: &BackendConfig, snapshot: Option<&Path>) -> Result<Arc<dyn Backend>> {
    if let Some(path) = snapshot {
        info!("Using snapshot backend: {}", path.display());
        let backend = MemoryBackend::load(path)?;
        return Ok(Arc::new(backend));
    }

    info!("Using REST backend at {}", config.url);
    let backend = RestBackend::new(config).context("Failed to initialize REST backend")?;
    Ok(Arc::new(backend))
}
