//! In-process backend seeded from a JSON snapshot.
//!
//! Enforces the schema constraints the workflows rely on: unique auth
//! emails, existing foreign keys, and the auth service's password rule.

use super::Backend;
use crate::error::BackendError;
use crate::models::{
    AuthUser, ClientUser, ClimateResponse, Company, DiscEvaluation, Employee, EmployeePatch,
    HrIndicators, NewEmployee, Project, Table,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

/// Every table the crate reads or writes, as plain rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub companies: Vec<Company>,
    pub projects: Vec<Project>,
    pub employees: Vec<Employee>,
    pub climate_responses: Vec<ClimateResponse>,
    pub disc_evaluations: Vec<DiscEvaluation>,
    pub hr_indicators: Vec<HrIndicators>,
    pub client_users: Vec<ClientUser>,
    pub auth_users: Vec<AuthUser>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
    }
}

pub struct MemoryBackend {
    state: RwLock<Snapshot>,
}

impl MemoryBackend {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(Snapshot::load(path)?))
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.clone()
    }
}

fn foreign_key_violation(table: Table, column: &str, value: &str) -> BackendError {
    BackendError::rejected(
        409,
        format!(
            "insert or update on table \"{}\" violates foreign key constraint on {} ({})",
            table, column, value
        ),
    )
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn company(&self, id: &str) -> Result<Company, BackendError> {
        let state = self.state.read().await;
        state
            .companies
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("company", id))
    }

    async fn project(&self, id: &str) -> Result<Project, BackendError> {
        let state = self.state.read().await;
        state
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("project", id))
    }

    async fn latest_project_for_company(
        &self,
        company_id: &str,
    ) -> Result<Option<Project>, BackendError> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .iter()
            .filter(|p| p.company_id == company_id)
            .max_by_key(|p| p.created_at)
            .cloned())
    }

    async fn active_employees(&self, company_id: &str) -> Result<Vec<Employee>, BackendError> {
        let state = self.state.read().await;
        let mut employees: Vec<Employee> = state
            .employees
            .iter()
            .filter(|e| e.company_id == company_id && e.active)
            .cloned()
            .collect();
        employees.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(employees)
    }

    async fn employee(&self, id: &str) -> Result<Employee, BackendError> {
        let state = self.state.read().await;
        state
            .employees
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("employee", id))
    }

    async fn insert_employee(&self, employee: &NewEmployee) -> Result<Employee, BackendError> {
        let mut state = self.state.write().await;

        if !state.companies.iter().any(|c| c.id == employee.company_id) {
            return Err(foreign_key_violation(
                Table::Employees,
                "cd_empresa",
                &employee.company_id,
            ));
        }
        if let Some(ref supervisor) = employee.supervisor_id {
            if !state.employees.iter().any(|e| &e.id == supervisor) {
                return Err(foreign_key_violation(Table::Employees, "cd_lider", supervisor));
            }
        }

        let row = Employee {
            id: Uuid::new_v4().to_string(),
            company_id: employee.company_id.clone(),
            full_name: employee.full_name.clone(),
            supervisor_id: employee.supervisor_id.clone(),
            role_id: employee.role_id.clone(),
            disc_profile: employee.disc_profile.clone(),
            disc_scores: None,
            active: true,
            hired_on: employee.hired_on,
        };
        debug!("Inserted employee {}", row.id);
        state.employees.push(row.clone());
        Ok(row)
    }

    async fn update_employee(&self, id: &str, patch: &EmployeePatch) -> Result<(), BackendError> {
        let mut state = self.state.write().await;

        if let Some(Some(ref supervisor)) = patch.supervisor_id {
            if !state.employees.iter().any(|e| &e.id == supervisor) {
                return Err(foreign_key_violation(Table::Employees, "cd_lider", supervisor));
            }
        }

        let employee = state
            .employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| BackendError::not_found("employee", id))?;
        patch.apply(employee);
        Ok(())
    }

    async fn climate_responses(
        &self,
        project_id: &str,
    ) -> Result<Vec<ClimateResponse>, BackendError> {
        let state = self.state.read().await;
        Ok(state
            .climate_responses
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn insert_climate_response(
        &self,
        response: &ClimateResponse,
    ) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        if !state.projects.iter().any(|p| p.id == response.project_id) {
            return Err(foreign_key_violation(
                Table::ClimateResponses,
                "cd_projeto",
                &response.project_id,
            ));
        }
        state.climate_responses.push(response.clone());
        Ok(())
    }

    async fn disc_evaluations(
        &self,
        project_id: &str,
    ) -> Result<Vec<DiscEvaluation>, BackendError> {
        let state = self.state.read().await;
        Ok(state
            .disc_evaluations
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn insert_disc_evaluation(
        &self,
        evaluation: &DiscEvaluation,
    ) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        if !state.projects.iter().any(|p| p.id == evaluation.project_id) {
            return Err(foreign_key_violation(
                Table::DiscEvaluations,
                "cd_projeto",
                &evaluation.project_id,
            ));
        }
        if !state.employees.iter().any(|e| e.id == evaluation.employee_id) {
            return Err(foreign_key_violation(
                Table::DiscEvaluations,
                "cd_funcionario",
                &evaluation.employee_id,
            ));
        }
        state.disc_evaluations.push(evaluation.clone());
        Ok(())
    }

    async fn latest_hr_indicators(
        &self,
        project_id: &str,
    ) -> Result<Option<HrIndicators>, BackendError> {
        let state = self.state.read().await;
        Ok(state
            .hr_indicators
            .iter()
            .filter(|i| i.project_id == project_id)
            .max_by_key(|i| i.created_at)
            .cloned())
    }

    async fn save_hr_indicators(
        &self,
        indicators: &HrIndicators,
    ) -> Result<HrIndicators, BackendError> {
        let mut state = self.state.write().await;
        if !state.projects.iter().any(|p| p.id == indicators.project_id) {
            return Err(foreign_key_violation(
                Table::HrIndicators,
                "cd_projeto",
                &indicators.project_id,
            ));
        }

        let existing = state
            .hr_indicators
            .iter_mut()
            .find(|i| i.project_id == indicators.project_id);
        let row = match existing {
            Some(row) => {
                let created_at = row.created_at;
                *row = HrIndicators {
                    created_at,
                    ..indicators.clone()
                };
                row.clone()
            }
            None => {
                let row = HrIndicators {
                    created_at: Some(Utc::now()),
                    ..indicators.clone()
                };
                state.hr_indicators.push(row.clone());
                row
            }
        };
        debug!("Saved HR indicators for project {}", row.project_id);
        Ok(row)
    }

    async fn hr_indicator_count(&self) -> Result<usize, BackendError> {
        Ok(self.state.read().await.hr_indicators.len())
    }

    async fn all_projects(&self) -> Result<Vec<Project>, BackendError> {
        let mut projects = self.state.read().await.projects.clone();
        // Descending on Option keeps rows without a timestamp last.
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn company_projects(&self, company_id: &str) -> Result<Vec<Project>, BackendError> {
        let state = self.state.read().await;
        let mut projects: Vec<Project> = state
            .projects
            .iter()
            .filter(|p| p.company_id == company_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }

    async fn all_climate_responses(&self) -> Result<Vec<ClimateResponse>, BackendError> {
        Ok(self.state.read().await.climate_responses.clone())
    }

    async fn client_user(&self, auth_user_id: &str) -> Result<ClientUser, BackendError> {
        let state = self.state.read().await;
        state
            .client_users
            .iter()
            .find(|u| u.auth_user_id == auth_user_id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("client user", auth_user_id))
    }

    async fn create_auth_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, BackendError> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(BackendError::rejected(
                400,
                "Unable to validate email address: invalid format",
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(BackendError::rejected(
                422,
                format!("Password should be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }

        let mut state = self.state.write().await;
        let taken = state
            .auth_users
            .iter()
            .any(|u| u.email.as_deref().map(str::to_lowercase).as_deref() == Some(email.as_str()));
        if taken {
            return Err(BackendError::rejected(
                422,
                "A user with this email address has already been registered",
            ));
        }

        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: Some(email),
        };
        debug!("Created auth user {}", user.id);
        state.auth_users.push(user.clone());
        Ok(user)
    }

    async fn delete_auth_user(&self, user_id: &str) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        let before = state.auth_users.len();
        state.auth_users.retain(|u| u.id != user_id);
        if state.auth_users.len() == before {
            return Err(BackendError::not_found("auth user", user_id));
        }
        Ok(())
    }

    async fn insert_client_user(&self, user: &ClientUser) -> Result<(), BackendError> {
        let mut state = self.state.write().await;

        if !state.companies.iter().any(|c| c.id == user.company_id) {
            return Err(foreign_key_violation(
                Table::ClientUsers,
                "cd_empresa",
                &user.company_id,
            ));
        }
        if !state.auth_users.iter().any(|u| u.id == user.auth_user_id) {
            return Err(foreign_key_violation(
                Table::ClientUsers,
                "cd_auth_supabase",
                &user.auth_user_id,
            ));
        }
        if state
            .client_users
            .iter()
            .any(|u| u.auth_user_id == user.auth_user_id)
        {
            return Err(BackendError::rejected(
                409,
                "duplicate key value violates unique constraint on cd_auth_supabase",
            ));
        }

        state.client_users.push(user.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    fn seeded() -> MemoryBackend {
        let created = |day| Some(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap());
        let project = |id: &str, day| Project {
            id: id.to_string(),
            company_id: "c1".to_string(),
            hours_contracted: 100,
            hours_consumed: 10,
            status: Default::default(),
            due_date: None,
            created_at: created(day),
            updated_at: None,
        };

        MemoryBackend::new(Snapshot {
            companies: vec![Company {
                id: "c1".to_string(),
                trade_name: "Acme".to_string(),
                legal_name: None,
            }],
            projects: vec![project("old", 1), project("new", 20), project("mid", 10)],
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_latest_project_by_creation_time() {
        let backend = seeded();
        let latest = backend.latest_project_for_company("c1").await.unwrap();
        assert_eq!(latest.unwrap().id, "new");
        assert!(backend
            .latest_project_for_company("missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_auth_email_is_unique() {
        let backend = seeded();
        backend.create_auth_user("ana@acme.com", "secret1").await.unwrap();

        let err = backend
            .create_auth_user("ANA@acme.com", "secret2")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 422, .. }));

        let err = backend.create_auth_user("bia@acme.com", "123").await.unwrap_err();
        assert!(err.to_string().contains("at least 6"));
    }

    #[tokio::test]
    async fn test_client_user_requires_company() {
        let backend = seeded();
        let user = backend.create_auth_user("ana@acme.com", "secret1").await.unwrap();

        let err = backend
            .insert_client_user(&ClientUser {
                auth_user_id: user.id.clone(),
                company_id: "ghost".to_string(),
                name: "Ana".to_string(),
                email: "ana@acme.com".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 409, .. }));

        backend.delete_auth_user(&user.id).await.unwrap();
        assert!(backend.snapshot().await.auth_users.is_empty());
        assert!(matches!(
            backend.delete_auth_user(&user.id).await,
            Err(BackendError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_employee_insert_and_update() {
        let backend = seeded();
        let boss = backend
            .insert_employee(&NewEmployee {
                company_id: "c1".to_string(),
                full_name: "Bruno".to_string(),
                supervisor_id: None,
                role_id: None,
                disc_profile: None,
                hired_on: None,
            })
            .await
            .unwrap();

        let patch = EmployeePatch {
            active: Some(false),
            ..Default::default()
        };
        backend.update_employee(&boss.id, &patch).await.unwrap();
        assert!(backend.active_employees("c1").await.unwrap().is_empty());

        assert!(matches!(
            backend.update_employee("nobody", &patch).await,
            Err(BackendError::NotFound { .. })
        ));

        let orphan = NewEmployee {
            company_id: "c1".to_string(),
            full_name: "Carla".to_string(),
            supervisor_id: Some("nobody".to_string()),
            role_id: None,
            disc_profile: None,
            hired_on: None,
        };
        assert!(backend.insert_employee(&orphan).await.is_err());
    }

    #[tokio::test]
    async fn test_hr_indicators_saved_once_per_project() {
        let backend = seeded();
        let mut indicators = HrIndicators {
            project_id: "new".to_string(),
            maturity: 40,
            labor_risk: 70,
            turnover: Some(3.5),
            absenteeism: None,
            notes: Some("Sem plano de cargos".to_string()),
            created_at: None,
        };

        let first = backend.save_hr_indicators(&indicators).await.unwrap();
        assert!(first.created_at.is_some());

        indicators.maturity = 65;
        indicators.notes = None;
        let second = backend.save_hr_indicators(&indicators).await.unwrap();
        assert_eq!(second.created_at, first.created_at);

        let stored = backend.snapshot().await.hr_indicators;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].maturity, 65);
        assert_eq!(backend.hr_indicator_count().await.unwrap(), 1);

        indicators.project_id = "ghost".to_string();
        assert!(matches!(
            backend.save_hr_indicators(&indicators).await,
            Err(BackendError::Rejected { status: 409, .. })
        ));
    }

    #[tokio::test]
    async fn test_project_listings_keep_missing_timestamps_last() {
        let backend = seeded();
        {
            let mut state = backend.state.write().await;
            state.projects.push(Project {
                id: "undated".to_string(),
                company_id: "c1".to_string(),
                hours_contracted: 0,
                hours_consumed: 0,
                status: Default::default(),
                due_date: None,
                created_at: None,
                updated_at: None,
            });
            let touched = Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();
            state.projects[2].updated_at = Some(touched);
        }

        let ids: Vec<String> = backend
            .all_projects()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old", "undated"]);

        let by_update = backend.company_projects("c1").await.unwrap();
        assert_eq!(by_update[0].id, "mid");
        let latest = backend.latest_project_for_company("c1").await.unwrap();
        assert_eq!(latest.unwrap().id, "new");
    }

    #[test]
    fn test_snapshot_load_with_missing_tables() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"companies": [{{"cd_empresa": "c1", "nm_fantasia": "Acme"}}]}}"#
        )
        .unwrap();

        let snapshot = Snapshot::load(file.path()).unwrap();
        assert_eq!(snapshot.companies.len(), 1);
        assert!(snapshot.employees.is_empty());
    }
}
