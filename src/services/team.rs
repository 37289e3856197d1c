//! Employee maintenance: create, edit, soft delete.

use super::ServiceError;
use crate::backend::Backend;
use crate::models::{Employee, EmployeePatch, NewEmployee};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

/// Editable employee fields as submitted by a form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeForm {
    #[serde(alias = "nm_completo")]
    pub full_name: String,
    #[serde(default, alias = "cd_empresa")]
    pub company_id: Option<String>,
    #[serde(default, alias = "cd_lider")]
    pub supervisor_id: Option<String>,
    #[serde(default, alias = "cd_cargo")]
    pub role_id: Option<String>,
    #[serde(default, alias = "dt_admissao")]
    pub hired_on: Option<NaiveDate>,
}

impl EmployeeForm {
    fn supervisor(&self) -> Option<String> {
        self.supervisor_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }
}

/// Whether making `supervisor` the leader of `employee` closes a loop.
fn creates_cycle(team: &[Employee], employee: &str, supervisor: &str) -> bool {
    let leaders: HashMap<&str, &str> = team
        .iter()
        .filter_map(|e| e.supervisor_id.as_deref().map(|s| (e.id.as_str(), s)))
        .collect();

    let mut current = Some(supervisor);
    let mut steps = 0;
    while let Some(id) = current {
        if id == employee {
            return true;
        }
        // An existing loop further up is not ours to report.
        if steps > team.len() {
            return false;
        }
        steps += 1;
        current = leaders.get(id).copied();
    }
    false
}

/// Insert a new employee, or update `existing` when given.
pub async fn save_employee(
    backend: &dyn Backend,
    existing: Option<&str>,
    form: EmployeeForm,
) -> Result<Employee, ServiceError> {
    let full_name = form.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(ServiceError::Invalid("Employee name is required".to_string()));
    }
    let supervisor = form.supervisor();

    let Some(id) = existing else {
        let company_id = form
            .company_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ServiceError::Invalid("Company is required".to_string()))?;

        let employee = backend
            .insert_employee(&NewEmployee {
                company_id: company_id.to_string(),
                full_name,
                supervisor_id: supervisor,
                role_id: form.role_id,
                disc_profile: None,
                hired_on: form.hired_on,
            })
            .await?;
        info!("Added employee {} to company {}", employee.id, company_id);
        return Ok(employee);
    };

    let current = backend.employee(id).await?;
    if let Some(ref leader) = supervisor {
        if leader == id {
            return Err(ServiceError::Invalid(
                "An employee cannot supervise themselves".to_string(),
            ));
        }
        let team = backend.active_employees(&current.company_id).await?;
        if creates_cycle(&team, id, leader) {
            return Err(ServiceError::Invalid(format!(
                "{} already reports to {}",
                leader, current.full_name
            )));
        }
    }

    let patch = EmployeePatch {
        full_name: Some(full_name),
        supervisor_id: Some(supervisor),
        role_id: Some(form.role_id),
        hired_on: Some(form.hired_on),
        ..Default::default()
    };
    backend.update_employee(id, &patch).await?;
    info!("Updated employee {}", id);

    let mut updated = current;
    patch.apply(&mut updated);
    Ok(updated)
}

/// Soft delete: the row stays, flagged inactive.
pub async fn deactivate_employee(backend: &dyn Backend, id: &str) -> Result<(), ServiceError> {
    let patch = EmployeePatch {
        active: Some(false),
        ..Default::default()
    };
    backend.update_employee(id, &patch).await?;
    info!("Deactivated employee {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::services::fixtures;

    fn form(name: &str, supervisor: Option<&str>) -> EmployeeForm {
        EmployeeForm {
            full_name: name.to_string(),
            company_id: Some("c1".to_string()),
            supervisor_id: supervisor.map(String::from),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_employee() {
        let backend = fixtures::backend();
        let employee = save_employee(&backend, None, form(" Davi ", Some("e2")))
            .await
            .unwrap();

        assert_eq!(employee.full_name, "Davi");
        assert_eq!(employee.supervisor_id.as_deref(), Some("e2"));
        assert_eq!(backend.active_employees("c1").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_update_employee_clears_blank_supervisor() {
        let backend = fixtures::backend();
        let updated = save_employee(&backend, Some("e2"), form("Bruno Lima", Some("")))
            .await
            .unwrap();

        assert_eq!(updated.full_name, "Bruno Lima");
        assert!(updated.supervisor_id.is_none());
        let stored = backend.employee("e2").await.unwrap();
        assert!(stored.supervisor_id.is_none());
        assert_eq!(stored.disc_profile.as_deref(), Some("S"));
    }

    #[tokio::test]
    async fn test_update_rejects_supervisor_loops() {
        let backend = fixtures::backend();

        let err = save_employee(&backend, Some("e1"), form("Ana", Some("e1")))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));

        // e2 reports to e1, so e1 cannot report to e2.
        let err = save_employee(&backend, Some("e1"), form("Ana", Some("e2")))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));
        assert!(backend.employee("e1").await.unwrap().supervisor_id.is_none());
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let backend = fixtures::backend();
        let err = save_employee(&backend, None, form("  ", None)).await.unwrap_err();
        assert_eq!(err.to_string(), "Employee name is required");
    }

    #[tokio::test]
    async fn test_deactivate_is_soft_delete() {
        let backend = fixtures::backend();
        deactivate_employee(&backend, "e3").await.unwrap();

        let active = backend.active_employees("c1").await.unwrap();
        assert!(active.iter().all(|e| e.id != "e3"));
        assert!(!backend.employee("e3").await.unwrap().active);

        let err = deactivate_employee(&backend, "ghost").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Backend(BackendError::NotFound { .. })
        ));
    }

    #[test]
    fn test_creates_cycle() {
        let team = vec![
            fixtures::employee("a", "A", None, None),
            fixtures::employee("b", "B", Some("a"), None),
            fixtures::employee("c", "C", Some("b"), None),
        ];
        assert!(creates_cycle(&team, "a", "c"));
        assert!(!creates_cycle(&team, "c", "a"));
    }
}
