//! HR diagnosis: the consultant's indicator sheet for a project.

use super::ServiceError;
use crate::backend::Backend;
use crate::models::HrIndicators;
use serde::Deserialize;
use tracing::info;

/// Indicator sheet as submitted by the diagnosis form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HrDiagnosisForm {
    #[serde(alias = "nr_maturidade_rh")]
    pub maturity: u32,
    #[serde(alias = "nr_risco_trabalhista")]
    pub labor_risk: u32,
    #[serde(default, alias = "nr_turnover")]
    pub turnover: Option<f64>,
    #[serde(default, alias = "nr_absenteismo")]
    pub absenteeism: Option<f64>,
    #[serde(default, alias = "ds_observacoes")]
    pub notes: Option<String>,
}

fn check_percentage(name: &str, value: u32) -> Result<(), ServiceError> {
    if value > 100 {
        return Err(ServiceError::Invalid(format!(
            "{} must be between 0 and 100, got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_rate(name: &str, value: Option<f64>) -> Result<(), ServiceError> {
    match value {
        Some(rate) if !rate.is_finite() || rate < 0.0 => Err(ServiceError::Invalid(format!(
            "{} must be a non-negative number",
            name
        ))),
        _ => Ok(()),
    }
}

/// Record the diagnosis of a project. A project keeps a single indicator
/// row; saving again replaces it.
pub async fn save_hr_diagnosis(
    backend: &dyn Backend,
    project_id: &str,
    form: HrDiagnosisForm,
) -> Result<HrIndicators, ServiceError> {
    check_percentage("HR maturity", form.maturity)?;
    check_percentage("Labor risk", form.labor_risk)?;
    check_rate("Turnover", form.turnover)?;
    check_rate("Absenteeism", form.absenteeism)?;

    backend.project(project_id).await?;

    let notes = form
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let saved = backend
        .save_hr_indicators(&HrIndicators {
            project_id: project_id.to_string(),
            maturity: form.maturity,
            labor_risk: form.labor_risk,
            turnover: form.turnover,
            absenteeism: form.absenteeism,
            notes,
            created_at: None,
        })
        .await?;

    info!(
        "Saved HR diagnosis for project {}: maturity {}, labor risk {}",
        project_id, saved.maturity, saved.labor_risk
    );
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::services::fixtures;

    fn form(maturity: u32, labor_risk: u32) -> HrDiagnosisForm {
        HrDiagnosisForm {
            maturity,
            labor_risk,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_replaces_previous_diagnosis() {
        let backend = fixtures::backend();
        let mut sheet = form(85, 10);
        sheet.absenteeism = Some(2.5);
        sheet.notes = Some("  Processos maduros  ".to_string());

        let saved = save_hr_diagnosis(&backend, "p1", sheet).await.unwrap();
        assert_eq!(saved.notes.as_deref(), Some("Processos maduros"));
        assert_eq!(saved.turnover, None);

        let latest = backend.latest_hr_indicators("p1").await.unwrap().unwrap();
        assert_eq!(latest.maturity, 85);
        assert_eq!(latest.absenteeism, Some(2.5));
        assert_eq!(backend.hr_indicator_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_first_diagnosis_of_project() {
        let backend = fixtures::backend();
        let mut sheet = form(20, 90);
        sheet.notes = Some("   ".to_string());

        let saved = save_hr_diagnosis(&backend, "p2", sheet).await.unwrap();
        assert_eq!(saved.notes, None);
        assert!(saved.created_at.is_some());
        assert_eq!(backend.hr_indicator_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_out_of_range_values_rejected() {
        let backend = fixtures::backend();

        let err = save_hr_diagnosis(&backend, "p1", form(101, 0))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HR maturity"));

        let mut sheet = form(50, 50);
        sheet.turnover = Some(-1.0);
        let err = save_hr_diagnosis(&backend, "p1", sheet).await.unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));

        let mut sheet = form(50, 50);
        sheet.absenteeism = Some(f64::NAN);
        assert!(save_hr_diagnosis(&backend, "p1", sheet).await.is_err());

        let latest = backend.latest_hr_indicators("p1").await.unwrap().unwrap();
        assert_eq!(latest.maturity, 60);
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let backend = fixtures::backend();
        let err = save_hr_diagnosis(&backend, "ghost", form(50, 50))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Backend(BackendError::NotFound { .. })
        ));
    }
}
