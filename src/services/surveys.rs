//! Climate survey and DISC questionnaire submissions.

use super::ServiceError;
use crate::analysis::questionnaire::{self, QuestionnaireResult, QUESTION_GROUPS};
use crate::backend::Backend;
use crate::models::{ClimateResponse, DiscEvaluation, EmployeePatch, RawAnswers};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One respondent's answers, before they are attached to a project.
#[derive(Debug, Clone, Deserialize)]
pub struct ClimateAnswers {
    #[serde(rename = "nr_lideranca", alias = "leadership")]
    pub leadership: u8,
    #[serde(rename = "nr_comunicac", alias = "communication")]
    pub communication: u8,
    #[serde(rename = "nr_reconhecir", alias = "recognition")]
    pub recognition: u8,
    #[serde(rename = "nr_desenvolvi", alias = "development")]
    pub development: u8,
    #[serde(rename = "nr_ambiente", alias = "environment")]
    pub environment: u8,
    #[serde(rename = "nr_engajamen", alias = "engagement")]
    pub engagement: u8,
    #[serde(rename = "ds_comentario", alias = "comment", default)]
    pub comment: Option<String>,
}

impl ClimateAnswers {
    pub fn for_project(self, project_id: &str) -> ClimateResponse {
        ClimateResponse {
            project_id: project_id.to_string(),
            leadership: self.leadership,
            communication: self.communication,
            recognition: self.recognition,
            development: self.development,
            environment: self.environment,
            engagement: self.engagement,
            comment: self
                .comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        }
    }
}

/// Record an anonymous climate response for a project.
pub async fn submit_climate_response(
    backend: &dyn Backend,
    project_id: &str,
    answers: ClimateAnswers,
) -> Result<ClimateResponse, ServiceError> {
    let response = answers.for_project(project_id);
    response.validate().map_err(ServiceError::Invalid)?;

    backend.project(project_id).await?;
    backend.insert_climate_response(&response).await?;

    info!("Recorded climate response for project {}", project_id);
    Ok(response)
}

/// Outcome of a questionnaire submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DiscSubmission {
    /// Partial answers saved for later.
    Draft { answered: usize, total: usize },
    /// Scored and stored on the employee.
    Completed {
        #[serde(flatten)]
        result: QuestionnaireResult,
        /// Project the evaluation was recorded against, if the company has one.
        project_id: Option<String>,
    },
}

/// Save or score an employee's questionnaire.
///
/// Incomplete answers are kept as a draft in the employee's score sheet.
/// Complete answers are scored, recorded as an evaluation of the company's
/// most recent project, and written back to the employee with the profile
/// code.
pub async fn submit_disc_answers(
    backend: &dyn Backend,
    employee_id: &str,
    answers: RawAnswers,
) -> Result<DiscSubmission, ServiceError> {
    let employee = backend.employee(employee_id).await?;
    let answered = questionnaire::validate(&answers)?;
    let total = QUESTION_GROUPS.len();

    if answered < total {
        let mut sheet = employee.disc_scores.clone().unwrap_or_default();
        sheet.raw_answers = Some(answers);

        let patch = EmployeePatch {
            disc_scores: Some(sheet),
            ..Default::default()
        };
        backend.update_employee(employee_id, &patch).await?;

        debug!(
            "Saved questionnaire draft for {} ({}/{})",
            employee_id, answered, total
        );
        return Ok(DiscSubmission::Draft { answered, total });
    }

    let result = questionnaire::score(&answers)?;

    let project = backend
        .latest_project_for_company(&employee.company_id)
        .await?;
    if let Some(ref project) = project {
        let evaluation = DiscEvaluation {
            project_id: project.id.clone(),
            employee_id: employee.id.clone(),
            employee_name: employee.full_name.clone(),
            dominance: result.scores[0],
            influence: result.scores[1],
            steadiness: result.scores[2],
            conformity: result.scores[3],
        };
        backend.insert_disc_evaluation(&evaluation).await?;
    }

    let patch = EmployeePatch {
        disc_profile: Some(Some(result.profile.clone())),
        disc_scores: Some(result.to_score_sheet(answers, employee.disc_scores.as_ref())),
        ..Default::default()
    };
    backend.update_employee(employee_id, &patch).await?;

    info!(
        "Scored questionnaire for {}: profile {}",
        employee_id, result.profile
    );
    Ok(DiscSubmission::Completed {
        result,
        project_id: project.map(|p| p.id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::services::fixtures;
    use std::collections::BTreeMap;

    fn answers(groups: usize) -> RawAnswers {
        QUESTION_GROUPS
            .iter()
            .take(groups)
            .map(|g| {
                let ranks: BTreeMap<String, u8> = g
                    .words
                    .iter()
                    .enumerate()
                    .map(|(pos, w)| (w.to_string(), pos as u8 + 1))
                    .collect();
                (g.id.to_string(), ranks)
            })
            .collect()
    }

    fn climate_answers(leadership: u8) -> ClimateAnswers {
        serde_json::from_value(serde_json::json!({
            "nr_lideranca": leadership,
            "nr_comunicac": 7,
            "nr_reconhecir": 9,
            "nr_desenvolvi": 6,
            "nr_ambiente": 8,
            "nr_engajamen": 7,
            "ds_comentario": "  Mais feedback  "
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_climate_response_recorded() {
        let backend = fixtures::backend();
        let response = submit_climate_response(&backend, "p2", climate_answers(8))
            .await
            .unwrap();

        assert_eq!(response.comment.as_deref(), Some("Mais feedback"));
        assert_eq!(backend.climate_responses("p2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_climate_response_validated_before_insert() {
        let backend = fixtures::backend();
        let err = submit_climate_response(&backend, "p2", climate_answers(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));

        let err = submit_climate_response(&backend, "nope", climate_answers(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Backend(BackendError::NotFound { .. })
        ));
        assert!(backend.climate_responses("p2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_questionnaire_saved_as_draft() {
        let backend = fixtures::backend();
        let outcome = submit_disc_answers(&backend, "e3", answers(10)).await.unwrap();
        assert_eq!(outcome, DiscSubmission::Draft { answered: 10, total: 25 });

        let employee = backend.employee("e3").await.unwrap();
        assert!(employee.disc_profile.is_none());
        let sheet = employee.disc_scores.unwrap();
        assert_eq!(sheet.raw_answers.unwrap().len(), 10);
        assert!(sheet.d.is_none());
    }

    #[tokio::test]
    async fn test_complete_questionnaire_scored_and_recorded() {
        let backend = fixtures::backend();
        let outcome = submit_disc_answers(&backend, "e3", answers(25)).await.unwrap();

        match outcome {
            DiscSubmission::Completed { result, project_id } => {
                assert_eq!(result.profile, "DI");
                assert_eq!(project_id.as_deref(), Some("p1"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let employee = backend.employee("e3").await.unwrap();
        assert_eq!(employee.disc_profile.as_deref(), Some("DI"));
        assert_eq!(employee.disc_scores.unwrap().d, Some(50));

        let evaluations = backend.disc_evaluations("p1").await.unwrap();
        assert!(evaluations
            .iter()
            .any(|e| e.employee_id == "e3" && e.dominance == 50));
    }

    #[tokio::test]
    async fn test_invalid_answers_rejected() {
        let backend = fixtures::backend();
        let mut bad = answers(1);
        bad.insert("99".to_string(), BTreeMap::new());

        let err = submit_disc_answers(&backend, "e3", bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Questionnaire(_)));
        assert!(backend.employee("e3").await.unwrap().disc_scores.is_none());
    }

    #[test]
    fn test_completed_outcome_serializes_flat() {
        let outcome = DiscSubmission::Completed {
            result: QuestionnaireResult {
                scores: [50, 33, 17, 0],
                profile: "DI".to_string(),
                adherence: 100,
            },
            project_id: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["profile"], "DI");
    }
}
