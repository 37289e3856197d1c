//! Multi-step workflows over a [`Backend`](crate::backend::Backend).
//!
//! Each workflow reads what it needs, validates, then writes. Nothing is
//! written before validation passes.

pub mod diagnosis;
pub mod portal;
pub mod provisioning;
pub mod reports;
pub mod surveys;
pub mod team;

use crate::analysis::questionnaire::QuestionnaireError;
use crate::error::{ApiError, BackendError};
use thiserror::Error;

/// Failure of a survey or team workflow.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Input rejected before reaching the store.
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Questionnaire(#[from] QuestionnaireError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Invalid(msg) => ApiError::BadRequest(msg),
            ServiceError::Questionnaire(e) => ApiError::BadRequest(e.to_string()),
            ServiceError::Backend(e) => e.into(),
        }
    }
}
