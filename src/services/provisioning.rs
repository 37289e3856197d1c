//! Client-access provisioning.
//!
//! Creates a confirmed auth account, then links it to a company through a
//! client-user row. If the link cannot be written the account is deleted
//! again so no orphan login survives.

use crate::backend::Backend;
use crate::error::{ApiError, BackendError};
use crate::models::ClientUser;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

/// Body of a provisioning request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "nome")]
    pub name: String,
    #[serde(default, alias = "cd_empresa")]
    pub company_id: String,
}

impl AccessRequest {
    /// Check that every field is present.
    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<&str> = [
            ("email", &self.email),
            ("password", &self.password),
            ("name", &self.name),
            ("company_id", &self.company_id),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| *field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("Missing required fields: {}", missing.join(", ")))
        }
    }
}

/// The account that was created and linked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisionedAccess {
    pub auth_user_id: String,
    pub company_id: String,
    pub email: String,
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("{0}")]
    Invalid(String),

    /// The auth service refused to create the account.
    #[error("{0}")]
    AuthRejected(String),

    /// The client-user row was refused; the account has been removed.
    #[error("{0}")]
    ProfileRejected(String),

    /// The client-user row failed and the account could not be removed.
    #[error("Client profile failed ({profile}); auth user {user_id} not removed: {rollback}")]
    RollbackFailed {
        user_id: String,
        profile: BackendError,
        rollback: BackendError,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ProvisionError {
    /// Whether the caller is at fault (HTTP 400) rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ProvisionError::Invalid(_)
                | ProvisionError::AuthRejected(_)
                | ProvisionError::ProfileRejected(_)
        )
    }
}

impl From<ProvisionError> for ApiError {
    fn from(err: ProvisionError) -> Self {
        if err.is_client_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

/// Create a login for a client company.
pub async fn provision_client_access(
    backend: &dyn Backend,
    request: &AccessRequest,
) -> Result<ProvisionedAccess, ProvisionError> {
    request.validate().map_err(ProvisionError::Invalid)?;

    let email = request.email.trim();
    let company_id = request.company_id.trim();

    let user = match backend.create_auth_user(email, &request.password).await {
        Ok(user) => user,
        Err(BackendError::Rejected { message, .. }) => {
            warn!("Auth service refused account for {}: {}", email, message);
            return Err(ProvisionError::AuthRejected(message));
        }
        Err(e) => return Err(e.into()),
    };
    info!("Created auth user {} for {}", user.id, email);

    let profile = ClientUser {
        auth_user_id: user.id.clone(),
        company_id: company_id.to_string(),
        name: request.name.trim().to_string(),
        email: email.to_string(),
    };

    let profile_err = match backend.insert_client_user(&profile).await {
        Ok(()) => {
            info!("Linked auth user {} to company {}", user.id, company_id);
            return Ok(ProvisionedAccess {
                auth_user_id: user.id,
                company_id: company_id.to_string(),
                email: email.to_string(),
            });
        }
        Err(e) => e,
    };

    warn!(
        "Client profile insert failed for {}: {}; removing auth user",
        user.id, profile_err
    );
    if let Err(rollback) = backend.delete_auth_user(&user.id).await {
        error!("Rollback of auth user {} failed: {}", user.id, rollback);
        return Err(ProvisionError::RollbackFailed {
            user_id: user.id,
            profile: profile_err,
            rollback,
        });
    }

    match profile_err {
        BackendError::Rejected { message, .. } => Err(ProvisionError::ProfileRejected(message)),
        other => Err(ProvisionError::Backend(other)),
    }
}
