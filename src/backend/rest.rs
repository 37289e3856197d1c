//! Backend over the hosted REST gateway and auth admin API.

use super::Backend;
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::models::{
    AuthUser, ClientUser, ClimateResponse, Company, DiscEvaluation, Employee, EmployeePatch,
    HrIndicators, NewEmployee, Project, Table,
};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub struct RestBackend {
    base_url: String,
    anon_key: Option<String>,
    service_role_key: Option<String>,
    timeout_seconds: u64,
    http_client: reqwest::Client,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: non_empty(config.anon_key.as_deref()),
            service_role_key: non_empty(config.service_role_key.as_deref()),
            timeout_seconds: config.timeout_seconds,
            http_client,
        })
    }

    /// Key for row operations: the service-role key when present, else the
    /// anon key.
    fn row_key(&self) -> Result<&str, BackendError> {
        self.service_role_key
            .as_deref()
            .or(self.anon_key.as_deref())
            .ok_or(BackendError::MissingCredentials("missing backend API key"))
    }

    fn admin_key(&self) -> Result<&str, BackendError> {
        self.service_role_key
            .as_deref()
            .ok_or(BackendError::MissingCredentials("missing service role key"))
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn admin_users_url(&self) -> String {
        format!("{}/auth/v1/admin/users", self.base_url)
    }

    fn authorized(request: RequestBuilder, key: &str) -> RequestBuilder {
        request.header("apikey", key).bearer_auth(key)
    }

    /// Send a request and turn non-2xx answers into `Rejected`.
    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Transport(format!(
                    "Request timed out after {}s",
                    self.timeout_seconds
                ))
            } else if e.is_connect() {
                BackendError::Transport(format!("Cannot connect to {}", self.base_url))
            } else {
                BackendError::Transport(format!("Failed to send request: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Backend answered {}: {}", status, body);
            return Err(BackendError::rejected(
                status.as_u16(),
                error_message(status.as_u16(), &body),
            ));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: Table,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        let key = self.row_key()?;
        debug!("GET {} {:?}", table, filters);

        let request = self
            .http_client
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .query(filters);
        let response = self.send(Self::authorized(request, key)).await?;
        Self::decode(response).await
    }

    async fn select_by_id<T: DeserializeOwned>(
        &self,
        table: Table,
        column: &str,
        id: &str,
        entity: &'static str,
    ) -> Result<T, BackendError> {
        let rows: Vec<T> = self
            .select(table, &[(column, eq(id)), ("limit", "1".to_string())])
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::not_found(entity, id))
    }

    /// Newest row of a table for a foreign key, by creation time.
    async fn select_latest<T: DeserializeOwned>(
        &self,
        table: Table,
        column: &str,
        id: &str,
    ) -> Result<Option<T>, BackendError> {
        let rows: Vec<T> = self
            .select(
                table,
                &[
                    (column, eq(id)),
                    ("order", newest_first("ts_criacao")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert<B, T>(&self, table: Table, row: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let key = self.row_key()?;
        debug!("POST {}", table);

        let request = self
            .http_client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(std::slice::from_ref(row));
        let response = self.send(Self::authorized(request, key)).await?;
        Self::decode(response).await
    }

    async fn insert_row<B: Serialize + Sync>(
        &self,
        table: Table,
        row: &B,
    ) -> Result<(), BackendError> {
        let _: Vec<Value> = self.insert(table, row).await?;
        Ok(())
    }

    /// PATCH the rows where `column` equals `id`; returns the updated rows.
    async fn update<B, T>(
        &self,
        table: Table,
        column: &str,
        id: &str,
        body: &B,
    ) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let key = self.row_key()?;
        debug!("PATCH {} {}", table, id);

        let request = self
            .http_client
            .patch(self.table_url(table))
            .query(&[(column, eq(id))])
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.send(Self::authorized(request, key)).await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn company(&self, id: &str) -> Result<Company, BackendError> {
        self.select_by_id(Table::Companies, "cd_empresa", id, "company")
            .await
    }

    async fn project(&self, id: &str) -> Result<Project, BackendError> {
        self.select_by_id(Table::Projects, "cd_projeto", id, "project")
            .await
    }

    async fn latest_project_for_company(
        &self,
        company_id: &str,
    ) -> Result<Option<Project>, BackendError> {
        self.select_latest(Table::Projects, "cd_empresa", company_id)
            .await
    }

    async fn active_employees(&self, company_id: &str) -> Result<Vec<Employee>, BackendError> {
        self.select(
            Table::Employees,
            &[
                ("cd_empresa", eq(company_id)),
                ("sn_ativo", "eq.true".to_string()),
                ("order", "nm_completo.asc".to_string()),
            ],
        )
        .await
    }

    async fn employee(&self, id: &str) -> Result<Employee, BackendError> {
        self.select_by_id(Table::Employees, "cd_funcionario", id, "employee")
            .await
    }

    async fn insert_employee(&self, employee: &NewEmployee) -> Result<Employee, BackendError> {
        let rows: Vec<Employee> = self.insert(Table::Employees, employee).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode("insert returned no employee row".to_string()))
    }

    async fn update_employee(&self, id: &str, patch: &EmployeePatch) -> Result<(), BackendError> {
        let rows: Vec<Value> = self
            .update(Table::Employees, "cd_funcionario", id, patch)
            .await?;
        if rows.is_empty() {
            return Err(BackendError::not_found("employee", id));
        }
        Ok(())
    }

    async fn climate_responses(
        &self,
        project_id: &str,
    ) -> Result<Vec<ClimateResponse>, BackendError> {
        self.select(
            Table::ClimateResponses,
            &[("cd_projeto", eq(project_id))],
        )
        .await
    }

    async fn insert_climate_response(
        &self,
        response: &ClimateResponse,
    ) -> Result<(), BackendError> {
        self.insert_row(Table::ClimateResponses, response).await
    }

    async fn disc_evaluations(
        &self,
        project_id: &str,
    ) -> Result<Vec<DiscEvaluation>, BackendError> {
        self.select(Table::DiscEvaluations, &[("cd_projeto", eq(project_id))])
            .await
    }

    async fn insert_disc_evaluation(
        &self,
        evaluation: &DiscEvaluation,
    ) -> Result<(), BackendError> {
        self.insert_row(Table::DiscEvaluations, evaluation).await
    }

    async fn latest_hr_indicators(
        &self,
        project_id: &str,
    ) -> Result<Option<HrIndicators>, BackendError> {
        self.select_latest(Table::HrIndicators, "cd_projeto", project_id)
            .await
    }

    async fn save_hr_indicators(
        &self,
        indicators: &HrIndicators,
    ) -> Result<HrIndicators, BackendError> {
        let project_id = indicators.project_id.as_str();
        let updated: Vec<HrIndicators> = self
            .update(Table::HrIndicators, "cd_projeto", project_id, indicators)
            .await?;

        let rows = if updated.is_empty() {
            self.insert(Table::HrIndicators, indicators).await?
        } else {
            updated
        };
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode("save returned no HR indicators row".to_string()))
    }

    async fn hr_indicator_count(&self) -> Result<usize, BackendError> {
        let rows: Vec<Value> = self.select(Table::HrIndicators, &[]).await?;
        Ok(rows.len())
    }

    async fn all_projects(&self) -> Result<Vec<Project>, BackendError> {
        self.select(Table::Projects, &[("order", newest_first("ts_criacao"))])
            .await
    }

    async fn company_projects(&self, company_id: &str) -> Result<Vec<Project>, BackendError> {
        self.select(
            Table::Projects,
            &[
                ("cd_empresa", eq(company_id)),
                ("order", newest_first("ts_atualizacao")),
            ],
        )
        .await
    }

    async fn all_climate_responses(&self) -> Result<Vec<ClimateResponse>, BackendError> {
        self.select(Table::ClimateResponses, &[]).await
    }

    async fn client_user(&self, auth_user_id: &str) -> Result<ClientUser, BackendError> {
        self.select_by_id(
            Table::ClientUsers,
            "cd_auth_supabase",
            auth_user_id,
            "client user",
        )
        .await
    }

    async fn create_auth_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, BackendError> {
        let key = self.admin_key()?;
        debug!("Creating auth user {}", email);

        let request = self.http_client.post(self.admin_users_url()).json(&json!({
            "email": email,
            "password": password,
            "email_confirm": true,
        }));
        let response = self.send(Self::authorized(request, key)).await?;

        // Older auth servers wrap the account in {"user": {...}}.
        let body: Value = Self::decode(response).await?;
        let user = body.get("user").cloned().unwrap_or(body);
        serde_json::from_value(user).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn delete_auth_user(&self, user_id: &str) -> Result<(), BackendError> {
        let key = self.admin_key()?;
        debug!("Deleting auth user {}", user_id);

        let url = format!("{}/{}", self.admin_users_url(), user_id);
        let request = self.http_client.delete(url);
        match self.send(Self::authorized(request, key)).await {
            Ok(_) => Ok(()),
            Err(BackendError::Rejected { status: 404, .. }) => {
                Err(BackendError::not_found("auth user", user_id))
            }
            Err(e) => Err(e),
        }
    }

    async fn insert_client_user(&self, user: &ClientUser) -> Result<(), BackendError> {
        self.insert_row(Table::ClientUsers, user).await
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// Descending order on a timestamp column. Postgres sorts NULLs first on
/// `desc`, so rows without a timestamp are pushed to the end explicitly.
fn newest_first(column: &str) -> String {
    format!("{}.desc.nullslast", column)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Pull a human-readable message out of an error body.
///
/// The REST gateway uses `message`; the auth service uses `msg`,
/// `error_description` or `error`.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for field in ["message", "msg", "error_description", "error"] {
            if let Some(message) = value.get(field).and_then(Value::as_str) {
                if !message.is_empty() {
                    return message.to_string();
                }
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("Backend request failed with status {}", status)
    } else {
        body.to_string()
    }
}
