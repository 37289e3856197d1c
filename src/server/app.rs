use super::handlers;
use crate::backend::Backend;
use crate::config::ReportConfig;
use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub report: Arc<ReportConfig>,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, report: ReportConfig) -> Self {
        Self {
            backend,
            report: Arc::new(report),
        }
    }
}

pub fn create_app(state: AppState, cors_origin: &str) -> Result<Router> {
    let cors = if cors_origin.trim() == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origin = cors_origin
            .parse::<HeaderValue>()
            .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = Router::new()
        .route("/health", get(handlers::health_check))
        // Path used by the existing web client
        .route(
            "/api/clientes/criar-acesso",
            post(handlers::create_client_access),
        )
        .nest("/api/v1", api_v1_routes())
        .layer(cors)
        .with_state(state);

    Ok(app)
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/client-access", post(handlers::create_client_access))
        // Project views
        .route("/projects/:id/org-chart", get(handlers::org_chart))
        .route("/projects/:id/disc", get(handlers::disc_summary))
        .route("/projects/:id/climate", get(handlers::climate_summary))
        .route(
            "/projects/:id/climate/responses",
            post(handlers::submit_climate_response),
        )
        .route("/projects/:id/report", get(handlers::executive_report))
        .route(
            "/projects/:id/hr-indicators",
            put(handlers::save_hr_indicators),
        )
        // Client portal and consultancy dashboard
        .route("/portal/:auth_user_id", get(handlers::portal))
        .route("/portfolio", get(handlers::portfolio))
        // Employees
        .route("/employees", post(handlers::create_employee))
        .route(
            "/employees/:id",
            put(handlers::update_employee).delete(handlers::deactivate_employee),
        )
        .route("/employees/:id/disc", post(handlers::submit_disc_answers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::services::fixtures;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    fn setup() -> (TestServer, Arc<MemoryBackend>) {
        let backend = Arc::new(fixtures::backend());
        let state = AppState::new(backend.clone(), ReportConfig::default());
        let app = create_app(state, "*").unwrap();
        (TestServer::new(app).unwrap(), backend)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (server, _) = setup();
        let response = server.get("/health").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["service"], "consultdesk");
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_provisioning_success() {
        let (server, backend) = setup();
        let response = server
            .post("/api/clientes/criar-acesso")
            .json(&json!({
                "email": "cliente@acme.com",
                "password": "s3cret!",
                "nome": "Cliente Acme",
                "cd_empresa": "c1"
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>(), json!({"success": true}));
        assert_eq!(backend.snapshot().await.client_users.len(), 1);
    }

    #[tokio::test]
    async fn test_provisioning_profile_failure_rolls_back() {
        let (server, backend) = setup();
        let response = server
            .post("/api/v1/client-access")
            .json(&json!({
                "email": "cliente@acme.com",
                "password": "s3cret!",
                "name": "Cliente",
                "company_id": "does-not-exist"
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("foreign key"));

        let state = backend.snapshot().await;
        assert!(state.auth_users.is_empty());
        assert!(state.client_users.is_empty());
    }

    #[tokio::test]
    async fn test_provisioning_rejects_malformed_body() {
        let (server, _) = setup();

        let response = server
            .post("/api/v1/client-access")
            .json(&json!({"email": "a@b.com"}))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["error"]
            .as_str()
            .unwrap()
            .contains("password"));

        let response = server
            .post("/api/v1/client-access")
            .text("not json")
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn test_project_views() {
        let (server, _) = setup();

        let response = server.get("/api/v1/projects/p1/org-chart").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let chart: Value = response.json();
        assert_eq!(chart["roots"][0]["name"], "Ana");

        let response = server.get("/api/v1/projects/p1/climate").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["responses"], 3);

        let response = server.get("/api/v1/projects/p2/climate").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert!(response.json::<Value>()["error"].is_string());

        let response = server.get("/api/v1/projects/p2/disc").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

        let response = server.get("/api/v1/projects/missing/org-chart").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submit_climate_response() {
        let (server, backend) = setup();
        let payload = json!({
            "nr_lideranca": 9, "nr_comunicac": 8, "nr_reconhecir": 7,
            "nr_desenvolvi": 6, "nr_ambiente": 5, "nr_engajamen": 4
        });

        let response = server
            .post("/api/v1/projects/p2/climate/responses")
            .json(&payload)
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(backend.climate_responses("p2").await.unwrap().len(), 1);

        let mut invalid = payload.clone();
        invalid["nr_engajamen"] = json!(11);
        let response = server
            .post("/api/v1/projects/p2/climate/responses")
            .json(&invalid)
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_submit_disc_draft() {
        let (server, _) = setup();
        let response = server
            .post("/api/v1/employees/e3/disc")
            .json(&json!({"respostas": {"1": {"FOCADO": 1, "ARTICULADO": 2}}}))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["status"], "draft");
        assert_eq!(body["answered"], 0);
    }

    #[tokio::test]
    async fn test_employee_lifecycle() {
        let (server, backend) = setup();

        let response = server
            .post("/api/v1/employees")
            .json(&json!({"nm_completo": "Davi", "cd_empresa": "c1", "cd_lider": "e2"}))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let id = response.json::<Value>()["cd_funcionario"]
            .as_str()
            .unwrap()
            .to_string();

        let response = server
            .put(&format!("/api/v1/employees/{}", id))
            .json(&json!({"full_name": "Davi Rocha", "supervisor_id": "e1"}))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["cd_lider"], "e1");

        let response = server.delete(&format!("/api/v1/employees/{}", id)).await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
        assert!(!backend.employee(&id).await.unwrap().active);
    }

    #[tokio::test]
    async fn test_save_hr_indicators() {
        let (server, backend) = setup();

        let response = server
            .put("/api/v1/projects/p2/hr-indicators")
            .json(&json!({
                "nr_maturidade_rh": 45,
                "nr_risco_trabalhista": 70,
                "nr_turnover": null,
                "ds_observacoes": "Sem plano de cargos"
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["nr_maturidade_rh"], 45);
        let saved = backend.latest_hr_indicators("p2").await.unwrap().unwrap();
        assert_eq!(saved.notes.as_deref(), Some("Sem plano de cargos"));

        let response = server
            .put("/api/v1/projects/p2/hr-indicators")
            .json(&json!({"maturity": 120, "labor_risk": 10}))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let response = server
            .put("/api/v1/projects/missing/hr-indicators")
            .json(&json!({"maturity": 50, "labor_risk": 10}))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_portal_and_portfolio() {
        let (server, backend) = setup();

        let response = server.get("/api/v1/portal/nobody").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

        server
            .post("/api/v1/client-access")
            .json(&json!({
                "email": "cliente@acme.com",
                "password": "s3cret!",
                "name": "Cliente Acme",
                "company_id": "c1"
            }))
            .await;
        let auth_user_id = backend.snapshot().await.client_users[0]
            .auth_user_id
            .clone();

        let response = server.get(&format!("/api/v1/portal/{}", auth_user_id)).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["company"]["nm_fantasia"], "Acme Ltda");
        assert_eq!(body["progress"]["project_id"], "p1");
        assert_eq!(body["progress"]["has_diagnosis"], true);

        let response = server.get("/api/v1/portfolio").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["projects"], 2);
        assert_eq!(body["diagnoses"], 1);
        assert_eq!(body["climate_mean"], 7.8);
    }

    #[tokio::test]
    async fn test_report_formats() {
        let (server, _) = setup();

        let response = server.get("/api/v1/projects/p1/report").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(response.text().starts_with("# Relatório"));

        let response = server
            .get("/api/v1/projects/p1/report")
            .add_query_param("format", "html")
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let html = response.text();
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(!html.contains("oklch("));

        let response = server
            .get("/api/v1/projects/p1/report")
            .add_query_param("format", "pdf")
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
}
