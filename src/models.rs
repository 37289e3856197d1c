//! Data models for the consulting backend.
//!
//! Rows mirror the tables of the backing store. Serde renames keep the stored
//! column names on the wire while the Rust fields read in English.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Read a nullable column as the type's default. The REST gateway returns
/// every column with `select=*`, so a missing value arrives as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Rows with a null active flag are treated as active.
fn null_as_active<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// Tables of the backing store used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Companies,
    Projects,
    Employees,
    ClimateResponses,
    DiscEvaluations,
    HrIndicators,
    ClientUsers,
}

impl Table {
    /// Name of the table as exposed by the REST gateway.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Companies => "EMPRESAS",
            Table::Projects => "PROJETOS",
            Table::Employees => "FUNCIONARIOS",
            Table::ClimateResponses => "RESPOSTAS_INDIVIDUAIS_CLIMA",
            Table::DiscEvaluations => "AVALIACOES_DISC",
            Table::HrIndicators => "INDICADORES_RH",
            Table::ClientUsers => "USUARIOS_CLIENTE",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a consulting project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "ATIVO")]
    Active,
    #[serde(rename = "PAUSADO")]
    Paused,
    #[serde(rename = "CONCLUIDO")]
    Completed,
    #[serde(rename = "CANCELADO")]
    Cancelled,
    #[serde(rename = "PROSPECCAO")]
    Prospect,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Active => write!(f, "Ativo"),
            ProjectStatus::Paused => write!(f, "Pausado"),
            ProjectStatus::Completed => write!(f, "Concluído"),
            ProjectStatus::Cancelled => write!(f, "Cancelado"),
            ProjectStatus::Prospect => write!(f, "Prospecção"),
        }
    }
}

/// A client company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(rename = "cd_empresa")]
    pub id: String,
    #[serde(rename = "nm_fantasia")]
    pub trade_name: String,
    #[serde(rename = "ds_razao_social", default, skip_serializing_if = "Option::is_none")]
    pub legal_name: Option<String>,
}

/// How close a project is to exhausting its contracted hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressBand {
    Normal,
    Warning,
    Critical,
}

/// A consulting engagement with a client company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "cd_projeto")]
    pub id: String,
    #[serde(rename = "cd_empresa")]
    pub company_id: String,
    #[serde(rename = "nr_horas_contratadas", default, deserialize_with = "null_as_default")]
    pub hours_contracted: u32,
    #[serde(rename = "nr_horas_consumidas", default, deserialize_with = "null_as_default")]
    pub hours_consumed: u32,
    #[serde(rename = "tp_status", default, deserialize_with = "null_as_default")]
    pub status: ProjectStatus,
    #[serde(rename = "dt_prazo_estimado", default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "ts_criacao", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "ts_atualizacao", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Consumed hours as a percentage of the contract, capped at 100.
    pub fn hours_progress(&self) -> f64 {
        if self.hours_contracted == 0 {
            return 0.0;
        }
        let pct = self.hours_consumed as f64 / self.hours_contracted as f64 * 100.0;
        pct.min(100.0)
    }

    pub fn progress_band(&self) -> ProgressBand {
        let pct = self.hours_progress();
        if pct >= 90.0 {
            ProgressBand::Critical
        } else if pct >= 75.0 {
            ProgressBand::Warning
        } else {
            ProgressBand::Normal
        }
    }
}

/// One of the four DISC behavioral letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiscLetter {
    D,
    I,
    S,
    C,
}

impl DiscLetter {
    /// Canonical order, also used to break ties.
    pub const ALL: [DiscLetter; 4] = [DiscLetter::D, DiscLetter::I, DiscLetter::S, DiscLetter::C];

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'D' => Some(DiscLetter::D),
            'I' => Some(DiscLetter::I),
            'S' => Some(DiscLetter::S),
            'C' => Some(DiscLetter::C),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            DiscLetter::D => 'D',
            DiscLetter::I => 'I',
            DiscLetter::S => 'S',
            DiscLetter::C => 'C',
        }
    }

    /// Trait name shown in reports.
    pub fn trait_name(&self) -> &'static str {
        match self {
            DiscLetter::D => "Dominância",
            DiscLetter::I => "Influência",
            DiscLetter::S => "Estabilidade",
            DiscLetter::C => "Conformidade",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            DiscLetter::D => 0,
            DiscLetter::I => 1,
            DiscLetter::S => 2,
            DiscLetter::C => 3,
        }
    }
}

impl fmt::Display for DiscLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Raw questionnaire answers: group id -> (word -> rank).
///
/// Group ids stay strings because the store keeps them as JSON object keys.
pub type RawAnswers = BTreeMap<String, BTreeMap<String, u8>>;

/// The JSON score sheet stored on an employee.
///
/// Unknown keys written by other tools are kept in `extra` so an update
/// never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscScoreSheet {
    #[serde(rename = "D", default, skip_serializing_if = "Option::is_none")]
    pub d: Option<u32>,
    #[serde(rename = "I", default, skip_serializing_if = "Option::is_none")]
    pub i: Option<u32>,
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u32>,
    #[serde(rename = "C", default, skip_serializing_if = "Option::is_none")]
    pub c: Option<u32>,
    #[serde(rename = "aderencia", default, skip_serializing_if = "Option::is_none")]
    pub adherence: Option<u32>,
    #[serde(rename = "respostas_brutas", default, skip_serializing_if = "Option::is_none")]
    pub raw_answers: Option<RawAnswers>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An employee of a client company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(rename = "cd_funcionario")]
    pub id: String,
    #[serde(rename = "cd_empresa", default, deserialize_with = "null_as_default")]
    pub company_id: String,
    #[serde(rename = "nm_completo")]
    pub full_name: String,
    #[serde(rename = "cd_lider", default)]
    pub supervisor_id: Option<String>,
    #[serde(rename = "cd_cargo", default)]
    pub role_id: Option<String>,
    #[serde(rename = "sg_perfil_disc", default)]
    pub disc_profile: Option<String>,
    #[serde(rename = "js_pontuacao_disc", default)]
    pub disc_scores: Option<DiscScoreSheet>,
    #[serde(
        rename = "sn_ativo",
        default = "default_active",
        deserialize_with = "null_as_active"
    )]
    pub active: bool,
    #[serde(rename = "dt_admissao", default)]
    pub hired_on: Option<NaiveDate>,
}

fn default_active() -> bool {
    true
}

impl Employee {
    /// Leading letter of the profile code, if it is a DISC letter.
    pub fn primary_letter(&self) -> Option<DiscLetter> {
        self.disc_profile
            .as_deref()
            .and_then(|code| code.trim().chars().next())
            .and_then(DiscLetter::from_char)
    }
}

/// Payload for inserting an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    #[serde(rename = "cd_empresa")]
    pub company_id: String,
    #[serde(rename = "nm_completo")]
    pub full_name: String,
    #[serde(rename = "cd_lider", default)]
    pub supervisor_id: Option<String>,
    #[serde(rename = "cd_cargo", default)]
    pub role_id: Option<String>,
    #[serde(rename = "sg_perfil_disc", default)]
    pub disc_profile: Option<String>,
    #[serde(rename = "dt_admissao", default)]
    pub hired_on: Option<NaiveDate>,
}

/// Partial update of an employee row. `None` leaves a column untouched,
/// `Some(None)` writes NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmployeePatch {
    #[serde(rename = "nm_completo", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(rename = "cd_lider", skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<Option<String>>,
    #[serde(rename = "cd_cargo", skip_serializing_if = "Option::is_none")]
    pub role_id: Option<Option<String>>,
    #[serde(rename = "sg_perfil_disc", skip_serializing_if = "Option::is_none")]
    pub disc_profile: Option<Option<String>>,
    #[serde(rename = "js_pontuacao_disc", skip_serializing_if = "Option::is_none")]
    pub disc_scores: Option<DiscScoreSheet>,
    #[serde(rename = "dt_admissao", skip_serializing_if = "Option::is_none")]
    pub hired_on: Option<Option<NaiveDate>>,
    #[serde(rename = "sn_ativo", skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl EmployeePatch {
    /// Apply the patch to an in-memory row.
    pub fn apply(&self, employee: &mut Employee) {
        if let Some(ref name) = self.full_name {
            employee.full_name = name.clone();
        }
        if let Some(ref supervisor) = self.supervisor_id {
            employee.supervisor_id = supervisor.clone();
        }
        if let Some(ref role) = self.role_id {
            employee.role_id = role.clone();
        }
        if let Some(ref profile) = self.disc_profile {
            employee.disc_profile = profile.clone();
        }
        if let Some(ref scores) = self.disc_scores {
            employee.disc_scores = Some(scores.clone());
        }
        if let Some(hired_on) = self.hired_on {
            employee.hired_on = hired_on;
        }
        if let Some(active) = self.active {
            employee.active = active;
        }
    }
}

/// The six dimensions of the climate survey, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimateDimension {
    Leadership,
    Communication,
    Recognition,
    Development,
    Environment,
    Engagement,
}

impl ClimateDimension {
    pub const ALL: [ClimateDimension; 6] = [
        ClimateDimension::Leadership,
        ClimateDimension::Communication,
        ClimateDimension::Recognition,
        ClimateDimension::Development,
        ClimateDimension::Environment,
        ClimateDimension::Engagement,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ClimateDimension::Leadership => "Liderança",
            ClimateDimension::Communication => "Comunicação",
            ClimateDimension::Recognition => "Reconhecimento",
            ClimateDimension::Development => "Desenvolvimento",
            ClimateDimension::Environment => "Ambiente",
            ClimateDimension::Engagement => "Engajamento",
        }
    }
}

impl fmt::Display for ClimateDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One respondent's answers to the climate survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateResponse {
    #[serde(rename = "cd_projeto")]
    pub project_id: String,
    #[serde(rename = "nr_lideranca")]
    pub leadership: u8,
    #[serde(rename = "nr_comunicac")]
    pub communication: u8,
    #[serde(rename = "nr_reconhecir")]
    pub recognition: u8,
    #[serde(rename = "nr_desenvolvi")]
    pub development: u8,
    #[serde(rename = "nr_ambiente")]
    pub environment: u8,
    #[serde(rename = "nr_engajamen")]
    pub engagement: u8,
    #[serde(rename = "ds_comentario", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ClimateResponse {
    pub fn score(&self, dimension: ClimateDimension) -> u8 {
        match dimension {
            ClimateDimension::Leadership => self.leadership,
            ClimateDimension::Communication => self.communication,
            ClimateDimension::Recognition => self.recognition,
            ClimateDimension::Development => self.development,
            ClimateDimension::Environment => self.environment,
            ClimateDimension::Engagement => self.engagement,
        }
    }

    /// Check that every score is on the 1-10 scale.
    pub fn validate(&self) -> Result<(), String> {
        for dimension in ClimateDimension::ALL {
            let score = self.score(dimension);
            if !(1..=10).contains(&score) {
                return Err(format!(
                    "{} score must be between 1 and 10, got {}",
                    dimension.label(),
                    score
                ));
            }
        }
        Ok(())
    }
}

/// A stored DISC evaluation of one employee within a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscEvaluation {
    #[serde(rename = "cd_projeto")]
    pub project_id: String,
    #[serde(rename = "cd_funcionario")]
    pub employee_id: String,
    #[serde(rename = "nm_colaborador", default, deserialize_with = "null_as_default")]
    pub employee_name: String,
    #[serde(rename = "nr_dominancia", default, deserialize_with = "null_as_default")]
    pub dominance: u32,
    #[serde(rename = "nr_influencia", default, deserialize_with = "null_as_default")]
    pub influence: u32,
    #[serde(rename = "nr_estabilidade", default, deserialize_with = "null_as_default")]
    pub steadiness: u32,
    #[serde(rename = "nr_conformidade", default, deserialize_with = "null_as_default")]
    pub conformity: u32,
}

impl DiscEvaluation {
    pub fn trait_score(&self, letter: DiscLetter) -> u32 {
        match letter {
            DiscLetter::D => self.dominance,
            DiscLetter::I => self.influence,
            DiscLetter::S => self.steadiness,
            DiscLetter::C => self.conformity,
        }
    }
}

/// HR diagnostic indicators recorded for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrIndicators {
    #[serde(rename = "cd_projeto")]
    pub project_id: String,
    #[serde(rename = "nr_maturidade_rh", default, deserialize_with = "null_as_default")]
    pub maturity: u32,
    #[serde(rename = "nr_risco_trabalhista", default, deserialize_with = "null_as_default")]
    pub labor_risk: u32,
    #[serde(rename = "nr_turnover", default, skip_serializing_if = "Option::is_none")]
    pub turnover: Option<f64>,
    #[serde(rename = "nr_absenteismo", default, skip_serializing_if = "Option::is_none")]
    pub absenteeism: Option<f64>,
    #[serde(rename = "ds_observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "ts_criacao", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Link between an auth account and the client company it may access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientUser {
    #[serde(rename = "cd_auth_supabase")]
    pub auth_user_id: String,
    #[serde(rename = "cd_empresa")]
    pub company_id: String,
    #[serde(rename = "nm_usuario")]
    pub name: String,
    #[serde(rename = "ds_email")]
    pub email: String,
}

/// An account of the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}
