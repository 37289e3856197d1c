//! Markdown and JSON report generation.
//!
//! The Markdown document follows the executive report layout: company,
//! project status, HR diagnosis, DISC, climate, overall dashboard and the
//! org chart.

use crate::analysis::orgchart::render_text;
use crate::analysis::{ClimateStatus, ClimateSummary, OrgChart, TeamDiscSummary, TraitAverages};
use crate::models::{Company, DiscLetter, HrIndicators, ProgressBand, Project};
use crate::services::reports::ExecutiveReport;
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// How many of the weakest climate dimensions the report calls out.
const ATTENTION_POINTS: usize = 3;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &ExecutiveReport) -> String {
    let mut output = String::new();

    output.push_str("# Relatório de Consultoria em Gestão de Pessoas\n\n");

    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_company_section(&report.company, &report.org_chart));
    output.push_str(&generate_project_section(report));
    output.push_str(&generate_diagnosis_section(
        report.indicators.as_ref(),
        report.maturity_label,
        report.risk_label,
    ));
    output.push_str(&generate_disc_section(
        report.disc_traits.as_ref(),
        report.team_disc.as_ref(),
    ));
    output.push_str(&generate_climate_section(report.climate.as_ref()));
    output.push_str(&generate_dashboard_section(report));
    output.push_str(&generate_org_chart_section(&report.org_chart));
    output.push_str(&generate_footer(&report.consultancy));

    output
}

fn generate_metadata_section(report: &ExecutiveReport) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **Empresa:** {}\n", report.company.trade_name));
    section.push_str(&format!("- **Consultoria:** {}\n", report.consultancy));
    section.push_str(&format!(
        "- **Data:** {}\n",
        report.generated_at.format("%d/%m/%Y")
    ));
    section.push_str(&format!("- **Projeto:** `{}`\n", report.project.id));
    section.push('\n');

    section
}

fn generate_company_section(company: &Company, chart: &OrgChart) -> String {
    let mut section = String::new();

    section.push_str("## 1. Dados da Empresa\n\n");
    section.push_str(&company.trade_name);
    if let Some(ref legal_name) = company.legal_name {
        section.push_str(&format!(" ({})", legal_name));
    }
    section.push_str(&format!(
        " • {} colaboradores ativos\n\n",
        chart.len() + chart.unplaced.len()
    ));

    section
}

fn progress_badge(band: ProgressBand) -> &'static str {
    match band {
        ProgressBand::Normal => "🟢",
        ProgressBand::Warning => "🟡",
        ProgressBand::Critical => "🔴",
    }
}

fn generate_project_section(report: &ExecutiveReport) -> String {
    let project: &Project = &report.project;
    let mut section = String::new();

    section.push_str("## 2. Status do Projeto\n\n");
    section.push_str("| Status | Horas | Progresso | Prazo |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");

    let due = project
        .due_date
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "---".to_string());
    section.push_str(&format!(
        "| {} | {}/{}h | {} {:.0}% | {} |\n\n",
        project.status,
        project.hours_consumed,
        project.hours_contracted,
        progress_badge(report.progress_band),
        report.hours_progress,
        due
    ));

    section
}

fn generate_diagnosis_section(
    indicators: Option<&HrIndicators>,
    maturity_label: Option<&str>,
    risk_label: Option<&str>,
) -> String {
    let mut section = String::new();

    section.push_str("## 3. Diagnóstico Inicial\n\n");

    let Some(hr) = indicators else {
        section.push_str("Nenhum indicador de RH registrado para este projeto.\n\n");
        return section;
    };

    section.push_str(&format!(
        "- **Maturidade de RH:** {}/100 ({})\n",
        hr.maturity,
        maturity_label.unwrap_or("---")
    ));
    section.push_str(&format!(
        "- **Risco trabalhista:** {}/100 ({})\n",
        hr.labor_risk,
        risk_label.unwrap_or("---")
    ));
    if let Some(turnover) = hr.turnover {
        section.push_str(&format!("- **Turnover:** {:.1}%\n", turnover));
    }
    if let Some(absenteeism) = hr.absenteeism {
        section.push_str(&format!("- **Absenteísmo:** {:.1}%\n", absenteeism));
    }
    section.push('\n');

    section
}

fn generate_disc_section(traits: Option<&TraitAverages>, team: Option<&TeamDiscSummary>) -> String {
    let mut section = String::new();

    section.push_str("## 4. Análise DISC\n\n");

    if traits.is_none() && team.is_none() {
        section.push_str("Nenhuma avaliação DISC concluída até o momento.\n\n");
        return section;
    }

    if let Some(traits) = traits {
        section.push_str(&format!(
            "Distribuição: {}. Média de {} avaliações individuais.\n\n",
            traits.headline(),
            traits.evaluations
        ));
    }

    if let Some(team) = team {
        section.push_str("| Perfil | Colaboradores | % |\n");
        section.push_str("|:---|:---:|:---:|\n");
        for letter in DiscLetter::ALL {
            let share = team.share(letter);
            section.push_str(&format!(
                "| {} ({}) | {} | {}% |\n",
                letter.trait_name(),
                letter,
                share.count,
                share.percent
            ));
        }
        section.push('\n');
        section.push_str(&format!(
            "Perfil predominante: **{}** • Aderência média: {}%\n\n",
            team.predominant.trait_name(),
            team.average_adherence
        ));
    }

    section
}

fn status_badge(status: ClimateStatus) -> &'static str {
    match status {
        ClimateStatus::Strong => "🟢",
        ClimateStatus::Stable => "🟡",
        ClimateStatus::Sensitive => "🔴",
    }
}

fn generate_climate_section(climate: Option<&ClimateSummary>) -> String {
    let mut section = String::new();

    section.push_str("## 5. Análise de Clima\n\n");

    let Some(climate) = climate else {
        section.push_str("Pesquisa de clima ainda não aplicada.\n\n");
        return section;
    };

    section.push_str(&format!(
        "Índice geral: **{}/100** com base em {} respostas anônimas.\n\n",
        climate.overall_rounded(),
        climate.responses
    ));

    section.push_str("| Dimensão | Pontuação | Status |\n");
    section.push_str("|:---|:---:|:---|\n");
    for dimension in &climate.dimensions {
        section.push_str(&format!(
            "| {} | {} | {} {} |\n",
            dimension.label,
            dimension.rounded(),
            status_badge(dimension.status),
            dimension.status
        ));
    }
    section.push('\n');

    let attention: Vec<_> = climate
        .attention_points()
        .into_iter()
        .filter(|d| d.status != ClimateStatus::Strong)
        .take(ATTENTION_POINTS)
        .collect();
    if !attention.is_empty() {
        section.push_str("### Pontos de Atenção\n\n");
        for dimension in attention {
            section.push_str(&format!("- {} ({})\n", dimension.label, dimension.rounded()));
        }
        section.push('\n');
    }

    if !climate.comments.is_empty() {
        section.push_str("### Comentários\n\n");
        for comment in &climate.comments {
            section.push_str(&format!("> {}\n\n", comment));
        }
    }

    section
}

fn generate_dashboard_section(report: &ExecutiveReport) -> String {
    let mut section = String::new();

    section.push_str("## 6. Dashboard Geral\n\n");
    section.push_str(&format!(
        "Índice Geral de Gestão de Pessoas: **{}/100**\n\n",
        report.executive_index
    ));

    section
}

fn generate_org_chart_section(chart: &OrgChart) -> String {
    let mut section = String::new();

    section.push_str("## 7. Organograma\n\n");

    if chart.is_empty() && chart.unplaced.is_empty() {
        section.push_str("Nenhum colaborador ativo cadastrado.\n\n");
        return section;
    }

    section.push_str("```\n");
    section.push_str(&render_text(chart));
    section.push_str("```\n\n");

    if !chart.unplaced.is_empty() {
        section.push_str(&format!(
            "> ⚠️ {} colaborador(es) com liderança circular fora do organograma: {}\n\n",
            chart.unplaced.len(),
            chart.unplaced.join(", ")
        ));
    }

    section
}

fn generate_footer(consultancy: &str) -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!("*{} • Documento Confidencial*\n", consultancy));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &ExecutiveReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}
