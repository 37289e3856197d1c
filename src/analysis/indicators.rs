//! HR diagnostic labels and the executive index.

use crate::models::HrIndicators;

/// Label for the HR maturity score (0-100).
pub fn maturity_label(value: u32) -> &'static str {
    if value < 40 {
        "Iniciante / Crítico"
    } else if value < 75 {
        "Estruturando"
    } else {
        "Avançado / Estratégico"
    }
}

/// Label for the labor-risk score (0-100).
pub fn risk_label(value: u32) -> &'static str {
    if value < 30 {
        "Baixo / Controlado"
    } else if value < 70 {
        "Médio / Atenção"
    } else {
        "Alto Risco / Urgente"
    }
}

/// Overall executive index: mean of maturity, climate and inverted risk.
///
/// Missing inputs count as zero.
pub fn executive_index(indicators: Option<&HrIndicators>, climate_index: Option<f64>) -> u32 {
    let maturity = indicators.map(|i| i.maturity.min(100)).unwrap_or(0) as f64;
    let risk = indicators.map(|i| i.labor_risk.min(100)).unwrap_or(0) as f64;
    let climate = climate_index.map(f64::round).unwrap_or(0.0);

    ((maturity + climate + (100.0 - risk)) / 3.0).round() as u32
}
