//! Print-ready HTML export.
//!
//! The capture step that turns the document into a PDF only understands
//! sRGB colors and renders shadows and borders poorly. Before handing the
//! document over, decoration classes are stripped and modern CSS color
//! functions inside the stylesheet and `style` attributes are rewritten to
//! `rgb()`.

use crate::analysis::{ClimateStatus, OrgNode};
use crate::config::ReportConfig;
use crate::models::DiscLetter;
use crate::services::reports::ExecutiveReport;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Remove `shadow*` and `border*` utility classes.
    pub flatten_decorations: bool,
    /// Replacement for color functions that cannot be converted.
    pub color_fallback: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            flatten_decorations: true,
            color_fallback: "rgb(0, 0, 0)".to_string(),
        }
    }
}

impl From<&ReportConfig> for ExportOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            flatten_decorations: config.flatten_decorations,
            color_fallback: config.color_fallback.clone(),
        }
    }
}

fn class_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"class="([^"]*)""#).unwrap())
}

fn color_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(oklch|oklab|color-mix|color|lab|lch)\(").unwrap())
}

/// A `<style>` block, or a `style="..."` attribute.
fn style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)(<style[^>]*>)(.*?)(</style>)|(\sstyle=")([^"]*)(")"#).unwrap()
    })
}

/// Render the report as a standalone HTML document ready for capture.
pub fn render_html(report: &ExecutiveReport, options: &ExportOptions) -> String {
    let document = generate_html_document(report);
    prepare_for_capture(&document, options)
}

/// Apply the capture fixes to an HTML document.
pub fn prepare_for_capture(document: &str, options: &ExportOptions) -> String {
    let flattened = if options.flatten_decorations {
        strip_decoration_classes(document)
    } else {
        document.to_string()
    };
    shim_styles(&flattened, &options.color_fallback)
}

/// Run [`shim_colors`] over the CSS of a document only. Text such as a
/// company called "Lab(Norte)" is not CSS and stays as written.
pub fn shim_styles(html: &str, fallback: &str) -> String {
    style_re()
        .replace_all(html, |caps: &Captures| match caps.get(2) {
            Some(css) => format!(
                "{}{}{}",
                &caps[1],
                shim_colors(css.as_str(), fallback),
                &caps[3]
            ),
            None => format!(
                "{}{}{}",
                &caps[4],
                shim_colors(&caps[5], fallback),
                &caps[6]
            ),
        })
        .into_owned()
}

/// Drop `shadow*` and `border*` tokens from every `class` attribute.
///
/// Variant prefixes count: `print:shadow-none` goes too.
pub fn strip_decoration_classes(html: &str) -> String {
    class_attr_re()
        .replace_all(html, |caps: &Captures| {
            let kept: Vec<&str> = caps[1]
                .split_whitespace()
                .filter(|token| {
                    let utility = token.rsplit(':').next().unwrap_or_default();
                    !(utility.starts_with("shadow") || utility.starts_with("border"))
                })
                .collect();
            format!("class=\"{}\"", kept.join(" "))
        })
        .into_owned()
}

/// Rewrite CSS color functions the capture step cannot parse.
///
/// `oklch()` and `oklab()` are converted to `rgb()`/`rgba()`. `lab()`,
/// `lch()`, `color()` and `color-mix()` become `fallback`, as does any
/// oklch/oklab value that cannot be parsed (e.g. one built from `var()`).
pub fn shim_colors(input: &str, fallback: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;
    let mut replaced = 0usize;

    while let Some(caps) = color_fn_re().captures_at(input, cursor) {
        let Some(whole) = caps.get(0) else { break };
        let name = caps[1].to_lowercase();
        let args_start = whole.end();

        let Some(args_end) = closing_paren(input, args_start) else {
            break;
        };

        output.push_str(&input[cursor..whole.start()]);
        let args = &input[args_start..args_end];
        let converted = match name.as_str() {
            "oklch" => parse_components(args).and_then(|c| oklch_to_rgb(&c)),
            "oklab" => parse_components(args).and_then(|c| oklab_to_rgb(&c)),
            _ => None,
        };
        output.push_str(converted.as_deref().unwrap_or(fallback));
        replaced += 1;

        cursor = args_end + 1;
    }

    output.push_str(&input[cursor..]);
    if replaced > 0 {
        debug!("Rewrote {} CSS color functions", replaced);
    }
    output
}

/// Index of the `)` closing the group that starts at `start`.
fn closing_paren(input: &str, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (offset, ch) in input[start..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// A parsed color component: value plus whether it was a percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Component {
    value: f64,
    percent: bool,
}

/// Split `L C H [/ A]` into components. `none` reads as zero.
fn parse_components(args: &str) -> Option<Vec<Component>> {
    args.replace('/', " / ")
        .split_whitespace()
        .filter(|token| *token != "/")
        .map(|token| {
            let token = token.to_lowercase();
            if token == "none" {
                return Some(Component {
                    value: 0.0,
                    percent: false,
                });
            }
            if let Some(number) = token.strip_suffix('%') {
                return number.parse().ok().map(|value| Component {
                    value,
                    percent: true,
                });
            }
            let number = token.strip_suffix("deg").unwrap_or(&token);
            number.parse().ok().map(|value| Component {
                value,
                percent: false,
            })
        })
        .collect()
}

fn lightness(c: Component) -> f64 {
    if c.percent {
        c.value / 100.0
    } else {
        c.value
    }
}

/// Chroma and the a/b axes use 100% = 0.4.
fn axis(c: Component) -> f64 {
    if c.percent {
        c.value / 100.0 * 0.4
    } else {
        c.value
    }
}

fn alpha(components: &[Component]) -> Option<f64> {
    components.get(3).map(|a| {
        let value = if a.percent { a.value / 100.0 } else { a.value };
        value.clamp(0.0, 1.0)
    })
}

fn oklch_to_rgb(components: &[Component]) -> Option<String> {
    if !(3..=4).contains(&components.len()) {
        return None;
    }
    let l = lightness(components[0]);
    let chroma = axis(components[1]);
    let hue = components[2].value.to_radians();

    Some(format_rgb(
        oklab_to_srgb(l, chroma * hue.cos(), chroma * hue.sin()),
        alpha(components),
    ))
}

fn oklab_to_rgb(components: &[Component]) -> Option<String> {
    if !(3..=4).contains(&components.len()) {
        return None;
    }
    let l = lightness(components[0]);
    let a = axis(components[1]);
    let b = axis(components[2]);

    Some(format_rgb(oklab_to_srgb(l, a, b), alpha(components)))
}

/// OKLab to gamma-encoded sRGB channels in 0..=255.
fn oklab_to_srgb(l: f64, a: f64, b: f64) -> [u8; 3] {
    let l_ = l + 0.396_337_777_4 * a + 0.215_803_757_3 * b;
    let m_ = l - 0.105_561_345_8 * a - 0.063_854_172_8 * b;
    let s_ = l - 0.089_484_177_5 * a - 1.291_485_548_0 * b;

    let (l3, m3, s3) = (l_.powi(3), m_.powi(3), s_.powi(3));

    let linear = [
        4.076_741_662_1 * l3 - 3.307_711_591_3 * m3 + 0.230_969_929_2 * s3,
        -1.268_438_004_6 * l3 + 2.609_757_401_1 * m3 - 0.341_319_396_5 * s3,
        -0.004_196_086_3 * l3 - 0.703_418_614_7 * m3 + 1.707_614_701_0 * s3,
    ];

    linear.map(|channel| {
        let encoded = if channel <= 0.003_130_8 {
            12.92 * channel
        } else {
            1.055 * channel.powf(1.0 / 2.4) - 0.055
        };
        (encoded.clamp(0.0, 1.0) * 255.0).round() as u8
    })
}

fn format_rgb([r, g, b]: [u8; 3], alpha: Option<f64>) -> String {
    match alpha {
        Some(a) if a < 1.0 => {
            format!("rgba({}, {}, {}, {})", r, g, b, (a * 1000.0).round() / 1000.0)
        }
        _ => format!("rgb({}, {}, {})", r, g, b),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const STYLESHEET: &str = r#"
@page { size: A4; margin: 18mm; }
:root {
  --brand: oklch(0.398 0.124 254.6);
  --accent: oklch(0.737 0.178 53.4);
  --ink: oklch(0.279 0.041 260.0);
  --muted: oklch(0.554 0.046 257.4);
  --rule: oklch(0.929 0.013 255.5);
  --wash: color-mix(in srgb, var(--brand) 8%, white);
}
body { font-family: "Helvetica Neue", Arial, sans-serif; color: var(--ink); margin: 0; }
main { max-width: 180mm; margin: 0 auto; }
header { text-align: center; margin-bottom: 10mm; }
.logo {
  display: inline-block; width: 16mm; height: 16mm; line-height: 16mm; border-radius: 4mm;
  background: var(--accent); color: white; font-weight: 900; font-size: 18pt;
}
h1 { font-size: 16pt; text-transform: uppercase; letter-spacing: -0.01em; }
h2 { font-size: 10pt; text-transform: uppercase; letter-spacing: 0.12em; color: var(--brand); }
section {
  border-top: 1px solid var(--rule); padding-top: 5mm; margin-top: 6mm;
  page-break-inside: avoid;
}
p, li, td, th { font-size: 10pt; line-height: 1.5; }
.muted { color: var(--muted); }
table { width: 100%; border-collapse: collapse; }
th { text-align: left; background: var(--wash); }
td, th { padding: 1.5mm 2mm; border-bottom: 1px solid var(--rule); }
.status-forte { color: oklch(0.627 0.170 149.2); }
.status-estavel { color: oklch(0.769 0.165 70.1); }
.status-sensivel { color: oklch(0.577 0.215 27.3); }
ul.org, ul.org ul { list-style: none; padding-left: 6mm; }
ul.org { padding-left: 0; }
footer {
  margin-top: 15mm; padding-top: 4mm; border-top: 1px solid var(--rule);
  font-size: 7pt; text-transform: uppercase; letter-spacing: 0.15em; color: var(--muted);
  display: flex; justify-content: space-between;
}
"#;

fn generate_html_document(report: &ExecutiveReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Relatório Executivo - {}</title>\n",
        escape_html(&report.company.trade_name)
    ));
    html.push_str("<style>");
    html.push_str(STYLESHEET);
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str(concat!(
        "<main class=\"mx-auto bg-white shadow-2xl border border-slate-200 p-16 ",
        "print:shadow-none print:border-none\">\n"
    ));

    html.push_str(&format!(
        concat!(
            "<header>\n<div class=\"logo shadow-xl\">GP</div>\n",
            "<h1>Relatório de Consultoria em Gestão de Pessoas</h1>\n",
            "<p class=\"muted\">{} • Data: {}</p>\n</header>\n"
        ),
        escape_html(&report.company.trade_name),
        report.generated_at.format("%d/%m/%Y")
    ));

    html.push_str(&html_company_section(report));
    html.push_str(&html_diagnosis_section(report));
    html.push_str(&html_disc_section(report));
    html.push_str(&html_climate_section(report));
    html.push_str(&html_dashboard_section(report));
    html.push_str(&html_org_chart_section(report));

    html.push_str(&format!(
        concat!(
            "<footer class=\"border-t border-slate-200\"><span>{}</span>",
            "<span>Documento Confidencial</span></footer>\n"
        ),
        escape_html(&report.consultancy)
    ));
    html.push_str("</main>\n</body>\n</html>\n");

    html
}

fn html_section(title: &str, body: &str) -> String {
    format!(
        "<section class=\"border-t border-slate-100 pt-6\">\n<h2>{}</h2>\n{}</section>\n",
        title, body
    )
}

fn html_company_section(report: &ExecutiveReport) -> String {
    let project = &report.project;
    let mut body = format!(
        "<p>{} • {} colaboradores ativos</p>\n",
        escape_html(&report.company.trade_name),
        report.org_chart.len() + report.org_chart.unplaced.len()
    );
    body.push_str(&format!(
        "<p class=\"muted\">Projeto {} • {}/{}h consumidas ({:.0}%)</p>\n",
        project.status, project.hours_consumed, project.hours_contracted, report.hours_progress
    ));
    html_section("1. Dados da Empresa", &body)
}

fn html_diagnosis_section(report: &ExecutiveReport) -> String {
    let body = match report.indicators {
        Some(ref hr) => format!(
            "<p>Maturidade de RH: {}/100 ({}). Risco trabalhista: {}/100 ({}).</p>\n",
            hr.maturity,
            report.maturity_label.unwrap_or("---"),
            hr.labor_risk,
            report.risk_label.unwrap_or("---")
        ),
        None => "<p class=\"muted\">Nenhum indicador de RH registrado.</p>\n".to_string(),
    };
    html_section("2. Diagnóstico Inicial", &body)
}

fn html_disc_section(report: &ExecutiveReport) -> String {
    let mut body = String::new();

    if let Some(ref traits) = report.disc_traits {
        body.push_str(&format!(
            "<p>Distribuição: {}. {} avaliações individuais concluídas.</p>\n",
            traits.headline(),
            traits.evaluations
        ));
    }
    if let Some(ref team) = report.team_disc {
        body.push_str("<table>\n<tr><th>Perfil</th><th>Colaboradores</th><th>%</th></tr>\n");
        for letter in DiscLetter::ALL {
            let share = team.share(letter);
            body.push_str(&format!(
                "<tr><td>{} ({})</td><td>{}</td><td>{}%</td></tr>\n",
                letter.trait_name(),
                letter,
                share.count,
                share.percent
            ));
        }
        body.push_str("</table>\n");
    }
    if body.is_empty() {
        body.push_str("<p class=\"muted\">Nenhuma avaliação DISC concluída.</p>\n");
    }

    html_section("3. Análise DISC", &body)
}

fn status_class(status: ClimateStatus) -> &'static str {
    match status {
        ClimateStatus::Strong => "status-forte",
        ClimateStatus::Stable => "status-estavel",
        ClimateStatus::Sensitive => "status-sensivel",
    }
}

fn html_climate_section(report: &ExecutiveReport) -> String {
    let Some(ref climate) = report.climate else {
        return html_section(
            "4. Análise de Clima",
            "<p class=\"muted\">Pesquisa de clima ainda não aplicada.</p>\n",
        );
    };

    let mut body = format!(
        "<p>Índice geral: <strong>{}/100</strong> ({} respostas).</p>\n",
        climate.overall_rounded(),
        climate.responses
    );
    body.push_str("<table>\n<tr><th>Dimensão</th><th>Pontuação</th><th>Status</th></tr>\n");
    for dimension in &climate.dimensions {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"{}\">{}</td></tr>\n",
            dimension.label,
            dimension.rounded(),
            status_class(dimension.status),
            dimension.status
        ));
    }
    body.push_str("</table>\n");

    html_section("4. Análise de Clima", &body)
}

fn html_dashboard_section(report: &ExecutiveReport) -> String {
    let body = format!(
        "<p>Índice Geral de Gestão de Pessoas: <strong>{}/100</strong></p>\n",
        report.executive_index
    );
    html_section("5. Dashboard Geral", &body)
}

fn html_org_node(node: &OrgNode, out: &mut String) {
    out.push_str("<li>");
    out.push_str(&escape_html(&node.name));
    if let Some(ref profile) = node.disc_profile {
        out.push_str(&format!(" <span class=\"muted\">[{}]</span>", escape_html(profile)));
    }
    if !node.reports.is_empty() {
        out.push_str("\n<ul>\n");
        for report in &node.reports {
            html_org_node(report, out);
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</li>\n");
}

fn html_org_chart_section(report: &ExecutiveReport) -> String {
    let chart = &report.org_chart;
    if chart.is_empty() {
        return html_section(
            "6. Organograma",
            "<p class=\"muted\">Nenhum colaborador ativo cadastrado.</p>\n",
        );
    }

    let mut body = String::from("<ul class=\"org\">\n");
    for root in &chart.roots {
        html_org_node(root, &mut body);
    }
    body.push_str("</ul>\n");
    html_section("6. Organograma", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures;

    #[test]
    fn test_strip_decoration_classes() {
        let html = concat!(
            r#"<div class="p-4 shadow-lg border border-slate-200 "#,
            r#"print:shadow-none rounded">x</div>"#,
            r#"<p class="text-sm">y</p>"#
        );
        assert_eq!(
            strip_decoration_classes(html),
            r#"<div class="p-4 rounded">x</div><p class="text-sm">y</p>"#
        );
    }

    #[test]
    fn test_oklch_converted_to_rgb() {
        let css = "a { color: oklch(1 0 0); background: oklch(0% 0 0); }";
        assert_eq!(
            shim_colors(css, "rgb(1, 2, 3)"),
            "a { color: rgb(255, 255, 255); background: rgb(0, 0, 0); }"
        );
        assert_eq!(shim_colors("oklch(0.5 0 0)", "x"), "rgb(99, 99, 99)");
        assert_eq!(shim_colors("OKLAB(1 0 0 / 50%)", "x"), "rgba(255, 255, 255, 0.5)");
    }

    #[test]
    fn test_unsupported_functions_use_fallback() {
        let css = concat!(
            "x { a: lab(50% 40 59); b: color-mix(in srgb, oklch(0.5 0 0) 20%, white); ",
            "c: oklch(var(--l) 0 0); d: color(display-p3 1 0 0); }"
        );
        assert_eq!(
            shim_colors(css, "rgb(9, 9, 9)"),
            "x { a: rgb(9, 9, 9); b: rgb(9, 9, 9); c: rgb(9, 9, 9); d: rgb(9, 9, 9); }"
        );
    }

    #[test]
    fn test_unbalanced_input_left_alone() {
        assert_eq!(shim_colors("oklch(1 0 0", "x"), "oklch(1 0 0");
    }

    #[test]
    fn test_rendered_report_is_capture_safe() {
        let report = fixtures::report();
        let html = render_html(&report, &ExportOptions::default());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("@page { size: A4"));
        assert!(html.contains("Acme Ltda"));
        assert!(html.contains("Liderança"));
        assert!(!html.contains("oklch("));
        assert!(!html.contains("color-mix("));
        assert!(!html.contains("shadow-2xl"));
        assert!(!html.contains("border-slate"));
    }

    #[test]
    fn test_color_shim_limited_to_css() {
        let html = concat!(
            "<style>p { color: oklch(1 0 0); }</style>",
            r#"<p style="background: lab(50% 0 0)">Lab(Norte) usa color(azul)</p>"#
        );
        assert_eq!(
            shim_styles(html, "rgb(9, 9, 9)"),
            concat!(
                "<style>p { color: rgb(255, 255, 255); }</style>",
                r#"<p style="background: rgb(9, 9, 9)">Lab(Norte) usa color(azul)</p>"#
            )
        );

        let mut report = fixtures::report();
        report.company.trade_name = "Lab(Norte) Color(Sul)".to_string();
        let html = render_html(&report, &ExportOptions::default());
        assert!(html.contains("Lab(Norte) Color(Sul)"));
        assert!(!html.contains("oklch("));
    }

    #[test]
    fn test_decorations_kept_when_disabled() {
        let report = fixtures::report();
        let options = ExportOptions {
            flatten_decorations: false,
            ..Default::default()
        };
        let html = render_html(&report, &options);
        assert!(html.contains("shadow-2xl"));
        assert!(!html.contains("oklch("));
    }

    #[test]
    fn test_names_are_escaped() {
        assert_eq!(escape_html("<b>A & B</b>"), "&lt;b&gt;A &amp; B&lt;/b&gt;");
    }
}
