//! Climate survey aggregation.
//!
//! Each response scores six dimensions on a 1-10 scale. A dimension's score
//! is the mean of its answers multiplied by 10, so the effective range is
//! 10-100. The overall index is the plain mean of the six dimension scores.

use crate::models::{ClimateDimension, ClimateResponse};
use serde::Serialize;
use std::fmt;

/// Qualitative band of a dimension score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClimateStatus {
    #[serde(rename = "Forte")]
    Strong,
    #[serde(rename = "Estável")]
    Stable,
    #[serde(rename = "Sensível")]
    Sensitive,
}

impl ClimateStatus {
    /// Band for a score; thresholds apply to the rounded score.
    pub fn from_score(score: f64) -> Self {
        let rounded = score.round();
        if rounded >= 70.0 {
            ClimateStatus::Strong
        } else if rounded >= 50.0 {
            ClimateStatus::Stable
        } else {
            ClimateStatus::Sensitive
        }
    }
}

impl fmt::Display for ClimateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClimateStatus::Strong => write!(f, "Forte"),
            ClimateStatus::Stable => write!(f, "Estável"),
            ClimateStatus::Sensitive => write!(f, "Sensível"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionScore {
    pub dimension: ClimateDimension,
    pub label: &'static str,
    pub score: f64,
    pub status: ClimateStatus,
}

impl DimensionScore {
    pub fn rounded(&self) -> u32 {
        self.score.round() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateSummary {
    pub responses: usize,
    /// In survey order.
    pub dimensions: Vec<DimensionScore>,
    pub overall_index: f64,
    /// Non-empty free-text comments.
    pub comments: Vec<String>,
}

impl ClimateSummary {
    pub fn overall_rounded(&self) -> u32 {
        self.overall_index.round() as u32
    }

    /// Dimensions ordered weakest first.
    pub fn attention_points(&self) -> Vec<&DimensionScore> {
        let mut sorted: Vec<&DimensionScore> = self.dimensions.iter().collect();
        sorted.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }
}

/// Aggregate climate responses. Returns `None` when the survey has no
/// responses yet.
pub fn summarize(responses: &[ClimateResponse]) -> Option<ClimateSummary> {
    if responses.is_empty() {
        return None;
    }

    let total = responses.len() as f64;

    let dimensions: Vec<DimensionScore> = ClimateDimension::ALL
        .iter()
        .map(|&dimension| {
            let sum: u32 = responses.iter().map(|r| r.score(dimension) as u32).sum();
            let score = sum as f64 / total * 10.0;
            DimensionScore {
                dimension,
                label: dimension.label(),
                score,
                status: ClimateStatus::from_score(score),
            }
        })
        .collect();

    let overall_index =
        dimensions.iter().map(|d| d.score).sum::<f64>() / dimensions.len() as f64;

    let comments = responses
        .iter()
        .filter_map(|r| r.comment.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect();

    Some(ClimateSummary {
        responses: responses.len(),
        dimensions,
        overall_index,
        comments,
    })
}

/// Portfolio-wide climate mean on the 0-10 answer scale, to one decimal.
///
/// Each response contributes the mean of its six answers, so a project with
/// many respondents weighs more than one with few.
pub fn global_mean(responses: &[ClimateResponse]) -> Option<f64> {
    if responses.is_empty() {
        return None;
    }

    let dimensions = ClimateDimension::ALL.len() as f64;
    let sum: f64 = responses
        .iter()
        .map(|r| {
            let answers: u32 = ClimateDimension::ALL
                .iter()
                .map(|&d| r.score(d) as u32)
                .sum();
            answers as f64 / dimensions
        })
        .sum();
    let mean = sum / responses.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(scores: [u8; 6], comment: Option<&str>) -> ClimateResponse {
        ClimateResponse {
            project_id: "p1".to_string(),
            leadership: scores[0],
            communication: scores[1],
            recognition: scores[2],
            development: scores[3],
            environment: scores[4],
            engagement: scores[5],
            comment: comment.map(String::from),
        }
    }

    #[test]
    fn test_three_response_scenario() {
        let responses = vec![
            response([8, 7, 9, 6, 8, 7], Some("Mais treinamentos")),
            response([6, 6, 6, 6, 6, 6], Some("   ")),
            response([10, 10, 10, 10, 10, 10], None),
        ];

        let summary = summarize(&responses).unwrap();

        assert_eq!(summary.responses, 3);
        let leadership = &summary.dimensions[0];
        assert_eq!(leadership.dimension, ClimateDimension::Leadership);
        assert!((leadership.score - 80.0).abs() < 1e-9);
        assert_eq!(leadership.status, ClimateStatus::Strong);

        let mean: f64 = summary.dimensions.iter().map(|d| d.score).sum::<f64>() / 6.0;
        assert!((summary.overall_index - mean).abs() < 1e-9);
        // (80 + 76.67 + 83.33 + 73.33 + 80 + 76.67) / 6
        assert_eq!(summary.overall_rounded(), 78);

        assert_eq!(summary.comments, vec!["Mais treinamentos"]);
    }

    #[test]
    fn test_scores_stay_within_scale() {
        let responses = vec![
            response([1, 1, 1, 1, 1, 1], None),
            response([10, 1, 5, 3, 10, 2], None),
            response([1, 10, 10, 10, 1, 9], None),
        ];

        let summary = summarize(&responses).unwrap();
        for d in &summary.dimensions {
            assert!((10.0..=100.0).contains(&d.score), "{} out of range", d.label);
        }
    }

    #[test]
    fn test_no_responses_is_no_data() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(ClimateStatus::from_score(70.0), ClimateStatus::Strong);
        assert_eq!(ClimateStatus::from_score(69.5), ClimateStatus::Strong);
        assert_eq!(ClimateStatus::from_score(69.4), ClimateStatus::Stable);
        assert_eq!(ClimateStatus::from_score(50.0), ClimateStatus::Stable);
        assert_eq!(ClimateStatus::from_score(49.0), ClimateStatus::Sensitive);
        assert_eq!(ClimateStatus::Stable.to_string(), "Estável");
    }

    #[test]
    fn test_global_mean_per_response() {
        let responses = vec![
            response([8, 7, 9, 6, 8, 7], None),
            response([6, 6, 6, 6, 6, 6], None),
            response([10, 10, 10, 10, 10, 10], None),
        ];

        // (7.5 + 6 + 10) / 3 = 7.833
        assert_eq!(global_mean(&responses), Some(7.8));
        assert_eq!(global_mean(&responses[1..2]), Some(6.0));
        assert_eq!(global_mean(&[]), None);
    }

    #[test]
    fn test_attention_points_weakest_first() {
        let summary = summarize(&[response([9, 3, 7, 5, 8, 6], None)]).unwrap();
        let order: Vec<_> = summary
            .attention_points()
            .iter()
            .map(|d| d.dimension)
            .collect();

        assert_eq!(order[0], ClimateDimension::Communication);
        assert_eq!(order[5], ClimateDimension::Leadership);
    }
}
