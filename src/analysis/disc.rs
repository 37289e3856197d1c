//! Team-level DISC aggregation.

use crate::models::{DiscEvaluation, DiscLetter, Employee};
use serde::Serialize;

/// Share of one DISC letter among the evaluated employees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LetterShare {
    pub letter: DiscLetter,
    pub count: usize,
    pub percent: u32,
}

/// Distribution of predominant profiles across a team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamDiscSummary {
    /// Employees with a completed assessment.
    pub evaluated: usize,
    /// One entry per letter, in D, I, S, C order.
    pub distribution: Vec<LetterShare>,
    pub predominant: DiscLetter,
    pub average_adherence: u32,
}

impl TeamDiscSummary {
    pub fn share(&self, letter: DiscLetter) -> &LetterShare {
        &self.distribution[letter.index()]
    }
}

/// Aggregate the predominant profile of a team.
///
/// Only employees with both a profile code and a score sheet count. The
/// bucket is the first letter of the profile code. Returns `None` when no one
/// has completed the assessment.
pub fn summarize_team(employees: &[Employee]) -> Option<TeamDiscSummary> {
    let assessed: Vec<&Employee> = employees
        .iter()
        .filter(|e| {
            e.disc_scores.is_some()
                && e.disc_profile
                    .as_deref()
                    .is_some_and(|p| !p.trim().is_empty())
        })
        .collect();

    let total = assessed.len();
    if total == 0 {
        return None;
    }

    let mut counts = [0usize; 4];
    let mut adherence_sum: u64 = 0;

    for employee in &assessed {
        if let Some(letter) = employee.primary_letter() {
            counts[letter.index()] += 1;
        }
        adherence_sum += employee
            .disc_scores
            .as_ref()
            .and_then(|s| s.adherence)
            .unwrap_or(0) as u64;
    }

    let distribution = DiscLetter::ALL
        .iter()
        .map(|&letter| {
            let count = counts[letter.index()];
            LetterShare {
                letter,
                count,
                percent: rounded_percent(count, total),
            }
        })
        .collect();

    Some(TeamDiscSummary {
        evaluated: total,
        distribution,
        predominant: predominant_letter(&counts),
        average_adherence: (adherence_sum as f64 / total as f64).round() as u32,
    })
}

/// Letter with the highest count; ties go to the earlier letter in D, I, S, C.
fn predominant_letter(counts: &[usize; 4]) -> DiscLetter {
    let mut best = DiscLetter::D;
    for letter in DiscLetter::ALL {
        if counts[letter.index()] > counts[best.index()] {
            best = letter;
        }
    }
    best
}

fn rounded_percent(count: usize, total: usize) -> u32 {
    (count as f64 / total as f64 * 100.0).round() as u32
}

/// Mean trait scores over a project's stored evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraitAverages {
    pub evaluations: usize,
    pub dominance: u32,
    pub influence: u32,
    pub steadiness: u32,
    pub conformity: u32,
}

impl TraitAverages {
    pub fn get(&self, letter: DiscLetter) -> u32 {
        match letter {
            DiscLetter::D => self.dominance,
            DiscLetter::I => self.influence,
            DiscLetter::S => self.steadiness,
            DiscLetter::C => self.conformity,
        }
    }

    /// One-line form used in reports, e.g. `D 40% | I 30% | S 20% | C 10%`.
    pub fn headline(&self) -> String {
        DiscLetter::ALL
            .iter()
            .map(|&l| format!("{} {}%", l, self.get(l)))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

pub fn average_traits(evaluations: &[DiscEvaluation]) -> Option<TraitAverages> {
    if evaluations.is_empty() {
        return None;
    }

    let n = evaluations.len() as f64;
    let mean = |letter: DiscLetter| -> u32 {
        let sum: u64 = evaluations
            .iter()
            .map(|e| e.trait_score(letter) as u64)
            .sum();
        (sum as f64 / n).round() as u32
    };

    Some(TraitAverages {
        evaluations: evaluations.len(),
        dominance: mean(DiscLetter::D),
        influence: mean(DiscLetter::I),
        steadiness: mean(DiscLetter::S),
        conformity: mean(DiscLetter::C),
    })
}
