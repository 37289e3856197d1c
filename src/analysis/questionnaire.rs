//! DISC forced-ranking questionnaire.
//!
//! The questionnaire has 25 groups of four adjectives. The respondent ranks
//! the words of each group from 1 ("most like me") to 4 ("least like me").
//! The word at position 0..3 of a group scores for D, I, S and C
//! respectively.

use crate::models::{DiscLetter, DiscScoreSheet, RawAnswers};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// A group of four words, one per DISC letter in D, I, S, C order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionGroup {
    pub id: u8,
    pub words: [&'static str; 4],
}

const fn group(id: u8, words: [&'static str; 4]) -> QuestionGroup {
    QuestionGroup { id, words }
}

pub static QUESTION_GROUPS: [QuestionGroup; 25] = [
    group(1, ["FOCADO", "ARTICULADO", "COMPREENSIVO", "CUIDADOSO"]),
    group(2, ["PODEROSO", "ESPONTÂNEO", "TOLERANTE", "DETALHISTA"]),
    group(3, ["COMPETITIVO", "AMIGÁVEL", "COLABORADOR", "PRECAVIDO"]),
    group(4, ["DIRETO", "VISIONÁRIO", "PACIENTE", "LÓGICO"]),
    group(5, ["INOVADOR", "ENTUSIASMADO", "PREVISÍVEL", "DISCIPLINADO"]),
    group(6, ["OBJETIVO", "EXPRESSIVO", "SENSÍVEL", "ATENTO"]),
    group(7, ["ASSERTIVO", "SOCIÁVEL", "CONFIÁVEL", "CAUTELOSO"]),
    group(8, ["AMBICIOSO", "CARISMÁTICO", "HARMONIOSO", "OBSERVADOR"]),
    group(9, ["AUTOCONFIANTE", "CRIATIVO", "TRANQUILO", "INVESTIGATIVO"]),
    group(10, ["INDEPENDENTE", "ALEGRE", "CONSERVADOR", "CRITERIOSO"]),
    group(11, ["DETERMINADO", "EXTROVERTIDO", "GENEROSO", "DESCONFIADO"]),
    group(12, ["PERSUASIVO", "DINÂMICO", "CALMO", "PERFECCIONISTA"]),
    group(13, ["ENERGÉTICO", "ENVOLVENTE", "COMPANHEIRO", "TÉCNICO"]),
    group(14, ["DESAFIADOR", "INSPIRADOR", "HUMILDE", "CRÍTICO"]),
    group(15, ["PIONEIRO", "MOTIVADOR", "ESTÁVEL", "SISTEMÁTICO"]),
    group(16, ["FIRME", "COMUNICATIVO", "APOIADOR", "IMERSO"]),
    group(17, ["DECIDIDO", "OTIMISTA", "SENSATO", "PRECISO"]),
    group(18, ["AGRESSIVO", "CATIVANTE", "LEAL", "RESERVADO"]),
    group(19, ["AUTÔNOMO", "PERSPICAZ", "GENTIL", "SÁBIO"]),
    group(20, ["INCISIVO", "ANIMADO", "DIPLOMÁTICO", "ESTRATÉGICO"]),
    group(21, ["CONTROLADOR", "CONVINCENTE", "AMOROSO", "ENVOLVIDO"]),
    group(22, ["DESENVOLVEDOR", "FLEXÍVEL", "PONDERADO", "MINUCIOSO"]),
    group(23, ["CONFRONTADOR", "POLÍTICO", "AGRADÁVEL", "EQUILIBRADO"]),
    group(24, ["IMPONENTE", "IDEALISTA", "PACÍFICO", "PROCESSUAL"]),
    group(25, ["AUDACIOSO", "EXAGERADO", "CONSISTENTE", "EXATO"]),
];

/// A secondary letter joins the profile code at this score or above.
const SECONDARY_THRESHOLD: u32 = 30;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuestionnaireError {
    #[error("Unknown question group: {0}")]
    UnknownGroup(String),

    #[error("Question group {0} answered more than once")]
    DuplicateGroup(u8),

    #[error("Word '{word}' does not belong to group {group}")]
    UnknownWord { group: u8, word: String },

    #[error("Rank {rank} in group {group} must be between 1 and 4")]
    RankOutOfRange { group: u8, rank: u8 },

    #[error("Word '{word}' ranked more than once in group {group}")]
    DuplicateWord { group: u8, word: String },

    #[error("Rank {rank} used more than once in group {group}")]
    DuplicateRank { group: u8, rank: u8 },

    #[error("Questionnaire incomplete: {answered} of 25 groups answered")]
    Incomplete { answered: usize },
}

fn find_group(key: &str) -> Result<&'static QuestionGroup, QuestionnaireError> {
    key.trim()
        .parse::<u8>()
        .ok()
        .and_then(|id| QUESTION_GROUPS.iter().find(|g| g.id == id))
        .ok_or_else(|| QuestionnaireError::UnknownGroup(key.to_string()))
}

/// Position of `word` in the group, which is also its letter index.
fn word_position(group: &QuestionGroup, word: &str) -> Option<usize> {
    let normalized = word.trim().to_uppercase();
    group.words.iter().position(|w| *w == normalized)
}

/// Validate a (possibly partial) set of answers.
///
/// Returns how many groups are fully ranked.
pub fn validate(answers: &RawAnswers) -> Result<usize, QuestionnaireError> {
    let mut complete = 0;
    let mut groups = HashSet::new();

    for (key, ranks) in answers {
        let group = find_group(key)?;
        // "1" and "01" name the same group.
        if !groups.insert(group.id) {
            return Err(QuestionnaireError::DuplicateGroup(group.id));
        }
        let mut seen = HashSet::new();
        let mut positions = HashSet::new();

        for (word, &rank) in ranks {
            let Some(pos) = word_position(group, word) else {
                return Err(QuestionnaireError::UnknownWord {
                    group: group.id,
                    word: word.clone(),
                });
            };
            if !positions.insert(pos) {
                return Err(QuestionnaireError::DuplicateWord {
                    group: group.id,
                    word: word.clone(),
                });
            }
            if !(1..=4).contains(&rank) {
                return Err(QuestionnaireError::RankOutOfRange {
                    group: group.id,
                    rank,
                });
            }
            if !seen.insert(rank) {
                return Err(QuestionnaireError::DuplicateRank {
                    group: group.id,
                    rank,
                });
            }
        }

        if seen.len() == 4 {
            complete += 1;
        }
    }

    Ok(complete)
}

/// Scored outcome of a completed questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionnaireResult {
    /// Trait scores in D, I, S, C order; they sum to 100 give or take rounding.
    pub scores: [u32; 4],
    pub profile: String,
    pub adherence: u32,
}

impl QuestionnaireResult {
    pub fn score(&self, letter: DiscLetter) -> u32 {
        self.scores[letter.index()]
    }

    /// Merge the result into an employee's score sheet, keeping unrelated keys.
    pub fn to_score_sheet(
        &self,
        answers: RawAnswers,
        previous: Option<&DiscScoreSheet>,
    ) -> DiscScoreSheet {
        let mut sheet = previous.cloned().unwrap_or_default();
        sheet.d = Some(self.score(DiscLetter::D));
        sheet.i = Some(self.score(DiscLetter::I));
        sheet.s = Some(self.score(DiscLetter::S));
        sheet.c = Some(self.score(DiscLetter::C));
        sheet.adherence = Some(self.adherence);
        sheet.raw_answers = Some(answers);
        sheet
    }
}

/// Score a complete questionnaire.
pub fn score(answers: &RawAnswers) -> Result<QuestionnaireResult, QuestionnaireError> {
    let complete = validate(answers)?;
    if complete < QUESTION_GROUPS.len() {
        return Err(QuestionnaireError::Incomplete { answered: complete });
    }

    // Rank 1 earns 4 points, rank 4 earns 1; each letter sums to 25..=100.
    let mut sums = [0u32; 4];
    let mut top_letters: Vec<usize> = Vec::with_capacity(QUESTION_GROUPS.len());

    for (key, ranks) in answers {
        let group = find_group(key)?;
        for (word, &rank) in ranks {
            if let Some(pos) = word_position(group, word) {
                sums[pos] += 5 - rank as u32;
                if rank == 1 {
                    top_letters.push(pos);
                }
            }
        }
    }

    let groups = QUESTION_GROUPS.len() as f64;
    let spread = groups * 6.0;
    let scores = sums.map(|sum| ((sum as f64 - groups) / spread * 100.0).round() as u32);

    let mut order = DiscLetter::ALL;
    order.sort_by(|a, b| scores[b.index()].cmp(&scores[a.index()]));

    let mut profile = order[0].to_string();
    if scores[order[1].index()] >= SECONDARY_THRESHOLD {
        profile.push(order[1].as_char());
    }

    let primary = order[0].index();
    let matching = top_letters.iter().filter(|&&pos| pos == primary).count();
    let adherence = (matching as f64 / groups * 100.0).round() as u32;

    Ok(QuestionnaireResult {
        scores,
        profile,
        adherence,
    })
}
