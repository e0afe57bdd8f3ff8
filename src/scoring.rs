use serde::{Deserialize, Serialize};

/// Counts correct answers for one playthrough. Never decrements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionScorer {
    score: u32,
    answered: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub playthrough_id: String,
    pub score: u32,
    pub answered: u32,
    pub total_questions: u32,
    pub percentage: u32,
}

impl SessionScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn answered(&self) -> u32 {
        self.answered
    }

    /// Count one committed answer.
    pub fn record(&mut self, correct: bool) {
        self.answered += 1;
        if correct {
            self.score += 1;
        }
    }

    pub fn summary(&self, playthrough_id: &str, total_questions: u32) -> SessionSummary {
        SessionSummary {
            playthrough_id: playthrough_id.to_string(),
            score: self.score,
            answered: self.answered,
            total_questions,
            percentage: percentage(self.score, total_questions),
        }
    }
}

/// `round(100 * score / total)`, 0 for an empty bank.
pub fn percentage(score: u32, total_questions: u32) -> u32 {
    if total_questions == 0 {
        return 0;
    }
    (100.0 * score as f64 / total_questions as f64).round() as u32
}
