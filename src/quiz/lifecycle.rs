//! Question lifecycle as a reducer.
//!
//! `QuizState::apply` is the only way state changes. It returns the side
//! effects for the controller to run (speech, tones, timers, buffer
//! discards), so the reducer itself stays synchronous and testable.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::arbiter::{AnswerArbiter, ArbiterOutcome, Modality, PendingCommand};
use crate::scoring::{SessionScorer, SessionSummary};

use super::questions::{option_letter, Question};

pub const HAPTIC_PENDING: &[u64] = &[50];
pub const HAPTIC_SUCCESS: &[u64] = &[100];
pub const HAPTIC_ERROR: &[u64] = &[200, 100, 200];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "intent")]
pub enum Intent {
    Propose { modality: Modality, option_index: usize },
    Confirm { via: Modality },
    Cancel { via: Modality },
    /// Explicit "next" from a click or the voice command.
    Next,
    Repeat,
    Restart,
    /// Timer fired after a gesture-confirmed answer.
    AutoAdvance { epoch: u64 },
    /// Timer fired after the last question was answered.
    ShowResults { epoch: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Speak(String),
    Tone(Tone),
    Vibrate(Vec<u64>),
    /// Replace any scheduled action with `intent`, fired after `delay`.
    Schedule { intent: Intent, delay: Duration },
    CancelScheduled,
    /// Drop buffered transcripts and gesture observations.
    DiscardInputBuffers,
    SessionCompleted(SessionSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleTiming {
    pub auto_advance: Duration,
    pub results: Duration,
}

impl Default for LifecycleTiming {
    fn default() -> Self {
        Self {
            auto_advance: Duration::from_millis(2000),
            results: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizState {
    questions: Vec<Question>,
    current_question_index: usize,
    arbiter: AnswerArbiter,
    scorer: SessionScorer,
    results_shown: bool,
    playthrough_id: String,
    /// Bumped on every question change and restart; timers carry the epoch
    /// they were scheduled in and are dropped when it no longer matches.
    #[serde(skip)]
    epoch: u64,
    #[serde(skip)]
    timing: LifecycleTiming,
}

impl QuizState {
    pub fn new(questions: Vec<Question>, timing: LifecycleTiming) -> Self {
        Self {
            questions,
            current_question_index: 0,
            arbiter: AnswerArbiter::new(),
            scorer: SessionScorer::new(),
            results_shown: false,
            playthrough_id: Uuid::new_v4().to_string(),
            epoch: 0,
            timing,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn arbiter(&self) -> &AnswerArbiter {
        &self.arbiter
    }

    pub fn selected_answer(&self) -> Option<usize> {
        self.arbiter.selected_answer()
    }

    pub fn pending(&self) -> Option<&PendingCommand> {
        self.arbiter.pending()
    }

    pub fn score(&self) -> u32 {
        self.scorer.score()
    }

    pub fn results_shown(&self) -> bool {
        self.results_shown
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn playthrough_id(&self) -> &str {
        &self.playthrough_id
    }

    pub fn is_last_question(&self) -> bool {
        self.current_question_index + 1 >= self.questions.len()
    }

    pub fn summary(&self) -> SessionSummary {
        self.scorer
            .summary(&self.playthrough_id, self.questions.len() as u32)
    }

    pub fn apply(&mut self, intent: Intent, now: DateTime<Utc>) -> Vec<Effect> {
        let Some(question) = self.current_question() else {
            return Vec::new();
        };
        let option_count = question.option_count();

        match intent {
            Intent::Propose {
                modality,
                option_index,
            } => {
                let outcome = self.arbiter.propose(modality, option_index, option_count, now);
                self.after_arbiter(outcome)
            }
            Intent::Confirm { via } => {
                let outcome = self.arbiter.confirm(via);
                self.after_arbiter(outcome)
            }
            Intent::Cancel { via } => {
                let outcome = self.arbiter.cancel(via);
                self.after_arbiter(outcome)
            }
            Intent::Next => {
                if !self.arbiter.is_committed() || self.is_last_question() {
                    return Vec::new();
                }
                self.advance()
            }
            Intent::AutoAdvance { epoch } => {
                if epoch != self.epoch || !self.arbiter.is_committed() || self.is_last_question()
                {
                    log::debug!("stale auto-advance for epoch {epoch} ignored");
                    return Vec::new();
                }
                self.advance()
            }
            Intent::ShowResults { epoch } => {
                if epoch != self.epoch
                    || self.results_shown
                    || !self.is_last_question()
                    || !self.arbiter.is_committed()
                {
                    return Vec::new();
                }
                self.results_shown = true;
                let summary = self.summary();
                vec![
                    Effect::Speak(results_message(&summary)),
                    Effect::SessionCompleted(summary),
                ]
            }
            Intent::Repeat => vec![Effect::Speak(question.announcement())],
            Intent::Restart => self.restart(),
        }
    }

    fn after_arbiter(&mut self, outcome: ArbiterOutcome) -> Vec<Effect> {
        let Some(question) = self.current_question() else {
            return Vec::new();
        };

        match outcome {
            ArbiterOutcome::Pending(pending) => vec![
                Effect::Speak(pending_message(question, &pending)),
                Effect::Vibrate(HAPTIC_PENDING.to_vec()),
            ],
            ArbiterOutcome::Cancelled(_) => vec![Effect::Speak("Selección cancelada.".into())],
            ArbiterOutcome::Committed {
                option_index,
                modality,
            } => self.commit(option_index, modality),
            ArbiterOutcome::Ignored(reason) => {
                log::debug!("intent ignored: {reason}");
                Vec::new()
            }
        }
    }

    fn commit(&mut self, option_index: usize, modality: Modality) -> Vec<Effect> {
        let Some(question) = self.current_question() else {
            return Vec::new();
        };
        let correct = question.is_correct(option_index);
        let message = answer_message(question, correct);

        self.scorer.record(correct);
        log::info!(
            "question {} answered with option {} via {} ({})",
            self.current_question_index + 1,
            option_letter(option_index),
            modality.as_str(),
            if correct { "correct" } else { "incorrect" }
        );

        let mut effects = if correct {
            vec![
                Effect::Tone(Tone::Success),
                Effect::Vibrate(HAPTIC_SUCCESS.to_vec()),
            ]
        } else {
            vec![
                Effect::Tone(Tone::Error),
                Effect::Vibrate(HAPTIC_ERROR.to_vec()),
            ]
        };
        effects.push(Effect::Speak(message));

        if self.is_last_question() {
            effects.push(Effect::Schedule {
                intent: Intent::ShowResults { epoch: self.epoch },
                delay: self.timing.results,
            });
        } else if modality == Modality::Gesture {
            effects.push(Effect::Schedule {
                intent: Intent::AutoAdvance { epoch: self.epoch },
                delay: self.timing.auto_advance,
            });
        }
        effects
    }

    /// Move to the next question and wipe every per-question trace.
    fn advance(&mut self) -> Vec<Effect> {
        self.current_question_index += 1;
        self.enter_question()
    }

    fn restart(&mut self) -> Vec<Effect> {
        self.current_question_index = 0;
        self.scorer = SessionScorer::new();
        self.results_shown = false;
        self.playthrough_id = Uuid::new_v4().to_string();
        self.enter_question()
    }

    fn enter_question(&mut self) -> Vec<Effect> {
        self.arbiter.reset();
        self.epoch += 1;

        let mut effects = vec![Effect::CancelScheduled, Effect::DiscardInputBuffers];
        if let Some(question) = self.current_question() {
            effects.push(Effect::Speak(question.announcement()));
        }
        effects
    }
}

fn describe_option(question: &Question, option_index: usize) -> String {
    let text = question
        .options
        .get(option_index)
        .map(String::as_str)
        .unwrap_or_default();
    format!("la opción {}: {}", option_letter(option_index), text)
}

fn pending_message(question: &Question, pending: &PendingCommand) -> String {
    let how = match pending.modality {
        Modality::Gesture => "Cierra el puño para confirmar o abre la mano para cancelar.",
        _ => "Di «confirmar» o «cancelar».",
    };
    format!(
        "Has elegido {}. {}",
        describe_option(question, pending.option_index),
        how
    )
}

fn answer_message(question: &Question, correct: bool) -> String {
    if correct {
        format!("¡Correcto! Era {}.", describe_option(question, question.correct_index))
    } else {
        format!(
            "Incorrecto. La respuesta correcta era {}.",
            describe_option(question, question.correct_index)
        )
    }
}

fn results_message(summary: &SessionSummary) -> String {
    format!(
        "Has terminado. Acertaste {} de {} preguntas, un {} por ciento.",
        summary.score, summary.total_questions, summary.percentage
    )
}
