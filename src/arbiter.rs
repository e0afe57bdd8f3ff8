//! Answer arbitration for one question.
//!
//! Three input channels compete for a single answer slot. Clicks commit
//! directly; voice and gesture proposals wait in `PendingConfirmation` until
//! the same channel (or a click on the confirmation panel) confirms or
//! cancels. Once committed, the slot is locked until the question changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Modality {
    Click,
    Voice,
    Gesture,
}

impl Modality {
    /// Clicks are self-confirming.
    pub fn needs_confirmation(&self) -> bool {
        !matches!(self, Modality::Click)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Click => "click",
            Modality::Voice => "voice",
            Modality::Gesture => "gesture",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCommand {
    pub modality: Modality,
    pub option_index: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum ArbiterState {
    Idle,
    PendingConfirmation(PendingCommand),
    #[serde(rename_all = "camelCase")]
    Committed {
        option_index: usize,
        modality: Modality,
    },
}

impl Default for ArbiterState {
    fn default() -> Self {
        ArbiterState::Idle
    }
}

/// What a call did. `Ignored` carries a short reason for debug logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbiterOutcome {
    Pending(PendingCommand),
    Committed {
        option_index: usize,
        modality: Modality,
    },
    Cancelled(PendingCommand),
    Ignored(&'static str),
}

impl ArbiterOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, ArbiterOutcome::Ignored(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerArbiter {
    state: ArbiterState,
}

impl AnswerArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ArbiterState {
        &self.state
    }

    pub fn selected_answer(&self) -> Option<usize> {
        match self.state {
            ArbiterState::Committed { option_index, .. } => Some(option_index),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<&PendingCommand> {
        match &self.state {
            ArbiterState::PendingConfirmation(pending) => Some(pending),
            _ => None,
        }
    }

    /// The modality whose confirmation panel is showing, if any.
    pub fn confirmation_visible(&self) -> Option<Modality> {
        self.pending().map(|pending| pending.modality)
    }

    pub fn is_idle(&self) -> bool {
        self.state == ArbiterState::Idle
    }

    pub fn is_committed(&self) -> bool {
        self.selected_answer().is_some()
    }

    /// Offer an answer. Only accepted from `Idle` and for an existing option.
    pub fn propose(
        &mut self,
        modality: Modality,
        option_index: usize,
        option_count: usize,
        now: DateTime<Utc>,
    ) -> ArbiterOutcome {
        match self.state {
            ArbiterState::Idle => {}
            ArbiterState::PendingConfirmation(_) => {
                return ArbiterOutcome::Ignored("another answer awaits confirmation")
            }
            ArbiterState::Committed { .. } => return ArbiterOutcome::Ignored("already answered"),
        }
        if option_index >= option_count {
            return ArbiterOutcome::Ignored("option out of range");
        }

        if !modality.needs_confirmation() {
            return self.commit(option_index, modality);
        }

        let pending = PendingCommand {
            modality,
            option_index,
            created_at: now,
        };
        self.state = ArbiterState::PendingConfirmation(pending.clone());
        ArbiterOutcome::Pending(pending)
    }

    /// Lock in the pending answer. `via` must own the pending command, except
    /// for clicks on the confirmation panel which may confirm any of them.
    pub fn confirm(&mut self, via: Modality) -> ArbiterOutcome {
        let (option_index, modality) = match &self.state {
            ArbiterState::PendingConfirmation(pending) if owns(via, pending) => {
                (pending.option_index, pending.modality)
            }
            ArbiterState::PendingConfirmation(_) => {
                return ArbiterOutcome::Ignored("pending belongs to another modality")
            }
            ArbiterState::Idle => return ArbiterOutcome::Ignored("nothing to confirm"),
            ArbiterState::Committed { .. } => return ArbiterOutcome::Ignored("already answered"),
        };
        self.commit(option_index, modality)
    }

    pub fn cancel(&mut self, via: Modality) -> ArbiterOutcome {
        let pending = match &self.state {
            ArbiterState::PendingConfirmation(pending) if owns(via, pending) => pending.clone(),
            ArbiterState::PendingConfirmation(_) => {
                return ArbiterOutcome::Ignored("pending belongs to another modality")
            }
            _ => return ArbiterOutcome::Ignored("nothing to cancel"),
        };
        self.state = ArbiterState::Idle;
        ArbiterOutcome::Cancelled(pending)
    }

    /// Back to `Idle` from any state. Used on every question change.
    pub fn reset(&mut self) {
        self.state = ArbiterState::Idle;
    }

    fn commit(&mut self, option_index: usize, modality: Modality) -> ArbiterOutcome {
        self.state = ArbiterState::Committed {
            option_index,
            modality,
        };
        ArbiterOutcome::Committed {
            option_index,
            modality,
        }
    }
}

fn owns(via: Modality, pending: &PendingCommand) -> bool {
    via == Modality::Click || via == pending.modality
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONS: usize = 4;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn click_commits_directly() {
        let mut arbiter = AnswerArbiter::new();
        let outcome = arbiter.propose(Modality::Click, 2, OPTIONS, now());
        assert_eq!(
            outcome,
            ArbiterOutcome::Committed {
                option_index: 2,
                modality: Modality::Click
            }
        );
        assert_eq!(arbiter.selected_answer(), Some(2));
        assert_eq!(arbiter.confirmation_visible(), None);
    }

    #[test]
    fn gesture_waits_for_confirmation() {
        let mut arbiter = AnswerArbiter::new();
        assert!(matches!(
            arbiter.propose(Modality::Gesture, 1, OPTIONS, now()),
            ArbiterOutcome::Pending(_)
        ));
        assert_eq!(arbiter.selected_answer(), None);
        assert_eq!(arbiter.confirmation_visible(), Some(Modality::Gesture));

        assert!(matches!(
            arbiter.confirm(Modality::Gesture),
            ArbiterOutcome::Committed { option_index: 1, .. }
        ));
        assert_eq!(arbiter.selected_answer(), Some(1));
        assert_eq!(arbiter.pending(), None);
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut arbiter = AnswerArbiter::new();
        arbiter.propose(Modality::Voice, 0, OPTIONS, now());
        assert!(matches!(
            arbiter.cancel(Modality::Voice),
            ArbiterOutcome::Cancelled(_)
        ));
        assert!(arbiter.is_idle());
        assert!(arbiter.confirm(Modality::Voice).is_ignored());
        assert!(arbiter.cancel(Modality::Voice).is_ignored());
    }

    #[test]
    fn second_modality_cannot_take_over_pending() {
        let mut arbiter = AnswerArbiter::new();
        arbiter.propose(Modality::Voice, 0, OPTIONS, now());

        assert!(arbiter.propose(Modality::Gesture, 3, OPTIONS, now()).is_ignored());
        assert!(arbiter.propose(Modality::Click, 3, OPTIONS, now()).is_ignored());
        assert!(arbiter.confirm(Modality::Gesture).is_ignored());
        assert!(arbiter.cancel(Modality::Gesture).is_ignored());
        assert_eq!(arbiter.confirmation_visible(), Some(Modality::Voice));
    }

    #[test]
    fn click_on_panel_confirms_any_pending() {
        let mut arbiter = AnswerArbiter::new();
        arbiter.propose(Modality::Gesture, 2, OPTIONS, now());
        assert!(matches!(
            arbiter.confirm(Modality::Click),
            ArbiterOutcome::Committed {
                option_index: 2,
                modality: Modality::Gesture
            }
        ));
    }

    #[test]
    fn out_of_range_option_is_noise() {
        let mut arbiter = AnswerArbiter::new();
        assert!(arbiter.propose(Modality::Gesture, 4, OPTIONS, now()).is_ignored());
        assert!(arbiter.propose(Modality::Click, 9, OPTIONS, now()).is_ignored());
        assert!(arbiter.is_idle());
    }

    #[test]
    fn committed_answer_is_locked() {
        let mut arbiter = AnswerArbiter::new();
        arbiter.propose(Modality::Click, 0, OPTIONS, now());
        assert!(arbiter.propose(Modality::Click, 1, OPTIONS, now()).is_ignored());
        assert!(arbiter.confirm(Modality::Click).is_ignored());
        assert!(arbiter.cancel(Modality::Click).is_ignored());
        assert_eq!(arbiter.selected_answer(), Some(0));

        arbiter.reset();
        assert!(arbiter.is_idle());
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Propose(Modality, usize),
        Confirm(Modality),
        Cancel(Modality),
    }

    #[test]
    fn selected_answer_changes_at_most_once() {
        let modalities = [Modality::Click, Modality::Voice, Modality::Gesture];
        let mut ops = Vec::new();
        for modality in modalities {
            ops.push(Op::Confirm(modality));
            ops.push(Op::Cancel(modality));
            for option in [0, 3, 5] {
                ops.push(Op::Propose(modality, option));
            }
        }

        // every sequence of four operations
        let n = ops.len();
        for code in 0..n.pow(4) {
            let mut arbiter = AnswerArbiter::new();
            let mut changes = 0;
            let mut last = arbiter.selected_answer();
            let mut rest = code;
            for _ in 0..4 {
                match ops[rest % n] {
                    Op::Propose(modality, option) => {
                        arbiter.propose(modality, option, OPTIONS, now());
                    }
                    Op::Confirm(modality) => {
                        arbiter.confirm(modality);
                    }
                    Op::Cancel(modality) => {
                        arbiter.cancel(modality);
                    }
                }
                rest /= n;
                if arbiter.selected_answer() != last {
                    changes += 1;
                    last = arbiter.selected_answer();
                }
            }
            assert!(changes <= 1, "sequence {code} changed the answer {changes} times");
        }
    }

    #[test]
    fn state_serializes_with_tag() {
        let mut arbiter = AnswerArbiter::new();
        arbiter.propose(Modality::Click, 1, OPTIONS, now());
        let json = serde_json::to_value(arbiter.state()).unwrap();
        assert_eq!(json["state"], "committed");
        assert_eq!(json["optionIndex"], 1);
        assert_eq!(json["modality"], "click");
    }
}
