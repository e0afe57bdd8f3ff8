use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::{
    sync::{broadcast, mpsc, watch, Mutex},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    arbiter::{Modality, PendingCommand},
    devices::ModalityStatus,
    feedback::FeedbackHub,
    gesture::{GestureInput, Landmark},
    scoring::SessionSummary,
    settings::{Preferences, QuizConfig},
    voice::{TranscriptFragment, VoiceCommandParser, VoiceInput},
};

use super::{
    intents::{gesture_intent, voice_intent},
    lifecycle::{Effect, Intent, QuizState},
    questions::Question,
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSnapshot {
    pub playthrough_id: String,
    pub question_index: usize,
    pub total_questions: usize,
    pub question: Option<Question>,
    pub selected_answer: Option<usize>,
    pub pending: Option<PendingCommand>,
    /// Which modality owns the confirmation panel, if one is showing.
    pub confirmation_visible: Option<Modality>,
    pub score: u32,
    pub results_shown: bool,
    pub summary: Option<SessionSummary>,
    pub gesture_status: ModalityStatus,
    pub voice_status: ModalityStatus,
    pub reduced_motion: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "payload")]
pub enum QuizEvent {
    StateChanged(QuizSnapshot),
    ModalityChanged {
        modality: Modality,
        status: ModalityStatus,
    },
    TranscriptHeard(TranscriptFragment),
    SessionCompleted(SessionSummary),
}

struct ScheduledAction {
    intent: Intent,
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

struct Driver {
    handle: JoinHandle<mpsc::UnboundedReceiver<Intent>>,
    cancel_token: CancellationToken,
}

/// Runs the quiz: owns the lifecycle state, both input modalities and the
/// feedback hub, and executes the effects the reducer returns.
///
/// Every input, whatever its source, ends up as an `Intent` passed through
/// `dispatch`. Timers never touch state directly; they post their intent to
/// the driver loop started by `start`.
#[derive(Clone)]
pub struct QuizController {
    state: Arc<Mutex<QuizState>>,
    // held from apply until the effects have run
    dispatch_lock: Arc<Mutex<()>>,
    config: QuizConfig,
    parser: Arc<VoiceCommandParser>,
    feedback: FeedbackHub,
    gesture: Arc<Mutex<GestureInput>>,
    voice: Arc<Mutex<VoiceInput>>,
    scheduled: Arc<Mutex<Option<ScheduledAction>>>,
    intents_tx: mpsc::UnboundedSender<Intent>,
    intents_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<Intent>>>>,
    driver: Arc<Mutex<Option<Driver>>>,
    events: broadcast::Sender<QuizEvent>,
}

impl QuizController {
    pub fn new(
        questions: Vec<Question>,
        config: QuizConfig,
        feedback: FeedbackHub,
        gesture: GestureInput,
        voice: VoiceInput,
    ) -> Self {
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            state: Arc::new(Mutex::new(QuizState::new(questions, config.timing))),
            dispatch_lock: Arc::new(Mutex::new(())),
            config,
            parser: Arc::new(VoiceCommandParser::new()),
            feedback,
            gesture: Arc::new(Mutex::new(gesture)),
            voice: Arc::new(Mutex::new(voice)),
            scheduled: Arc::new(Mutex::new(None)),
            intents_tx,
            intents_rx: Arc::new(Mutex::new(Some(intents_rx))),
            driver: Arc::new(Mutex::new(None)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QuizEvent> {
        self.events.subscribe()
    }

    /// Spawn the driver loop and announce the first question.
    pub async fn start(&self) -> Result<()> {
        {
            let mut driver = self.driver.lock().await;
            if driver.is_some() {
                return Ok(());
            }

            let intents = self
                .intents_rx
                .lock()
                .await
                .take()
                .ok_or_else(|| anyhow!("intent receiver already taken"))?;
            let gesture_status = self.gesture.lock().await.subscribe_status();
            let voice_status = self.voice.lock().await.subscribe_status();
            let cancel_token = CancellationToken::new();

            let handle = tokio::spawn(self.clone().drive(
                intents,
                gesture_status,
                voice_status,
                cancel_token.clone(),
            ));
            *driver = Some(Driver {
                handle,
                cancel_token,
            });
        }

        info!("quiz started");
        self.dispatch(Intent::Repeat).await;
        Ok(())
    }

    /// Stop the driver, drop any pending timer and release both devices.
    pub async fn shutdown(&self) {
        if let Some(driver) = self.driver.lock().await.take() {
            driver.cancel_token.cancel();
            match driver.handle.await {
                Ok(intents) => *self.intents_rx.lock().await = Some(intents),
                Err(err) => warn!("quiz driver ended abnormally: {err}"),
            }
        }

        self.cancel_scheduled().await;
        if let Err(err) = self.gesture.lock().await.disable().await {
            warn!("failed to stop gesture input: {err:?}");
        }
        self.voice.lock().await.disable();
        info!("quiz shut down");
    }

    async fn drive(
        self,
        mut intents: mpsc::UnboundedReceiver<Intent>,
        mut gesture_status: watch::Receiver<ModalityStatus>,
        mut voice_status: watch::Receiver<ModalityStatus>,
        cancel_token: CancellationToken,
    ) -> mpsc::UnboundedReceiver<Intent> {
        let mut ticker = time::interval(self.config.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                Some(intent) = intents.recv() => {
                    self.dispatch(intent).await;
                }
                Ok(()) = gesture_status.changed() => {
                    let status = gesture_status.borrow_and_update().clone();
                    self.report_modality(Modality::Gesture, status).await;
                }
                Ok(()) = voice_status.changed() => {
                    let status = voice_status.borrow_and_update().clone();
                    self.report_modality(Modality::Voice, status).await;
                }
                _ = ticker.tick() => self.pump().await,
            }
        }

        debug!("quiz driver stopped");
        intents
    }

    /// Apply one intent and run its effects. Returns whether anything changed.
    pub async fn dispatch(&self, intent: Intent) -> bool {
        self.dispatch_from(|_| Some(intent)).await
    }

    /// Choose the intent under the state lock so it is derived from the same
    /// state it is applied to. Dispatches are serialised, so the speech and
    /// tones of one intent never interleave with another's.
    async fn dispatch_from<F>(&self, choose: F) -> bool
    where
        F: FnOnce(&QuizState) -> Option<Intent>,
    {
        let _serial = self.dispatch_lock.lock().await;
        let effects = {
            let mut state = self.state.lock().await;
            let Some(intent) = choose(&state) else {
                return false;
            };
            debug!("dispatch {:?}", intent);
            state.apply(intent, Utc::now())
        };

        if effects.is_empty() {
            return false;
        }
        self.run_effects(effects).await;
        self.emit_state_changed().await;
        true
    }

    async fn run_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Speak(text) => self.feedback.speak(&text),
                Effect::Tone(tone) => self.feedback.tone(tone),
                Effect::Vibrate(pattern) => self.feedback.vibrate(&pattern),
                Effect::Schedule { intent, delay } => self.schedule(intent, delay).await,
                Effect::CancelScheduled => self.cancel_scheduled().await,
                Effect::DiscardInputBuffers => {
                    self.gesture.lock().await.discard_buffered();
                    self.voice.lock().await.discard_buffered();
                }
                Effect::SessionCompleted(summary) => {
                    info!(
                        "playthrough {} finished: {}/{}",
                        summary.playthrough_id, summary.score, summary.total_questions
                    );
                    self.emit(QuizEvent::SessionCompleted(summary));
                }
            }
        }
    }

    async fn schedule(&self, intent: Intent, delay: Duration) {
        let mut slot = self.scheduled.lock().await;
        if let Some(previous) = slot.take() {
            previous.cancel_token.cancel();
            debug!("replaced scheduled {:?}", previous.intent);
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn({
            let cancel_token = cancel_token.clone();
            let intents = self.intents_tx.clone();
            async move {
                tokio::select! {
                    _ = time::sleep(delay) => {
                        let _ = intents.send(intent);
                    }
                    _ = cancel_token.cancelled() => {}
                }
            }
        });

        *slot = Some(ScheduledAction {
            intent,
            handle,
            cancel_token,
        });
    }

    async fn cancel_scheduled(&self) {
        if let Some(action) = self.scheduled.lock().await.take() {
            action.cancel_token.cancel();
            action.handle.abort();
        }
    }

    /// Read each input mailbox once and turn what is there into intents.
    pub async fn pump(&self) {
        let observation = self.gesture.lock().await.take_observation();
        if let Some(observation) = observation {
            let threshold = self.config.gesture_confidence_threshold;
            self.dispatch_from(|state| {
                let question = state.current_question()?;
                gesture_intent(
                    &observation,
                    state.arbiter(),
                    question.option_count(),
                    threshold,
                )
            })
            .await;
        }

        let fragment = self.voice.lock().await.take_fragment();
        if let Some(fragment) = fragment {
            self.emit(QuizEvent::TranscriptHeard(fragment.clone()));
            if fragment.is_final {
                let result = self.parser.parse(&fragment.text);
                debug!(
                    "parsed {:?} as {:?} ({:?})",
                    result.original_text, result.command, result.confidence_tier
                );
                self.dispatch_from(|state| voice_intent(&result, state.arbiter()))
                    .await;
            }
        }
    }

    pub async fn select_option(&self, option_index: usize) -> bool {
        self.dispatch(Intent::Propose {
            modality: Modality::Click,
            option_index,
        })
        .await
    }

    /// Confirm button on the confirmation panel.
    pub async fn confirm_pending(&self) -> bool {
        self.dispatch(Intent::Confirm {
            via: Modality::Click,
        })
        .await
    }

    /// Cancel button on the confirmation panel.
    pub async fn cancel_pending(&self) -> bool {
        self.dispatch(Intent::Cancel {
            via: Modality::Click,
        })
        .await
    }

    pub async fn next_question(&self) -> bool {
        self.dispatch(Intent::Next).await
    }

    pub async fn repeat_question(&self) -> bool {
        self.dispatch(Intent::Repeat).await
    }

    /// Back to question one with a fresh score. Camera and microphone are
    /// switched off; the user turns them back on for the new playthrough.
    pub async fn restart(&self) -> bool {
        let restarted = self.dispatch(Intent::Restart).await;
        if let Err(err) = self.gesture.lock().await.disable().await {
            warn!("failed to stop gesture input: {err:?}");
        }
        self.voice.lock().await.disable();
        self.emit_state_changed().await;
        restarted
    }

    pub async fn enable_gesture(&self) -> Result<()> {
        let result = self.gesture.lock().await.enable().await;
        if let Err(err) = &result {
            warn!("gesture input unavailable: {err:?}");
        }
        self.emit_state_changed().await;
        result
    }

    pub async fn disable_gesture(&self) -> Result<()> {
        let result = self.gesture.lock().await.disable().await;
        self.emit_state_changed().await;
        result
    }

    pub async fn enable_voice(&self) -> Result<()> {
        let result = self.voice.lock().await.enable();
        if let Err(err) = &result {
            warn!("voice input unavailable: {err:?}");
        }
        self.emit_state_changed().await;
        result
    }

    pub async fn disable_voice(&self) {
        self.voice.lock().await.disable();
        self.emit_state_changed().await;
    }

    /// Recognizer callbacks.
    pub async fn on_transcript(&self, fragment: TranscriptFragment) {
        self.voice.lock().await.on_fragment(fragment);
    }

    pub async fn on_voice_error(&self, message: &str) {
        self.voice.lock().await.on_error(message);
        self.emit_state_changed().await;
    }

    pub async fn on_voice_ended(&self) {
        self.voice.lock().await.on_ended();
    }

    /// Detector callback for hosts that push landmarks.
    pub async fn on_hand_frame(&self, landmarks: Option<Vec<Landmark>>) {
        self.gesture.lock().await.on_hand_frame(landmarks);
    }

    pub async fn hand_overlay(&self) -> Option<Vec<Landmark>> {
        self.gesture.lock().await.overlay()
    }

    pub fn preferences(&self) -> Preferences {
        self.feedback.preferences()
    }

    pub async fn set_preferences(&self, preferences: Preferences) {
        self.feedback.set_preferences(preferences);
        self.emit_state_changed().await;
    }

    pub async fn snapshot(&self) -> QuizSnapshot {
        let mut snapshot = {
            let state = self.state.lock().await;
            QuizSnapshot {
                playthrough_id: state.playthrough_id().to_string(),
                question_index: state.current_question_index(),
                total_questions: state.total_questions(),
                question: state.current_question().cloned(),
                selected_answer: state.selected_answer(),
                pending: state.pending().cloned(),
                confirmation_visible: state.arbiter().confirmation_visible(),
                score: state.score(),
                results_shown: state.results_shown(),
                summary: state.results_shown().then(|| state.summary()),
                gesture_status: ModalityStatus::Off,
                voice_status: ModalityStatus::Off,
                reduced_motion: false,
            }
        };
        snapshot.gesture_status = self.gesture.lock().await.status();
        snapshot.voice_status = self.voice.lock().await.status();
        snapshot.reduced_motion = self.feedback.preferences().reduced_motion;
        snapshot
    }

    async fn report_modality(&self, modality: Modality, status: ModalityStatus) {
        info!("{} input is now {:?}", modality.as_str(), status);
        self.emit(QuizEvent::ModalityChanged { modality, status });
        self.emit_state_changed().await;
    }

    async fn emit_state_changed(&self) {
        let snapshot = self.snapshot().await;
        self.emit(QuizEvent::StateChanged(snapshot));
    }

    fn emit(&self, event: QuizEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{CameraSource, Frame, HandDetector, SpeechRecognizer};
    use crate::feedback::recording::{hub, Recorder};
    use crate::gesture::{posed_hand, FingerVector};
    use crate::quiz::lifecycle::Tone;
    use crate::quiz::questions::question_bank;

    struct IdleCamera;

    impl CameraSource for IdleCamera {
        fn start(&mut self) -> Result<()> {
            Ok(())
        }
        fn stop(&mut self) {}
        fn grab_frame(&mut self) -> Result<Option<Frame>> {
            Ok(None)
        }
    }

    struct NoHands;

    impl HandDetector for NoHands {
        fn detect(&mut self, _frame: &Frame) -> Result<Option<Vec<Landmark>>> {
            Ok(None)
        }
    }

    struct QuietRecognizer;

    impl SpeechRecognizer for QuietRecognizer {
        fn start(&mut self, _language: &str) -> Result<()> {
            Ok(())
        }
        fn stop(&mut self) {}
        fn abort(&mut self) {}
    }

    // Long frame interval: the tests feed mailboxes by hand and pump explicitly.
    fn quiz(recorder: &Arc<Recorder>) -> QuizController {
        let config = QuizConfig {
            frame_interval: Duration::from_secs(3600),
            ..QuizConfig::default()
        };
        let gesture = GestureInput::new(
            Box::new(IdleCamera),
            Box::new(NoHands),
            config.frame_interval,
            config.stable_frames,
        );
        let voice = VoiceInput::new(Box::new(QuietRecognizer), "es-ES");
        QuizController::new(
            question_bank(),
            config,
            hub(recorder, Preferences::default()),
            gesture,
            voice,
        )
    }

    async fn show_hand(quiz: &QuizController, fingers: u8) {
        quiz.on_hand_frame(Some(posed_hand(FingerVector::with_count(fingers))))
            .await;
        quiz.pump().await;
    }

    async fn say(quiz: &QuizController, text: &str) {
        quiz.on_transcript(TranscriptFragment::final_text(text)).await;
        quiz.pump().await;
    }

    fn drain(events: &mut broadcast::Receiver<QuizEvent>) -> Vec<QuizEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn gesture_answer_auto_advances_after_delay() {
        let recorder = Arc::new(Recorder::default());
        let quiz = quiz(&recorder);
        quiz.start().await.unwrap();
        quiz.enable_gesture().await.unwrap();

        show_hand(&quiz, 2).await;
        let snapshot = quiz.snapshot().await;
        assert_eq!(snapshot.confirmation_visible, Some(Modality::Gesture));
        assert_eq!(snapshot.pending.map(|p| p.option_index), Some(1));

        show_hand(&quiz, 0).await;
        let snapshot = quiz.snapshot().await;
        assert_eq!(snapshot.selected_answer, Some(1));
        assert_eq!(snapshot.score, 1);

        time::sleep(Duration::from_millis(1990)).await;
        assert_eq!(quiz.snapshot().await.question_index, 0);

        time::sleep(Duration::from_millis(20)).await;
        let snapshot = quiz.snapshot().await;
        assert_eq!(snapshot.question_index, 1);
        assert_eq!(snapshot.selected_answer, None);

        quiz.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn restart_inside_delay_window_cancels_auto_advance() {
        let recorder = Arc::new(Recorder::default());
        let quiz = quiz(&recorder);
        quiz.start().await.unwrap();
        quiz.enable_gesture().await.unwrap();
        quiz.enable_voice().await.unwrap();

        show_hand(&quiz, 3).await;
        show_hand(&quiz, 0).await;
        assert_eq!(quiz.snapshot().await.selected_answer, Some(2));

        time::sleep(Duration::from_millis(500)).await;
        assert!(quiz.restart().await);
        time::sleep(Duration::from_secs(3)).await;

        let snapshot = quiz.snapshot().await;
        assert_eq!(snapshot.question_index, 0);
        assert_eq!(snapshot.selected_answer, None);
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.gesture_status, ModalityStatus::Off);
        assert_eq!(snapshot.voice_status, ModalityStatus::Off);

        quiz.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_dispatches_speak_in_apply_order() {
        for _ in 0..50 {
            let recorder = Arc::new(Recorder::default());
            let quiz = quiz(&recorder);

            let click = tokio::spawn({
                let quiz = quiz.clone();
                async move { quiz.select_option(1).await }
            });
            let restart = tokio::spawn({
                let quiz = quiz.clone();
                async move { quiz.dispatch(Intent::Restart).await }
            });
            assert!(click.await.unwrap());
            assert!(restart.await.unwrap());

            // whatever was said last describes the state the quiz ended in
            let snapshot = quiz.snapshot().await;
            let announcement = snapshot.question.unwrap().announcement();
            let spoken = recorder.spoken.lock().unwrap().clone();
            assert_eq!(spoken.len(), 2);
            if snapshot.score == 1 {
                assert_ne!(spoken[1], announcement);
                assert_eq!(*recorder.tones.lock().unwrap(), vec![Tone::Success]);
            } else {
                assert_eq!(spoken[1], announcement);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn voice_answer_waits_for_next() {
        let recorder = Arc::new(Recorder::default());
        let quiz = quiz(&recorder);
        quiz.start().await.unwrap();
        quiz.enable_voice().await.unwrap();

        say(&quiz, "segunda opción").await;
        assert_eq!(
            quiz.snapshot().await.confirmation_visible,
            Some(Modality::Voice)
        );
        say(&quiz, "confirmar").await;
        assert_eq!(quiz.snapshot().await.selected_answer, Some(1));
        assert_eq!(*recorder.tones.lock().unwrap(), vec![Tone::Success]);

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(quiz.snapshot().await.question_index, 0);

        say(&quiz, "siguiente").await;
        assert_eq!(quiz.snapshot().await.question_index, 1);

        quiz.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn interim_transcripts_are_shown_but_not_acted_on() {
        let recorder = Arc::new(Recorder::default());
        let quiz = quiz(&recorder);
        let mut events = quiz.subscribe();
        quiz.start().await.unwrap();
        quiz.enable_voice().await.unwrap();

        quiz.on_transcript(TranscriptFragment::interim("opción a"))
            .await;
        quiz.pump().await;

        assert!(quiz.snapshot().await.pending.is_none());
        assert!(drain(&mut events).iter().any(|event| matches!(
            event,
            QuizEvent::TranscriptHeard(fragment) if fragment.text == "opción a" && !fragment.is_final
        )));

        quiz.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn buffered_input_does_not_leak_into_next_question() {
        let recorder = Arc::new(Recorder::default());
        let quiz = quiz(&recorder);
        quiz.start().await.unwrap();
        quiz.enable_voice().await.unwrap();
        quiz.enable_gesture().await.unwrap();

        assert!(quiz.select_option(1).await);
        quiz.on_transcript(TranscriptFragment::final_text("tercera opción"))
            .await;
        quiz.on_hand_frame(Some(posed_hand(FingerVector::with_count(4))))
            .await;
        assert!(quiz.next_question().await);

        quiz.pump().await;
        let snapshot = quiz.snapshot().await;
        assert_eq!(snapshot.question_index, 1);
        assert!(snapshot.pending.is_none());
        assert_eq!(snapshot.selected_answer, None);

        quiz.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn only_owner_or_panel_click_resolves_confirmation() {
        let recorder = Arc::new(Recorder::default());
        let quiz = quiz(&recorder);
        quiz.start().await.unwrap();
        quiz.enable_voice().await.unwrap();
        quiz.enable_gesture().await.unwrap();

        show_hand(&quiz, 1).await;
        say(&quiz, "confirmar").await;
        assert!(quiz.snapshot().await.pending.is_some());

        // a click on a different option cannot jump the queue
        assert!(!quiz.select_option(2).await);

        assert!(quiz.confirm_pending().await);
        let snapshot = quiz.snapshot().await;
        assert_eq!(snapshot.selected_answer, Some(0));
        assert_eq!(snapshot.score, 0);

        quiz.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn voice_failure_leaves_click_working() {
        let recorder = Arc::new(Recorder::default());
        let quiz = quiz(&recorder);
        let mut events = quiz.subscribe();
        quiz.start().await.unwrap();
        quiz.enable_voice().await.unwrap();

        quiz.on_voice_error("network").await;
        // let the driver see the status change
        time::sleep(Duration::from_millis(1)).await;

        assert!(matches!(
            quiz.snapshot().await.voice_status,
            ModalityStatus::Error(_)
        ));
        assert!(drain(&mut events).iter().any(|event| matches!(
            event,
            QuizEvent::ModalityChanged {
                modality: Modality::Voice,
                status: ModalityStatus::Error(_)
            }
        )));

        assert!(quiz.select_option(1).await);
        assert_eq!(quiz.snapshot().await.score, 1);

        quiz.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn results_are_announced_once_after_last_answer() {
        let recorder = Arc::new(Recorder::default());
        let quiz = quiz(&recorder);
        let mut events = quiz.subscribe();
        quiz.start().await.unwrap();

        for correct in [1, 3, 2] {
            assert!(quiz.select_option(correct).await);
            assert!(quiz.next_question().await);
        }
        assert!(quiz.select_option(0).await);
        assert!(!quiz.next_question().await);

        time::sleep(Duration::from_millis(1400)).await;
        assert!(!quiz.snapshot().await.results_shown);

        time::sleep(Duration::from_millis(200)).await;
        let snapshot = quiz.snapshot().await;
        assert!(snapshot.results_shown);
        let summary = snapshot.summary.expect("summary");
        assert_eq!(summary.score, 3);
        assert_eq!(summary.percentage, 75);

        let completed = drain(&mut events)
            .into_iter()
            .filter(|event| matches!(event, QuizEvent::SessionCompleted(_)))
            .count();
        assert_eq!(completed, 1);

        quiz.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_announces_first_question() {
        let recorder = Arc::new(Recorder::default());
        let quiz = quiz(&recorder);
        quiz.start().await.unwrap();
        quiz.start().await.unwrap();

        let spoken = recorder.spoken.lock().unwrap().clone();
        assert_eq!(spoken.len(), 1);
        assert!(spoken[0].contains("Francia"));

        quiz.shutdown().await;
    }
}
