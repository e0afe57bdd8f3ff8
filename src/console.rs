//! Text-mode host. Each stdin line is one user action; clicks, transcripts
//! and hand poses go through the same pipeline a graphical shell would use.

use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use crate::devices::{CameraSource, Frame, HandDetector, SpeechOutput, SpeechRecognizer};
use crate::feedback::{FeedbackHub, LoggedHaptics, ToneEngineHandle};
use crate::gesture::{posed_hand, FingerVector, GestureInput, Landmark};
use crate::quiz::{option_letter, question_bank, QuizController, QuizEvent};
use crate::settings::{Preferences, QuizConfig, SettingsStore};
use crate::voice::{TranscriptFragment, VoiceInput};

type HeldPose = Arc<Mutex<Option<Vec<Landmark>>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceToggle {
    Sound,
    Speech,
    Haptics,
    ReducedMotion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Click(usize),
    Confirm,
    Cancel,
    Say(String),
    /// `None` takes the hand out of view.
    Hand(Option<u8>),
    Voice(bool),
    Camera(bool),
    Next,
    Repeat,
    Restart,
    Preference(PreferenceToggle, bool),
    Status,
    Help,
    Quit,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "click" => ConsoleCommand::Click(parse_option(rest)?),
            "confirmar" => ConsoleCommand::Confirm,
            "cancelar" => ConsoleCommand::Cancel,
            "di" => {
                if rest.is_empty() {
                    bail!("uso: di <texto>");
                }
                ConsoleCommand::Say(rest.to_string())
            }
            "mano" if rest.is_empty() => ConsoleCommand::Hand(None),
            "mano" => {
                let count: u8 = rest.parse().context("uso: mano <0-5>")?;
                if count > 5 {
                    bail!("una mano tiene como mucho 5 dedos");
                }
                ConsoleCommand::Hand(Some(count))
            }
            "voz" => ConsoleCommand::Voice(parse_switch(rest)?),
            "camara" | "cámara" => ConsoleCommand::Camera(parse_switch(rest)?),
            "siguiente" => ConsoleCommand::Next,
            "repetir" => ConsoleCommand::Repeat,
            "reiniciar" => ConsoleCommand::Restart,
            "sonido" => ConsoleCommand::Preference(PreferenceToggle::Sound, parse_switch(rest)?),
            "narracion" | "narración" => {
                ConsoleCommand::Preference(PreferenceToggle::Speech, parse_switch(rest)?)
            }
            "vibracion" | "vibración" => {
                ConsoleCommand::Preference(PreferenceToggle::Haptics, parse_switch(rest)?)
            }
            "movimiento" => {
                // "movimiento off" asks for reduced motion
                ConsoleCommand::Preference(PreferenceToggle::ReducedMotion, !parse_switch(rest)?)
            }
            "estado" => ConsoleCommand::Status,
            "ayuda" | "help" => ConsoleCommand::Help,
            "salir" | "exit" => ConsoleCommand::Quit,
            other => bail!("comando desconocido: {other} (escribe «ayuda»)"),
        };
        Ok(Some(command))
    }
}

/// `1`-`4` or `a`-`d`.
fn parse_option(arg: &str) -> Result<usize> {
    let arg = arg.trim().to_lowercase();
    if let Ok(number) = arg.parse::<usize>() {
        if number == 0 {
            bail!("las opciones empiezan en 1");
        }
        return Ok(number - 1);
    }
    match arg.as_str() {
        "a" => Ok(0),
        "b" => Ok(1),
        "c" => Ok(2),
        "d" => Ok(3),
        _ => bail!("uso: click <1-4|a-d>"),
    }
}

fn parse_switch(arg: &str) -> Result<bool> {
    match arg.trim().to_lowercase().as_str() {
        "on" | "si" | "sí" => Ok(true),
        "off" | "no" => Ok(false),
        _ => bail!("uso: on|off"),
    }
}

fn apply_toggle(preferences: &mut Preferences, toggle: PreferenceToggle, value: bool) {
    match toggle {
        PreferenceToggle::Sound => preferences.sound_enabled = value,
        PreferenceToggle::Speech => preferences.speech_enabled = value,
        PreferenceToggle::Haptics => preferences.haptics_enabled = value,
        PreferenceToggle::ReducedMotion => preferences.reduced_motion = value,
    }
}

struct ConsoleSpeech;

impl SpeechOutput for ConsoleSpeech {
    fn speak(&self, text: &str) {
        println!("🔊 {text}");
    }
}

/// Produces a blank frame per tick while started; the detector supplies the pose.
#[derive(Default)]
struct SyntheticCamera {
    running: bool,
}

impl CameraSource for SyntheticCamera {
    fn start(&mut self) -> Result<()> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn grab_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.running.then(Frame::empty))
    }
}

struct HeldPoseDetector {
    pose: HeldPose,
}

impl HandDetector for HeldPoseDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Option<Vec<Landmark>>> {
        match self.pose.lock() {
            Ok(pose) => Ok(pose.clone()),
            Err(poisoned) => Ok(poisoned.into_inner().clone()),
        }
    }
}

/// Transcripts arrive as `di ...` lines, so there is no engine to drive.
struct TypedRecognizer;

impl SpeechRecognizer for TypedRecognizer {
    fn start(&mut self, language: &str) -> Result<()> {
        log::debug!("typed recognizer listening ({language})");
        Ok(())
    }

    fn stop(&mut self) {}

    fn abort(&mut self) {}
}

fn print_help() {
    println!(
        "Comandos: click <1-4|a-d>, confirmar, cancelar, di <texto>, mano <0-5>, mano,\n\
         voz on|off, camara on|off, siguiente, repetir, reiniciar,\n\
         sonido|narracion|vibracion|movimiento on|off, estado, ayuda, salir"
    );
}

async fn print_events(mut events: broadcast::Receiver<QuizEvent>) {
    loop {
        match events.recv().await {
            Ok(QuizEvent::ModalityChanged { modality, status }) => {
                println!("[{}] {:?}", modality.as_str(), status);
            }
            Ok(QuizEvent::TranscriptHeard(fragment)) if !fragment.is_final => {
                println!("… {}", fragment.text);
            }
            Ok(QuizEvent::SessionCompleted(summary)) => {
                println!(
                    "== {}/{} ({}%) ==",
                    summary.score, summary.total_questions, summary.percentage
                );
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::debug!("console skipped {skipped} events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn execute(
    quiz: &QuizController,
    settings: &SettingsStore,
    pose: &HeldPose,
    command: ConsoleCommand,
) -> Result<()> {
    match command {
        ConsoleCommand::Click(option_index) => {
            if !quiz.select_option(option_index).await {
                println!("(opción {} ignorada)", option_letter(option_index));
            }
        }
        ConsoleCommand::Confirm => {
            quiz.confirm_pending().await;
        }
        ConsoleCommand::Cancel => {
            quiz.cancel_pending().await;
        }
        ConsoleCommand::Say(text) => {
            quiz.on_transcript(TranscriptFragment::final_text(text))
                .await;
        }
        ConsoleCommand::Hand(count) => {
            let landmarks = count.map(|count| posed_hand(FingerVector::with_count(count)));
            match pose.lock() {
                Ok(mut held) => *held = landmarks,
                Err(poisoned) => *poisoned.into_inner() = landmarks,
            }
        }
        ConsoleCommand::Voice(true) => quiz.enable_voice().await?,
        ConsoleCommand::Voice(false) => quiz.disable_voice().await,
        ConsoleCommand::Camera(true) => quiz.enable_gesture().await?,
        ConsoleCommand::Camera(false) => quiz.disable_gesture().await?,
        ConsoleCommand::Next => {
            if !quiz.next_question().await {
                println!("(primero responde la pregunta)");
            }
        }
        ConsoleCommand::Repeat => {
            quiz.repeat_question().await;
        }
        ConsoleCommand::Restart => {
            quiz.restart().await;
        }
        ConsoleCommand::Preference(toggle, value) => {
            let mut preferences = quiz.preferences();
            apply_toggle(&mut preferences, toggle, value);
            quiz.set_preferences(preferences.clone()).await;
            settings.update(preferences)?;
        }
        ConsoleCommand::Status => {
            let snapshot = quiz.snapshot().await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        ConsoleCommand::Help => print_help(),
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

pub async fn run(settings: SettingsStore, config: QuizConfig) -> Result<()> {
    let preferences = settings.preferences();
    let pose: HeldPose = Arc::new(Mutex::new(None));

    let gesture = GestureInput::new(
        Box::new(SyntheticCamera::default()),
        Box::new(HeldPoseDetector { pose: pose.clone() }),
        config.frame_interval,
        config.stable_frames,
    );
    let voice = VoiceInput::new(Box::new(TypedRecognizer), preferences.language.clone());
    let feedback = FeedbackHub::new(
        Arc::new(ConsoleSpeech),
        Arc::new(ToneEngineHandle::new()),
        Arc::new(LoggedHaptics),
        preferences,
    );

    let quiz = QuizController::new(question_bank(), config, feedback, gesture, voice);
    let printer = tokio::spawn(print_events(quiz.subscribe()));

    print_help();
    quiz.start().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        if command == ConsoleCommand::Quit {
            break;
        }
        if let Err(err) = execute(&quiz, &settings, &pose, command).await {
            println!("error: {err:#}");
        }
    }

    quiz.shutdown().await;
    printer.abort();
    Ok(())
}
