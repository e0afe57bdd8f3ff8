use serde::{Deserialize, Serialize};

/// Canonical command recognised in a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoiceCommand {
    SelectOption(usize),
    Repeat,
    Next,
    Confirm,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfidenceTier {
    /// The whole transcript is a known phrase.
    High,
    /// A known phrase appears somewhere in the transcript.
    Medium,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParseResult {
    pub command: Option<VoiceCommand>,
    pub confidence_tier: ConfidenceTier,
    pub original_text: String,
}

impl VoiceParseResult {
    /// `None`-tier results are never forwarded to the arbiter.
    pub fn is_actionable(&self) -> bool {
        self.confidence_tier != ConfidenceTier::None && self.command.is_some()
    }
}

use VoiceCommand::{Cancel, Confirm, Next, Repeat, SelectOption};

// Order matters for partial matches: the first key contained in the
// transcript wins. A key must come before every shorter key it contains
// ("opción cuatro" before "opción c", "dos" before "d"), so multi-word
// phrases come first and single letters last.
const PHRASES: &[(&str, VoiceCommand)] = &[
    ("opción a", SelectOption(0)),
    ("opcion a", SelectOption(0)),
    ("primera opción", SelectOption(0)),
    ("primera opcion", SelectOption(0)),
    ("opción uno", SelectOption(0)),
    ("opcion uno", SelectOption(0)),
    ("opción 1", SelectOption(0)),
    ("opcion 1", SelectOption(0)),
    ("la primera", SelectOption(0)),
    ("primera", SelectOption(0)),
    ("opción b", SelectOption(1)),
    ("opcion b", SelectOption(1)),
    ("segunda opción", SelectOption(1)),
    ("segunda opcion", SelectOption(1)),
    ("opción dos", SelectOption(1)),
    ("opcion dos", SelectOption(1)),
    ("opción 2", SelectOption(1)),
    ("opcion 2", SelectOption(1)),
    ("la segunda", SelectOption(1)),
    ("segunda", SelectOption(1)),
    ("opción cuatro", SelectOption(3)),
    ("opcion cuatro", SelectOption(3)),
    ("opción c", SelectOption(2)),
    ("opcion c", SelectOption(2)),
    ("tercera opción", SelectOption(2)),
    ("tercera opcion", SelectOption(2)),
    ("opción tres", SelectOption(2)),
    ("opcion tres", SelectOption(2)),
    ("opción 3", SelectOption(2)),
    ("opcion 3", SelectOption(2)),
    ("la tercera", SelectOption(2)),
    ("tercera", SelectOption(2)),
    ("opción d", SelectOption(3)),
    ("opcion d", SelectOption(3)),
    ("cuarta opción", SelectOption(3)),
    ("cuarta opcion", SelectOption(3)),
    ("opción 4", SelectOption(3)),
    ("opcion 4", SelectOption(3)),
    ("la cuarta", SelectOption(3)),
    ("cuarta", SelectOption(3)),
    ("repetir pregunta", Repeat),
    ("repite la pregunta", Repeat),
    ("repetir", Repeat),
    ("repite", Repeat),
    ("otra vez", Repeat),
    ("siguiente pregunta", Next),
    ("siguiente", Next),
    ("próxima", Next),
    ("proxima", Next),
    ("avanzar", Next),
    ("confirmar", Confirm),
    ("confirmo", Confirm),
    ("confirma", Confirm),
    ("cancelar", Cancel),
    ("cancela", Cancel),
    ("cancelo", Cancel),
    ("uno", SelectOption(0)),
    ("dos", SelectOption(1)),
    ("tres", SelectOption(2)),
    ("cuatro", SelectOption(3)),
    ("a", SelectOption(0)),
    ("b", SelectOption(1)),
    ("c", SelectOption(2)),
    ("d", SelectOption(3)),
    ("1", SelectOption(0)),
    ("2", SelectOption(1)),
    ("3", SelectOption(2)),
    ("4", SelectOption(3)),
    ("sí", Confirm),
    ("si", Confirm),
    ("no", Cancel),
];

/// Maps free-form transcripts to commands through a fixed phrase table.
#[derive(Debug, Clone)]
pub struct VoiceCommandParser {
    phrases: &'static [(&'static str, VoiceCommand)],
}

impl VoiceCommandParser {
    pub fn new() -> Self {
        Self { phrases: PHRASES }
    }

    pub fn parse(&self, transcript: &str) -> VoiceParseResult {
        let normalized = transcript.trim().to_lowercase();

        let (command, confidence_tier) = if normalized.is_empty() {
            (None, ConfidenceTier::None)
        } else if let Some((_, command)) = self.phrases.iter().find(|(key, _)| *key == normalized)
        {
            (Some(*command), ConfidenceTier::High)
        } else if let Some((_, command)) = self
            .phrases
            .iter()
            .find(|(key, _)| normalized.contains(*key))
        {
            (Some(*command), ConfidenceTier::Medium)
        } else {
            (None, ConfidenceTier::None)
        };

        VoiceParseResult {
            command,
            confidence_tier,
            original_text: transcript.to_string(),
        }
    }
}

impl Default for VoiceCommandParser {
    fn default() -> Self {
        Self::new()
    }
}
