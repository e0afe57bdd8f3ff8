pub mod capture;
pub mod parser;

pub use capture::{TranscriptFragment, VoiceInput};
pub use parser::{ConfidenceTier, VoiceCommand, VoiceCommandParser, VoiceParseResult};
