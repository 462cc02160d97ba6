use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::channel::{Speaker, Utterance};

/// One speaker-labeled transcript line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptLine {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Accumulates utterances, in arrival order, into one transcript
///
/// Each speaker has at most one open line. Partials overwrite it in place,
/// even when the other speaker talked in between, and a final utterance
/// replaces it and closes it. An interrupted partial therefore never
/// survives next to its own final text.
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    lines: Vec<TranscriptLine>,
    /// Per speaker, the index of the line still being revised by partials
    open_lines: HashMap<Speaker, usize>,
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a final utterance
    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.apply(Utterance::new(speaker, text, true));
    }

    pub fn apply(&mut self, utterance: Utterance) {
        let Utterance {
            speaker,
            text,
            is_final,
            timestamp,
        } = utterance;

        match self.open_lines.get(&speaker).copied() {
            Some(index) => {
                let line = &mut self.lines[index];
                debug!("Revising partial {} line: {:?} -> {:?}", speaker.label(), line.text, text);
                line.text = text;
                line.timestamp = timestamp;
            }
            None => {
                self.lines.push(TranscriptLine {
                    speaker,
                    text,
                    timestamp,
                });
                self.open_lines.insert(speaker, self.lines.len() - 1);
            }
        }

        if is_final {
            self.open_lines.remove(&speaker);
        }
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The transcript as `Label: text` lines
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| format!("{}: {}", line.speaker.label(), line.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.open_lines.clear();
    }
}
