//! Note representation.
//!
//! A note is one sounding event of a track with pitch, start/end time and
//! velocity, as extracted by the tokenizer backend.

use super::note_to_name;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier correlating a note with the tokens that encode it.
///
/// Unique within a single response's note collection. Not unique across
/// responses, which is why lookups always pair it with a `ResponseId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(u64);

impl NoteId {
    /// Wraps a raw note id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single note of a track.
///
/// Times are in the tokenizer's tick units; the piano roll scales them to
/// pixels with its own time scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Correlation id shared with the note's tokens.
    pub note_id: NoteId,

    /// MIDI note number (0-127). 60 = Middle C (C4).
    pub pitch: u8,

    /// Start time in ticks.
    pub start: f64,

    /// End time in ticks. Expected to be greater than `start`.
    pub end: f64,

    /// Note velocity.
    pub velocity: f64,

    /// Display name sent by the backend, e.g. "C4".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Note {
    /// Creates a note without a backend-provided name.
    pub fn new(note_id: u64, pitch: u8, start: f64, end: f64, velocity: f64) -> Self {
        Self {
            note_id: NoteId::new(note_id),
            pitch: pitch.min(127),
            start,
            end,
            velocity,
            name: None,
        }
    }

    /// Returns the display name, derived from the pitch when the backend
    /// didn't send one.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| note_to_name(self.pitch as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_creation() {
        let note = Note::new(3, 60, 0.0, 480.0, 100.0);
        assert_eq!(note.note_id, NoteId::new(3));
        assert_eq!(note.pitch, 60);
        assert_eq!(note.end, 480.0);
        assert_eq!(note.display_name(), "C4");
    }

    #[test]
    fn test_pitch_clamping() {
        let note = Note::new(1, 200, 0.0, 10.0, 64.0);
        assert_eq!(note.pitch, 127);
    }

    #[test]
    fn test_deserialize_backend_note() {
        let json = r#"{"pitch": 62, "name": "D4", "start": 0, "end": 240, "velocity": 90, "note_id": 7}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.note_id, NoteId::new(7));
        assert_eq!(note.display_name(), "D4");
        assert_eq!(note.end, 240.0);
    }
}
