//! Token representation.
//!
//! Tokens are the typed symbols emitted by a music tokenizer. A token may be
//! tied to the note it encodes through `note_id`; structural tokens (bars,
//! positions, tempos) carry none.

use super::note::NoteId;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Token vocabulary recognized by the visualizer.
///
/// Types outside the known vocabulary are kept verbatim in `Other` so that
/// new tokenizer versions still display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TokenType {
    Bar,
    Position,
    TimeShift,
    Tempo,
    Rest,
    Pitch,
    NoteOn,
    Velocity,
    Duration,
    NoteOff,
    Family,
    TimeSig,
    MicroTiming,
    Program,
    Ignore,
    Other(String),
}

impl TokenType {
    /// Returns the type name as the tokenizer spells it.
    pub fn as_str(&self) -> &str {
        match self {
            TokenType::Bar => "Bar",
            TokenType::Position => "Position",
            TokenType::TimeShift => "TimeShift",
            TokenType::Tempo => "Tempo",
            TokenType::Rest => "Rest",
            TokenType::Pitch => "Pitch",
            TokenType::NoteOn => "NoteOn",
            TokenType::Velocity => "Velocity",
            TokenType::Duration => "Duration",
            TokenType::NoteOff => "NoteOff",
            TokenType::Family => "Family",
            TokenType::TimeSig => "TimeSig",
            TokenType::MicroTiming => "MicroTiming",
            TokenType::Program => "Program",
            TokenType::Ignore => "Ignore",
            TokenType::Other(name) => name,
        }
    }

    /// Short label that fits in a token block.
    pub fn abbreviation(&self) -> String {
        match self {
            TokenType::TimeShift => "TSh".to_string(),
            TokenType::TimeSig => "TSg".to_string(),
            TokenType::NoteOn => "On".to_string(),
            TokenType::NoteOff => "Off".to_string(),
            TokenType::MicroTiming => "MT".to_string(),
            TokenType::Position => "Pos".to_string(),
            TokenType::Velocity => "Vel".to_string(),
            TokenType::Duration => "Dur".to_string(),
            TokenType::Program => "Prg".to_string(),
            other => other.as_str().chars().take(3).collect(),
        }
    }
}

impl From<String> for TokenType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Bar" => TokenType::Bar,
            "Position" => TokenType::Position,
            "TimeShift" => TokenType::TimeShift,
            "Tempo" => TokenType::Tempo,
            "Rest" => TokenType::Rest,
            "Pitch" => TokenType::Pitch,
            "NoteOn" => TokenType::NoteOn,
            "Velocity" => TokenType::Velocity,
            "Duration" => TokenType::Duration,
            "NoteOff" => TokenType::NoteOff,
            "Family" => TokenType::Family,
            "TimeSig" => TokenType::TimeSig,
            "MicroTiming" => TokenType::MicroTiming,
            "Program" => TokenType::Program,
            "Ignore" => TokenType::Ignore,
            _ => TokenType::Other(name),
        }
    }
}

impl From<TokenType> for String {
    fn from(kind: TokenType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Track a token belongs to. Backends send either a track index or a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackRef {
    Index(i64),
    Label(String),
}

impl fmt::Display for TrackRef {
    /// Indices are shown 1-based, labels verbatim.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackRef::Index(index) => write!(f, "{}", index + 1),
            TrackRef::Label(label) => match label.trim().parse::<i64>() {
                Ok(index) => write!(f, "{}", index + 1),
                Err(_) => f.write_str(label),
            },
        }
    }
}

/// A single tokenizer symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenType,

    #[serde(default, deserialize_with = "deserialize_scalar_string")]
    pub value: String,

    #[serde(default)]
    pub time: f64,

    #[serde(default)]
    pub program: Option<i64>,

    #[serde(default, deserialize_with = "deserialize_scalar_string")]
    pub desc: String,

    /// Note this token encodes, if any.
    #[serde(default)]
    pub note_id: Option<NoteId>,

    #[serde(default)]
    pub track_id: Option<TrackRef>,
}

impl Token {
    /// Creates a token with no program, description or track.
    pub fn new(kind: TokenType, value: impl Into<String>, time: f64, note_id: Option<u64>) -> Self {
        Self {
            kind,
            value: value.into(),
            time,
            program: None,
            desc: String::new(),
            note_id: note_id.map(NoteId::new),
            track_id: None,
        }
    }
}

/// Accepts a JSON string, number or boolean and renders it as a string.
///
/// Tokenizers emit numeric values for pitches and velocities but string
/// values for durations ("1.0.8") and special tokens.
fn deserialize_scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar token value, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_types() {
        assert_eq!(TokenType::from("Pitch".to_string()), TokenType::Pitch);
        assert_eq!(
            TokenType::from("PitchDrum".to_string()),
            TokenType::Other("PitchDrum".to_string())
        );
        assert_eq!(TokenType::Other("Chord".into()).abbreviation(), "Cho");
    }

    #[test]
    fn test_deserialize_numeric_value() {
        let json = r#"{"type": "Pitch", "value": 60, "time": 0, "program": 0,
                       "desc": "", "note_id": 1, "track_id": 0}"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert_eq!(token.kind, TokenType::Pitch);
        assert_eq!(token.value, "60");
        assert_eq!(token.note_id, Some(NoteId::new(1)));
        assert_eq!(token.track_id, Some(TrackRef::Index(0)));
    }

    #[test]
    fn test_deserialize_structural_token() {
        let json = r#"{"type": "Bar", "value": "None", "time": 0, "program": null,
                       "desc": "", "note_id": null, "track_id": "Drums"}"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert_eq!(token.note_id, None);
        assert_eq!(token.program, None);
        assert_eq!(token.track_id, Some(TrackRef::Label("Drums".to_string())));
    }

    #[test]
    fn test_track_display_is_one_based() {
        assert_eq!(TrackRef::Index(0).to_string(), "1");
        assert_eq!(TrackRef::Label("2".to_string()).to_string(), "3");
        assert_eq!(TrackRef::Label("Drums".to_string()).to_string(), "Drums");
    }
}
