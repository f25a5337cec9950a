//! Tokenizer backend responses.
//!
//! One response is produced per processed MIDI file. It carries either the
//! tokenization result (`data`) or an error message. A successfully loaded
//! response becomes a [`LoadedResponse`]: immutable for as long as its tab is
//! open, and tagged with a fresh [`ResponseId`] so that note ids from
//! different files never collide.

use super::note::Note;
use super::token::Token;
use crate::viz::flatten::{flatten, TokenNode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while loading a response file.
#[derive(Debug, Error)]
pub enum DataError {
    /// File could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// File is not a valid response document.
    #[error("invalid response JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// Response carried neither data nor an error message.
    #[error("response contains neither data nor an error")]
    Empty,
}

/// Identifier of one loaded response, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseId(Uuid);

impl ResponseId {
    /// Generates a new random response ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ResponseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `tokens` field of a response.
///
/// Anything that is not a (possibly nested) sequence of tokens is kept as
/// `Invalid` so the token grid can show a placeholder instead of failing the
/// whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenPayload {
    Nodes(Vec<TokenNode>),
    Invalid(serde_json::Value),
}

/// File-level information computed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    pub title: Option<String>,
    pub resolution: Option<i64>,
    /// (time, tempo in quarter notes per minute)
    pub tempos: Option<Vec<(f64, f64)>>,
    /// (time, root, mode)
    pub key_signatures: Option<Vec<(f64, i64, Option<String>)>>,
    /// (time, numerator, denominator)
    pub time_signatures: Option<Vec<(f64, i64, i64)>>,
    pub pitch_range: Option<f64>,
    pub n_pitches_used: Option<f64>,
    pub polyphony: Option<f64>,
    pub empty_beat_rate: Option<f64>,
    pub drum_pattern_consistency: Option<f64>,
}

impl Metrics {
    /// Returns true if any of the statistics fields is present.
    pub fn has_statistics(&self) -> bool {
        self.pitch_range.is_some()
            || self.n_pitches_used.is_some()
            || self.polyphony.is_some()
            || self.empty_beat_rate.is_some()
            || self.drum_pattern_consistency.is_some()
    }
}

/// Successful tokenization result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    pub tokens: TokenPayload,
    /// Notes grouped per track.
    #[serde(default)]
    pub notes: Vec<Vec<Note>>,
    #[serde(default)]
    pub metrics: Metrics,
}

/// Response envelope as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<ResponseData>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Envelope read without looking into `tokens`.
///
/// `IgnoredAny` skips a value without recursing, so token trees nested past
/// serde_json's depth limit still leave the rest of the response readable.
#[derive(Deserialize)]
struct ShallowResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<ShallowData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ShallowData {
    #[serde(rename = "tokens")]
    _tokens: serde::de::IgnoredAny,
    #[serde(default)]
    notes: Vec<Vec<Note>>,
    #[serde(default)]
    metrics: Metrics,
}

impl ApiResponse {
    /// Parses a response document.
    ///
    /// A document that only fails inside `tokens` still loads, with its
    /// tokens marked invalid.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a valid response document
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let error = match serde_json::from_str(json) {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        let Ok(shallow) = serde_json::from_str::<ShallowResponse>(json) else {
            return Err(error.into());
        };
        tracing::warn!("Token payload unreadable, keeping the rest: {}", error);
        Ok(Self {
            success: shallow.success,
            data: shallow.data.map(|data| ResponseData {
                tokens: TokenPayload::Invalid(serde_json::Value::Null),
                notes: data.notes,
                metrics: data.metrics,
            }),
            error: shallow.error,
        })
    }

    /// Reads and parses a response document from disk.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Splits the envelope into its data or its error message.
    ///
    /// An error message takes precedence over data, matching how the backend
    /// reports failures.
    ///
    /// # Errors
    ///
    /// Returns the backend's error text, or the `DataError::Empty` message
    /// when the envelope is empty
    pub fn into_data(self) -> Result<ResponseData, String> {
        match (self.error, self.data) {
            (Some(error), _) => Err(error),
            (None, Some(data)) => Ok(data),
            (None, None) => Err(DataError::Empty.to_string()),
        }
    }
}

/// A processed file's response, ready for display.
#[derive(Debug, Clone)]
pub struct LoadedResponse {
    id: ResponseId,
    /// Display name, usually the response file name.
    pub name: String,
    valid_tokens: bool,
    flat_tokens: Vec<Token>,
    notes: Vec<Vec<Note>>,
    /// File-level information for the music info panel.
    pub metrics: Metrics,
}

impl LoadedResponse {
    /// Builds the display form of a response, flattening its tokens once.
    pub fn new(name: impl Into<String>, data: ResponseData) -> Self {
        let (valid_tokens, flat_tokens) = match &data.tokens {
            TokenPayload::Nodes(nodes) => (true, flatten(nodes)),
            TokenPayload::Invalid(_) => (false, Vec::new()),
        };
        let name = name.into();
        tracing::debug!(
            "Loaded response {}: {} tokens, {} tracks",
            name,
            flat_tokens.len(),
            data.notes.len()
        );

        Self {
            id: ResponseId::new(),
            name,
            valid_tokens,
            flat_tokens,
            notes: data.notes,
            metrics: data.metrics,
        }
    }

    /// Returns the identifier namespacing this response's note ids.
    pub fn id(&self) -> ResponseId {
        self.id
    }

    /// Returns true if the token payload was a token sequence.
    pub fn has_valid_tokens(&self) -> bool {
        self.valid_tokens
    }

    /// Returns the flattened token stream.
    pub fn tokens(&self) -> &[Token] {
        &self.flat_tokens
    }

    /// Returns the token at a flat index.
    pub fn token(&self, index: usize) -> Option<&Token> {
        self.flat_tokens.get(index)
    }

    /// Returns the per-track note lists.
    pub fn tracks(&self) -> &[Vec<Note>] {
        &self.notes
    }

    /// Returns the notes of one track, or an empty slice for a missing track.
    pub fn track_notes(&self, track: usize) -> &[Note] {
        self.notes.get(track).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns a note by track and position within the track.
    pub fn note(&self, track: usize, index: usize) -> Option<&Note> {
        self.notes.get(track).and_then(|notes| notes.get(index))
    }
}
