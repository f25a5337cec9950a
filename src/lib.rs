//! miditok-viz - A terminal visualizer for tokenized MIDI.
//!
//! This library provides the visualization core (token flattening,
//! note/token cross-referencing, grid pagination, piano roll geometry, and
//! hover/selection highlighting) plus the ratatui front end that drives it.

pub mod app;
pub mod config;
pub mod midi;
pub mod ui;
pub mod viz;

// Re-export commonly used types
pub use app::App;
pub use config::{Config, ConfigError};
pub use midi::{ApiResponse, DataError, LoadedResponse, Note, NoteId, ResponseId, Token, TokenType};
pub use viz::{SelectionEvent, SelectionState};
