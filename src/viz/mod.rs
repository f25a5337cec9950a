//! Core visualizer logic, independent of the terminal.
//!
//! Flattening, cross-referencing, grid projection, roll geometry, and the
//! shared hover/selection state all live here so they can be tested without
//! a frame to draw into.

pub mod flatten;
pub mod geometry;
pub mod grid;
pub mod highlight;
pub mod selection;
pub mod xref;

pub use geometry::{PianoRollGeometry, PixelRect, RollMetrics};
pub use grid::{GridCell, GridProjection, Pager};
pub use highlight::{hit_test, roll_commands, DrawCommand, VisualState};
pub use selection::{SelectionEvent, SelectionState};
pub use xref::{NoteRef, TokenRef};
