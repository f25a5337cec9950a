//! Hit-testing and highlight evaluation for the piano roll and token grid.

use super::geometry::{PianoRollGeometry, PixelRect};
use super::selection::{ElementFlags, SelectionState};
use super::xref::{NoteRef, TokenRef};
use crate::midi::{LoadedResponse, Note, ResponseId, Token};

/// Visual state of a note or token block.
///
/// Selected outranks highlighted, which outranks the default look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VisualState {
    Default,
    Highlighted,
    Selected,
}

impl VisualState {
    pub fn from_flags(flags: ElementFlags) -> Self {
        if flags.selected {
            VisualState::Selected
        } else if flags.highlighted {
            VisualState::Highlighted
        } else {
            VisualState::Default
        }
    }
}

/// Finds the note under a canvas point.
///
/// Uses the same rectangles the roll is drawn with, edges inclusive. When
/// notes overlap the first one in track order wins.
pub fn hit_test(geometry: &PianoRollGeometry, notes: &[Note], x: f64, y: f64) -> Option<usize> {
    notes
        .iter()
        .position(|note| geometry.note_rect(note).contains(x, y))
}

/// Returns the visual state of the token at `index` in a response.
pub fn token_state(
    selection: &SelectionState,
    response: ResponseId,
    index: usize,
    token: &Token,
) -> VisualState {
    VisualState::from_flags(selection.token_flags(TokenRef::new(response, index), token.note_id))
}

/// Returns the visual state of a note.
pub fn note_state(selection: &SelectionState, note_ref: NoteRef, note: &Note) -> VisualState {
    VisualState::from_flags(selection.note_flags(note_ref, note.note_id))
}

/// One primitive of the piano roll, in painter order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Background band of one pitch row.
    Row {
        pitch: i32,
        y: f64,
        height: f64,
        is_black: bool,
    },
    /// Horizontal boundary between two pitch rows.
    GridLine { y: f64 },
    Note {
        note: NoteRef,
        rect: PixelRect,
        state: VisualState,
    },
}

/// Builds the draw list of one track of a response.
///
/// Rows come first, lowest pitch first, then the row boundaries, then the
/// track's notes in order. The output depends only on the arguments, so the
/// same inputs always produce the same list.
pub fn roll_commands(
    geometry: &PianoRollGeometry,
    response: &LoadedResponse,
    track: usize,
    selection: &SelectionState,
) -> Vec<DrawCommand> {
    let notes = response.track_notes(track);
    let mut commands = Vec::with_capacity(2 * geometry.num_rows() + 1 + notes.len());

    commands.extend(geometry.keys().into_iter().map(|key| DrawCommand::Row {
        pitch: key.pitch,
        y: key.y,
        height: geometry.metrics.note_row_height,
        is_black: key.is_black,
    }));
    commands.extend(
        geometry
            .grid_lines()
            .into_iter()
            .map(|y| DrawCommand::GridLine { y }),
    );

    commands.extend(notes.iter().enumerate().map(|(index, note)| {
        let note_ref = NoteRef::new(response.id(), track, index);
        DrawCommand::Note {
            note: note_ref,
            rect: geometry.note_rect(note),
            state: note_state(selection, note_ref, note),
        }
    }));

    commands
}
