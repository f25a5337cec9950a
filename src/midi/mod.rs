//! Data structures for tokenized MIDI responses.
//!
//! This module provides the types a tokenizer backend hands to the visualizer:
//! typed tokens, per-track notes, file-level metrics, and the response envelope
//! that wraps them. It also owns the pitch naming helpers shared by the piano
//! roll keyboard and the token info panel.

mod note;
mod response;
mod token;

pub use note::{Note, NoteId};
pub use response::{
    ApiResponse, DataError, LoadedResponse, Metrics, ResponseData, ResponseId, TokenPayload,
};
pub use token::{Token, TokenType, TrackRef};

/// Standard MIDI note names for display purposes.
/// Maps MIDI note number (0-127) to note name within an octave.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Names that sit on black piano keys.
const BLACK_KEY_NAMES: [&str; 5] = ["C#", "D#", "F#", "G#", "A#"];

/// Returns the pitch class name ("C", "C#", ...) for a MIDI pitch number.
///
/// Pitch numbers below zero wrap around the octave, which happens for the
/// padding octave the piano roll adds under very low notes.
pub fn pitch_class_name(pitch: i32) -> &'static str {
    NOTE_NAMES[pitch.rem_euclid(12) as usize]
}

/// Converts a MIDI note number to a human-readable note name with octave.
///
/// # Arguments
///
/// * `pitch` - MIDI note number. Values outside 0-127 are named by extending
///   the same octave convention.
///
/// # Returns
///
/// String representation like "C4" or "F#5"
///
/// # Examples
///
/// ```
/// use miditok_viz::midi::note_to_name;
///
/// let name = note_to_name(60); // Middle C
/// assert_eq!(name, "C4");
/// ```
pub fn note_to_name(pitch: i32) -> String {
    let octave = pitch.div_euclid(12) - 1; // MIDI octave convention
    format!("{}{}", pitch_class_name(pitch), octave)
}

/// Checks whether a pitch falls on a black key.
///
/// Decided by the pitch class name rather than arithmetic on the pitch
/// number, since the chromatic pattern of black keys is irregular.
pub fn is_black_key(pitch: i32) -> bool {
    BLACK_KEY_NAMES.contains(&pitch_class_name(pitch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_to_name() {
        assert_eq!(note_to_name(60), "C4");
        assert_eq!(note_to_name(69), "A4");
        assert_eq!(note_to_name(0), "C-1");
        assert_eq!(note_to_name(127), "G9");
    }

    #[test]
    fn test_note_to_name_below_zero() {
        assert_eq!(note_to_name(-12), "C-2");
        assert_eq!(note_to_name(-1), "B-2");
    }

    #[test]
    fn test_black_keys_by_name() {
        let black: Vec<i32> = (60..72).filter(|&p| is_black_key(p)).collect();
        assert_eq!(black, vec![61, 63, 66, 68, 70]);
        assert!(!is_black_key(64)); // E
        assert!(!is_black_key(65)); // F
        assert!(is_black_key(-11)); // C# in the padding octave
    }
}
