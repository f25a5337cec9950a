//! Piano roll geometry.
//!
//! Maps musical coordinates (pitch, time) to canvas pixels and back. The
//! canvas is sized from the extents of *all* tracks of a response, so the
//! viewport stays put when the user switches between tracks; only the set of
//! drawn notes changes.
//!
//! Canvas layout, y growing downwards:
//!
//! ```text
//!  0 ┌──────────┬──────────────────────────────┐
//!    │ keyboard │ highOctave row               │
//!    │          │ ...                          │
//!    │          │ lowOctave row                │
//!  H └──────────┴──────────────────────────────┘
//!    0    keyboard_width                     W
//! ```

use crate::midi::{is_black_key, note_to_name, Note};
use serde::{Deserialize, Serialize};

/// Pitch range used when a response has no notes at all.
pub const FALLBACK_PITCH_RANGE: (i32, i32) = (60, 72);

/// Fixed scale factors of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollMetrics {
    /// Height of one pitch row in pixels.
    pub note_row_height: f64,
    /// Width reserved for the keyboard before time zero, in pixels.
    pub keyboard_width: f64,
    /// Pixels per tick.
    pub time_scale: f64,
    /// Lower bound of the canvas width, in pixels.
    pub min_grid_width: f64,
}

impl Default for RollMetrics {
    fn default() -> Self {
        Self {
            note_row_height: 20.0,
            keyboard_width: 75.0 + 10.0, // white key plus gap
            time_scale: 0.5,
            min_grid_width: 1000.0,
        }
    }
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    /// Returns the right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Returns the bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Checks if a point lies inside the rectangle, edges included.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

/// One key of the keyboard column.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyLabel {
    pub pitch: i32,
    /// Note name with octave, e.g. "C#4".
    pub name: String,
    pub is_black: bool,
    /// Top edge of the key's row.
    pub y: f64,
}

/// Coordinate transform of one response's piano roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PianoRollGeometry {
    pub metrics: RollMetrics,
    /// Lowest pitch present in any track (or the fallback).
    pub lowest_pitch: i32,
    /// Highest pitch present in any track (or the fallback).
    pub highest_pitch: i32,
    /// Bottom row pitch: the octave boundary one octave below the lowest note.
    pub low_octave: i32,
    /// Top row pitch: the end of the octave one octave above the highest note.
    pub high_octave: i32,
    /// Largest note end across all tracks, in ticks.
    pub max_end_time: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl PianoRollGeometry {
    /// Computes the geometry from every track of a response.
    ///
    /// The active track is not an input: extents are global so
    /// switching tracks never rescales the canvas.
    pub fn compute(tracks: &[Vec<Note>], metrics: RollMetrics) -> Self {
        let mut notes = tracks.iter().flatten().peekable();

        let (lowest_pitch, highest_pitch, max_end_time) = if notes.peek().is_none() {
            (FALLBACK_PITCH_RANGE.0, FALLBACK_PITCH_RANGE.1, 0.0)
        } else {
            notes.fold((i32::MAX, i32::MIN, 0.0_f64), |(low, high, end), note| {
                let pitch = note.pitch as i32;
                (low.min(pitch), high.max(pitch), end.max(note.end))
            })
        };

        let low_octave = lowest_pitch.div_euclid(12) * 12 - 12;
        let high_octave = ceil_div(highest_pitch, 12) * 12 + 11;
        let rows = (high_octave - low_octave + 1) as f64;

        Self {
            metrics,
            lowest_pitch,
            highest_pitch,
            low_octave,
            high_octave,
            max_end_time,
            canvas_width: (max_end_time * metrics.time_scale + metrics.keyboard_width)
                .max(metrics.min_grid_width),
            canvas_height: rows * metrics.note_row_height,
        }
    }

    /// Number of pitch rows on the canvas.
    pub fn num_rows(&self) -> usize {
        (self.high_octave - self.low_octave + 1) as usize
    }

    /// Returns the top edge of a pitch's row.
    pub fn pitch_to_y(&self, pitch: i32) -> f64 {
        self.canvas_height - (pitch - self.low_octave + 1) as f64 * self.metrics.note_row_height
    }

    /// Returns the x position of a time in ticks.
    pub fn time_to_x(&self, time: f64) -> f64 {
        time * self.metrics.time_scale + self.metrics.keyboard_width
    }

    /// Returns the rectangle a note is drawn in.
    ///
    /// Width is at least one pixel so zero-length notes stay visible and
    /// clickable.
    pub fn note_rect(&self, note: &Note) -> PixelRect {
        PixelRect {
            x: self.time_to_x(note.start),
            y: self.pitch_to_y(note.pitch as i32),
            width: ((note.end - note.start) * self.metrics.time_scale).max(1.0),
            height: self.metrics.note_row_height,
        }
    }

    /// Returns the keyboard keys, lowest pitch first.
    pub fn keys(&self) -> Vec<KeyLabel> {
        (self.low_octave..=self.high_octave)
            .map(|pitch| KeyLabel {
                pitch,
                name: note_to_name(pitch),
                is_black: is_black_key(pitch),
                y: self.pitch_to_y(pitch),
            })
            .collect()
    }

    /// Returns the y positions of the horizontal row boundaries, bottom first.
    pub fn grid_lines(&self) -> Vec<f64> {
        (0..=self.num_rows())
            .map(|i| self.canvas_height - i as f64 * self.metrics.note_row_height)
            .collect()
    }
}

/// Integer ceiling division for a positive divisor.
fn ceil_div(value: i32, divisor: i32) -> i32 {
    -((-value).div_euclid(divisor))
}
