//! Piano roll rendering.
//!
//! Rasterizes the roll's draw commands onto terminal cells: one row per
//! pitch, one column per `pixels_per_column` canvas pixels. Includes visual
//! indicators for notes of the active track that are scrolled off-screen.

use super::RenderError;
use crate::app::{RollViewport, TabView};
use crate::midi::{note_to_name, LoadedResponse, Note};
use crate::viz::geometry::{PianoRollGeometry, PixelRect};
use crate::viz::highlight::{roll_commands, DrawCommand, VisualState};
use crate::viz::selection::SelectionState;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Width of the note name column.
pub const KEY_LABEL_WIDTH: u16 = 5;

/// Tracks which edges of the piano roll have notes scrolled off-screen.
#[derive(Debug, Default, Clone, Copy)]
struct OffScreenIndicators {
    /// Notes exist above the visible pitch range.
    above: bool,
    /// Notes exist below the visible pitch range.
    below: bool,
    /// Notes start before the visible time range.
    left: bool,
    /// Notes extend past the visible time range.
    right: bool,
}

impl OffScreenIndicators {
    /// Calculates which edges have off-screen notes for a `cols` x `rows` window.
    fn calculate(
        rects: &[PixelRect],
        geometry: &PianoRollGeometry,
        viewport: &RollViewport,
        cols: u16,
        rows: u16,
    ) -> Self {
        let mut indicators = Self::default();

        let row_height = geometry.metrics.note_row_height;
        let top = viewport.scroll_row as f64 * row_height;
        let bottom = top + rows as f64 * row_height;
        let (left, _) = viewport.column_span(geometry, 0);
        let right = left + cols as f64 * viewport.pixels_per_column;

        for rect in rects {
            if rect.y < top {
                indicators.above = true;
            }
            if rect.y >= bottom {
                indicators.below = true;
            }
            if rect.x < left {
                indicators.left = true;
            }
            if rect.right() > right {
                indicators.right = true;
            }

            // Early exit if all indicators are set
            if indicators.above && indicators.below && indicators.left && indicators.right {
                break;
            }
        }

        indicators
    }
}

/// Builds a compact indicator string like "[^v<>]" for the title.
/// Empty string if no off-screen notes exist.
fn build_title_indicator(indicators: &OffScreenIndicators) -> String {
    let parts: String = [
        (indicators.above, '^'),
        (indicators.below, 'v'),
        (indicators.left, '<'),
        (indicators.right, '>'),
    ]
    .iter()
    .filter(|(set, _)| *set)
    .map(|(_, c)| *c)
    .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!("[{}]", parts)
    }
}

/// Returns the fill color of a note in a given state.
fn note_color(state: VisualState) -> Color {
    match state {
        VisualState::Selected => Color::Red,
        VisualState::Highlighted => Color::Yellow,
        VisualState::Default => Color::Blue,
    }
}

/// Returns the key label style of a pitch row.
fn key_style(pitch: i32, is_black: bool) -> Style {
    if is_black {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else if pitch.rem_euclid(12) == 0 {
        Style::default().bg(Color::White).fg(Color::Black)
    } else {
        Style::default().bg(Color::Gray).fg(Color::Black)
    }
}

/// The hovered note, or else the selected one, when it lies on the shown track.
fn focused_note<'a>(
    response: &'a LoadedResponse,
    track: usize,
    selection: &SelectionState,
) -> Option<&'a Note> {
    selection
        .hovered_note()
        .or(selection.selected_note())
        .filter(|r| r.response == response.id() && r.track == track)
        .and_then(|r| response.note(r.track, r.index))
}

/// Renders the piano roll of the active track.
///
/// # Returns
///
/// The note area for mouse hit testing, or an empty rect if too small to render.
///
/// # Errors
///
/// Returns `RenderError::NonFiniteGeometry` when the note data produced a
/// canvas that cannot be mapped to cells
pub fn render_piano_roll(
    frame: &mut Frame,
    area: Rect,
    response: &LoadedResponse,
    view: &TabView,
    selection: &SelectionState,
) -> Result<Rect, RenderError> {
    let geometry = &view.geometry;
    let viewport = &view.viewport;
    if !geometry.canvas_width.is_finite() || !geometry.canvas_height.is_finite() {
        return Err(RenderError::NonFiniteGeometry);
    }

    let commands = roll_commands(geometry, response, view.track, selection);
    let track_count = response.tracks().len();
    let note_count = response.track_notes(view.track).len();

    // Rough estimate before the exact inner size is known
    let estimated_cols = area.width.saturating_sub(KEY_LABEL_WIDTH + 2);
    let estimated_rows = area.height.saturating_sub(2);
    let rects: Vec<PixelRect> = commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Note { rect, .. } => Some(*rect),
            _ => None,
        })
        .collect();
    let indicators =
        OffScreenIndicators::calculate(&rects, geometry, viewport, estimated_cols, estimated_rows);

    let mut title = format!(
        " Piano Roll - Track {}/{} ({} notes) ",
        (view.track + 1).min(track_count.max(1)),
        track_count.max(1),
        note_count,
    );
    if let Some(note) = focused_note(response, view.track, selection) {
        title.push_str(&format!("- {} ", note.display_name()));
    }
    title.push_str(&build_title_indicator(&indicators));
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width <= KEY_LABEL_WIDTH + 1 || inner.height < 2 {
        return Ok(Rect::default());
    }

    let grid = Rect::new(
        inner.x + KEY_LABEL_WIDTH,
        inner.y,
        inner.width - KEY_LABEL_WIDTH,
        inner.height,
    );
    let cols = grid.width as usize;
    let rows = grid.height;

    let empty = (' ', Style::default());
    let mut cells = vec![vec![empty; cols]; rows as usize];
    let mut labels: Vec<Option<(String, Style)>> = vec![None; rows as usize];

    // Painter order: rows first, then notes in track order.
    for command in &commands {
        match command {
            DrawCommand::Row {
                pitch,
                y,
                height,
                is_black,
            } => {
                let row = (y / height).round() as i64 - viewport.scroll_row as i64;
                if row < 0 || row >= rows as i64 {
                    continue;
                }
                let bg = if *is_black {
                    Color::Rgb(30, 30, 30)
                } else {
                    Color::Rgb(40, 40, 40)
                };
                let style = Style::default().fg(Color::Rgb(60, 60, 60)).bg(bg);
                cells[row as usize].fill(('.', style));
                labels[row as usize] = Some((
                    format!("{:>4} ", note_to_name(*pitch)),
                    key_style(*pitch, *is_black),
                ));
            }
            // One terminal row per pitch; the row bands already separate them.
            DrawCommand::GridLine { .. } => {}
            DrawCommand::Note { rect, state, .. } => {
                let Some((row, span)) = viewport.rect_cells(geometry, rect, grid.width, rows)
                else {
                    continue;
                };
                let style = Style::default()
                    .fg(Color::Black)
                    .bg(note_color(*state))
                    .add_modifier(if *state == VisualState::Default {
                        Modifier::empty()
                    } else {
                        Modifier::BOLD
                    });
                // Notes scrolled in from the left have no visible start.
                let (left, _) = viewport.column_span(geometry, 0);
                let start_col = span.start;
                for col in span {
                    let ch = if col == start_col && rect.x >= left {
                        '['
                    } else {
                        '='
                    };
                    cells[row as usize][col as usize] = (ch, style);
                }
            }
        }
    }

    for row in 0..rows {
        let y = grid.y + row;

        let (label, style) = labels[row as usize]
            .clone()
            .unwrap_or_else(|| (" ".repeat(KEY_LABEL_WIDTH as usize), Style::default()));
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect::new(inner.x, y, KEY_LABEL_WIDTH, 1),
        );

        let spans: Vec<Span> = cells[row as usize]
            .iter()
            .map(|(ch, style)| Span::styled(ch.to_string(), *style))
            .collect();
        frame.render_widget(
            Paragraph::new(Line::from(spans)),
            Rect::new(grid.x, y, grid.width, 1),
        );
    }

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::Note;
    use crate::viz::geometry::RollMetrics;

    #[test]
    fn test_title_indicator() {
        assert_eq!(build_title_indicator(&OffScreenIndicators::default()), "");
        let indicators = OffScreenIndicators {
            above: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(build_title_indicator(&indicators), "[^>]");
    }

    #[test]
    fn test_off_screen_detection() {
        let tracks = vec![vec![
            Note::new(1, 60, 0.0, 10.0, 1.0),
            Note::new(2, 84, 0.0, 10.0, 1.0),
            Note::new(3, 60, 5000.0, 5010.0, 1.0),
        ]];
        let geometry = PianoRollGeometry::compute(&tracks, RollMetrics::default());
        let mut viewport = RollViewport::new(&geometry, 10.0);
        viewport.scroll_row = 20;
        let rects: Vec<PixelRect> = tracks[0].iter().map(|n| geometry.note_rect(n)).collect();

        let indicators = OffScreenIndicators::calculate(&rects, &geometry, &viewport, 40, 20);
        assert!(indicators.above);
        assert!(!indicators.below);
        assert!(!indicators.left);
        assert!(indicators.right);
    }

    #[test]
    fn test_note_colors() {
        assert_eq!(note_color(VisualState::Default), Color::Blue);
        assert_eq!(note_color(VisualState::Highlighted), Color::Yellow);
        assert_eq!(note_color(VisualState::Selected), Color::Red);
    }
}
