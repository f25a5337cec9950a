//! Token grid rendering.
//!
//! Displays the flattened token stream as rows of colored blocks, one block
//! per token, windowed by the tab's pager.

use super::RenderError;
use crate::app::TabView;
use crate::config::Config;
use crate::midi::{LoadedResponse, TokenType};
use crate::viz::grid::project;
use crate::viz::highlight::{token_state, VisualState};
use crate::viz::selection::SelectionState;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Returns the block color of a token type.
#[inline]
pub fn token_color(kind: &TokenType) -> Color {
    match kind {
        TokenType::Bar => Color::Rgb(224, 255, 255),         // light cyan
        TokenType::Position => Color::Rgb(230, 230, 250),    // lavender
        TokenType::TimeShift => Color::Rgb(144, 238, 144),   // light green
        TokenType::Tempo => Color::Rgb(255, 182, 193),       // light pink
        TokenType::Rest => Color::Rgb(152, 251, 152),        // pale green
        TokenType::Pitch => Color::Rgb(173, 216, 230),       // light blue
        TokenType::NoteOn => Color::Rgb(255, 218, 185),      // peach puff
        TokenType::Velocity => Color::Rgb(240, 128, 128),    // light coral
        TokenType::Duration => Color::Rgb(250, 250, 210),    // light goldenrod
        TokenType::NoteOff => Color::Rgb(240, 230, 140),     // khaki
        TokenType::Family => Color::Rgb(211, 211, 211),      // light gray
        TokenType::TimeSig => Color::Rgb(216, 191, 216),     // thistle
        TokenType::MicroTiming => Color::Rgb(221, 160, 221), // plum
        TokenType::Program => Color::Rgb(32, 178, 170),      // light sea green
        TokenType::Ignore | TokenType::Other(_) => Color::White,
    }
}

/// Returns the background of a token block in a given state.
fn block_color(kind: &TokenType, state: VisualState) -> Color {
    match state {
        VisualState::Selected => Color::Red,
        VisualState::Highlighted => Color::Yellow,
        VisualState::Default => token_color(kind),
    }
}

/// Narrowest token block: one colored column plus the gap.
const MIN_BLOCK_WIDTH: u16 = 2;

/// Width of one token block, shrunk so a full row of `chunk_size` blocks
/// fits in `available` columns when possible. Rows that still do not fit
/// wrap.
fn fit_block_width(available: u16, config: &Config) -> u16 {
    let chunk = config.chunk_size.max(1).min(u16::MAX as usize) as u16;
    let preferred = config.token_block_width.max(MIN_BLOCK_WIDTH);
    (available / chunk).clamp(MIN_BLOCK_WIDTH, preferred)
}

/// Fits a label into a block, padding or cutting it to `width` columns.
fn fit(label: &str, width: usize) -> String {
    let cut: String = label.chars().take(width).collect();
    format!("{:<width$}", cut, width = width)
}

/// Renders the token grid of the active response.
///
/// # Returns
///
/// The screen cell of every drawn block with its flat token index, for mouse
/// hit testing.
///
/// # Errors
///
/// Returns `RenderError::InvalidTokenData` when the response's token payload
/// is not a token sequence
pub fn render_token_grid(
    frame: &mut Frame,
    area: Rect,
    response: &LoadedResponse,
    view: &TabView,
    selection: &SelectionState,
    config: &Config,
) -> Result<Vec<(Rect, usize)>, RenderError> {
    if !response.has_valid_tokens() {
        return Err(RenderError::InvalidTokenData);
    }

    let tokens = response.tokens();
    let projection = project(
        tokens,
        view.pager.page,
        view.pager.enabled,
        config.page_size,
        config.chunk_size,
    );

    let mut title = format!(" Tokens ({}) ", tokens.len());
    if view.pager.enabled && projection.total_pages > 0 {
        title.push_str(&format!(
            "- Page {}/{} ",
            projection.page + 1,
            projection.total_pages
        ));
    }

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 2 || inner.width < MIN_BLOCK_WIDTH {
        return Ok(Vec::new());
    }

    // Toggle hints
    let mut hints = vec![Span::styled(
        if view.show_types {
            "[t] types: on "
        } else {
            "[t] types: off "
        },
        Style::default().fg(Color::DarkGray),
    )];
    if view.pager.can_paginate(tokens.len()) {
        hints.push(Span::styled(
            if view.pager.enabled {
                "[p] paginate: on  [<-/->] page"
            } else {
                "[p] paginate: off"
            },
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(hints)),
        Rect::new(inner.x, inner.y, inner.width, 1),
    );

    let rows_area = Rect::new(inner.x, inner.y + 1, inner.width, inner.height - 1);
    let block_width = fit_block_width(rows_area.width, config);
    let blocks_per_line = ((rows_area.width / block_width) as usize).max(1);
    let mut cells = Vec::new();

    // A row wider than the panel wraps onto extra screen lines.
    let lines = projection
        .rows
        .iter()
        .skip(view.grid_scroll)
        .flat_map(|row| row.chunks(blocks_per_line));

    for (line, blocks) in lines.take(rows_area.height as usize).enumerate() {
        let y = rows_area.y + line as u16;
        let mut spans = Vec::with_capacity(2 * blocks.len());

        for (col, cell) in blocks.iter().enumerate() {
            let state = token_state(selection, response.id(), cell.index, cell.token);
            let label = if view.show_types {
                cell.token.kind.abbreviation()
            } else {
                String::new()
            };

            let mut style = Style::default()
                .fg(Color::Black)
                .bg(block_color(&cell.token.kind, state));
            if state != VisualState::Default {
                style = style.add_modifier(Modifier::BOLD);
            }

            // Leave the last column of each block as a gap.
            spans.push(Span::styled(fit(&label, block_width as usize - 1), style));
            spans.push(Span::raw(" "));

            let x = rows_area.x + col as u16 * block_width;
            cells.push((Rect::new(x, y, block_width - 1, 1), cell.index));
        }

        frame.render_widget(
            Paragraph::new(Line::from(spans)),
            Rect::new(rows_area.x, y, rows_area.width, 1),
        );
    }

    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_color_precedence() {
        assert_eq!(block_color(&TokenType::Pitch, VisualState::Selected), Color::Red);
        assert_eq!(
            block_color(&TokenType::Pitch, VisualState::Highlighted),
            Color::Yellow
        );
        assert_eq!(
            block_color(&TokenType::Pitch, VisualState::Default),
            Color::Rgb(173, 216, 230)
        );
    }

    #[test]
    fn test_unknown_types_are_white() {
        assert_eq!(token_color(&TokenType::Other("Chord".into())), Color::White);
        assert_eq!(token_color(&TokenType::Ignore), Color::White);
    }

    #[test]
    fn test_block_width_shrinks_to_fit_a_row() {
        let config = Config::default();
        assert_eq!(fit_block_width(200, &config), 5);
        assert_eq!(fit_block_width(52, &config), 3);
        assert_eq!(fit_block_width(10, &config), MIN_BLOCK_WIDTH);
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("Pos", 4), "Pos ");
        assert_eq!(fit("Velocity", 4), "Velo");
        assert_eq!(fit("", 2), "  ");
    }
}
