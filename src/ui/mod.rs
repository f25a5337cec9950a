//! Terminal user interface components.
//!
//! This module provides the visual components of the visualizer: the file
//! tab bar, token grid, token details, piano roll, and music info panel.
//! Each panel reads the shared selection state; none of them mutates it.

mod music_info;
mod piano_roll;
mod token_grid;
mod token_info;

use crate::app::{ActiveTab, App, LayoutRegions};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use thiserror::Error;

pub use music_info::{format_significant, metrics_lines, render_music_info};
pub use piano_roll::render_piano_roll;
pub use token_grid::{render_token_grid, token_color};
pub use token_info::render_token_info;

/// A panel that could not be drawn.
///
/// The panel is replaced by a placeholder; sibling panels still render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Invalid data")]
    InvalidTokenData,
    #[error("Note data cannot be drawn")]
    NonFiniteGeometry,
}

/// Height of the hovered token panel below the grid.
const TOKEN_INFO_HEIGHT: u16 = 10;
/// Height of the music info panel below the piano roll.
const MUSIC_INFO_HEIGHT: u16 = 12;

/// Key hints shown in the footer.
const KEY_HINTS: &str = "[/] file  <-/-> page  j/k rows  p paginate  t types  ,/. track  \
                         up/down/PgUp/PgDn/Home scroll  +/- zoom  Esc clear  w close  q quit";

/// Calculates the layout regions for the given terminal size.
///
/// Token cells, tab titles and the roll's note area are filled in later,
/// during rendering.
fn calculate_layout(size: Rect) -> LayoutRegions {
    // Main vertical layout: tab bar, content, footer
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // File tabs
            Constraint::Min(8),    // Content area
            Constraint::Length(1), // Key hints and status
        ])
        .split(size);

    // Content area: tokens on the left, piano roll on the right
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(main_chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(TOKEN_INFO_HEIGHT)])
        .split(content_chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(MUSIC_INFO_HEIGHT)])
        .split(content_chunks[1]);

    LayoutRegions {
        tab_bar: main_chunks[0],
        token_grid: left[0],
        token_info: left[1],
        piano_roll: right[0],
        roll_grid: Rect::default(),
        music_info: right[1],
        footer: main_chunks[2],
        token_cells: Vec::new(),
        tab_titles: Vec::new(),
    }
}

/// Renders the file tabs.
///
/// # Returns
///
/// The screen span of each tab title, for mouse hit testing.
fn render_tab_bar(frame: &mut Frame, area: Rect, app: &App) -> Vec<(Rect, usize)> {
    let mut spans = Vec::new();
    let mut regions = Vec::new();
    let mut x = area.x;

    for (index, tab) in app.tabs().iter().enumerate() {
        let failed = matches!(tab, crate::app::Tab::Failed { .. });
        let label = format!(" {} ", app.tab_title(tab));
        let width = label.chars().count() as u16;

        let mut style = if index == app.active_tab {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        if failed {
            style = style.fg(Color::Red);
        }

        if x < area.x + area.width {
            let visible = width.min(area.x + area.width - x);
            regions.push((Rect::new(x, area.y, visible, 1), index));
        }
        spans.push(Span::styled(label, style));
        spans.push(Span::raw("|"));
        x = x.saturating_add(width + 1);
    }

    if spans.is_empty() {
        spans.push(Span::styled(
            " No files ",
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
    regions
}

/// Renders the key hints, or the current status message.
fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let line = match &app.status_message {
        Some((message, _)) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(KEY_HINTS, Style::default().fg(Color::DarkGray))),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Draws the stand-in for a panel that failed to render.
fn render_placeholder(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red),
        )))
        .block(block),
        area,
    );
}

/// Renders a tab whose file could not be loaded.
fn render_error_tab(frame: &mut Frame, area: Rect, title: &str, error: &str) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    frame.render_widget(
        Paragraph::new(error.to_string())
            .style(Style::default().fg(Color::Red))
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
}

/// Renders the screen shown when no file is open.
fn render_empty(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from("No response files loaded."),
        Line::from(""),
        Line::from(Span::styled(
            "Usage: miditok-viz [OPTIONS] <response.json>...",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

/// Renders the complete UI layout and updates layout regions.
///
/// The layout is divided into:
/// - Top: one tab per loaded file
/// - Left: token grid above the hovered token's details
/// - Right: piano roll above the music info panel
/// - Bottom: key hints or status message
///
/// A panel that fails is replaced by a placeholder and logged once; the other
/// panels are unaffected.
pub fn render(frame: &mut Frame, app: &mut App) {
    let mut layout = calculate_layout(frame.area());
    layout.tab_titles = render_tab_bar(frame, layout.tab_bar, app);

    let content = Rect::new(
        layout.token_grid.x,
        layout.token_grid.y,
        layout.token_grid.width + layout.piano_roll.width,
        layout.token_grid.height + layout.token_info.height,
    );

    let mut faults = Vec::new();
    match app.active() {
        None => render_empty(frame, content),
        Some(ActiveTab::Failed { title, error }) => {
            render_error_tab(frame, content, title, error)
        }
        Some(ActiveTab::Loaded { response, view }) => {
            match render_token_grid(
                frame,
                layout.token_grid,
                response,
                view,
                &app.selection,
                &app.config,
            ) {
                Ok(cells) => layout.token_cells = cells,
                Err(e) => {
                    render_placeholder(frame, layout.token_grid, "Tokens", &e.to_string());
                    faults.push(("token grid", e));
                }
            }

            render_token_info(
                frame,
                layout.token_info,
                response,
                view,
                &app.selection,
                &app.config,
            );

            match render_piano_roll(frame, layout.piano_roll, response, view, &app.selection) {
                Ok(grid) => layout.roll_grid = grid,
                Err(e) => {
                    render_placeholder(frame, layout.piano_roll, "Piano Roll", &e.to_string());
                    faults.push(("piano roll", e));
                }
            }

            render_music_info(frame, layout.music_info, &response.metrics);
        }
    }

    render_footer(frame, layout.footer, app);

    for (panel, error) in faults {
        app.report_render_fault(panel, &error);
    }
    app.update_layout(layout);
}
