//! Details of the hovered token.

use super::token_grid::token_color;
use crate::app::TabView;
use crate::config::Config;
use crate::midi::{LoadedResponse, Token};
use crate::viz::grid::heading_for_index;
use crate::viz::selection::SelectionState;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

const PLACEHOLDER: &str = "Hover a token...";

/// Builds the label/value rows shown for a token.
fn token_fields(token: &Token, heading: String) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("Position", heading),
        ("Type", token.kind.to_string()),
        ("Value", token.value.clone()),
        ("Time", format!("{}", token.time)),
    ];
    if let Some(program) = token.program {
        fields.push(("Program", program.to_string()));
    }
    if !token.desc.is_empty() {
        fields.push(("Desc", token.desc.clone()));
    }
    if let Some(note_id) = token.note_id {
        fields.push(("Note id", note_id.to_string()));
    }
    if let Some(track) = &token.track_id {
        fields.push(("Track", track.to_string()));
    }
    fields
}

/// Renders the hovered token's details, or a placeholder when nothing in
/// this response is hovered.
pub fn render_token_info(
    frame: &mut Frame,
    area: Rect,
    response: &LoadedResponse,
    view: &TabView,
    selection: &SelectionState,
    config: &Config,
) {
    let block = Block::default()
        .title(" Token ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let hovered = selection
        .hovered_token()
        .filter(|t| t.response == response.id())
        .and_then(|t| Some((t.index, response.token(t.index)?)));

    let lines: Vec<Line> = match hovered {
        Some((index, token)) => {
            let heading = heading_for_index(
                index,
                config.page_size,
                config.chunk_size,
                view.pager.enabled,
            );
            let tint = Style::default().fg(token_color(&token.kind));
            token_fields(token, heading)
                .into_iter()
                .map(|(label, value)| {
                    Line::from(vec![
                        Span::styled(
                            format!("{:<9}", label),
                            tint.add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(value, tint),
                    ])
                })
                .collect()
        }
        None => vec![Line::from(Span::styled(
            PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))],
    };

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::TokenType;

    #[test]
    fn test_token_fields_skip_absent_values() {
        let token = Token::new(TokenType::Bar, "None", 0.0, None);
        let labels: Vec<&str> = token_fields(&token, "1.1".to_string())
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(labels, vec!["Position", "Type", "Value", "Time"]);
    }

    #[test]
    fn test_token_fields_full() {
        let json = r#"{"type": "Pitch", "value": 64, "time": 480, "program": 0,
                       "desc": "E4", "note_id": 7, "track_id": 0}"#;
        let token: Token = serde_json::from_str(json).unwrap();
        let fields = token_fields(&token, "2.3".to_string());
        assert!(fields.contains(&("Value", "64".to_string())));
        assert!(fields.contains(&("Time", "480".to_string())));
        assert!(fields.contains(&("Note id", "7".to_string())));
        // Track indices are shown 1-based.
        assert!(fields.contains(&("Track", "1".to_string())));
    }
}
