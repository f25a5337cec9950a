//! Music info panel: file-level metrics reported by the tokenizer backend.

use crate::midi::{Metrics, NOTE_NAMES};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

/// Formats a value with a fixed number of significant digits.
///
/// Trailing zeros are kept, so `0.5` becomes `"0.500"` at three digits.
pub fn format_significant(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let digits = digits.max(1) as i32;
    let magnitude = if value == 0.0 {
        0
    } else {
        value.abs().log10().floor() as i32
    };
    let decimals = digits - 1 - magnitude;

    if decimals >= 0 {
        format!("{:.*}", decimals as usize, value)
    } else {
        let scale = 10f64.powi(-decimals);
        format!("{}", (value / scale).round() * scale)
    }
}

/// Returns the name of a key signature root.
fn root_name(root: i64) -> String {
    NOTE_NAMES
        .get(root.rem_euclid(12) as usize)
        .map(|name| name.to_string())
        .unwrap_or_else(|| root.to_string())
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::Gray)),
        Span::raw(value),
    ])
}

/// Builds the panel text. Absent metrics are left out entirely.
pub fn metrics_lines(metrics: &Metrics) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if let Some(title) = &metrics.title {
        lines.push(field("Title", title.clone()));
    }
    if let Some(resolution) = metrics.resolution {
        lines.push(field("Resolution", format!("{} ticks/beat", resolution)));
    }

    if let Some(tempos) = metrics.tempos.as_ref().filter(|t| !t.is_empty()) {
        lines.push(heading("Tempos"));
        for (time, tempo) in tempos {
            lines.push(Line::from(format!("  {}: {} BPM", time, tempo.round() as i64)));
        }
    }

    if let Some(keys) = metrics.key_signatures.as_ref().filter(|k| !k.is_empty()) {
        lines.push(heading("Key signatures"));
        for (time, root, mode) in keys {
            let mode = mode.as_deref().unwrap_or("");
            lines.push(Line::from(
                format!("  {}: {} {}", time, root_name(*root), mode)
                    .trim_end()
                    .to_string(),
            ));
        }
    }

    if let Some(sigs) = metrics.time_signatures.as_ref().filter(|s| !s.is_empty()) {
        lines.push(heading("Time signatures"));
        for (time, numerator, denominator) in sigs {
            lines.push(Line::from(format!("  {}: {}/{}", time, numerator, denominator)));
        }
    }

    if metrics.has_statistics() {
        lines.push(heading("Statistics"));
        if let Some(range) = metrics.pitch_range {
            lines.push(field("  Pitch range", range.to_string()));
        }
        if let Some(used) = metrics.n_pitches_used {
            lines.push(field("  Pitches used", used.to_string()));
        }
        if let Some(polyphony) = metrics.polyphony {
            lines.push(field("  Polyphony", format_significant(polyphony, 3)));
        }
        if let Some(rate) = metrics.empty_beat_rate {
            lines.push(field("  Empty beat rate", format_significant(rate, 3)));
        }
        if let Some(consistency) = metrics.drum_pattern_consistency {
            lines.push(field(
                "  Drum pattern consistency",
                format_significant(consistency, 3),
            ));
        }
    }

    lines
}

/// Renders the music info panel.
pub fn render_music_info(frame: &mut Frame, area: Rect, metrics: &Metrics) {
    let block = Block::default()
        .title(" Music Info ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let mut lines = metrics_lines(metrics);
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No metrics",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[Line]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_format_significant() {
        assert_eq!(format_significant(0.12345, 3), "0.123");
        assert_eq!(format_significant(0.5, 3), "0.500");
        assert_eq!(format_significant(2.0, 3), "2.00");
        assert_eq!(format_significant(12.36, 3), "12.4");
        assert_eq!(format_significant(0.0, 3), "0.00");
        assert_eq!(format_significant(1234.0, 3), "1230");
        assert_eq!(format_significant(-0.004567, 3), "-0.00457");
    }

    #[test]
    fn test_absent_metrics_are_omitted() {
        assert!(metrics_lines(&Metrics::default()).is_empty());

        let metrics = Metrics {
            title: Some("Etude".to_string()),
            ..Metrics::default()
        };
        assert_eq!(text(&metrics_lines(&metrics)), vec!["Title: Etude"]);
    }

    #[test]
    fn test_metrics_formatting() {
        let metrics: Metrics = serde_json::from_value(serde_json::json!({
            "tempos": [[0, 119.6]],
            "key_signatures": [[0, 2, "major"], [960, 9, null]],
            "time_signatures": [[0, 3, 4]],
            "polyphony": 1.23456
        }))
        .unwrap();
        let lines = text(&metrics_lines(&metrics));
        assert!(lines.contains(&"  0: 120 BPM".to_string()));
        assert!(lines.contains(&"  0: D major".to_string()));
        assert!(lines.contains(&"  960: A".to_string()));
        assert!(lines.contains(&"  0: 3/4".to_string()));
        assert!(lines.contains(&"  Polyphony: 1.23".to_string()));
        assert!(!lines.iter().any(|l| l.contains("Empty beat rate")));
    }
}
