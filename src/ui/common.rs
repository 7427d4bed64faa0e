//! Header bar, status bar and help overlay.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;

/// Render the title bar.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" 🚘 Follower (Receiver) ", app.theme.header),
        Span::raw("│ Platoon System"),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar: data source, freshness and the last decode error.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" {} ", app.source_description()),
        Style::default().add_modifier(Modifier::DIM),
    )];

    match app.age() {
        Some(age) if app.is_stale() => {
            spans.push(Span::raw("│ "));
            spans.push(Span::styled(
                format!("STALE {}s ", age.as_secs()),
                app.theme.alert_style(),
            ));
        }
        Some(age) => {
            spans.push(Span::raw(format!("│ updated {:.1}s ago ", age.as_secs_f64())));
        }
        None => {}
    }

    if let Some(error) = app.last_error() {
        spans.push(Span::raw("│ "));
        spans.push(Span::styled(format!("last message dropped: {} ", error), app.theme.alert_style()));
    }

    spans.push(Span::styled(
        "│ q:quit ?:help",
        Style::default().add_modifier(Modifier::DIM),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the help overlay in the middle of `area`.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let lines = vec![
        Line::from(Span::styled("Keys", app.theme.header)),
        Line::from(""),
        Line::from("  q / Esc / Ctrl-C   quit"),
        Line::from("  ?                  toggle this help"),
        Line::from(""),
        Line::from("Shows the latest congestion estimate and lane"),
        Line::from("suggestion published by the platoon leader."),
    ];

    let popup = centered(area, 54, lines.len() as u16 + 2);
    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .areas(middle);
    center
}
