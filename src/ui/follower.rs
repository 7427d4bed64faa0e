//! Main follower view: traffic level and lane suggestion.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

/// Render the two display fields stacked vertically.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [traffic_area, lane_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Length(3)]).areas(area);

    let waiting = app.view.is_waiting();
    let traffic_style = if waiting {
        app.theme.waiting
    } else {
        Style::default().fg(app.theme.highlight)
    };
    let lane_style = match app.lane() {
        Some(lane) if !waiting => app.theme.lane_style(lane),
        _ => app.theme.waiting,
    };

    frame.render_widget(
        field(app, " Traffic ", &app.view.traffic_level, traffic_style),
        traffic_area,
    );
    frame.render_widget(
        field(app, " Lane ", &app.view.lane_suggestion, lane_style),
        lane_area,
    );
}

fn field<'a>(app: &App, title: &'a str, text: &'a str, style: Style) -> Paragraph<'a> {
    let border_style = if app.is_stale() {
        app.theme.alert_style()
    } else {
        Style::default().fg(app.theme.border)
    };

    Paragraph::new(Line::styled(text, style))
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(border_style),
        )
}
