//! Terminal UI rendering using ratatui.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Traffic field  (follower::render)    │
//! │ Lane field                           │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!    Help overlay rendered on top: common::render_help
//! ```

pub mod common;
pub mod follower;
pub mod theme;

pub use theme::Theme;

use ratatui::layout::{Constraint, Layout};
use ratatui::Frame;

use crate::app::App;

/// Draw a full frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let [header, content, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(6),
        Constraint::Length(1),
    ])
    .areas(area);

    common::render_header(frame, app, header);
    follower::render(frame, app, content);
    common::render_status_bar(frame, app, status);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayState;
    use platoon_types::{CongestionLevel, LaneSuggestion, TelemetryRecord};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn rendered(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_draw_waiting() {
        let app = App::new(Arc::new(DisplayState::new()), "memory: test", Theme::dark());
        let screen = rendered(&app);

        assert!(screen.contains("Waiting for data..."));
        assert!(screen.contains("memory: test"));
    }

    #[test]
    fn test_draw_populated() {
        let state = Arc::new(DisplayState::new());
        state.replace(TelemetryRecord::new(
            30.0,
            35.0,
            CongestionLevel::new(35).unwrap(),
            LaneSuggestion::Stay,
        ));
        let app = App::new(state, "memory: test", Theme::light());
        let screen = rendered(&app);

        assert!(screen.contains("Traffic Level: 35%"));
        assert!(screen.contains("Lane Suggestion: Stay"));
    }
}
