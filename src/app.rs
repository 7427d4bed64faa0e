//! Follower display application state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::display::{DisplayState, View};
use crate::ui::Theme;

/// State of the follower terminal display.
///
/// The view is refreshed from [`DisplayState`] on a fixed cadence rather
/// than on every delivery, so rendering never waits on the channel.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub theme: Theme,

    state: Arc<DisplayState>,
    source_description: String,
    stale_after: Option<Duration>,

    /// View captured at the last refresh.
    pub view: View,
    /// Generation of the state when `view` was captured.
    pub generation: u64,
    pub last_refresh: Instant,
}

impl App {
    pub fn new(state: Arc<DisplayState>, source_description: impl Into<String>, theme: Theme) -> Self {
        let view = state.current_view();
        let generation = state.generation();
        Self {
            running: true,
            show_help: false,
            theme,
            state,
            source_description: source_description.into(),
            stale_after: None,
            view,
            generation,
            last_refresh: Instant::now(),
        }
    }

    /// Flag the view as stale once no record arrived within `max_age`.
    pub fn with_stale_after(mut self, max_age: Option<Duration>) -> Self {
        self.stale_after = max_age;
        self
    }

    /// Re-read the current view. Returns `true` if a new record arrived.
    pub fn refresh(&mut self) -> bool {
        self.last_refresh = Instant::now();
        let generation = self.state.generation();
        let changed = generation != self.generation;
        self.view = self.state.current_view();
        self.generation = generation;
        changed
    }

    pub fn source_description(&self) -> &str {
        &self.source_description
    }

    pub fn is_stale(&self) -> bool {
        self.stale_after
            .is_some_and(|max_age| self.state.is_stale(max_age))
    }

    /// Time since the current record arrived.
    pub fn age(&self) -> Option<Duration> {
        self.state.age()
    }

    /// Error from the most recently rejected message.
    pub fn last_error(&self) -> Option<String> {
        self.state.last_error()
    }

    /// The most recent lane suggestion, if a record has arrived.
    pub fn lane(&self) -> Option<platoon_types::LaneSuggestion> {
        self.state.latest().map(|r| r.lane_suggestion())
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }
}
