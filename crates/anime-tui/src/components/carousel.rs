//! TopAiringCarousel — one currently-airing title at a time, rotating.
//!
//! Fetch gating: nothing happens until Home reports ready; then one fetch per
//! activation, and none at all if this instance attempted one within the
//! refetch guard window. When the guard suppresses a fetch, rotation resumes
//! over the records already held.

use std::time::Duration;

use anime_proto::catalog::AnimeRecord;
use anime_proto::CatalogError;
use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    action::Action,
    app::AppMessage,
    app_state::AppState,
    component::Component,
    latch::FetchLatch,
    rotation::RotationTimer,
    theme::{style_error, style_muted, style_secondary, C_ACCENT, C_ERROR, C_LIVE, C_PENDING},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        text::truncate,
    },
};

pub const CAROUSEL_LOADING: &str = "Loading top airing anime...";
pub const CAROUSEL_EMPTY: &str = "No airing anime found.";
pub const CAROUSEL_ERROR: &str = "Failed to load top airing anime.";

pub struct TopAiringCarousel {
    records: Vec<AnimeRecord>,
    rotation: RotationTimer,
    latch: FetchLatch,
    generation: Option<u64>,
    loading: bool,
    error: Option<String>,
}

impl TopAiringCarousel {
    pub fn new(rotation_period: Duration, refetch_guard: Duration) -> Self {
        Self {
            records: Vec::new(),
            rotation: RotationTimer::new(rotation_period),
            latch: FetchLatch::with_min_interval(refetch_guard),
            generation: None,
            loading: false,
            error: None,
        }
    }

    /// Home became ready under `generation`. Returns whether the caller
    /// should start the top-airing fetch.
    pub fn activate(&mut self, generation: u64, tx: &mpsc::Sender<AppMessage>) -> bool {
        self.generation = Some(generation);
        self.latch.rearm();
        if self.latch.try_begin() {
            self.loading = true;
            self.error = None;
            return true;
        }
        debug!(
            "carousel: refetch suppressed, rotating {} held records",
            self.records.len()
        );
        self.restart_rotation(tx);
        false
    }

    /// Home was torn down: stop rotating and ignore in-flight results.
    pub fn deactivate(&mut self) {
        if self.loading {
            self.latch.abandon();
        }
        self.generation = None;
        self.loading = false;
        self.rotation.stop();
    }

    pub fn on_loaded(
        &mut self,
        generation: u64,
        result: Result<Vec<AnimeRecord>, CatalogError>,
        tx: &mpsc::Sender<AppMessage>,
    ) -> bool {
        if self.generation != Some(generation) || !self.loading {
            debug!("carousel: discarding result for generation {}", generation);
            return false;
        }
        self.loading = false;
        match result {
            Ok(records) => {
                debug!("carousel: {} airing records", records.len());
                self.records = records;
                self.error = None;
            }
            Err(e) => {
                warn!("carousel: fetch failed: {}", e);
                self.records.clear();
                self.error = Some(CAROUSEL_ERROR.to_string());
            }
        }
        self.restart_rotation(tx);
        true
    }

    pub fn on_tick(&mut self, epoch: u64) -> bool {
        self.rotation.on_tick(epoch)
    }

    pub fn current(&self) -> Option<&AnimeRecord> {
        self.records.get(self.rotation.index())
    }

    #[cfg(test)]
    pub fn is_rotating(&self) -> bool {
        self.rotation.is_running()
    }

    fn restart_rotation(&mut self, tx: &mpsc::Sender<AppMessage>) {
        self.rotation
            .reset(self.records.len(), tx, AppMessage::CarouselTick);
    }

    fn body_lines(&self, state: &AppState, width: usize) -> Vec<Line<'static>> {
        let message = |text: &str, style: Style| {
            vec![
                Line::from(""),
                Line::from(Span::styled(text.to_string(), style)),
            ]
        };

        if !state.home_ready || self.loading {
            return message(CAROUSEL_LOADING, style_secondary());
        }
        if let Some(err) = state.home_error.as_deref().or(self.error.as_deref()) {
            return message(err, style_error());
        }
        let Some(anime) = self.current() else {
            return message(CAROUSEL_EMPTY, style_muted());
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                truncate(&anime.title, width),
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
            )),
        ];
        if let Some(url) = anime.large_image_url() {
            lines.push(Line::from(Span::styled(truncate(url, width), style_muted())));
        }
        lines.push(Line::from(Span::styled(
            format!("{}/{}", self.rotation.index() + 1, self.rotation.count()),
            style_secondary(),
        )));
        lines
    }
}

impl Component for TopAiringCarousel {
    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = if !state.home_ready || self.loading {
            Badge { text: "…", color: C_PENDING }
        } else if state.home_error.is_some() || self.error.is_some() {
            Badge { text: "ERR", color: C_ERROR }
        } else {
            Badge { text: "AIRING", color: C_LIVE }
        };
        let block = pane_chrome("Top Airing", focused, Some(badge));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = self.body_lines(state, inner.width.saturating_sub(2) as usize);
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
    }
}
