//! PopularAnime — grid of the most popular titles, below the carousel.
//!
//! Fetches once per activation once Home is ready. Cells are laid out in as
//! many columns as fit; scrolling moves by grid rows.

use anime_proto::catalog::AnimeRecord;
use anime_proto::CatalogError;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::{debug, warn};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    latch::FetchLatch,
    theme::{
        style_error, style_muted, style_secondary, style_unfocused_border, C_ERROR, C_LIVE,
        C_PENDING, C_PRIMARY,
    },
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        text::{image_file_name, truncate},
    },
};

pub const POPULAR_LOADING: &str = "Loading popular anime...";
pub const POPULAR_ERROR: &str = "Failed to load popular anime.";

const CELL_WIDTH: u16 = 30;
const CELL_HEIGHT: u16 = 4;

pub struct PopularAnime {
    records: Vec<AnimeRecord>,
    latch: FetchLatch,
    generation: Option<u64>,
    loading: bool,
    error: Option<String>,
    /// First visible grid row.
    scroll: usize,
    /// Grid shape from the last draw, for clamping scroll.
    rows: usize,
    visible_rows: usize,
}

impl PopularAnime {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            latch: FetchLatch::new(),
            generation: None,
            loading: false,
            error: None,
            scroll: 0,
            rows: 0,
            visible_rows: 0,
        }
    }

    /// Home became ready under `generation`. Returns whether the caller
    /// should start the popular fetch; a repeat activation without a
    /// teardown in between is ignored.
    pub fn activate(&mut self, generation: u64) -> bool {
        if !self.latch.try_begin() {
            debug!("popular: already active, ignoring generation {}", generation);
            return false;
        }
        self.generation = Some(generation);
        self.loading = true;
        self.error = None;
        true
    }

    pub fn deactivate(&mut self) {
        self.latch.rearm();
        self.generation = None;
        self.loading = false;
        self.records.clear();
        self.error = None;
        self.scroll = 0;
    }

    pub fn on_loaded(
        &mut self,
        generation: u64,
        result: Result<Vec<AnimeRecord>, CatalogError>,
    ) -> bool {
        if self.generation != Some(generation) || !self.loading {
            debug!("popular: discarding result for generation {}", generation);
            return false;
        }
        self.loading = false;
        match result {
            Ok(records) => {
                debug!("popular: {} records", records.len());
                self.records = records;
            }
            Err(e) => {
                warn!("popular: fetch failed: {}", e);
                self.error = Some(POPULAR_ERROR.to_string());
            }
        }
        true
    }

    #[cfg(test)]
    pub fn records(&self) -> &[AnimeRecord] {
        &self.records
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.rows.saturating_sub(self.visible_rows);
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
    }

    fn draw_cell(frame: &mut Frame, area: Rect, anime: &AnimeRecord) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style_unfocused_border());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let width = inner.width as usize;
        let image = anime
            .image_url()
            .map(image_file_name)
            .unwrap_or("no image");
        let lines = vec![
            Line::from(Span::styled(
                truncate(&anime.title, width),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(truncate(image, width), style_muted())),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// Number of grid columns that fit in `width`; never less than one.
pub fn columns_for(width: u16) -> usize {
    (width / CELL_WIDTH).max(1) as usize
}

impl Component for PopularAnime {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let page = self.visible_rows.max(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => vec![Action::ScrollUp(1)],
            KeyCode::Down | KeyCode::Char('j') => vec![Action::ScrollDown(1)],
            KeyCode::PageUp => vec![Action::ScrollUp(page)],
            KeyCode::PageDown => vec![Action::ScrollDown(page)],
            KeyCode::Home | KeyCode::Char('g') => vec![Action::ScrollTop],
            KeyCode::End | KeyCode::Char('G') => vec![Action::ScrollBottom],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => vec![Action::ScrollUp(1)],
            MouseEventKind::ScrollDown => vec![Action::ScrollDown(1)],
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::ScrollUp(n) => self.scroll_by(-(*n as isize)),
            Action::ScrollDown(n) => self.scroll_by(*n as isize),
            Action::ScrollTop => self.scroll = 0,
            Action::ScrollBottom => self.scroll = self.rows.saturating_sub(self.visible_rows),
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let pending = !state.home_ready || self.loading;
        let count = self.records.len().to_string();
        let badge = if pending {
            Badge { text: "…", color: C_PENDING }
        } else if self.error.is_some() {
            Badge { text: "ERR", color: C_ERROR }
        } else {
            Badge { text: &count, color: C_LIVE }
        };
        let block = pane_chrome("Popular Anime", focused, Some(badge));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if pending {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(format!(" {}", POPULAR_LOADING), style_secondary()))),
                inner,
            );
            return;
        }
        if let Some(err) = &self.error {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(format!(" {}", err), style_error()))),
                inner,
            );
            return;
        }

        let cols = columns_for(inner.width);
        self.rows = self.records.len().div_ceil(cols);
        self.visible_rows = (inner.height / CELL_HEIGHT) as usize;
        self.scroll = self.scroll.min(self.rows.saturating_sub(self.visible_rows));

        let cell_width = inner.width / cols as u16;
        for (row, chunk) in self
            .records
            .chunks(cols)
            .skip(self.scroll)
            .take(self.visible_rows)
            .enumerate()
        {
            for (col, anime) in chunk.iter().enumerate() {
                let cell = Rect {
                    x: inner.x + col as u16 * cell_width,
                    y: inner.y + row as u16 * CELL_HEIGHT,
                    width: cell_width,
                    height: CELL_HEIGHT,
                };
                Self::draw_cell(frame, cell, anime);
            }
        }
    }
}

impl Default for PopularAnime {
    fn default() -> Self {
        Self::new()
    }
}
