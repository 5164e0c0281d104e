//! Schedule view — the week's broadcasts, one section per day.
//!
//! Lifecycle per mount: `Loading` → `Ready` | `Error`. Error is terminal for
//! the mount; navigating away and back mounts again with a new generation.

use anime_proto::catalog::AnimeRecord;
use anime_proto::schedule::{bucket_for_label, group_by_day, DayBuckets, DAYS_OF_WEEK};
use anime_proto::CatalogError;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tracing::{debug, warn};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    latch::FetchLatch,
    theme::{style_error, style_muted, style_secondary, C_DAY, C_ERROR, C_LIVE, C_PENDING, C_PRIMARY, C_TIME},
    widgets::pane_chrome::{pane_chrome, Badge},
};

pub const SCHEDULE_TITLE: &str = "Upcoming Anime Schedule";
pub const SCHEDULE_ERROR: &str = "Failed to load anime schedule.";

#[derive(Debug, Clone)]
pub enum ScheduleState {
    Loading,
    Error(String),
    Ready(DayBuckets),
}

pub struct ScheduleView {
    state: ScheduleState,
    generation: Option<u64>,
    latch: FetchLatch,
    fetched_at: Option<chrono::DateTime<chrono::Local>>,
    scroll: usize,
    /// Lines and rows from the last draw, for clamping scroll.
    content_len: usize,
    viewport: usize,
}

impl ScheduleView {
    pub fn new() -> Self {
        Self {
            state: ScheduleState::Loading,
            generation: None,
            latch: FetchLatch::new(),
            fetched_at: None,
            scroll: 0,
            content_len: 0,
            viewport: 0,
        }
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        match self.state() {
            ScheduleState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// Enter `Loading` under `generation`. Returns whether the caller should
    /// start the fetch; a second mount without an unmount in between is
    /// ignored and keeps the current generation.
    pub fn mount(&mut self, generation: u64) -> bool {
        if !self.latch.try_begin() {
            debug!("schedule: already mounted, ignoring generation {}", generation);
            return false;
        }
        self.generation = Some(generation);
        self.state = ScheduleState::Loading;
        self.fetched_at = None;
        self.scroll = 0;
        true
    }

    pub fn unmount(&mut self) {
        self.generation = None;
        self.state = ScheduleState::Loading;
        self.fetched_at = None;
        self.latch.rearm();
    }

    /// Apply a fetch result. Results for another mount are discarded.
    /// Returns whether the result was accepted.
    pub fn on_loaded(
        &mut self,
        generation: u64,
        result: Result<Vec<AnimeRecord>, CatalogError>,
    ) -> bool {
        if self.generation != Some(generation) || !matches!(self.state, ScheduleState::Loading) {
            debug!("schedule: discarding result for generation {}", generation);
            return false;
        }
        match result {
            Ok(records) => {
                debug!("schedule: {} records", records.len());
                self.state = ScheduleState::Ready(group_by_day(&records));
                self.fetched_at = Some(chrono::Local::now());
            }
            Err(e) => {
                warn!("schedule: fetch failed: {}", e);
                self.state = ScheduleState::Error(SCHEDULE_ERROR.to_string());
            }
        }
        true
    }

    pub fn build_lines(&self) -> Vec<Line<'static>> {
        match &self.state {
            ScheduleState::Loading => vec![Line::from(Span::styled(" Loading...", style_secondary()))],
            ScheduleState::Error(msg) => vec![Line::from(Span::styled(format!(" {}", msg), style_error()))],
            ScheduleState::Ready(groups) => day_section_lines(groups),
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.content_len.saturating_sub(self.viewport);
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
    }
}

fn day_section_lines(groups: &DayBuckets) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for day in DAYS_OF_WEEK {
        lines.push(Line::from(Span::styled(
            format!(" {}", day),
            Style::default().fg(C_DAY).add_modifier(Modifier::BOLD),
        )));
        let bucket = bucket_for_label(groups, day);
        if bucket.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("   No anime scheduled for {}.", day),
                style_muted(),
            )));
        }
        for anime in bucket {
            lines.push(Line::from(vec![
                Span::raw("   "),
                Span::styled(
                    anime.title.clone(),
                    Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
                ),
            ]));
            let mut detail = vec![
                Span::raw("     "),
                Span::styled("Release Date: ", style_secondary()),
                Span::styled(
                    anime.broadcast_time_label().to_string(),
                    Style::default().fg(C_TIME),
                ),
            ];
            if let Some(url) = anime.image_url() {
                detail.push(Span::styled(format!("  ·  {}", url), style_muted()));
            }
            lines.push(Line::from(detail));
        }
        lines.push(Line::from(""));
    }
    lines
}

impl Component for ScheduleView {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let page = self.viewport.max(1);
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
            MouseEventKind::ScrollUp => vec![Action::ScrollUp(3)],
            MouseEventKind::ScrollDown => vec![Action::ScrollDown(3)],
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::ScrollUp(n) => self.scroll_by(-(*n as isize)),
            Action::ScrollDown(n) => self.scroll_by(*n as isize),
            Action::ScrollTop => self.scroll = 0,
            Action::ScrollBottom => self.scroll = self.content_len.saturating_sub(self.viewport),
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, _state: &AppState) {
        let updated = self
            .fetched_at
            .map(|t| format!("updated {}", t.format("%H:%M")))
            .unwrap_or_default();
        let badge = match &self.state {
            ScheduleState::Loading => Some(Badge { text: "…", color: C_PENDING }),
            ScheduleState::Error(_) => Some(Badge { text: "ERR", color: C_ERROR }),
            ScheduleState::Ready(_) => Some(Badge { text: &updated, color: C_LIVE }),
        };
        let block = pane_chrome(SCHEDULE_TITLE, focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = self.build_lines();
        self.content_len = lines.len();
        self.viewport = inner.height as usize;
        self.scroll = self.scroll.min(self.content_len.saturating_sub(self.viewport));

        frame.render_widget(
            Paragraph::new(lines).scroll((self.scroll.min(u16::MAX as usize) as u16, 0)),
            inner,
        );
    }
}

impl Default for ScheduleView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anime_proto::catalog::Broadcast;
    use anime_proto::CatalogClient;
    use ratatui::{backend::TestBackend, Terminal};

    fn record(id: i64, title: &str, day: Option<&str>, time: Option<&str>) -> AnimeRecord {
        AnimeRecord {
            mal_id: id,
            title: title.to_string(),
            images: Default::default(),
            broadcast: Some(Broadcast {
                day: day.map(str::to_string),
                time: time.map(str::to_string),
                ..Broadcast::default()
            }),
        }
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn render(view: &mut ScheduleView, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let state = AppState::default();
        terminal
            .draw(|f| view.draw(f, f.area(), true, &state))
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect()
    }

    /// An address nothing listens on: a real fetch against it fails.
    fn unreachable_client() -> CatalogClient {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        CatalogClient::new(format!("http://127.0.0.1:{}", port))
    }

    #[tokio::test]
    async fn failing_fetch_reaches_error_and_never_ready() {
        let mut view = ScheduleView::new();
        assert!(view.mount(1));
        assert!(matches!(view.state(), ScheduleState::Loading));

        let result = unreachable_client().fetch_schedules().await;
        assert!(view.on_loaded(1, result));
        match view.state() {
            ScheduleState::Error(msg) => assert_eq!(msg, SCHEDULE_ERROR),
            other => panic!("expected error state, got {other:?}"),
        }

        // Error is terminal for the mount: a late success cannot revive it.
        assert!(!view.on_loaded(1, Ok(vec![record(1, "late", Some("Monday"), None)])));
        assert!(matches!(view.state(), ScheduleState::Error(_)));

        let screen = render(&mut view, 60, 6).join("\n");
        assert!(screen.contains(SCHEDULE_TITLE));
        assert!(screen.contains(SCHEDULE_ERROR));
    }

    #[test]
    fn empty_result_renders_all_placeholders() {
        let mut view = ScheduleView::new();
        view.mount(4);
        assert!(view.on_loaded(4, Ok(vec![])));

        let screen = render(&mut view, 60, 40).join("\n");
        for day in DAYS_OF_WEEK {
            assert!(
                screen.contains(&format!("No anime scheduled for {}.", day)),
                "missing placeholder for {day}"
            );
        }
    }

    #[test]
    fn loading_state_renders_loading() {
        let mut view = ScheduleView::new();
        view.mount(1);
        let screen = render(&mut view, 60, 5).join("\n");
        assert!(screen.contains("Loading..."));
    }

    #[test]
    fn records_render_under_their_day_in_order() {
        let mut view = ScheduleView::new();
        view.mount(2);
        view.on_loaded(
            2,
            Ok(vec![
                record(1, "Alpha", Some("Mondays"), Some("01:00")),
                record(2, "Bravo", None, None),
                record(3, "Charlie", Some("Mondays"), None),
            ]),
        );
        let text: Vec<String> = view.build_lines().iter().map(line_text).collect();

        let monday = text.iter().position(|l| l.trim() == "Monday").unwrap();
        let tuesday = text.iter().position(|l| l.trim() == "Tuesday").unwrap();
        let unknown = text.iter().position(|l| l.trim() == "Unknown").unwrap();
        let alpha = text.iter().position(|l| l.trim() == "Alpha").unwrap();
        let charlie = text.iter().position(|l| l.trim() == "Charlie").unwrap();
        let bravo = text.iter().position(|l| l.trim() == "Bravo").unwrap();

        assert!(monday < alpha && alpha < charlie && charlie < tuesday);
        assert!(unknown < bravo);
        assert!(text.contains(&"   No anime scheduled for Tuesday.".to_string()));
        assert!(text[alpha + 1].contains("Release Date: 01:00"));
        assert!(text[charlie + 1].contains("Release Date: Not Announced"));
        assert!(text[bravo + 1].contains("Release Date: Not Announced"));
    }

    #[test]
    fn singular_and_plural_day_buckets_share_a_section() {
        let mut view = ScheduleView::new();
        view.mount(3);
        view.on_loaded(
            3,
            Ok(vec![
                record(1, "SingularShow", Some("Monday"), None),
                record(2, "PluralShow", Some("Mondays"), None),
            ]),
        );
        let text: Vec<String> = view.build_lines().iter().map(line_text).collect();

        let monday = text.iter().position(|l| l.trim() == "Monday").unwrap();
        let tuesday = text.iter().position(|l| l.trim() == "Tuesday").unwrap();
        let singular = text.iter().position(|l| l.trim() == "SingularShow").unwrap();
        let plural = text.iter().position(|l| l.trim() == "PluralShow").unwrap();
        assert!(monday < singular && singular < plural && plural < tuesday);
        assert!(!text.contains(&"   No anime scheduled for Monday.".to_string()));
    }

    #[test]
    fn detail_row_shows_full_image_url() {
        let url = "https://cdn.myanimelist.net/images/anime/1015/138006.jpg";
        let mut rec = record(1, "Frieren", Some("Fridays"), Some("23:00"));
        rec.images.jpg.image_url = Some(url.to_string());

        let mut view = ScheduleView::new();
        view.mount(1);
        view.on_loaded(1, Ok(vec![rec]));
        let text: Vec<String> = view.build_lines().iter().map(line_text).collect();
        let title = text.iter().position(|l| l.trim() == "Frieren").unwrap();
        assert!(text[title + 1].contains("Release Date: 23:00"));
        assert!(text[title + 1].ends_with(url));
    }

    #[test]
    fn mount_twice_keeps_first_generation() {
        let mut view = ScheduleView::new();
        assert!(view.mount(1));
        assert!(!view.mount(2));
        assert!(!view.on_loaded(2, Ok(vec![])));
        assert!(view.on_loaded(1, Ok(vec![])));

        view.unmount();
        assert!(view.mount(3));
        assert!(matches!(view.state(), ScheduleState::Loading));
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut view = ScheduleView::new();
        view.mount(1);
        view.unmount();
        view.mount(2);
        assert!(!view.on_loaded(1, Ok(vec![])));
        assert!(matches!(view.state(), ScheduleState::Loading));
        assert!(view.on_loaded(2, Ok(vec![])));
        assert!(matches!(view.state(), ScheduleState::Ready(_)));

        view.unmount();
        assert!(!view.on_loaded(2, Ok(vec![])));
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let mut view = ScheduleView::new();
        view.mount(1);
        view.on_loaded(1, Ok(vec![]));
        render(&mut view, 60, 10);
        let state = AppState::default();
        view.on_action(&Action::ScrollBottom, &state);
        let bottom = view.scroll;
        assert!(bottom > 0);
        view.on_action(&Action::ScrollDown(100), &state);
        assert_eq!(view.scroll, bottom);
        view.on_action(&Action::ScrollUp(1000), &state);
        assert_eq!(view.scroll, 0);
    }
}
