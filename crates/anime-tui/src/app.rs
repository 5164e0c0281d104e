//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns all components and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background tasks:
//!   terminal input, catalog fetches, the Home probe and carousel ticks.
//! - The event loop draws each frame, then awaits the next message.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - Every mount gets a fresh generation number. Background results carry the
//!   generation they were started under and are dropped if it no longer matches.

use std::io;
use std::time::Duration;

use anyhow::Context;
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use anime_proto::catalog::AnimeRecord;
use anime_proto::config::{Config, TimingConfig};
use anime_proto::{CatalogClient, CatalogError, Endpoint};

use crate::{
    action::{Action, Route},
    app_state::AppState,
    component::Component,
    components::{
        carousel::TopAiringCarousel, help_overlay::HelpOverlay, popular::PopularAnime,
        schedule::{ScheduleView, SCHEDULE_ERROR},
    },
    home::{self, HomeContent, HOME_TITLE},
    theme::{style_title, C_BG, C_LINK},
    widgets::{
        status_bar,
        toast::{Severity, ToastManager},
    },
};

// ── Internal event bus ────────────────────────────────────────────────────────

pub enum AppMessage {
    Event(Event),
    /// Home's delay + probe finished.
    HomeReady {
        generation: u64,
        probe: Result<(), CatalogError>,
    },
    /// A list fetch started under `generation` finished.
    CatalogLoaded {
        endpoint: Endpoint,
        generation: u64,
        result: Result<Vec<AnimeRecord>, CatalogError>,
    },
    /// Carousel rotation tick, stamped with the ticker epoch.
    CarouselTick(u64),
}

pub struct App {
    state: AppState,
    client: CatalogClient,
    timing: TimingConfig,

    home: HomeContent,
    carousel: TopAiringCarousel,
    popular: PopularAnime,
    schedule: ScheduleView,
    help_overlay: HelpOverlay,
    toast: ToastManager,

    next_generation: u64,
    should_quit: bool,
    tx: mpsc::Sender<AppMessage>,
    rx: Option<mpsc::Receiver<AppMessage>>,
}

impl App {
    pub fn new(client: CatalogClient, config: &Config) -> Self {
        let (tx, rx) = mpsc::channel::<AppMessage>(1024);
        let timing = config.timing.clone();
        Self {
            state: AppState {
                show_keys_bar: config.ui.show_keys_bar,
                ..AppState::default()
            },
            client,
            carousel: TopAiringCarousel::new(timing.rotation_interval(), timing.refetch_guard()),
            timing,
            home: HomeContent::new(),
            popular: PopularAnime::new(),
            schedule: ScheduleView::new(),
            help_overlay: HelpOverlay::new(),
            toast: ToastManager::new(),
            next_generation: 0,
            should_quit: false,
            tx,
            rx: Some(rx),
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut rx = self.rx.take().context("app event channel already taken")?;

        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let result = self.event_loop(&mut terminal, &mut rx).await;

        // ── Teardown ──────────────────────────────────────────────────────────
        // Runs even when the loop failed, so the shell gets its terminal back.
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        rx: &mut mpsc::Receiver<AppMessage>,
    ) -> anyhow::Result<()> {
        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = self.tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("terminal event reader stopped: {}", e);
                    break;
                }
            }
        });

        info!("anime-schedule started");
        self.mount_home();

        // Toast expiry check + spinner animation: 100ms for smooth braille animation
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg);
                    // Drain whatever else is already queued before redrawing.
                    while let Ok(next) = rx.try_recv() {
                        needs_redraw |= self.handle_message(next);
                    }
                }

                _ = toast_tick.tick() => {
                    needs_redraw = !self.toast.is_empty();
                    self.toast.tick();
                }
            }
        }
        Ok(())
    }

    // ── Message handling ──────────────────────────────────────────────────────

    /// Apply one message. Returns whether a redraw is needed.
    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                for action in self.handle_key(key) {
                    self.dispatch(action);
                }
                true
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                for action in self.handle_mouse(mouse) {
                    self.dispatch(action);
                }
                true
            }
            AppMessage::Event(Event::Resize(w, h)) => {
                self.dispatch(Action::Resize(w, h));
                true
            }
            AppMessage::Event(_) => false,
            AppMessage::HomeReady { generation, probe } => self.on_home_ready(generation, probe),
            AppMessage::CatalogLoaded {
                endpoint,
                generation,
                result,
            } => self.on_catalog_loaded(endpoint, generation, result),
            AppMessage::CarouselTick(epoch) => self.carousel.on_tick(epoch),
        }
    }

    fn on_home_ready(&mut self, generation: u64, probe: Result<(), CatalogError>) -> bool {
        if !self.home.on_ready(generation, probe) {
            return false;
        }
        self.state.home_ready = self.home.is_ready();
        self.state.home_error = self.home.error().map(str::to_string);
        match &self.state.home_error {
            Some(msg) => {
                self.toast
                    .resolve_spinner(Severity::Warning, msg.clone(), Duration::from_secs(4))
            }
            None => self.toast.resolve_spinner(
                Severity::Info,
                "Connected to the catalog",
                Duration::from_secs(2),
            ),
        }

        if self.carousel.activate(generation, &self.tx) {
            self.spawn_catalog_fetch(Endpoint::TopAiring, generation);
        }
        if self.popular.activate(generation) {
            self.spawn_catalog_fetch(Endpoint::Popular, generation);
        }
        true
    }

    fn on_catalog_loaded(
        &mut self,
        endpoint: Endpoint,
        generation: u64,
        result: Result<Vec<AnimeRecord>, CatalogError>,
    ) -> bool {
        match endpoint {
            Endpoint::Schedules => {
                let accepted = self.schedule.on_loaded(generation, result);
                if accepted && self.schedule.error().is_some() {
                    self.toast.error(SCHEDULE_ERROR);
                }
                accepted
            }
            Endpoint::TopAiring => self.carousel.on_loaded(generation, result, &self.tx),
            Endpoint::Popular => {
                let accepted = self.popular.on_loaded(generation, result);
                if let (true, Some(msg)) = (accepted, self.popular.error()) {
                    self.toast.warning(msg.to_string());
                }
                accepted
            }
        }
    }

    // ── Navigation ────────────────────────────────────────────────────────────

    fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn navigate(&mut self, route: Route) {
        if route == self.state.route {
            return;
        }
        info!("navigate: {} -> {}", self.state.route.path(), route.path());
        match self.state.route {
            Route::Home => self.unmount_home(),
            Route::Schedule => self.schedule.unmount(),
        }
        self.state.route = route;
        match route {
            Route::Home => self.mount_home(),
            Route::Schedule => self.mount_schedule(),
        }
    }

    fn mount_home(&mut self) {
        let generation = self.next_generation();
        self.home.mount(generation);
        self.state.home_ready = false;
        self.state.home_error = None;
        self.toast.spinner("Loading anime…");

        let client = self.client.clone();
        let delay = self.timing.loading_delay();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let probe = home::run_activation(client, delay).await;
            let _ = tx.send(AppMessage::HomeReady { generation, probe }).await;
        });
    }

    fn unmount_home(&mut self) {
        self.home.unmount();
        self.carousel.deactivate();
        self.popular.deactivate();
        self.state.home_ready = false;
        self.state.home_error = None;
        self.toast.dismiss_spinner();
    }

    fn mount_schedule(&mut self) {
        let generation = self.next_generation();
        if self.schedule.mount(generation) {
            self.spawn_catalog_fetch(Endpoint::Schedules, generation);
        }
    }

    fn spawn_catalog_fetch(&self, endpoint: Endpoint, generation: u64) {
        debug!("fetch: {:?} for generation {}", endpoint, generation);
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = match endpoint {
                Endpoint::Schedules => client.fetch_schedules().await,
                Endpoint::TopAiring => client.fetch_top_airing().await,
                Endpoint::Popular => client.fetch_popular().await,
            };
            let _ = tx
                .send(AppMessage::CatalogLoaded {
                    endpoint,
                    generation,
                    result,
                })
                .await;
        });
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }

        // Global keys — always active
        match key.code {
            KeyCode::Char('q') if key.modifiers == KeyModifiers::NONE => return vec![Action::Quit],
            KeyCode::Char('c') if key.modifiers == KeyModifiers::CONTROL => {
                return vec![Action::Quit];
            }
            KeyCode::Char('?') => return vec![Action::ToggleHelp],
            _ => {}
        }

        // Help overlay captures all keys when visible
        if self.help_overlay.visible {
            return self.help_overlay.handle_key(key, &self.state);
        }

        if key.code == KeyCode::Char('K') {
            return vec![Action::ToggleKeys];
        }

        match self.state.route {
            Route::Home => match key.code {
                KeyCode::Char('s') | KeyCode::Enter => vec![Action::Navigate(Route::Schedule)],
                _ => self.popular.handle_key(key, &self.state),
            },
            Route::Schedule => match key.code {
                KeyCode::Char('h') | KeyCode::Esc | KeyCode::Backspace => {
                    vec![Action::Navigate(Route::Home)]
                }
                _ => self.schedule.handle_key(key, &self.state),
            },
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Vec<Action> {
        if self.help_overlay.visible {
            return vec![];
        }
        match self.state.route {
            Route::Home => self.popular.handle_mouse(mouse, &self.state),
            Route::Schedule => self.schedule.handle_mouse(mouse, &self.state),
        }
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        // Offer the action to the overlay and the active route's components first
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.help_overlay.on_action(&action, s));
            match s.route {
                Route::Home => {
                    out.extend(self.carousel.on_action(&action, s));
                    out.extend(self.popular.on_action(&action, s));
                }
                Route::Schedule => out.extend(self.schedule.on_action(&action, s)),
            }
            out
        };

        self.apply_action(action);

        // Dispatch any secondary actions (depth-limited to 1 level)
        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        if action != Action::Noop {
            debug!("apply_action: {:?}", action);
        }
        match action {
            Action::Navigate(route) => self.navigate(route),
            Action::ToggleKeys => self.state.show_keys_bar = !self.state.show_keys_bar,
            Action::Quit => self.should_quit = true,
            // Scroll and help are handled inside the components; resize just redraws.
            Action::ScrollUp(_)
            | Action::ScrollDown(_)
            | Action::ScrollTop
            | Action::ScrollBottom
            | Action::ToggleHelp
            | Action::Resize(_, _)
            | Action::Noop => {}
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();

        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let status_h = if self.state.show_keys_bar { 1u16 } else { 0 };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(status_h)])
            .split(area);

        match self.state.route {
            Route::Home => self.draw_home(frame, outer[0]),
            Route::Schedule => self.schedule.draw(frame, outer[0], true, &self.state),
        }

        if self.state.show_keys_bar {
            status_bar::draw_keys_bar(frame, outer[1], self.state.route);
        }

        // ── Help overlay (on top of everything) ──────────────────────────────
        self.help_overlay.draw(frame, area, false, &self.state);

        // ── Toast notifications (topmost layer) ──────────────────────────────
        self.toast.draw(frame, area);
    }

    fn draw_home(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(7),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(HOME_TITLE, style_title())))
                .alignment(Alignment::Center),
            rows[0],
        );
        status_bar::draw_separator(frame, rows[1]);

        self.carousel.draw(frame, rows[2], false, &self.state);
        self.popular.draw(frame, rows[3], true, &self.state);

        let link = Line::from(vec![
            Span::styled(" [s] ", Style::default().fg(C_LINK).add_modifier(Modifier::BOLD)),
            Span::styled(
                "Go to Schedule",
                Style::default()
                    .fg(C_LINK)
                    .add_modifier(Modifier::UNDERLINED),
            ),
        ]);
        frame.render_widget(Paragraph::new(link), rows[4]);
    }
}
