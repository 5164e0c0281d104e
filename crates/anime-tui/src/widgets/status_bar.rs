//! Status bar — bottom line with the active route and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::action::Route;
use crate::theme::{C_MODE_HOME, C_MODE_SCHEDULE, C_MUTED, C_SECONDARY, C_SEPARATOR};

fn route_color(route: Route) -> ratatui::style::Color {
    match route {
        Route::Home => C_MODE_HOME,
        Route::Schedule => C_MODE_SCHEDULE,
    }
}

/// Draw a horizontal separator line.
pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, route: Route) {
    let keys = match route {
        Route::Home => " s/Enter schedule  ↑↓/jk scroll popular  K keys  ? help  q quit",
        Route::Schedule => " h/Esc home  ↑↓/jk scroll  PgUp/PgDn page  g/G top/bottom  K keys  ? help  q quit",
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", route.label()),
            Style::default()
                .fg(route_color(route))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(route.path(), Style::default().fg(C_SECONDARY)),
        Span::raw(" "),
        Span::styled(keys, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
