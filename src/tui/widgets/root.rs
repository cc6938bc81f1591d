//! Root layout: tab bar, the active screen, the player bar, and the
//! status line.
//!
//! ┌────────────────────────────────────────────────────┐
//! │ [Search] [Album] [Now Playing] [Downloads] [Help]  │
//! ├────────────────────────────────────────────────────┤
//! │                  active screen                     │
//! ├─────────────────────────┬──────────────────────────┤
//! │         Player          │          Lyrics          │
//! ├─────────────────────────┴──────────────────────────┤
//! │ status                                       toast │
//! └────────────────────────────────────────────────────┘

use crate::app::state::{AppState, Screen, ToastKind};
use crate::tui::theme::Theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{album, downloads, help, now_playing, search, truncate_str};

const SCREENS: [Screen; 5] = [
    Screen::Search,
    Screen::Album,
    Screen::NowPlaying,
    Screen::Downloads,
    Screen::Help,
];

pub fn render(frame: &mut Frame, theme: &Theme, state: &mut AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tab bar
            Constraint::Min(6),    // active screen
            Constraint::Length(7), // player + lyrics
            Constraint::Length(1), // status line
        ])
        .split(frame.area());

    render_tabs(frame, theme, state, rows[0]);

    match state.screen {
        Screen::Search => search::render(frame, theme, state, rows[1]),
        Screen::Album => album::render(frame, theme, state, rows[1]),
        Screen::NowPlaying => now_playing::render_screen(frame, theme, state, rows[1]),
        Screen::Downloads => downloads::render(frame, theme, state, rows[1]),
        Screen::Help => help::render(frame, theme, rows[1]),
    }

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[2]);
    now_playing::render_bar(frame, theme, state, bottom[0]);
    now_playing::render_lyric_strip(frame, theme, state, bottom[1]);

    render_status_line(frame, theme, state, rows[3]);
}

fn render_tabs(frame: &mut Frame, theme: &Theme, state: &AppState, area: Rect) {
    let mut spans: Vec<Span> = vec![Span::raw(" ")];
    for (i, screen) in SCREENS.iter().enumerate() {
        let active = state.screen == *screen;
        let style = if active {
            Style::default()
                .fg(theme.palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.palette.fg_secondary)
        };
        spans.push(Span::styled(format!("[{}]", i + 1), style));
        spans.push(Span::styled(format!(" {} ", screen.title()), style));
        if i < SCREENS.len() - 1 {
            spans.push(Span::raw(" "));
        }
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_status_line(frame: &mut Frame, theme: &Theme, state: &AppState, area: Rect) {
    let width = area.width as usize;

    if let Some(toast) = &state.toast {
        let (icon, color) = match toast.kind {
            ToastKind::Success => (theme.icons.success, theme.palette.playing),
            ToastKind::Error => (theme.icons.error, theme.palette.error),
        };
        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(color)),
            Span::styled(
                truncate_str(&toast.message, width.saturating_sub(4)),
                Style::default().fg(color),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let running = state.downloads.running();
    let right = if running > 0 {
        format!(
            "{} {} download{} ",
            theme.icons.download,
            running,
            if running == 1 { "" } else { "s" }
        )
    } else {
        String::new()
    };
    let left_width = width.saturating_sub(right.chars().count() + 2);
    let line = Line::from(vec![
        Span::styled(
            format!(" {}", truncate_str(&state.status, left_width)),
            Style::default().fg(theme.palette.fg_secondary),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    if !right.is_empty() {
        let len = right.chars().count() as u16;
        let x = area.x + area.width.saturating_sub(len);
        if x > area.x {
            frame.render_widget(
                Paragraph::new(right).style(Style::default().fg(theme.palette.fg_secondary)),
                Rect::new(x, area.y, len, 1),
            );
        }
    }
}
