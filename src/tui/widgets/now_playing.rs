//! Now-playing views: the compact bottom player bar, the synced lyric
//! strip next to it, and the full-screen lyrics page.

use crate::app::state::AppState;
use crate::player::SessionState;
use crate::tui::theme::{LoadingSpinner, Theme};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{fmt_clock, progress_bar, truncate_str};

/// Compact player for the bottom bar.
pub fn render_bar(frame: &mut Frame, theme: &Theme, state: &AppState, area: Rect) {
    let icons = &theme.icons;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(format!(" {} Player ", icons.music))
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let padded = pad_horizontal(inner);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1), // artist
            Constraint::Length(1), // spacing
            Constraint::Length(1), // progress bar
            Constraint::Length(1), // time + state + volume
        ])
        .split(padded);

    let content_width = padded.width.saturating_sub(1) as usize;

    let title = match (&state.playback.track, state.player) {
        (Some(t), SessionState::Loading) => format!("{} {}", LoadingSpinner::frame(state.tick), t.title),
        (Some(t), _) => t.title.clone(),
        (None, _) => "Not playing".to_string(),
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            truncate_str(&title, content_width),
            Style::default()
                .fg(theme.palette.fg_primary)
                .add_modifier(Modifier::BOLD),
        ))),
        rows[0],
    );

    let artist = state
        .playback
        .track
        .as_ref()
        .map(|t| t.artist_line())
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            truncate_str(&artist, content_width),
            Style::default().fg(theme.palette.fg_secondary),
        ))),
        rows[1],
    );

    let position = state.playback.position.map(|p| p.as_secs()).unwrap_or(0);
    let duration = state
        .playback
        .track
        .as_ref()
        .and_then(|t| t.duration_seconds)
        .map(u64::from)
        .unwrap_or(0);
    let ratio = if duration > 0 {
        position as f64 / duration as f64
    } else {
        0.0
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            progress_bar(rows[3].width as usize, ratio, icons),
            Style::default().fg(theme.palette.accent),
        ))),
        rows[3],
    );

    let state_icon = match state.player {
        SessionState::Playing => icons.pause,
        SessionState::Paused => icons.play,
        _ => icons.play,
    };
    let vol_icon = if state.volume == 0 {
        icons.volume_mute
    } else if state.volume < 50 {
        icons.volume_low
    } else {
        icons.volume_high
    };
    let controls = Line::from(vec![
        Span::styled(
            format!("{}/{}", fmt_clock(position), fmt_clock(duration)),
            Style::default().fg(theme.palette.fg_secondary),
        ),
        Span::raw("  "),
        Span::styled(state_icon, Style::default().fg(theme.palette.playing)),
        Span::raw("  "),
        Span::styled(vol_icon, Style::default().fg(theme.palette.fg_secondary)),
        Span::raw(" "),
        Span::styled(
            format!("{}%", state.volume),
            Style::default().fg(theme.palette.fg_secondary),
        ),
    ]);
    frame.render_widget(Paragraph::new(controls), rows[4]);
}

/// Three-line synced lyric window for the bottom bar.
pub fn render_lyric_strip(frame: &mut Frame, theme: &Theme, state: &AppState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(format!(" {} Lyrics ", theme.icons.lyrics))
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let padded = pad_horizontal(inner);

    let Some(lines) = lyric_window(theme, state, padded.width.saturating_sub(4) as usize, 1, 1)
    else {
        let msg = lyric_placeholder(state);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                msg,
                Style::default().fg(theme.palette.fg_secondary),
            )))
            .alignment(Alignment::Center),
            padded,
        );
        return;
    };

    // Center vertically.
    let top_padding = (padded.height as usize).saturating_sub(lines.len()) / 2;
    let mut centered: Vec<Line> = vec![Line::default(); top_padding];
    centered.extend(lines);
    frame.render_widget(Paragraph::new(centered), padded);
}

/// Full-screen now-playing page: a taller lyric window around the
/// current line.
pub fn render_screen(frame: &mut Frame, theme: &Theme, state: &AppState, area: Rect) {
    let title = match &state.playback.track {
        Some(t) => format!(" {} {} — {} ", theme.icons.music, t.title, t.artist_line()),
        None => format!(" {} Now Playing ", theme.icons.music),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(title)
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let padded = pad_horizontal(inner);
    let (lyric_area, footer) = if state.playback.track.is_some() && padded.height > 2 {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(padded);
        (rows[0], Some(rows[1]))
    } else {
        (padded, None)
    };
    let half = (lyric_area.height as usize).saturating_sub(1) / 2;

    if let Some(lines) =
        lyric_window(theme, state, lyric_area.width.saturating_sub(4) as usize, half, half)
    {
        let top_padding = (lyric_area.height as usize).saturating_sub(lines.len()) / 2;
        let mut centered: Vec<Line> = vec![Line::default(); top_padding];
        centered.extend(lines);
        frame.render_widget(Paragraph::new(centered), lyric_area);
    } else {
        let msg = if state.playback.track.is_none() {
            "Play a track from the search or album screen".to_string()
        } else {
            lyric_placeholder(state)
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                msg,
                Style::default().fg(theme.palette.fg_secondary),
            )))
            .alignment(Alignment::Center),
            lyric_area,
        );
    }

    if let Some(footer) = footer {
        let cover_line = match &state.playback.cover {
            Some(path) => format!("{} cover: {}", theme.icons.album, path.display()),
            None => format!("{} no cover art", theme.icons.album),
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                truncate_str(&cover_line, footer.width as usize),
                Style::default().fg(theme.palette.fg_secondary),
            ))),
            footer,
        );
    }
}

fn lyric_placeholder(state: &AppState) -> String {
    if state.playback.lyrics_unavailable {
        "No lyrics available".to_string()
    } else if state.playback.track.is_some() {
        format!("{} Fetching lyrics...", LoadingSpinner::frame(state.tick))
    } else {
        "No lyrics available".to_string()
    }
}

/// Lines around the current lyric index, highlighted. `None` when there
/// is no sheet to show.
fn lyric_window(
    theme: &Theme,
    state: &AppState,
    max_width: usize,
    before: usize,
    after: usize,
) -> Option<Vec<Line<'static>>> {
    let sheet = state.playback.lyrics.as_ref()?;
    if sheet.lines.is_empty() {
        return None;
    }

    // Before the first timestamp, show the window anchored at the top.
    let current = state.playback.lyric_index;
    let anchor = current.unwrap_or(0);
    let start = anchor.saturating_sub(before);
    let end = (anchor + after + 1).min(sheet.lines.len());

    let mut out = Vec::with_capacity(end - start);
    for i in start..end {
        let is_current = current == Some(i);
        let style = if is_current {
            Style::default()
                .fg(theme.palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.palette.fg_secondary)
        };
        let prefix = if is_current { "♪ " } else { "  " };
        out.push(Line::from(vec![
            Span::styled(prefix, style),
            Span::styled(truncate_str(&sheet.lines[i].text, max_width), style),
        ]));
    }
    Some(out)
}

fn pad_horizontal(area: Rect) -> Rect {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area)[1]
}
