//! Help screen showing keybindings.

use crate::tui::theme::Theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(frame: &mut Frame, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(format!(" {} Keybinds ", theme.icons.help))
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let left = [
        ("", "Navigation"),
        ("j / ↓", "Move down"),
        ("k / ↑", "Move up"),
        ("g / G", "First / last item"),
        ("Ctrl-d / Ctrl-u", "Page down / up"),
        ("Tab / Shift-Tab", "Next / previous screen"),
        ("1-5", "Jump to screen"),
        ("Esc", "Back (album) / quit (search)"),
        ("q", "Quit"),
        ("", ""),
        ("", "Search"),
        ("Enter", "Search / open selection"),
        ("/ or i", "Focus the query box"),
        ("Ctrl-u", "Clear the query"),
    ];
    let right = [
        ("", "Playback"),
        ("Enter", "Play selected track"),
        ("Space", "Pause / resume"),
        ("s", "Stop (now-playing screen)"),
        ("[ / ]", "Seek -5s / +5s"),
        ("- / =", "Volume down / up"),
        ("", ""),
        ("", "Downloads"),
        ("d", "Download selected track"),
        ("D", "Download whole album"),
    ];

    frame.render_widget(Paragraph::new(column(theme, &left)), cols[0]);
    frame.render_widget(Paragraph::new(column(theme, &right)), cols[1]);
}

fn column<'a>(theme: &Theme, rows: &[(&'a str, &'a str)]) -> Vec<Line<'a>> {
    rows.iter()
        .map(|(key, desc)| {
            if key.is_empty() {
                // Section header (or spacer when both are empty).
                Line::from(Span::styled(
                    format!(" {desc}"),
                    Style::default()
                        .fg(theme.palette.accent)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        format!("  {key:<16}"),
                        Style::default().fg(theme.palette.fg_primary),
                    ),
                    Span::styled(*desc, Style::default().fg(theme.palette.fg_secondary)),
                ])
            }
        })
        .collect()
}
