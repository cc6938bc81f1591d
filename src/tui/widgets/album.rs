//! Album screen: the reconstructed track listing for one album.

use crate::app::state::AppState;
use crate::tui::theme::{LoadingSpinner, Theme};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::truncate_str;

pub fn render(frame: &mut Frame, theme: &Theme, state: &mut AppState, area: Rect) {
    let title = match &state.album_header {
        Some((album, artist)) => format!(" {} {album} — {artist} ", theme.icons.album),
        None => format!(" {} Album ", theme.icons.album),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(title)
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.album_list.loading {
        let spinner = LoadingSpinner::frame(state.tick);
        let loading = Paragraph::new(Line::from(format!("{} Resolving track listing...", spinner)))
            .style(Style::default().fg(theme.palette.fg_secondary));
        frame.render_widget(loading, inner);
        return;
    }

    if state.album_list.items.is_empty() {
        let msg = if state.album_header.is_some() {
            "No tracks found for this album"
        } else {
            "Open an album from the search screen"
        };
        let empty = Paragraph::new(Line::from(msg))
            .style(Style::default().fg(theme.palette.fg_secondary));
        frame.render_widget(empty, inner);
        return;
    }

    let visible_height = inner.height as usize;
    state.album_list.update_scroll(visible_height);
    let scroll_offset = state.album_list.scroll_offset;
    let max_width = inner.width.saturating_sub(3) as usize;

    let items: Vec<ListItem> = state
        .album_list
        .items
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
        .map(|(i, track)| {
            let is_selected = i == state.album_list.selected;
            let style = if is_selected {
                Style::default()
                    .fg(theme.palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.palette.fg_primary)
            };
            let duration = track
                .duration_seconds
                .map(|s| format!("  [{}]", super::fmt_clock(u64::from(s))))
                .unwrap_or_default();
            let label = format!(
                " {:02}. {} — {}{}",
                i + 1,
                track.title,
                track.artist_line(),
                duration
            );
            ListItem::new(Line::from(Span::styled(
                truncate_str(&label, max_width),
                style,
            )))
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(state.album_list.selected.saturating_sub(scroll_offset)));

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .fg(theme.palette.bg_primary)
                .bg(theme.palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(theme.icons.selected);

    frame.render_stateful_widget(list, inner, &mut list_state);
}
