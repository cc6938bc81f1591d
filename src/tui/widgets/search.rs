//! Search screen: query box plus the classified result list.

use crate::app::state::{AppState, SearchFocus};
use crate::catalog::models::SearchItem;
use crate::tui::theme::{LoadingSpinner, Theme};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::truncate_str;

pub fn render(frame: &mut Frame, theme: &Theme, state: &mut AppState, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    render_query_box(frame, theme, state, rows[0]);
    render_results(frame, theme, state, rows[1]);
}

fn render_query_box(frame: &mut Frame, theme: &Theme, state: &AppState, area: Rect) {
    let is_focused = state.search_focus == SearchFocus::Input;
    let border_color = if is_focused {
        theme.palette.accent
    } else {
        theme.palette.border
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} Query ", theme.icons.search))
        .title_style(Style::default().fg(theme.palette.accent));

    let prompt = if state.search_list.loading {
        let spinner = LoadingSpinner::frame(state.tick);
        format!("{} {}", state.search_query, spinner)
    } else {
        let cursor = if is_focused { "▏" } else { "" };
        format!("{}{}", state.search_query, cursor)
    };

    let p = Paragraph::new(Line::from(prompt))
        .style(Style::default().fg(theme.palette.fg_primary))
        .block(block);
    frame.render_widget(p, area);
}

fn render_results(frame: &mut Frame, theme: &Theme, state: &mut AppState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(" Results ")
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.search_list.loading {
        let spinner = LoadingSpinner::frame(state.tick);
        let loading = Paragraph::new(Line::from(format!("{} Searching...", spinner)))
            .style(Style::default().fg(theme.palette.fg_secondary));
        frame.render_widget(loading, inner);
        return;
    }

    if state.search_list.items.is_empty() {
        let msg = if state.last_search.is_some() {
            "Nothing found. Try another query."
        } else {
            "Type a query and press Enter"
        };
        let empty = Paragraph::new(Line::from(msg))
            .style(Style::default().fg(theme.palette.fg_secondary));
        frame.render_widget(empty, inner);
        return;
    }

    let visible_height = inner.height as usize;
    state.search_list.update_scroll(visible_height);
    let scroll_offset = state.search_list.scroll_offset;
    let max_width = inner.width.saturating_sub(3) as usize;

    let items: Vec<ListItem> = state
        .search_list
        .items
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
        .map(|(i, item)| {
            let is_selected = i == state.search_list.selected;
            let style = if is_selected {
                Style::default()
                    .fg(theme.palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.palette.fg_primary)
            };
            ListItem::new(Line::from(Span::styled(
                truncate_str(&item_label(theme, item), max_width),
                style,
            )))
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(state.search_list.selected.saturating_sub(scroll_offset)));

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .fg(theme.palette.bg_primary)
                .bg(theme.palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(theme.icons.selected);

    frame.render_stateful_widget(list, inner, &mut list_state);

    // Scroll position indicator in the top-right corner.
    let total = state.search_list.items.len();
    if total > visible_height {
        let pos_text = format!("{}/{}", state.search_list.selected + 1, total);
        let pos_len = pos_text.len() as u16;
        let pos_x = inner.x + inner.width.saturating_sub(pos_len);
        if pos_x > inner.x {
            frame.render_widget(
                Paragraph::new(pos_text).style(Style::default().fg(theme.palette.fg_secondary)),
                Rect::new(pos_x, inner.y, pos_len, 1),
            );
        }
    }
}

fn item_label(theme: &Theme, item: &SearchItem) -> String {
    match item {
        SearchItem::Track(t) => {
            let duration = t
                .duration_seconds
                .map(|s| format!("  [{}]", super::fmt_clock(u64::from(s))))
                .unwrap_or_default();
            format!(
                " {} {} — {}{}",
                theme.icons.music,
                t.title,
                t.artist_line(),
                duration
            )
        }
        SearchItem::Album(a) => {
            let count = a
                .track_count
                .map(|c| format!("  ({c} tracks)"))
                .unwrap_or_default();
            let year = a.year.as_deref().map(|y| format!(", {y}")).unwrap_or_default();
            format!(
                " {} {} — {}{}{}",
                theme.icons.album, a.title, a.artist, year, count
            )
        }
        SearchItem::Playlist(p) => {
            let count = p
                .track_count
                .map(|c| format!("  ({c} tracks)"))
                .unwrap_or_default();
            format!(
                " {} {} — {}{}",
                theme.icons.playlist, p.title, p.author, count
            )
        }
    }
}
