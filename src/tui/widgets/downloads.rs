//! Downloads screen: one row per job with a progress bar.

use crate::app::state::{AppState, DownloadStatus};
use crate::tui::theme::{LoadingSpinner, Theme};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{progress_bar, truncate_str};

pub fn render(frame: &mut Frame, theme: &Theme, state: &AppState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(format!(" {} Downloads ", theme.icons.download))
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.downloads.jobs.is_empty() {
        let empty = Paragraph::new(Line::from(
            "No downloads yet. Press d on a track, D on an album.",
        ))
        .style(Style::default().fg(theme.palette.fg_secondary));
        frame.render_widget(empty, inner);
        return;
    }

    let bar_width = (inner.width as usize / 3).max(10);
    let label_width = (inner.width as usize).saturating_sub(bar_width + 12);

    // Newest jobs first; two lines per job when a detail string exists.
    let mut lines: Vec<Line> = Vec::new();
    for job in state.downloads.jobs.iter().rev() {
        let (icon, color) = match &job.status {
            DownloadStatus::Running => (
                LoadingSpinner::frame(state.tick),
                theme.palette.fg_primary,
            ),
            DownloadStatus::Done(_) => (theme.icons.success, theme.palette.playing),
            DownloadStatus::Failed(_) => (theme.icons.error, theme.palette.error),
        };

        let mut spans = vec![
            Span::styled(format!(" {icon} "), Style::default().fg(color)),
            Span::styled(
                truncate_str(&job.label, label_width),
                Style::default().fg(theme.palette.fg_primary),
            ),
            Span::raw("  "),
        ];
        match &job.status {
            DownloadStatus::Running => {
                spans.push(Span::styled(
                    progress_bar(bar_width, job.fraction, &theme.icons),
                    Style::default().fg(theme.palette.accent),
                ));
                spans.push(Span::styled(
                    format!(" {:3.0}%", job.fraction * 100.0),
                    Style::default().fg(theme.palette.fg_secondary),
                ));
            }
            DownloadStatus::Done(path) => {
                spans.push(Span::styled(
                    truncate_str(&path.display().to_string(), bar_width + 6),
                    Style::default().fg(theme.palette.fg_secondary),
                ));
            }
            DownloadStatus::Failed(err) => {
                spans.push(Span::styled(
                    truncate_str(err, bar_width + 6),
                    Style::default().fg(theme.palette.error),
                ));
            }
        }
        lines.push(Line::from(spans));

        if let Some(detail) = &job.detail
            && job.status == DownloadStatus::Running
        {
            lines.push(Line::from(Span::styled(
                format!("   {}", truncate_str(detail, label_width + bar_width)),
                Style::default().fg(theme.palette.fg_secondary),
            )));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
