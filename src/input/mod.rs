use crate::app::actions::Action;
use crate::app::events::{Event, InputEvent};
use crate::app::state::{AppState, Screen, SearchFocus};
use crossterm::event::{
    self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use tokio::sync::mpsc;

pub fn spawn_input_task(tx: mpsc::Sender<Event>) {
    tokio::task::spawn_blocking(move || {
        loop {
            if event::poll(std::time::Duration::from_millis(250)).unwrap_or(false) {
                match event::read() {
                    Ok(CtEvent::Key(k)) => {
                        if k.kind == KeyEventKind::Press
                            && tx.blocking_send(Event::Input(InputEvent::Key(k))).is_err()
                        {
                            break;
                        }
                    }
                    Ok(CtEvent::Mouse(m)) => {
                        if tx.blocking_send(Event::Input(InputEvent::Mouse(m))).is_err() {
                            break;
                        }
                    }
                    Ok(CtEvent::Resize(_, _)) => {
                        if tx
                            .blocking_send(Event::Input(InputEvent::Resize))
                            .is_err()
                        {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(_) => {}
                }
            }
        }
    });
}

pub fn map_input_to_action(state: &AppState, ev: InputEvent) -> Option<Action> {
    match ev {
        InputEvent::Resize => Some(Action::Resize),
        InputEvent::Mouse(m) => match m.kind {
            MouseEventKind::ScrollUp => Some(Action::ListUp),
            MouseEventKind::ScrollDown => Some(Action::ListDown),
            _ => None,
        },
        InputEvent::Key(k) => match state.screen {
            Screen::Search => handle_search_screen(state, k),
            Screen::Album => handle_album_screen(k),
            Screen::NowPlaying => handle_now_playing_screen(k),
            Screen::Downloads | Screen::Help => global_key(k),
        },
    }
}

fn handle_search_screen(state: &AppState, k: KeyEvent) -> Option<Action> {
    match state.search_focus {
        SearchFocus::Input => match k.code {
            KeyCode::Esc => Some(Action::Quit),
            KeyCode::Tab => Some(Action::NextScreen),
            KeyCode::BackTab => Some(Action::PrevScreen),
            KeyCode::Enter => Some(Action::StartSearch),
            KeyCode::Backspace => Some(Action::Backspace),
            KeyCode::Down if !state.search_list.items.is_empty() => {
                Some(Action::SetSearchFocus(SearchFocus::Results))
            }
            KeyCode::Char('u') if k.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::ClearInput)
            }
            KeyCode::Char(c) => Some(Action::InputChar(c)),
            _ => None,
        },
        SearchFocus::Results => match k.code {
            KeyCode::Esc | KeyCode::Char('/') | KeyCode::Char('i') => {
                Some(Action::SetSearchFocus(SearchFocus::Input))
            }
            KeyCode::Enter => Some(Action::Activate),
            KeyCode::Char('d') if !k.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::DownloadSelected)
            }
            _ => global_key(k),
        },
    }
}

fn handle_album_screen(k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Esc | KeyCode::Backspace => Some(Action::BackToSearch),
        KeyCode::Enter => Some(Action::Activate),
        KeyCode::Char('d') if !k.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::DownloadSelected)
        }
        KeyCode::Char('D') => Some(Action::DownloadAlbum),
        _ => global_key(k),
    }
}

fn handle_now_playing_screen(k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Char('s') => Some(Action::Stop),
        _ => global_key(k),
    }
}

/// Keys that mean the same thing everywhere outside the search input.
fn global_key(k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Char('q') => Some(Action::Quit),

        // Navigation - vim style
        KeyCode::Up | KeyCode::Char('k') => Some(Action::ListUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::ListDown),
        KeyCode::Char('g') => Some(Action::GoTop),
        KeyCode::Char('G') => Some(Action::GoBottom),
        KeyCode::Char('d') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageDown),
        KeyCode::Char('u') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageUp),

        // Screen switching - Tab cycles through screens
        KeyCode::Tab => Some(Action::NextScreen),
        KeyCode::BackTab => Some(Action::PrevScreen),
        KeyCode::Char('1') => Some(Action::SetScreen(Screen::Search)),
        KeyCode::Char('2') => Some(Action::SetScreen(Screen::Album)),
        KeyCode::Char('3') => Some(Action::SetScreen(Screen::NowPlaying)),
        KeyCode::Char('4') => Some(Action::SetScreen(Screen::Downloads)),
        KeyCode::Char('5') => Some(Action::SetScreen(Screen::Help)),

        // Playback
        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('=') | KeyCode::Char('+') => Some(Action::VolumeUp),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::VolumeDown),
        KeyCode::Char(']') => Some(Action::SeekForward),
        KeyCode::Char('[') => Some(Action::SeekBack),

        KeyCode::Char('?') | KeyCode::F(1) => Some(Action::SetScreen(Screen::Help)),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> InputEvent {
        InputEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    #[test]
    fn typing_goes_into_the_search_input() {
        let state = AppState::new();
        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Char('q'))),
            Some(Action::InputChar('q'))
        );
        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Enter)),
            Some(Action::StartSearch)
        );
    }

    #[test]
    fn album_screen_separates_track_and_album_downloads() {
        let mut state = AppState::new();
        state.screen = Screen::Album;

        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Char('d'))),
            Some(Action::DownloadSelected)
        );
        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Char('D'))),
            Some(Action::DownloadAlbum)
        );
        assert_eq!(map_input_to_action(&state, ctrl('d')), Some(Action::PageDown));
        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Esc)),
            Some(Action::BackToSearch)
        );
    }

    #[test]
    fn playback_keys_work_outside_the_search_input() {
        let mut state = AppState::new();
        state.screen = Screen::NowPlaying;

        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Char(' '))),
            Some(Action::TogglePause)
        );
        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Char('s'))),
            Some(Action::Stop)
        );
        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Char(']'))),
            Some(Action::SeekForward)
        );
    }
}
