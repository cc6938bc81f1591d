use super::state::{Screen, SearchFocus};

/// Everything a key press can ask the app to do. Input mapping produces
/// these; the reducer in `app` interprets them against current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextScreen,
    PrevScreen,
    SetScreen(Screen),
    SetSearchFocus(SearchFocus),

    ListUp,
    ListDown,
    GoTop,
    GoBottom,
    PageUp,
    PageDown,

    InputChar(char),
    Backspace,
    ClearInput,
    StartSearch,

    /// Open the selected album or play the selected track.
    Activate,
    BackToSearch,

    DownloadSelected,
    DownloadAlbum,

    TogglePause,
    Stop,
    SeekForward,
    SeekBack,
    VolumeUp,
    VolumeDown,

    Resize,
}
