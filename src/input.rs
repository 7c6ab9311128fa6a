use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Navigation
    NextItem, // Down arrow, j
    PrevItem, // Up arrow, k
    First,    // Home, g
    Last,     // End, G

    // Interaction
    Toggle, // Enter, Space - expand/collapse group or row under cursor
    Block,  // 'b' - emit a block intent for the row under cursor

    // Control
    Quit,    // 'q', Esc, Ctrl+C
    Pause,   // 'p' - pause/resume polling
    Refresh, // 'r' - fetch now instead of waiting for the next tick
    Help,    // '?' - toggle key help overlay

    // Unknown/unhandled
    Unknown,
}

impl InputEvent {
    pub fn from_key_event(key_event: KeyEvent) -> Self {
        match (key_event.code, key_event.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Self::Quit,

            (KeyCode::Down | KeyCode::Char('j'), _) => Self::NextItem,
            (KeyCode::Up | KeyCode::Char('k'), _) => Self::PrevItem,
            (KeyCode::Home | KeyCode::Char('g'), _) => Self::First,
            (KeyCode::End | KeyCode::Char('G'), _) => Self::Last,

            (KeyCode::Enter | KeyCode::Char(' '), _) => Self::Toggle,
            (KeyCode::Char('b'), _) => Self::Block,

            (KeyCode::Char('q') | KeyCode::Esc, _) => Self::Quit,
            (KeyCode::Char('p'), _) => Self::Pause,
            (KeyCode::Char('r'), _) => Self::Refresh,
            (KeyCode::Char('?'), _) => Self::Help,

            _ => Self::Unknown,
        }
    }
}
