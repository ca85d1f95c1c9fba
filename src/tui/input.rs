use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key actions while browsing the panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    SwitchFocus,
    NextPort,
    PrevPort,
    EditPath,
    SubmitFlash,
    SubmitTest,
    SubmitFocused,
    None,
}

/// Key actions while the firmware path is being typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    Insert(char),
    Backspace,
    Confirm,
    Cancel,
    None,
}

pub fn map_key(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => Action::SwitchFocus,
        KeyCode::Down | KeyCode::Char('j') => Action::NextPort,
        KeyCode::Up | KeyCode::Char('k') => Action::PrevPort,
        KeyCode::Char('o') | KeyCode::Char('e') => Action::EditPath,
        KeyCode::F(5) => Action::SubmitFlash,
        KeyCode::F(6) => Action::SubmitTest,
        KeyCode::Enter => Action::SubmitFocused,
        _ => Action::None,
    }
}

pub fn map_edit_key(key: KeyEvent) -> EditAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => EditAction::Cancel,
            _ => EditAction::None,
        };
    }

    match key.code {
        KeyCode::Char(c) => EditAction::Insert(c),
        KeyCode::Backspace => EditAction::Backspace,
        KeyCode::Enter => EditAction::Confirm,
        KeyCode::Esc => EditAction::Cancel,
        _ => EditAction::None,
    }
}
