use crossterm::event::KeyEvent;
use std::path::PathBuf;

use crate::{
    core::{Bench, SubmitOutcome},
    tui::input::{map_edit_key, map_key, Action, EditAction},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Flash,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub bench: Bench,
    pub focus: Focus,
    /// Firmware path being typed, if the path editor is open.
    pub path_input: Option<String>,
}

impl App {
    pub fn new(bench: Bench) -> Self {
        Self {
            bench,
            focus: Focus::Flash,
            path_input: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if self.path_input.is_some() {
            self.handle_edit_key(key);
            return Flow::Continue;
        }

        match map_key(key) {
            Action::Quit => return Flow::Quit,
            Action::SwitchFocus => {
                self.focus = match self.focus {
                    Focus::Flash => Focus::Test,
                    Focus::Test => Focus::Flash,
                };
            }
            Action::NextPort => self.focused_ports_cycle(1),
            Action::PrevPort => self.focused_ports_cycle(-1),
            Action::EditPath => {
                let current = self
                    .bench
                    .flash_image()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                self.focus = Focus::Flash;
                self.path_input = Some(current);
            }
            Action::SubmitFlash => self.submit(Focus::Flash),
            Action::SubmitTest => self.submit(Focus::Test),
            Action::SubmitFocused => self.submit(self.focus),
            Action::None => {}
        }
        Flow::Continue
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        let Some(input) = self.path_input.as_mut() else {
            return;
        };
        match map_edit_key(key) {
            EditAction::Insert(c) => input.push(c),
            EditAction::Backspace => {
                input.pop();
            }
            EditAction::Confirm => {
                let text = input.trim().to_string();
                let image = (!text.is_empty()).then(|| PathBuf::from(text));
                self.bench.set_flash_image(image);
                self.path_input = None;
            }
            // Cancelling keeps the previous choice.
            EditAction::Cancel => self.path_input = None,
            EditAction::None => {}
        }
    }

    fn focused_ports_cycle(&mut self, step: isize) {
        match self.focus {
            Focus::Flash => self.bench.flash_ports_mut().cycle(step),
            Focus::Test => self.bench.test_ports_mut().cycle(step),
        }
    }

    fn submit(&mut self, pane: Focus) {
        let outcome = match pane {
            Focus::Flash => self.bench.submit_flash(),
            Focus::Test => self.bench.submit_test(),
        };
        if outcome == SubmitOutcome::Busy {
            log::debug!("[TUI] {pane:?} pane is busy");
        }
    }
}
