pub mod app;
pub mod input;
pub mod ui;

use anyhow::Result;
use crossterm::event::{Event, KeyEventKind};
use ratatui::{backend::CrosstermBackend, prelude::*};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

use crate::core::Bench;
use app::{App, Flow};

/// Upper bound on one input poll wait.
const MAX_IDLE: Duration = Duration::from_millis(250);

pub fn start(bench: Bench) -> Result<()> {
    log::info!("[TUI] probe-bench TUI starting...");

    let mut stdout = io::stdout();
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(&mut stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, App::new(bench));

    // Restore terminal
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen)?;
    crossterm::terminal::disable_raw_mode()?;

    res
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<&mut Stdout>>, mut app: App) -> Result<()> {
    loop {
        app.bench.on_tick(Instant::now());
        terminal.draw(|f| ui::render_ui(f, &app))?;

        let wait = app.bench.next_wake(Instant::now()).min(MAX_IDLE);
        if !crossterm::event::poll(wait)? {
            continue;
        }

        match crossterm::event::read() {
            // Only the initial press counts; repeats and releases are ignored.
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if app.handle_key(key) == Flow::Quit {
                    break;
                }
            }
            Ok(_) => {}
            Err(err) => log::error!("[TUI] input read error: {err}"),
        }
    }

    terminal.clear()?;
    Ok(())
}
