pub mod app;
pub mod ui;

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::config::Config;
use crate::error::Result;
use crate::focus::{Durations, TimerKind};
use crate::models::Status;
use crate::storage::Gateway;
use crate::store::TaskStore;
use app::{App, InputField, InputMode, ViewMode};
use ui::ui;

/// How long to wait for a key before redrawing the focus timer.
const TICK_RATE: Duration = Duration::from_millis(250);

pub fn run_tui<G: Gateway>(store: TaskStore<G>, config: &Config) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, Durations::from(config));

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: Backend, G: Gateway>(terminal: &mut Terminal<B>, app: &mut App<G>) -> io::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.input_mode {
                    InputMode::Normal => {
                        if key.code == KeyCode::Char('q') {
                            return Ok(());
                        }
                        handle_normal_key(app, key.code);
                    }
                    InputMode::Editing | InputMode::Adding => match key.code {
                        KeyCode::Enter => app.handle_input(),
                        KeyCode::Esc => app.cancel_input(),
                        KeyCode::Char(c) => app.input_buffer.push(c),
                        KeyCode::Backspace => {
                            app.input_buffer.pop();
                        }
                        _ => {}
                    },
                }
            }
        }

        let now = Instant::now();
        app.tick(now - last_tick);
        last_tick = now;
    }
}

fn handle_normal_key<G: Gateway>(app: &mut App<G>, code: KeyCode) {
    if code == KeyCode::Tab {
        app.toggle_view();
        return;
    }
    match app.view_mode {
        ViewMode::Tasks => match code {
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::Char(' ') => app.set_selected_status(Status::Completed),
            KeyCode::Char('i') => app.set_selected_status(Status::InProgress),
            KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
            KeyCode::Char('a') => app.start_add(),
            KeyCode::Char('e') => app.start_edit(InputField::Title),
            KeyCode::Char('D') => app.start_edit(InputField::Description),
            KeyCode::Char('t') => app.start_edit(InputField::Due),
            KeyCode::Char('s') => app.start_edit(InputField::Subtask),
            KeyCode::Char('/') => app.start_edit(InputField::Search),
            KeyCode::Char('p') => app.cycle_priority(),
            KeyCode::Char('f') => app.cycle_status_filter(),
            KeyCode::Char('P') => app.cycle_priority_filter(),
            KeyCode::Char('J') => app.move_selected(true),
            KeyCode::Char('K') => app.move_selected(false),
            KeyCode::Char(c @ '1'..='9') => app.toggle_subtask(c as usize - '0' as usize),
            _ => {}
        },
        ViewMode::Projects => match code {
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::Char('a') => app.start_add(),
            KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
            _ => {}
        },
        ViewMode::Dashboard => {}
        ViewMode::Focus => match code {
            KeyCode::Char(' ') => app.timer.toggle(),
            KeyCode::Char('r') => app.timer.reset(),
            KeyCode::Char('1') => app.switch_timer(TimerKind::Pomodoro),
            KeyCode::Char('2') => app.switch_timer(TimerKind::ShortBreak),
            KeyCode::Char('3') => app.switch_timer(TimerKind::LongBreak),
            _ => {}
        },
    }
}
