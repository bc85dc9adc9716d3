pub mod app;
pub mod ui;

use std::{error::Error, io};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use app::{App, InputField, InputMode};
use ui::ui;

use crate::commands::Context;
use crate::models::EntryStatus;

/// Runs the interactive dashboard for the signed-in user.
pub fn run_tui(ctx: Context) -> Result<(), Box<dyn Error>> {
    // Resolve the user before touching the terminal so a login error prints normally.
    let mut app = App::new(ctx)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match app.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Char(' ') | KeyCode::Char('d') => app.complete_selected(),
                KeyCode::Char('p') => app.set_selected_status(EntryStatus::Partial),
                KeyCode::Char('s') => app.set_selected_status(EntryStatus::Skipped),
                KeyCode::Char('u') => app.set_selected_status(EntryStatus::Planned),
                KeyCode::Char('l') => app.start_edit(InputField::LogMinutes),
                KeyCode::Char('a') => app.start_edit(InputField::AddTask),
                KeyCode::Char('g') => app.generate_plan(),
                KeyCode::Char('r') => app.reload(),
                KeyCode::Char('v') | KeyCode::Tab => app.toggle_view(),
                KeyCode::Char('[') | KeyCode::Left => app.shift_day(-1),
                KeyCode::Char(']') | KeyCode::Right => app.shift_day(1),
                _ => {}
            },
            InputMode::Editing => match key.code {
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
