use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use crate::commands::format_minutes;
use crate::models::{EntryStatus, Priority};
use crate::urgency::compute_urgency;
use super::app::{App, InputField, InputMode, ViewMode};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Table
            Constraint::Length(1), // Status
            Constraint::Length(3), // Help
        ].as_ref())
        .split(f.area());

    let header_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let highlight_style = Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray);

    match app.view_mode {
        ViewMode::Timeline => {
            let rows: Vec<Row> = app
                .entries
                .iter()
                .map(|e| {
                    let style = match e.status {
                        EntryStatus::Done => Style::default().fg(Color::Green),
                        EntryStatus::Partial => Style::default().fg(Color::Yellow),
                        EntryStatus::Skipped => Style::default().fg(Color::DarkGray),
                        EntryStatus::Planned if e.is_break => Style::default().fg(Color::Gray),
                        EntryStatus::Planned => Style::default(),
                    };
                    let title = if e.is_meeting { format!("[meeting] {}", e.title) } else { e.title.clone() };
                    Row::new(vec![
                        Cell::from(e.id.to_string()),
                        Cell::from(format!("{}-{}", e.start.format("%H:%M"), e.end.format("%H:%M"))),
                        Cell::from(title),
                        Cell::from(e.category_label().to_string()),
                        Cell::from(format_minutes(e.planned_minutes())),
                        Cell::from(e.actual_minutes.map(format_minutes).unwrap_or_default()),
                        Cell::from(e.status.to_string()),
                    ]).style(style)
                })
                .collect();

            let widths = [
                Constraint::Length(5),
                Constraint::Length(12),
                Constraint::Min(20),
                Constraint::Length(12),
                Constraint::Length(8),
                Constraint::Length(8),
                Constraint::Length(8),
            ];

            let title = format!("Planwise - {} ({})", app.date, app.date.format("%A"));
            let table = Table::new(rows, widths)
                .header(Row::new(vec!["ID", "Time", "Title", "Category", "Length", "Logged", "Status"])
                    .style(header_style)
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title(title))
                .row_highlight_style(highlight_style)
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.timeline_state);
        }
        ViewMode::Tasks => {
            let today = app.ctx.today();
            let rows: Vec<Row> = app
                .tasks
                .iter()
                .map(|t| {
                    let urgency = compute_urgency(t, today);
                    let time_left = match t.deadline {
                        Some(d) => match (d.date() - today).num_days() {
                            n if n < 0 => format!("{}d overdue", n.abs()),
                            0 => "Today".to_string(),
                            n => format!("{n}d"),
                        },
                        None => "-".to_string(),
                    };
                    let style = if urgency > 50.0 {
                        Style::default().fg(Color::Red)
                    } else if urgency > 20.0 {
                        Style::default().fg(Color::Yellow)
                    } else {
                        Style::default().fg(Color::Green)
                    };
                    let priority = match t.priority {
                        Priority::High => "!!",
                        Priority::Medium => "!",
                        Priority::Low => "",
                    };

                    Row::new(vec![
                        Cell::from(t.id.to_string()),
                        Cell::from(t.title.clone()),
                        Cell::from(t.category.clone()),
                        Cell::from(priority),
                        Cell::from(time_left),
                        Cell::from(format_minutes(t.estimated_minutes)),
                        Cell::from(format!("{urgency:.1}")),
                    ]).style(style)
                })
                .collect();

            let widths = [
                Constraint::Length(5),
                Constraint::Min(20),
                Constraint::Length(12),
                Constraint::Length(4),
                Constraint::Length(12),
                Constraint::Length(8),
                Constraint::Length(6),
            ];

            let table = Table::new(rows, widths)
                .header(Row::new(vec!["ID", "Title", "Category", "Pri", "Time Left", "Est", "Urg"])
                    .style(header_style)
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title("Planwise - Pending Tasks"))
                .row_highlight_style(highlight_style)
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.task_state);
        }
    }

    let status = Paragraph::new(app.status.as_deref().unwrap_or(""))
        .style(Style::default().fg(Color::Yellow));
    f.render_widget(status, chunks[1]);

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Timeline => "q: Quit | Space: Done | p: Partial | s: Skip | u: Undo | l: Log | g: Plan Day | [ ]: Day | a: Add Task | r: Reload | v: Tasks",
            ViewMode::Tasks => "q: Quit | Space: Complete | a: Add Task | r: Reload | v: Timeline",
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[2]);

    if app.input_mode == InputMode::Editing {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);

        let title = match app.input_field {
            InputField::LogMinutes => "Log Minutes Worked (marks done)",
            InputField::AddTask => "Add Task: Enter Title",
            InputField::None => "",
        };

        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));

        f.render_widget(input, area);
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
