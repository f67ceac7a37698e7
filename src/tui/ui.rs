use chrono::{Local, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use super::app::{App, InputField, InputMode, ViewMode};
use crate::analytics::{active_projects, compute_metrics, due_on, weekly_activity};
use crate::commands::short_id;
use crate::focus::format_clock;
use crate::models::{Priority, Status, Task};
use crate::storage::Gateway;

pub fn ui<G: Gateway>(f: &mut Frame, app: &mut App<G>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // View
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    match app.view_mode {
        ViewMode::Tasks => render_tasks(f, app, chunks[0]),
        ViewMode::Projects => render_projects(f, app, chunks[0]),
        ViewMode::Dashboard => render_dashboard(f, app, chunks[0]),
        ViewMode::Focus => render_focus(f, app, chunks[0]),
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Tasks => concat!(
                "q: Quit | Tab: View | a: Add | Space: Done | i: Start | d: Del | e: Title | ",
                "D: Desc | t: Due | p: Prio | s: Subtask | 1-9: Toggle | J/K: Move | ",
                "/: Search | f/P: Filter",
            ),
            ViewMode::Projects => "q: Quit | Tab: View | a: Add | d: Del",
            ViewMode::Dashboard => "q: Quit | Tab: View",
            ViewMode::Focus => concat!(
                "q: Quit | Tab: View | Space: Start/Pause | r: Reset | ",
                "1: Pomodoro | 2: Short | 3: Long",
            ),
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };

    let help = match &app.message {
        Some(msg) => Paragraph::new(msg.as_str()).style(Style::default().fg(Color::Red)),
        None => Paragraph::new(help_text).style(Style::default().fg(Color::Gray)),
    }
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[1]);

    // Render Input Box if needed
    if app.input_mode != InputMode::Normal {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);

        let title = match app.input_mode {
            InputMode::Adding if app.view_mode == ViewMode::Projects => "Add Project: Enter Name",
            InputMode::Adding => match app.add_state.step {
                0 => "Add Task: Enter Title",
                1 => "Add Task: Enter Description (Optional)",
                2 => "Add Task: Enter Due Date (YYYY-MM-DD [HH:MM], Optional)",
                _ => "Add Task: Enter Priority (low/medium/high)",
            },
            _ => match app.input_field {
                InputField::Title => "Edit Title",
                InputField::Description => "Edit Description",
                InputField::Due => "Edit Due Date (YYYY-MM-DD [HH:MM], empty clears)",
                InputField::Search => "Search",
                InputField::Subtask => "Add Subtask",
                InputField::None => "Edit",
            },
        };

        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));

        f.render_widget(input, area);
    }
}

fn priority_style(p: Priority) -> Style {
    match p {
        Priority::High => Style::default().fg(Color::Red),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::Green),
    }
}

fn render_tasks<G: Gateway>(f: &mut Frame, app: &mut App<G>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let now = Utc::now();
    let rows: Vec<Row> = app
        .visible_tasks()
        .into_iter()
        .map(|t| {
            let due = match t.due_date {
                Some(d) if d < now && !t.is_completed() => format!("{} !", local_date(&d)),
                Some(d) => local_date(&d),
                None => String::new(),
            };
            let style = match t.status {
                Status::Completed | Status::Canceled => Style::default().fg(Color::DarkGray),
                _ => priority_style(t.priority),
            };
            let checklist = if t.subtasks.is_empty() {
                String::new()
            } else {
                format!("{}/{}", t.completed_subtasks(), t.subtasks.len())
            };
            Row::new(vec![
                Cell::from(short_id(&t.id).to_string()),
                Cell::from(t.title.clone()),
                Cell::from(t.status.as_str()),
                Cell::from(t.priority.label()),
                Cell::from(due),
                Cell::from(checklist),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Min(20),
        Constraint::Length(11),
        Constraint::Length(6),
        Constraint::Length(12),
        Constraint::Length(5),
    ];

    let mut title = String::from("Planer - Tasks");
    if let Some(s) = app.filter.status {
        title.push_str(&format!(" [status: {}]", s));
    }
    if let Some(p) = app.filter.priority {
        title.push_str(&format!(" [priority: {}]", p.label()));
    }
    if !app.filter.search.is_empty() {
        title.push_str(&format!(" [search: {}]", app.filter.search));
    }

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["ID", "Title", "Status", "Prio", "Due", "Subs"])
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, chunks[0], &mut app.state);

    let detail = match app.selected_task() {
        Some(t) => task_detail(app, t),
        None => vec![Line::from("No task selected")],
    };
    let detail = Paragraph::new(detail)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Details"));
    f.render_widget(detail, chunks[1]);
}

fn task_detail<'a, G: Gateway>(app: &'a App<G>, t: &'a Task) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(Span::styled(t.title.as_str(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
    ];
    if let Some(d) = &t.description {
        lines.push(Line::from(d.as_str()));
        lines.push(Line::from(""));
    }
    if let Some(c) = &t.category {
        lines.push(Line::from(format!("Category: {}", c)));
    }
    if let Some(p) = &t.project {
        let name = app.store.project(p).map_or("(missing)", |p| p.name.as_str());
        lines.push(Line::from(format!("Project:  {}", name)));
    }
    if let Some(d) = t.due_date {
        lines.push(Line::from(format!(
            "Due:      {}",
            d.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        )));
    }
    if t.time_spent.is_some() || t.time_estimate.is_some() {
        lines.push(Line::from(format!(
            "Time:     {} / {} min",
            t.time_spent.map_or("-".to_string(), |m| format!("{:.0}", m)),
            t.time_estimate.map_or("-".to_string(), |m| format!("{:.0}", m)),
        )));
    }
    if !t.subtasks.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(format!("Subtasks ({}%)", t.subtask_progress())));
        for (i, s) in t.subtasks.iter().enumerate() {
            let mark = if s.completed { "x" } else { " " };
            let style = if s.completed {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            let text = format!("{} [{}] {}", i + 1, mark, s.title);
            lines.push(Line::from(Span::styled(text, style)));
        }
    }
    lines
}

fn render_projects<G: Gateway>(f: &mut Frame, app: &mut App<G>, area: Rect) {
    let rows: Vec<Row> = app
        .store
        .projects()
        .iter()
        .map(|p| {
            let tasks = app.store.project_tasks(&p.id);
            let done = tasks.iter().filter(|t| t.is_completed()).count();
            Row::new(vec![
                Cell::from(short_id(&p.id).to_string()),
                Cell::from(p.name.clone()),
                Cell::from(p.status.as_str()),
                Cell::from(format!("{}/{}", done, tasks.len())),
                Cell::from(p.description.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Min(20),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["ID", "Name", "Status", "Tasks", "Description"])
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title("Planer - Projects"))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.project_state);
}

fn render_dashboard<G: Gateway>(f: &mut Frame, app: &App<G>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(40), Constraint::Min(0)])
        .split(area);

    let tasks = app.store.tasks();
    let stats = app.store.stats();
    let metrics = compute_metrics(tasks, Utc::now());
    let today = Local::now().date_naive();

    let lines = vec![
        Line::from(format!("Total tasks:        {}", stats.total)),
        Line::from(format!("Completed:          {}", stats.completed)),
        Line::from(format!("Pending:            {}", stats.pending)),
        Line::from(format!("Completion rate:    {}%", stats.completion_rate)),
        Line::from(""),
        Line::from(Span::styled(
            format!("High priority:      {}", stats.high_priority),
            priority_style(Priority::High),
        )),
        Line::from(Span::styled(
            format!("Medium priority:    {}", stats.medium_priority),
            priority_style(Priority::Medium),
        )),
        Line::from(Span::styled(
            format!("Low priority:       {}", stats.low_priority),
            priority_style(Priority::Low),
        )),
        Line::from(""),
        Line::from(format!("Due today:          {}", due_on(tasks, today).len())),
        Line::from(format!("Active projects:    {}", active_projects(app.store.projects()))),
        Line::from(format!("Created this week:  {}", metrics.tasks_this_week)),
        Line::from(format!("Avg time per task:  {} min", metrics.avg_completion_time)),
        Line::from(format!("Pending high prio:  {}", metrics.pending_high_priority)),
    ];
    let summary =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Statistics"));
    f.render_widget(summary, chunks[0]);

    let week = weekly_activity(tasks, today);
    let peak = week.iter().map(|d| d.all).max().unwrap_or(0).max(1);
    let rows: Vec<Row> = week
        .iter()
        .map(|d| {
            let style = if d.day == today {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(d.day.format("%a %d").to_string()),
                Cell::from(d.all.to_string()),
                Cell::from(d.completed.to_string()),
                Cell::from("#".repeat(d.all * 20 / peak)),
            ])
            .style(style)
        })
        .collect();
    let widths = [
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Day", "Created", "Completed", ""])
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title("This week"));
    f.render_widget(table, chunks[1]);
}

fn render_focus<G: Gateway>(f: &mut Frame, app: &App<G>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let timer = &app.timer;
    let state = if timer.is_running() { "running" } else { "paused" };
    let clock = Paragraph::new(vec![
        Line::from(Span::styled(
            timer.display(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("{} ({})", timer.active(), state)),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Planer - Focus"));
    f.render_widget(clock, chunks[0]);

    let filled = (timer.progress() * 40.0).round() as usize;
    let bar = Paragraph::new(format!(
        "[{}{}] {:.0}%",
        "#".repeat(filled),
        "-".repeat(40 - filled),
        timer.progress() * 100.0
    ))
    .style(Style::default().fg(Color::Cyan))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(bar, chunks[1]);

    let summary = Paragraph::new(vec![
        Line::from(format!("Sessions completed: {}", timer.sessions())),
        Line::from(format!("Focus time:         {}", format_clock(timer.total_focus()))),
    ])
    .block(Block::default().borders(Borders::ALL).title("Today"));
    f.render_widget(summary, chunks[2]);
}

fn local_date(d: &chrono::DateTime<Utc>) -> String {
    d.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Length(r.height.saturating_sub(height) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
