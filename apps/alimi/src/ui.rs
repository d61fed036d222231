//! UI rendering for alimi.

use crate::app::{App, ConfirmDialog, MessageType, SettingsRow, View};
use crate::form::{FormField, TaskForm};
use chrono::NaiveDate;
use reminder_core::dates::{format_date_key, format_display_date, weekday_index, weekday_label};
use reminder_core::recurrence::{describe_schedule, is_active_for_date};
use reminder_core::{Recurrence, RefreshOutcome, Slot, Task};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

/// Draw the application.
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer/status
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_footer(f, app, chunks[2]);

    // Draw popups
    if app.show_help {
        draw_help_popup(f);
    }

    if let Some(dialog) = &app.confirm_dialog {
        draw_confirm_dialog(f, dialog);
    }

    if let Some(form) = &app.form {
        draw_form(f, form);
    }

    if let Some((slot, input)) = &app.time_input {
        draw_time_input(f, *slot, input);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let title = format!(" {} - {} ", app.view_title(), date_title(app.selected_date));

    let tabs: Vec<Span> = vec![
        styled_tab("1:오늘", app.view == View::Today),
        Span::raw(" "),
        styled_tab("2:할 일", app.view == View::Tasks),
        Span::raw(" "),
        styled_tab("3:설정", app.view == View::Settings),
    ];

    let header = Paragraph::new(Line::from(tabs))
        .block(Block::default().borders(Borders::ALL).title(title))
        .alignment(Alignment::Center);

    f.render_widget(header, area);
}

/// Korean date with its weekday, e.g. `2024년 1월 10일 (수)`.
pub fn date_title(date: NaiveDate) -> String {
    let weekday = weekday_label(weekday_index(date)).unwrap_or_default();
    format!("{} ({})", format_display_date(&format_date_key(date)), weekday)
}

fn styled_tab(label: &str, active: bool) -> Span<'static> {
    if active {
        Span::styled(
            format!("[{}]", label),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(format!(" {} ", label), Style::default().fg(Color::Gray))
    }
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Today => draw_today_view(f, app, area),
        View::Tasks => draw_tasks_view(f, app, area),
        View::Settings => draw_settings_view(f, app, area),
    }
}

fn selected_style(selected: bool) -> Style {
    if selected {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    }
}

fn slot_span(app: &App, task: &Task, slot: Slot, focused: bool) -> Span<'static> {
    let label = slot.label();
    let (text, color) = if !task.times.get(slot) {
        (format!(" {} - ", label), Color::DarkGray)
    } else if app.is_taken(task, slot) {
        (format!(" {} [x]", label), Color::Green)
    } else {
        (format!(" {} [ ]", label), Color::Gray)
    };
    let mut style = Style::default().fg(color);
    if focused {
        style = style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
    }
    Span::styled(text, style)
}

fn draw_today_view(f: &mut Frame, app: &App, area: Rect) {
    let tasks = app.visible_tasks();
    if tasks.is_empty() {
        let msg = Paragraph::new("이 날짜에 예정된 할 일이 없어요. '2'에서 'a'로 추가하세요.")
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(msg, area);
        return;
    }

    let items: Vec<ListItem> = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let active = is_active_for_date(task, app.selected_date);
            let name_style = if !active {
                Style::default().fg(Color::DarkGray)
            } else if i == app.selected_index {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let mut spans = vec![Span::styled(format!("{:<20}", task.name), name_style)];
            for slot in Slot::ALL {
                let focused = i == app.selected_index && slot == app.selected_slot;
                spans.push(slot_span(app, task, slot, focused));
            }

            ListItem::new(Line::from(spans)).style(selected_style(i == app.selected_index))
        })
        .collect();

    let summary = app.day_summary();
    let title = format!(
        " 완료 {}/{} ({:.0}%) ",
        summary.taken,
        summary.scheduled,
        summary.ratio() * 100.0
    );

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

fn draw_tasks_view(f: &mut Frame, app: &App, area: Rect) {
    let tasks = app.visible_tasks();
    if tasks.is_empty() {
        let msg = Paragraph::new("할 일이 없어요. 'a'를 눌러 추가하세요.")
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(msg, area);
        return;
    }

    let items: Vec<ListItem> = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let slots: Vec<&str> = task.times.enabled().map(|s| s.label()).collect();
            let name_style = if i == app.selected_index {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let spans = vec![
                Span::styled(task.name.clone(), name_style),
                Span::raw("  "),
                Span::styled(slots.join(", "), Style::default().fg(Color::Cyan)),
                Span::raw("  "),
                Span::styled(describe_schedule(task), Style::default().fg(Color::Gray)),
            ];
            ListItem::new(Line::from(spans)).style(selected_style(i == app.selected_index))
        })
        .collect();

    let title = format!(" 할 일 {}개 ", tasks.len());
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

fn settings_row_text(app: &App, row: SettingsRow) -> String {
    match row {
        SettingsRow::SlotTime(slot) => {
            format!("{} 알림 시간   {}", slot.label(), app.settings.slot_times.get(slot))
        }
        SettingsRow::Notifications => {
            let state = if app.settings.notifications_enabled { "켜짐" } else { "꺼짐" };
            format!("알림          {}", state)
        }
        SettingsRow::Export => {
            let month = app.export_month.as_deref().unwrap_or("기록 없음");
            format!("기록 내보내기 < {} >", month)
        }
    }
}

fn draw_settings_view(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(6)])
        .split(area);

    let items: Vec<ListItem> = SettingsRow::ALL
        .iter()
        .enumerate()
        .map(|(i, row)| {
            ListItem::new(settings_row_text(app, *row)).style(selected_style(i == app.settings_index))
        })
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" 설정 "));
    f.render_widget(list, chunks[0]);

    let status = match app.last_outcome {
        Some(RefreshOutcome::Scheduled { count }) => format!("예약된 알림 {}개", count),
        Some(RefreshOutcome::Disabled) => "알림이 꺼져 있습니다".to_string(),
        Some(RefreshOutcome::PermissionDenied) => "알림 권한이 없습니다".to_string(),
        Some(RefreshOutcome::AlreadyRunning) | None => "알림 갱신 중".to_string(),
    };
    let next = app
        .scheduler
        .next_trigger()
        .map(|t| format!("다음 알림: {}", t.format("%Y-%m-%d %H:%M")))
        .unwrap_or_else(|| "다음 알림 없음".to_string());

    let queued = format!("대기 중인 알림 {}개", app.scheduler.pending_count());

    let overview = Paragraph::new(format!("{}\n{}\n{}", status, queued, next))
        .block(Block::default().borders(Borders::ALL).title(" 알림 상태 "))
        .wrap(Wrap { trim: true });
    f.render_widget(overview, chunks[1]);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let (msg, style) = if let Some((ref message, msg_type)) = app.message {
        let color = match msg_type {
            MessageType::Info => Color::Blue,
            MessageType::Success => Color::Green,
            MessageType::Warning => Color::Yellow,
            MessageType::Error => Color::Red,
        };
        (message.clone(), Style::default().fg(color))
    } else {
        let help = match app.view {
            View::Today => "j/k:Navigate  Tab:Slot  Space:Toggle  h/l:Date  t:Today  ?:Help  q:Quit",
            View::Tasks => "j/k:Navigate  a:Add  e:Edit  d:Delete  ?:Help  q:Quit",
            View::Settings => "j/k:Navigate  Enter:Change  h/l:Month  ?:Help  q:Quit",
        };
        (help.to_string(), Style::default().fg(Color::DarkGray))
    };

    let footer = Paragraph::new(msg)
        .style(style)
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = centered_rect(60, 80, f.area());
    f.render_widget(Clear, area);

    let help_text = r#"
Alimi Keybindings

Views:
  1               Today
  2               Tasks
  3               Settings

Today:
  j/k, Up/Down    Move selection
  h/l, Left/Right Change date
  t               Jump to today
  Tab/Shift-Tab   Choose slot
  Space, Enter    Toggle completion

Tasks:
  a               Add task
  e, Enter        Edit task
  d               Delete task

Task form:
  Tab/Shift-Tab   Next/previous field
  1/2/3           Toggle morning/noon/evening
  d / w           Daily / weekly
  0-6             Toggle weekday (0 = Sunday)
  Enter           Save
  Esc             Cancel

General:
  ?               Show this help
  q               Quit

Press any key to close
"#;

    let popup = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title(" Help "))
        .wrap(Wrap { trim: false });

    f.render_widget(popup, area);
}

fn draw_confirm_dialog(f: &mut Frame, dialog: &ConfirmDialog) {
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);

    let text = Paragraph::new(dialog.message.clone())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", dialog.title)),
        )
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    f.render_widget(text, area);
}

fn repeat_text(recurrence: &Recurrence) -> String {
    match recurrence {
        Recurrence::Daily => "매일".to_string(),
        Recurrence::Weekly { days } => {
            let labels: Vec<&str> = days.iter().filter_map(|d| weekday_label(*d)).collect();
            if labels.is_empty() {
                "매주 (요일 선택)".to_string()
            } else {
                format!("매주 {}", labels.join(", "))
            }
        }
    }
}

/// Form lines, one per field plus the error line.
pub fn form_lines(form: &TaskForm) -> Vec<Line<'static>> {
    let slots: Vec<String> = Slot::ALL
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let mark = if form.times.get(*slot) { "x" } else { " " };
            format!("{}:{} [{}]", i + 1, slot.label(), mark)
        })
        .collect();

    let fields = [
        (FormField::Name, form.name.clone()),
        (FormField::Slots, slots.join("  ")),
        (FormField::Repeat, repeat_text(&form.recurrence)),
        (FormField::StartDate, form.start_input.clone()),
        (FormField::EndDate, form.end_input.clone()),
    ];

    let mut lines: Vec<Line> = fields
        .into_iter()
        .map(|(field, value)| {
            let style = if field == form.focus {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{:<6}", field.label()), style),
                Span::raw(" "),
                Span::styled(value, style),
            ])
        })
        .collect();

    if let Some(error) = &form.error {
        lines.push(Line::raw(""));
        lines.push(Line::styled(error.clone(), Style::default().fg(Color::Red)));
    }
    lines
}

fn draw_form(f: &mut Frame, form: &TaskForm) {
    let area = centered_rect(60, 40, f.area());
    f.render_widget(Clear, area);

    let popup = Paragraph::new(form_lines(form))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", form.title())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(popup, area);
}

fn draw_time_input(f: &mut Frame, slot: Slot, input: &str) {
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);

    let title = format!(" {} 알림 시간 (HH:MM) ", slot.label());
    let widget = Paragraph::new(input)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::Yellow));

    f.render_widget(widget, area);

    // Show cursor
    f.set_cursor_position((area.x + 1 + input.len() as u16, area.y + 1));
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
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
