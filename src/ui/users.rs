//! Users table and the user-related modals (form, delete confirmation, details).

use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::api::User;
use crate::app::AppState;
use crate::app::controller::{Form, FormField, FormMode, Operation};
use crate::ui::components::centered_rect;

/// Render the users table, one page around the selection.
pub fn render_users_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }

    let state = app.controller.state();
    let block = Block::default()
        .title("Users")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));

    if state.users.is_empty() {
        let msg = if state.is_loading() {
            "Loading..."
        } else {
            "No users found. Add your first user!"
        };
        let p = Paragraph::new(msg).style(Style::default().fg(app.theme.muted)).block(block);
        f.render_widget(p, area);
        return;
    }

    let start = (app.selected_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(state.users.len());
    let rows = state.users[start..end].iter().enumerate().map(|(i, u)| {
        let absolute_index = start + i;
        let style = if absolute_index == app.selected_index {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        Row::new(vec![
            Cell::from((absolute_index + 1).to_string()),
            Cell::from(u.name.clone()),
            Cell::from(u.email.clone()),
        ])
        .style(style)
    });

    let widths = [Constraint::Length(6), Constraint::Percentage(40), Constraint::Percentage(60)];
    let header = Row::new(vec!["#", "Name", "Email"]).style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD));

    let table = Table::new(rows, widths).header(header).block(block).column_spacing(1);
    f.render_widget(table, area);
}

/// Render the add/edit form.
pub fn render_form_modal(f: &mut Frame, area: Rect, app: &AppState, form: &Form) {
    let state = app.controller.state();
    let editing = matches!(form.mode, FormMode::Edit { .. });
    let saving = matches!(
        state.activity,
        crate::app::controller::Activity::Loading {
            op: Operation::Create | Operation::Update
        }
    );
    let title = if editing { "Edit User" } else { "Add New User" };
    let width = 60u16.min(area.width.saturating_sub(4)).max(30);
    // wrapped error text plus a spacer row
    let error_rows = state
        .error()
        .map_or(0, |err| wrapped_rows(err, width.saturating_sub(2)).saturating_add(1));
    let rect = centered_rect(width, 8u16.saturating_add(error_rows), area);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(rect);
    f.render_widget(Clear, rect);
    f.render_widget(block, rect);

    if let Some(err) = state.error() {
        let err_area = Rect {
            height: error_rows.saturating_sub(1).min(inner.height),
            ..inner
        };
        let p = Paragraph::new(err.to_string())
            .style(Style::default().fg(app.theme.error))
            .wrap(Wrap { trim: true });
        f.render_widget(p, err_area);
    }

    let mut lines: Vec<Line> = Vec::new();
    for field in [FormField::Name, FormField::Email] {
        let label = match field {
            FormField::Name => "Name: ",
            FormField::Email => "Email:",
        };
        let marker = if form.focus == field { "▶" } else { " " };
        lines.push(Line::from(vec![
            Span::raw(format!("{marker} {label} ")),
            Span::styled(form.draft.get(field).to_string(), Style::default().fg(app.theme.text)),
        ]));
    }
    lines.push(Line::raw(""));
    let action = match (saving, editing) {
        (true, true) => "Updating...",
        (true, false) => "Saving...",
        (false, true) => "[Enter] Update",
        (false, false) => "[Enter] Save",
    };
    lines.push(Line::from(vec![
        Span::styled("[Esc] Cancel", Style::default().fg(app.theme.muted)),
        Span::raw("   "),
        Span::styled(action, Style::default().add_modifier(Modifier::BOLD)),
    ]));
    let body = Rect {
        y: inner.y.saturating_add(error_rows),
        height: inner.height.saturating_sub(error_rows),
        ..inner
    };
    f.render_widget(Paragraph::new(lines), body);

    // Cursor after the focused value: marker + label.
    let field_row: u16 = if form.focus == FormField::Email { 1 } else { 0 };
    let row = body.y.saturating_add(field_row);
    let typed = u16::try_from(form.draft.get(form.focus).chars().count()).unwrap_or(u16::MAX);
    let col = body.x.saturating_add(9).saturating_add(typed);
    if !saving && row < body.bottom() && col < inner.right() {
        f.set_cursor_position((col, row));
    }
}

/// Rows `text` takes when word-wrapped to `width` columns.
fn wrapped_rows(text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let mut rows = 0usize;
    for line in text.lines() {
        rows += 1;
        let mut used = 0usize;
        for word in line.split_whitespace() {
            let len = word.chars().count();
            if used > 0 && used + 1 + len <= width {
                used += 1 + len;
                continue;
            }
            if used > 0 {
                rows += 1;
            }
            // words longer than a row break across rows
            rows += len.saturating_sub(1) / width;
            used = match len % width {
                0 => width,
                rest => rest,
            };
        }
    }
    u16::try_from(rows.max(1)).unwrap_or(u16::MAX)
}

pub fn render_delete_modal(f: &mut Frame, area: Rect, app: &AppState, user: &User, confirm: bool) {
    let rect = centered_rect(50u16.min(area.width), 7, area);
    let yes = if confirm { "[Yes]" } else { " Yes " };
    let no = if confirm { " No " } else { "[No]" };
    let mut body = format!("Delete user '{}' <{}>?\n\n  {}    {}", user.name, user.email, yes, no);
    if let Some(err) = app.controller.state().error() {
        body.push_str(&format!("\n{err}"));
    }
    let p = Paragraph::new(body).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("Confirm delete")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

pub fn render_details_modal(f: &mut Frame, area: Rect, app: &AppState, user: &User) {
    let rect = centered_rect(60u16.min(area.width), 7, area);
    let body = format!("Id:    {}\nName:  {}\nEmail: {}", user.id, user.name, user.email);
    let p = Paragraph::new(body).style(Style::default().fg(app.theme.text)).block(
        Block::default()
            .title("User")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
