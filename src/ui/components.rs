//! Shared UI components (banner line, status bar, help modal, layout helpers).

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::AppState;
use crate::app::controller::{Activity, Operation};
use crate::app::keymap::KeyAction;

/// One line under the header: success banner, else the current error.
pub fn render_banner(f: &mut Frame, area: Rect, app: &AppState) {
    let state = app.controller.state();
    let line = if let Some(ok) = state.success() {
        Line::from(Span::styled(ok.to_string(), Style::default().fg(app.theme.success).add_modifier(Modifier::BOLD)))
    } else if let Some(err) = state.error() {
        Line::from(Span::styled(err.to_string(), Style::default().fg(app.theme.error)))
    } else {
        Line::raw("")
    };
    f.render_widget(Paragraph::new(line), area);
}

/// Bottom status bar: activity and counts.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let state = app.controller.state();
    let activity = match &state.activity {
        Activity::Idle => "idle",
        Activity::Failed { .. } => "error",
        Activity::Loading { op } => match op {
            Operation::List => "loading users...",
            Operation::Create => "saving...",
            Operation::Update => "updating...",
            Operation::Fetch => "fetching user...",
            Operation::Delete => "deleting...",
        },
    };
    let position = if state.users.is_empty() {
        "0/0".to_string()
    } else {
        format!("{}/{}", app.selected_index + 1, state.users.len())
    };
    let msg = format!("{activity}  row:{position}  rows/page:{}", app.rows_per_page);
    let p = Paragraph::new(msg).style(Style::default().fg(app.theme.status_fg).bg(app.theme.status_bg));
    f.render_widget(p, area);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Help modal built from the live keymap.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) {
    let width = 64u16.min(area.width.saturating_sub(4)).max(40);
    let height = 20u16.min(area.height.saturating_sub(4)).max(10);
    let rect = centered_rect(width, height, area);

    let table_keys: [(&str, KeyAction); 10] = [
        ("Add new user", KeyAction::NewUser),
        ("Edit selected", KeyAction::EditSelected),
        ("Delete selected", KeyAction::DeleteSelected),
        ("Show selected (re-fetch)", KeyAction::InspectSelected),
        ("Reload list", KeyAction::Reload),
        ("Move up", KeyAction::MoveUp),
        ("Move down", KeyAction::MoveDown),
        ("Page up", KeyAction::PageUp),
        ("Page down", KeyAction::PageDown),
        ("Quit", KeyAction::Quit),
    ];
    let label_w = table_keys.iter().map(|(l, _)| l.len()).max().unwrap_or(0);

    let mut lines: Vec<Line> = vec![Line::from(Span::styled("Users table", Style::default().add_modifier(Modifier::BOLD)))];
    for (label, action) in table_keys {
        let keys = app.keymap.keys_for(action).join(", ");
        lines.push(Line::from(vec![
            Span::raw(format!("  {:>label_w$} │ ", label)),
            Span::styled(keys, Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled("Form", Style::default().add_modifier(Modifier::BOLD))));
    for (label, keys) in [
        ("Switch field", "Tab, Up, Down"),
        ("Save / Update", "Enter"),
        ("Cancel", "Esc"),
    ] {
        lines.push(Line::from(vec![
            Span::raw(format!("  {:>label_w$} │ ", label)),
            Span::styled(keys, Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::raw("Close help: "),
        Span::styled("Esc / Enter", Style::default().add_modifier(Modifier::ITALIC)),
    ]));

    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((scroll, 0)).block(
        Block::default()
            .title("Help")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect(40, 40, area), Rect::new(0, 0, 20, 10));
    }
}
