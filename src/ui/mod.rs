//! Rendering of the users screen and its modals.

pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::AppState;
use crate::app::controller::Modal;

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    let hint = app
        .keymap
        .keys_for(crate::app::keymap::KeyAction::NewUser)
        .into_iter()
        .next()
        .unwrap_or_else(|| "n".to_string());
    let header = Paragraph::new(format!(
        "{}  users:{}  [{hint}] Add New User  [?] help",
        app.endpoint,
        app.controller.state().users.len()
    ))
    .block(
        Block::default()
            .title("User Management")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    )
    .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(header, root[0]);

    components::render_banner(f, root[1], app);
    users::render_users_table(f, root[2], app);
    components::render_status_bar(f, root[3], app);

    if let Some(modal) = app.controller.state().modal.clone() {
        let area = f.area();
        match &modal {
            Modal::Form(form) => users::render_form_modal(f, area, app, form),
            Modal::ConfirmDelete { user, confirm } => users::render_delete_modal(f, area, app, user, *confirm),
            Modal::Details { user } => users::render_details_modal(f, area, app, user),
            Modal::Help { scroll } => components::render_help_modal(f, area, app, *scroll),
        }
    }
}
