use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::Backend;
use std::time::Duration;
use tracing::{debug, info};

use crate::app::AppState;
use crate::app::controller::{Dispatch, Modal};
use crate::app::keymap::KeyAction;
use crate::ui;

/// Draw, poll keys, apply finished requests; until the user quits.
pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut AppState) -> Result<()> {
    info!(endpoint = %app.endpoint, "starting");
    app.controller.load();

    while !app.should_quit {
        if app.controller.drain() > 0 {
            app.clamp_selection();
        }

        terminal.draw(|f| {
            ui::render(f, app);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key);
                }
            }
        }
    }

    info!("quit");
    Ok(())
}

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    if app.controller.state().modal.is_some() {
        handle_modal_key(app, key);
    } else if let Some(action) = app.keymap.resolve(&key) {
        handle_action(app, action);
    }
}

fn handle_action(app: &mut AppState, action: KeyAction) {
    let total = app.controller.state().users.len();
    match action {
        KeyAction::Quit => app.should_quit = true,
        KeyAction::NewUser => app.controller.open_create(),
        KeyAction::EditSelected => {
            if let Some(user) = app.selected_user().cloned() {
                app.controller.open_edit(&user);
            }
        }
        KeyAction::DeleteSelected => {
            if let Some(user) = app.selected_user().cloned() {
                app.controller.open_delete(&user);
            }
        }
        KeyAction::InspectSelected => {
            if let Some(user) = app.selected_user().cloned() {
                log_dispatch("inspect", app.controller.inspect(&user));
            }
        }
        KeyAction::Reload => log_dispatch("reload", app.controller.load()),
        KeyAction::OpenHelp => app.controller.open_help(),
        KeyAction::MoveUp => app.selected_index = app.selected_index.saturating_sub(1),
        KeyAction::MoveDown => {
            if app.selected_index + 1 < total {
                app.selected_index += 1;
            }
        }
        KeyAction::PageUp => {
            let rpp = app.rows_per_page.max(1);
            app.selected_index = app.selected_index.saturating_sub(rpp);
        }
        KeyAction::PageDown => {
            let rpp = app.rows_per_page.max(1);
            app.selected_index = app.selected_index.saturating_add(rpp).min(total.saturating_sub(1));
        }
        KeyAction::Ignore => {}
    }
}

fn handle_modal_key(app: &mut AppState, key: KeyEvent) {
    let loading = app.controller.state().is_loading();
    match app.controller.state().modal.clone() {
        Some(Modal::Form(form)) => match key.code {
            KeyCode::Esc => app.controller.close_modal(),
            KeyCode::Enter => log_dispatch("submit", app.controller.submit()),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                app.controller.focus_field(form.focus.next());
            }
            // Inputs are frozen while a save is in flight.
            _ if loading => {}
            KeyCode::Backspace => {
                let mut value = form.draft.get(form.focus).to_string();
                value.pop();
                app.controller.change_field(form.focus, value);
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let mut value = form.draft.get(form.focus).to_string();
                value.push(c);
                app.controller.change_field(form.focus, value);
            }
            _ => {}
        },
        Some(Modal::ConfirmDelete { confirm, .. }) => match key.code {
            KeyCode::Esc | KeyCode::Char('n') => app.controller.close_modal(),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                app.controller.toggle_confirm();
            }
            KeyCode::Char('y') => {
                if !confirm {
                    app.controller.toggle_confirm();
                }
                log_dispatch("delete", app.controller.submit());
            }
            KeyCode::Enter => log_dispatch("delete", app.controller.submit()),
            _ => {}
        },
        Some(Modal::Details { .. }) => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                app.controller.close_modal();
            }
        }
        Some(Modal::Help { .. }) => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?') | KeyCode::Char('q') => app.controller.close_modal(),
            KeyCode::Up | KeyCode::Char('k') => app.controller.scroll_help(-1),
            KeyCode::Down | KeyCode::Char('j') => app.controller.scroll_help(1),
            _ => {}
        },
        None => {}
    }
    // A modal may have been closed by the key; keep the table selection valid.
    app.clamp_selection();
}

fn log_dispatch(what: &str, outcome: Dispatch) {
    debug!(action = what, ?outcome, "dispatch");
}
