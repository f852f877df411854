//! View controller: owns the user collection and the modal/form state and
//! turns user actions into calls against a [`UserApi`].
//!
//! Network calls run as tokio tasks. Each task reports a [`Completion`] on
//! the controller's channel; the UI loop drains it with [`Controller::drain`]
//! (tests await [`Controller::process_next`]) and every state change happens
//! inside [`Controller::apply`].
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{User, UserApi, UserId, UserInput};
use crate::error::{ApiError, ApiResult};

pub const MSG_REQUIRED: &str = "Name and Email are required";
pub const MSG_ADDED: &str = "User successfully added!";
pub const MSG_UPDATED: &str = "User successfully updated!";
pub const MSG_DELETED: &str = "User successfully deleted!";
pub const MSG_SAVE_FAILED: &str = "Error saving user. Please try again.";
pub const MSG_LIST_FAILED: &str = "Failed to fetch users. Please try again later.";
pub const MSG_FETCH_FAILED: &str = "Failed to fetch user. Please try again later.";
pub const MSG_DELETE_FAILED: &str = "Error deleting user. Please try again.";

pub const DEFAULT_BANNER_TTL: Duration = Duration::from_millis(3000);

/// Remote operation currently in flight.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Update,
    Fetch,
    Delete,
}

/// Request lifecycle: at most one operation is loading at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Loading { op: Operation },
    Failed { message: String },
}

/// What `submit` does with the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: UserId },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Email,
            FormField::Email => FormField::Name,
        }
    }
}

/// In-progress form input, independent of any stored user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub email: String,
}

impl Draft {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Email => &self.email,
        }
    }

    fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.email.trim().is_empty()
    }

    fn to_input(&self) -> UserInput {
        UserInput {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Form {
    pub mode: FormMode,
    pub draft: Draft,
    pub focus: FormField,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Modal {
    Form(Form),
    ConfirmDelete { user: User, confirm: bool },
    Details { user: User },
    Help { scroll: u16 },
}

/// Auto-clearing success message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Banner {
    pub text: String,
    token: u64,
}

#[derive(Clone, Debug)]
pub struct ViewState {
    pub users: Vec<User>,
    pub activity: Activity,
    pub banner: Option<Banner>,
    pub modal: Option<Modal>,
    /// Bumped whenever a modal opens or closes.
    pub modal_session: u64,
}

impl ViewState {
    fn new() -> Self {
        Self {
            users: Vec::new(),
            activity: Activity::Idle,
            banner: None,
            modal: None,
            modal_session: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.activity, Activity::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.activity {
            Activity::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn success(&self) -> Option<&str> {
        self.banner.as_ref().map(|b| b.text.as_str())
    }

    pub fn form(&self) -> Option<&Form> {
        match &self.modal {
            Some(Modal::Form(form)) => Some(form),
            _ => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.edit_target().is_some()
    }

    pub fn edit_target(&self) -> Option<&UserId> {
        match self.form() {
            Some(Form {
                mode: FormMode::Edit { id },
                ..
            }) => Some(id),
            _ => None,
        }
    }
}

/// Result of a background call, delivered back to the controller.
#[derive(Debug)]
pub enum Completion {
    Loaded(ApiResult<Vec<User>>),
    Saved {
        mode: FormMode,
        session: u64,
        result: ApiResult<User>,
    },
    Fetched {
        id: UserId,
        result: ApiResult<User>,
    },
    Deleted {
        id: UserId,
        session: u64,
        result: ApiResult<serde_json::Value>,
    },
    BannerExpired {
        token: u64,
    },
}

/// Immediate answer to an action that may start a request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Started,
    /// Another operation is still loading; nothing was sent.
    Busy,
    /// Rejected locally (validation); nothing was sent.
    Rejected,
    /// Nothing to act on, e.g. submit without an open modal.
    Ignored,
}

#[derive(Clone, Debug)]
pub struct ControllerSettings {
    pub banner_ttl: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            banner_ttl: DEFAULT_BANNER_TTL,
        }
    }
}

pub struct Controller {
    api: Arc<dyn UserApi>,
    settings: ControllerSettings,
    state: ViewState,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    banner_timer: Option<JoinHandle<()>>,
    banner_seq: u64,
}

impl Controller {
    pub fn new(api: Arc<dyn UserApi>, settings: ControllerSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            settings,
            state: ViewState::new(),
            tx,
            rx,
            banner_timer: None,
            banner_seq: 0,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Fetch the whole collection. Must be called inside a tokio runtime.
    pub fn load(&mut self) -> Dispatch {
        if self.state.is_loading() {
            return Dispatch::Busy;
        }
        self.begin(Operation::List);
        let api = Arc::clone(&self.api);
        self.spawn(async move { Completion::Loaded(api.list().await) });
        Dispatch::Started
    }

    pub fn change_field(&mut self, field: FormField, value: impl Into<String>) {
        if let Some(Modal::Form(form)) = &mut self.state.modal {
            let value = value.into();
            match field {
                FormField::Name => form.draft.name = value,
                FormField::Email => form.draft.email = value,
            }
        }
    }

    pub fn focus_field(&mut self, field: FormField) {
        if let Some(Modal::Form(form)) = &mut self.state.modal {
            form.focus = field;
        }
    }

    pub fn open_create(&mut self) {
        self.open(Modal::Form(Form {
            mode: FormMode::Create,
            draft: Draft::default(),
            focus: FormField::Name,
        }));
    }

    pub fn open_edit(&mut self, user: &User) {
        self.open(Modal::Form(Form {
            mode: FormMode::Edit { id: user.id.clone() },
            draft: Draft {
                name: user.name.clone(),
                email: user.email.clone(),
            },
            focus: FormField::Name,
        }));
    }

    pub fn open_delete(&mut self, user: &User) {
        self.open(Modal::ConfirmDelete {
            user: user.clone(),
            confirm: false,
        });
    }

    pub fn open_help(&mut self) {
        self.open(Modal::Help { scroll: 0 });
    }

    /// Flip the yes/no choice of an open delete confirmation.
    pub fn toggle_confirm(&mut self) {
        if let Some(Modal::ConfirmDelete { confirm, .. }) = &mut self.state.modal {
            *confirm = !*confirm;
        }
    }

    pub fn scroll_help(&mut self, delta: i32) {
        if let Some(Modal::Help { scroll }) = &mut self.state.modal {
            *scroll = (i32::from(*scroll) + delta).clamp(0, i32::from(u16::MAX)) as u16;
        }
    }

    /// Hide any modal, discard the draft and edit target, clear the error.
    /// An in-flight request is not cancelled.
    pub fn close_modal(&mut self) {
        self.state.modal = None;
        self.state.modal_session += 1;
        if let Activity::Failed { .. } = self.state.activity {
            self.state.activity = Activity::Idle;
        }
    }

    /// Submit the open modal: save the form, or run a confirmed delete.
    pub fn submit(&mut self) -> Dispatch {
        match self.state.modal.clone() {
            Some(Modal::Form(form)) => self.submit_form(form),
            Some(Modal::ConfirmDelete { user, confirm }) => {
                if confirm {
                    self.delete(user.id)
                } else {
                    self.close_modal();
                    Dispatch::Ignored
                }
            }
            Some(Modal::Details { .. }) | Some(Modal::Help { .. }) => {
                self.close_modal();
                Dispatch::Ignored
            }
            None => Dispatch::Ignored,
        }
    }

    fn submit_form(&mut self, form: Form) -> Dispatch {
        if self.state.is_loading() {
            return Dispatch::Busy;
        }
        if !form.draft.is_complete() {
            self.state.activity = Activity::Failed {
                message: MSG_REQUIRED.to_string(),
            };
            return Dispatch::Rejected;
        }
        let input = form.draft.to_input();
        let session = self.state.modal_session;
        let api = Arc::clone(&self.api);
        match form.mode {
            FormMode::Edit { id } => {
                self.begin(Operation::Update);
                self.spawn(async move {
                    let result = api.update(&id, &input).await;
                    Completion::Saved {
                        mode: FormMode::Edit { id },
                        session,
                        result,
                    }
                });
            }
            FormMode::Create => {
                self.begin(Operation::Create);
                self.spawn(async move {
                    let result = api.create(&input).await;
                    Completion::Saved {
                        mode: FormMode::Create,
                        session,
                        result,
                    }
                });
            }
        }
        Dispatch::Started
    }

    fn delete(&mut self, id: UserId) -> Dispatch {
        if self.state.is_loading() {
            return Dispatch::Busy;
        }
        self.begin(Operation::Delete);
        let session = self.state.modal_session;
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.delete(&id).await;
            Completion::Deleted { id, session, result }
        });
        Dispatch::Started
    }

    /// Re-read one user from the server and show it.
    pub fn inspect(&mut self, user: &User) -> Dispatch {
        if self.state.is_loading() {
            return Dispatch::Busy;
        }
        self.begin(Operation::Fetch);
        let id = user.id.clone();
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.read_one(&id).await;
            Completion::Fetched { id, result }
        });
        Dispatch::Started
    }

    /// Apply every completion already waiting on the channel. Returns how many were applied.
    pub fn drain(&mut self) -> usize {
        let mut n = 0;
        while let Ok(done) = self.rx.try_recv() {
            self.apply(done);
            n += 1;
        }
        n
    }

    /// Wait for the next completion and apply it.
    pub async fn process_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(done) => {
                self.apply(done);
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, done: Completion) {
        match done {
            Completion::Loaded(Ok(users)) => {
                debug!(count = users.len(), "collection replaced");
                self.state.users = users;
                self.state.activity = Activity::Idle;
            }
            Completion::Loaded(Err(e)) => self.fail(&e, MSG_LIST_FAILED),
            Completion::Saved { mode, session, result } => match result {
                Ok(user) => {
                    let text = match mode {
                        FormMode::Create => {
                            self.state.users.push(user);
                            MSG_ADDED
                        }
                        FormMode::Edit { id } => {
                            match self.state.users.iter_mut().find(|u| u.id == id) {
                                Some(slot) => *slot = user,
                                None => warn!(%id, "updated user is no longer in the collection"),
                            }
                            MSG_UPDATED
                        }
                    };
                    self.finish_success(session, text);
                }
                Err(e) => self.fail(&e, MSG_SAVE_FAILED),
            },
            Completion::Deleted { id, session, result } => match result {
                Ok(_) => {
                    self.state.users.retain(|u| u.id != id);
                    self.finish_success(session, MSG_DELETED);
                }
                Err(e) => self.fail(&e, MSG_DELETE_FAILED),
            },
            Completion::Fetched { id, result } => match result {
                Ok(user) => {
                    if let Some(slot) = self.state.users.iter_mut().find(|u| u.id == id) {
                        *slot = user.clone();
                    }
                    self.state.activity = Activity::Idle;
                    if self.state.modal.is_none() {
                        self.open(Modal::Details { user });
                    }
                }
                Err(e) => self.fail(&e, MSG_FETCH_FAILED),
            },
            Completion::BannerExpired { token } => {
                if self.state.banner.as_ref().is_some_and(|b| b.token == token) {
                    self.state.banner = None;
                    self.banner_timer = None;
                }
            }
        }
    }

    fn open(&mut self, modal: Modal) {
        self.state.modal = Some(modal);
        self.state.modal_session += 1;
    }

    fn begin(&mut self, op: Operation) {
        debug!(?op, "request started");
        self.state.activity = Activity::Loading { op };
    }

    fn fail(&mut self, err: &ApiError, fallback: &str) {
        let message = err.server_message().unwrap_or(fallback).to_string();
        warn!(error = %err, %message, "request failed");
        self.state.activity = Activity::Failed { message };
    }

    fn finish_success(&mut self, session: u64, text: &str) {
        self.state.activity = Activity::Idle;
        if self.state.modal_session == session {
            self.close_modal();
        }
        self.show_banner(text);
    }

    fn show_banner(&mut self, text: &str) {
        if let Some(timer) = self.banner_timer.take() {
            timer.abort();
        }
        self.banner_seq += 1;
        let token = self.banner_seq;
        self.state.banner = Some(Banner {
            text: text.to_string(),
            token,
        });
        let tx = self.tx.clone();
        let ttl = self.settings.banner_ttl;
        self.banner_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let _ = tx.send(Completion::BannerExpired { token });
        }));
    }

    fn spawn<F>(&self, fut: F)
    where
        F: std::future::Future<Output = Completion> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let done = fut.await;
            let _ = tx.send(done);
        });
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Some(timer) = self.banner_timer.take() {
            timer.abort();
        }
    }
}
