// Integration tests for userdesk: config files and rendering.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use userdesk::api::{Envelope, User, UserApi, UserId, UserInput};
use userdesk::app::config::AppConfig;
use userdesk::app::controller::{Completion, Controller, ControllerSettings, FormField};
use userdesk::app::keymap::Keymap;
use userdesk::app::{AppState, Theme};
use userdesk::error::{ApiError, ApiResult};
use userdesk::ui;

fn tmp_path(tag: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    let nonce = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    p.push(format!("userdesk_{tag}_{}_{}.conf", std::process::id(), nonce));
    p
}

// 1) Theme config roundtrip and init
#[test]
fn theme_roundtrip_and_init() {
    let path = tmp_path("theme");
    let path_str = path.to_string_lossy().to_string();

    let t = Theme::mocha();
    t.write_file(&path_str).expect("write theme");
    let t2 = Theme::from_file(&path_str).expect("read theme");
    assert_eq!(t, t2);

    let init = tmp_path("theme_init");
    let init_str = init.to_string_lossy().to_string();
    let _ = std::fs::remove_file(&init);
    let _created = Theme::load_or_init(&init_str);
    assert!(init.exists());

    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(&init);
}

// 2) Connection settings survive a write/read cycle
#[test]
fn app_config_roundtrip() {
    let path = tmp_path("settings");
    let path_str = path.to_string_lossy().to_string();

    let cfg = AppConfig {
        base_url: "http://api.internal:8080".into(),
        envelope: Envelope::Wrapped("data".into()),
        success_banner: Duration::from_millis(1200),
        log_file: PathBuf::from("/tmp/ud.log"),
        log_filter: "userdesk=debug".into(),
    };
    cfg.write_file(&path_str).expect("write settings");
    assert_eq!(AppConfig::from_file(&path_str), Some(cfg));

    let raw = AppConfig {
        envelope: Envelope::Raw,
        ..AppConfig::default()
    };
    raw.write_file(&path_str).expect("write settings");
    assert_eq!(AppConfig::from_file(&path_str).unwrap().envelope, Envelope::Raw);

    let _ = std::fs::remove_file(&path);
}

// 3) Keymap written to disk reads back to the same bindings
#[test]
fn keymap_file_roundtrip() {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use userdesk::app::keymap::KeyAction;

    let path = tmp_path("keys");
    let path_str = path.to_string_lossy().to_string();
    let km = Keymap::parse("Reload = F\n");
    km.write_file(&path_str).expect("write keymap");
    let back = Keymap::from_file(&path_str).expect("read keymap");
    let f = KeyEvent::new(KeyCode::Char('F'), KeyModifiers::NONE);
    assert_eq!(back.resolve(&f), Some(KeyAction::Reload));
    assert_eq!(back.keys_for(KeyAction::Quit), km.keys_for(KeyAction::Quit));
    let _ = std::fs::remove_file(&path);
}

struct Static(Vec<User>);

#[async_trait]
impl UserApi for Static {
    async fn list(&self) -> ApiResult<Vec<User>> {
        Ok(self.0.clone())
    }
    async fn create(&self, input: &UserInput) -> ApiResult<User> {
        Ok(User {
            id: UserId::new("new"),
            name: input.name.clone(),
            email: input.email.clone(),
        })
    }
    async fn read_one(&self, id: &UserId) -> ApiResult<User> {
        Ok(self.0.iter().find(|u| &u.id == id).cloned().unwrap_or_else(|| self.0[0].clone()))
    }
    async fn update(&self, id: &UserId, input: &UserInput) -> ApiResult<User> {
        Ok(User {
            id: id.clone(),
            name: input.name.clone(),
            email: input.email.clone(),
        })
    }
    async fn delete(&self, _: &UserId) -> ApiResult<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }
}

fn screen(terminal: &Terminal<TestBackend>) -> String {
    let buf = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buf.area.height {
        for x in 0..buf.area.width {
            out.push_str(buf[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

fn app_with(users: Vec<User>) -> AppState {
    let ctl = Controller::new(Arc::new(Static(users)), ControllerSettings::default());
    AppState::new(ctl, Theme::dark(), Keymap::default(), "http://localhost:5000")
}

// 4) Empty collection shows the hint, loaded users show up in the table
#[tokio::test]
async fn renders_table_and_empty_hint() {
    let mut terminal = Terminal::new(TestBackend::new(90, 24)).unwrap();

    let mut empty = app_with(Vec::new());
    terminal.draw(|f| ui::render(f, &mut empty)).unwrap();
    assert!(screen(&terminal).contains("No users found. Add your first user!"));

    let mut app = app_with(vec![
        User {
            id: UserId::new("1"),
            name: "Ann".into(),
            email: "a@x.com".into(),
        },
        User {
            id: UserId::new("2"),
            name: "Bo".into(),
            email: "b@x.com".into(),
        },
    ]);
    app.controller.load();
    assert!(app.controller.process_next().await);
    terminal.draw(|f| ui::render(f, &mut app)).unwrap();
    let text = screen(&terminal);
    assert!(text.contains("User Management"));
    assert!(text.contains("Ann"));
    assert!(text.contains("b@x.com"));
    assert!(text.contains("row:1/2"));
}

// 5) Form modal titles, validation error, and success banner
#[tokio::test]
async fn renders_form_modal_and_banners() {
    let mut terminal = Terminal::new(TestBackend::new(90, 24)).unwrap();
    let mut app = app_with(Vec::new());

    app.controller.open_create();
    assert!(matches!(app.controller.submit(), userdesk::app::controller::Dispatch::Rejected));
    terminal.draw(|f| ui::render(f, &mut app)).unwrap();
    let text = screen(&terminal);
    assert!(text.contains("Add New User"));
    assert!(text.contains("Name and Email are required"));
    assert!(text.contains("[Enter] Save"));

    app.controller.change_field(FormField::Name, "Ann");
    app.controller.change_field(FormField::Email, "a@x.com");
    app.controller.submit();
    terminal.draw(|f| ui::render(f, &mut app)).unwrap();
    assert!(screen(&terminal).contains("Saving..."));

    assert!(app.controller.process_next().await);
    terminal.draw(|f| ui::render(f, &mut app)).unwrap();
    let text = screen(&terminal);
    assert!(text.contains("User successfully added!"));
    assert!(!text.contains("Saving..."));

    let user = app.controller.state().users[0].clone();
    app.controller.open_edit(&user);
    terminal.draw(|f| ui::render(f, &mut app)).unwrap();
    let text = screen(&terminal);
    assert!(text.contains("Edit User"));
    assert!(text.contains("[Enter] Update"));

    // an expiry for an unknown token leaves the banner alone
    app.controller.apply(Completion::BannerExpired { token: 999 });
    assert_eq!(app.controller.state().success(), Some("User successfully added!"));
}

const LONG_REJECTION: &str = "That email address is already registered to another account in this directory";

/// Refuses every save with a long server message.
struct Rejecting;

#[async_trait]
impl UserApi for Rejecting {
    async fn list(&self) -> ApiResult<Vec<User>> {
        Ok(Vec::new())
    }
    async fn create(&self, _: &UserInput) -> ApiResult<User> {
        Err(ApiError::Status {
            url: "http://localhost:5000/users".into(),
            status: 409,
            message: Some(LONG_REJECTION.into()),
        })
    }
    async fn read_one(&self, id: &UserId) -> ApiResult<User> {
        Err(ApiError::Status {
            url: format!("http://localhost:5000/users/{id}"),
            status: 404,
            message: None,
        })
    }
    async fn update(&self, id: &UserId, input: &UserInput) -> ApiResult<User> {
        self.read_one(id).await.map(|_| User {
            id: id.clone(),
            name: input.name.clone(),
            email: input.email.clone(),
        })
    }
    async fn delete(&self, _: &UserId) -> ApiResult<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }
}

// 6) A wrapped server error pushes the fields down and the cursor follows
#[tokio::test]
async fn cursor_tracks_focused_field_below_wrapped_error() {
    let ctl = Controller::new(Arc::new(Rejecting), ControllerSettings::default());
    let mut app = AppState::new(ctl, Theme::dark(), Keymap::default(), "http://localhost:5000");
    app.controller.open_create();
    app.controller.change_field(FormField::Name, "Ann");
    app.controller.change_field(FormField::Email, "taken@x.com");
    app.controller.focus_field(FormField::Email);
    app.controller.submit();
    assert!(app.controller.process_next().await);
    assert_eq!(app.controller.state().error(), Some(LONG_REJECTION));

    let mut terminal = Terminal::new(TestBackend::new(90, 24)).unwrap();
    terminal.draw(|f| ui::render(f, &mut app)).unwrap();
    let text = screen(&terminal);
    assert!(text.contains("Email: taken@x.com"));
    assert!(text.contains("directory"));

    let buf = terminal.backend().buffer().clone();
    let (mx, my) = (0..buf.area.height)
        .flat_map(|y| (0..buf.area.width).map(move |x| (x, y)))
        .find(|&(x, y)| buf[(x, y)].symbol() == "▶")
        .expect("focus marker");
    let pos = terminal.get_cursor_position().unwrap();
    assert_eq!(pos.y, my);
    assert_eq!(pos.x, mx + 9 + "taken@x.com".len() as u16);
}
