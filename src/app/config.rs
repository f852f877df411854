//! Connection settings: parse/write `userdesk.conf`.
//!
//! Plain `key = value` lines. Unknown keys are skipped, malformed values keep
//! the default. Command line flags are layered on top with
//! [`AppConfig::apply_overrides`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::Envelope;
use crate::api::http::DEFAULT_BASE_URL;
use crate::app::controller::DEFAULT_BANNER_TTL;

pub const CONFIG_FILE: &str = "userdesk.conf";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub base_url: String,
    /// Shape of single-user responses (create, read-one, update).
    pub envelope: Envelope,
    /// How long the success banner stays up.
    pub success_banner: Duration,
    pub log_file: PathBuf,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            envelope: Envelope::default(),
            success_banner: DEFAULT_BANNER_TTL,
            log_file: PathBuf::from("userdesk.log"),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load `path` if it exists, else the file from the config dir, else write defaults to `path`.
    pub fn load_or_init(path: &str) -> Self {
        if Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        if let Some(existing) = config_file_read_path(CONFIG_FILE) {
            return Self::from_file(&existing.to_string_lossy()).unwrap_or_default();
        }
        let cfg = Self::default();
        let _ = cfg.write_file(path);
        cfg
    }

    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut cfg = Self::default();
        let mut envelope_kind = cfg.envelope.kind().to_string();
        let mut envelope_key = cfg.envelope.key().to_string();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((lhs, rhs)) = line.split_once('=') else {
                continue;
            };
            let (key, val) = (lhs.trim(), rhs.trim());
            if val.is_empty() {
                continue;
            }
            match key {
                "base_url" => cfg.base_url = val.to_string(),
                "envelope" => envelope_kind = val.to_string(),
                "envelope_key" => envelope_key = val.to_string(),
                "success_banner_ms" => {
                    if let Ok(ms) = val.parse::<u64>() {
                        cfg.success_banner = Duration::from_millis(ms);
                    }
                }
                "log_file" => cfg.log_file = PathBuf::from(val),
                "log_filter" => cfg.log_filter = val.to_string(),
                _ => {}
            }
        }
        if let Some(env) = Envelope::from_parts(&envelope_kind, &envelope_key) {
            cfg.envelope = env;
        }
        cfg
    }

    /// Layer flag values over the loaded settings. An envelope kind or key
    /// given alone keeps the other half from the file.
    pub fn apply_overrides(
        &mut self,
        base_url: Option<&str>,
        envelope: Option<&str>,
        envelope_key: Option<&str>,
        log_file: Option<&Path>,
    ) {
        if let Some(url) = base_url {
            self.base_url = url.to_string();
        }
        if envelope.is_some() || envelope_key.is_some() {
            let kind = envelope.unwrap_or(self.envelope.kind());
            let key = envelope_key.unwrap_or(self.envelope.key());
            if let Some(env) = Envelope::from_parts(kind, key) {
                self.envelope = env;
            }
        }
        if let Some(path) = log_file {
            self.log_file = path.to_path_buf();
        }
    }

    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# userdesk connection settings\n");
        buf.push_str("# envelope: wrapped (body is { <envelope_key>: user }) | raw (body is the user)\n\n");
        let _ = writeln!(&mut buf, "base_url = {}", self.base_url);
        let _ = writeln!(&mut buf, "envelope = {}", self.envelope.kind());
        let key = match &self.envelope {
            Envelope::Wrapped(k) => k.as_str(),
            Envelope::Raw => "user",
        };
        let _ = writeln!(&mut buf, "envelope_key = {}", key);
        let _ = writeln!(&mut buf, "success_banner_ms = {}", self.success_banner.as_millis());
        let _ = writeln!(&mut buf, "log_file = {}", self.log_file.display());
        let _ = writeln!(&mut buf, "log_filter = {}", self.log_filter);
        std::fs::write(path, buf)
    }
}

/// Per-user config directory: `$XDG_CONFIG_HOME/userdesk` or `~/.config/userdesk`.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join("userdesk"));
    }
    std::env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".config").join("userdesk"))
}

/// Existing copy of `name` in the config directory, if any.
pub fn config_file_read_path(name: &str) -> Option<PathBuf> {
    let candidate = config_dir()?.join(name);
    candidate.is_file().then_some(candidate)
}
