//! Resource client for the `/users` collection.
//!
//! [`UserApi`] is the seam the view controller talks to; [`HttpUserApi`]
//! is the real implementation over HTTP. Tests drive the controller with
//! in-memory fakes implementing the same trait.

pub mod http;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

pub use http::HttpUserApi;

/// Server-assigned user identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user record as returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Request body for create and update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub email: String,
}

/// Shape of a single-user response body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Envelope {
    /// The user object is nested under the given key, e.g. `{ "user": {...} }`.
    Wrapped(String),
    /// The body is the user object itself.
    Raw,
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope::Wrapped("user".to_string())
    }
}

impl Envelope {
    /// Build an envelope from its config spelling (`wrapped` / `raw`) and wrapper key.
    pub fn from_parts(kind: &str, key: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "raw" => Some(Envelope::Raw),
            "wrapped" => {
                let key = key.trim();
                let key = if key.is_empty() { "user" } else { key };
                Some(Envelope::Wrapped(key.to_string()))
            }
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Wrapped(_) => "wrapped",
            Envelope::Raw => "raw",
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Envelope::Wrapped(k) => k,
            Envelope::Raw => "",
        }
    }

    /// Extract the user payload from a decoded body.
    pub fn unwrap_user(&self, body: serde_json::Value) -> Result<User, String> {
        let inner = match self {
            Envelope::Raw => body,
            Envelope::Wrapped(key) => match body {
                serde_json::Value::Object(mut map) => map
                    .remove(key.as_str())
                    .ok_or_else(|| format!("missing '{key}' field in response"))?,
                other => return Err(format!("expected an object with '{key}', got {}", kind_of(&other))),
            },
        };
        serde_json::from_value(inner).map_err(|e| e.to_string())
    }
}

impl FromStr for Envelope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Envelope::from_parts(s, "user").ok_or_else(|| format!("unknown envelope '{s}' (expected wrapped|raw)"))
    }
}

fn kind_of(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// The five remote operations on the users collection.
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn list(&self) -> ApiResult<Vec<User>>;
    async fn create(&self, input: &UserInput) -> ApiResult<User>;
    async fn read_one(&self, id: &UserId) -> ApiResult<User>;
    async fn update(&self, id: &UserId, input: &UserInput) -> ApiResult<User>;
    /// Returns the server's acknowledgment body untouched.
    async fn delete(&self, id: &UserId) -> ApiResult<serde_json::Value>;
}
