use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::Serialize;
use tracing::{debug, error};
use url::Url;

use super::{Envelope, User, UserApi, UserId, UserInput};
use crate::error::{ApiError, ApiResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// `UserApi` over JSON/HTTP: `/users` and `/users/{id}` below a base URL.
#[derive(Clone, Debug)]
pub struct HttpUserApi {
    http: Client,
    base: Url,
    envelope: Envelope,
}

impl HttpUserApi {
    pub fn new(base_url: &str, envelope: Envelope) -> ApiResult<Self> {
        Self::with_client(Client::new(), base_url, envelope)
    }

    pub fn with_client(http: Client, base_url: &str, envelope: Envelope) -> ApiResult<Self> {
        let base = Url::parse(base_url.trim()).map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { http, base, envelope })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// `<base>/users` or `<base>/users/<id>`, with the id escaped as one segment.
    fn endpoint(&self, id: Option<&UserId>) -> ApiResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidBaseUrl(self.base.to_string()))?;
            segments.pop_if_empty().push("users");
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        Ok(url)
    }

    async fn send<B: Serialize + ?Sized>(&self, method: Method, url: &Url, body: Option<&B>) -> ApiResult<Response> {
        let mut req = self.http.request(method, url.clone());
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        // Error bodies are best-effort: `{"message": "..."}` when present.
        let message = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned));
        Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn body(url: &Url, resp: Response) -> ApiResult<serde_json::Value> {
        let bytes = resp.bytes().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        if bytes.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn single(&self, method: Method, id: Option<&UserId>, input: Option<&UserInput>) -> ApiResult<User> {
        let url = self.endpoint(id)?;
        let resp = self.send(method, &url, input).await?;
        let body = Self::body(&url, resp).await?;
        self.envelope.unwrap_user(body).map_err(|reason| ApiError::Decode {
            url: url.to_string(),
            reason,
        })
    }
}

#[async_trait]
impl UserApi for HttpUserApi {
    async fn list(&self) -> ApiResult<Vec<User>> {
        let res = async {
            let url = self.endpoint(None)?;
            let resp = self.send::<()>(Method::GET, &url, None).await?;
            let body = Self::body(&url, resp).await?;
            serde_json::from_value::<Vec<User>>(body).map_err(|e| ApiError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })
        }
        .await;
        match &res {
            Ok(users) => debug!(count = users.len(), "fetched users"),
            Err(e) => error!(op = "list", error = %e, "Error fetching users"),
        }
        res
    }

    async fn create(&self, input: &UserInput) -> ApiResult<User> {
        let res = self.single(Method::POST, None, Some(input)).await;
        match &res {
            Ok(user) => debug!(id = %user.id, "created user"),
            Err(e) => error!(op = "create", error = %e, "Error adding user"),
        }
        res
    }

    async fn read_one(&self, id: &UserId) -> ApiResult<User> {
        let res = self.single(Method::GET, Some(id), None).await;
        match &res {
            Ok(user) => debug!(id = %user.id, "fetched user"),
            Err(e) => error!(op = "read_one", %id, error = %e, "Error fetching user"),
        }
        res
    }

    async fn update(&self, id: &UserId, input: &UserInput) -> ApiResult<User> {
        let res = self.single(Method::PUT, Some(id), Some(input)).await;
        match &res {
            Ok(user) => debug!(id = %user.id, "updated user"),
            Err(e) => error!(op = "update", %id, error = %e, "Error updating user"),
        }
        res
    }

    async fn delete(&self, id: &UserId) -> ApiResult<serde_json::Value> {
        let res = async {
            let url = self.endpoint(Some(id))?;
            let resp = self.send::<()>(Method::DELETE, &url, None).await?;
            Self::body(&url, resp).await
        }
        .await;
        match &res {
            Ok(_) => debug!(%id, "deleted user"),
            Err(e) => error!(op = "delete", %id, error = %e, "Error deleting user"),
        }
        res
    }
}
