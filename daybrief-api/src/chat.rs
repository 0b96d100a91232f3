//! Chat-gateway collaborator: outbound messages and profile lookups.
//!
//! The transport itself is thin plumbing; jobs only depend on this trait.

use chrono_tz::Tz;
use daybrief_core::RetryPolicy;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;

/// Reference to a delivered message (transport timestamp/id).
pub type MessageRef = String;

pub trait ChatGateway {
    fn send_message(&self, user_id: &str, text: &str) -> Result<MessageRef, ApiError>;
    fn send_ephemeral(&self, user_id: &str, channel: &str, text: &str) -> Result<(), ApiError>;
    /// May fail; callers fall back to the configured default timezone.
    fn user_timezone(&self, user_id: &str) -> Result<Tz, ApiError>;
}

#[derive(Debug, Deserialize)]
struct PostMessageDto {
    ts: String,
}

#[derive(Debug, Deserialize)]
struct UserProfileDto {
    #[serde(default)]
    tz: Option<String>,
}

/// HTTP chat gateway client.
pub struct HttpChatClient {
    base_url: String,
    token: String,
    client: Client,
    policy: RetryPolicy,
}

impl HttpChatClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: Client::new(),
            policy,
        }
    }

    fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ApiError> {
        let mut attempt = 0;
        loop {
            let result = self.post_once(path, &body);
            match result {
                Ok(v) => return Ok(v),
                Err(err) if err.is_retryable() => match self.policy.delay_after(attempt) {
                    Some(delay) => {
                        std::thread::sleep(delay);
                        attempt += 1;
                    }
                    None => return Err(err),
                },
                Err(err) => return Err(err),
            }
        }
    }

    fn post_once<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => ApiError::AuthInvalid {
                    service: "chat".to_string(),
                },
                404 => ApiError::NotFound {
                    resource: path.to_string(),
                },
                429 => ApiError::RateLimited {
                    retry_after_secs: None,
                },
                s if (500..600).contains(&s) => {
                    ApiError::Transient(format!("chat gateway returned {s}"))
                }
                s => ApiError::Unknown(format!("chat gateway returned {s}")),
            });
        }

        response
            .json()
            .map_err(|e| ApiError::Unknown(format!("bad chat response: {e}")))
    }
}

impl ChatGateway for HttpChatClient {
    fn send_message(&self, user_id: &str, text: &str) -> Result<MessageRef, ApiError> {
        let dto: PostMessageDto = self.post(
            "/messages",
            serde_json::json!({ "channel": user_id, "text": text }),
        )?;
        info!(user_id, ts = %dto.ts, "message delivered");
        Ok(dto.ts)
    }

    fn send_ephemeral(&self, user_id: &str, channel: &str, text: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self.post(
            "/ephemeral",
            serde_json::json!({ "user": user_id, "channel": channel, "text": text }),
        )?;
        Ok(())
    }

    fn user_timezone(&self, user_id: &str) -> Result<Tz, ApiError> {
        let profile: UserProfileDto =
            self.post("/users/info", serde_json::json!({ "user": user_id }))?;
        let name = profile
            .tz
            .ok_or_else(|| ApiError::Unknown(format!("no timezone on profile for {user_id}")))?;
        name.parse()
            .map_err(|_| ApiError::Unknown(format!("unparseable timezone '{name}'")))
    }
}
