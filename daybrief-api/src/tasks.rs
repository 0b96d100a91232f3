//! Task-store adapter: the narrow capability set we consume upstream.

use daybrief_core::{Due, RetryPolicy, Task};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;

/// Optional filters for listing tasks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub label: Option<String>,
    pub project: Option<String>,
}

impl TaskFilter {
    pub fn by_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            project: None,
        }
    }
}

/// Partial update pushed back to the task-store. Absent fields are left
/// untouched upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<Due>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.priority.is_none() && self.due.is_none() && self.labels.is_none()
    }
}

/// Capability set consumed from the task-store collaborator.
pub trait TaskApi {
    fn list_tasks(&self, filter: Option<&TaskFilter>) -> Result<Vec<Task>, ApiError>;
    fn get_task(&self, task_id: &str) -> Result<Task, ApiError>;
    fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<Task, ApiError>;
    fn complete_task(&self, task_id: &str) -> Result<bool, ApiError>;
    /// Idempotent get-or-create; returns the label id.
    fn ensure_label(&self, name: &str) -> Result<String, ApiError>;
}

#[derive(Debug, Deserialize)]
struct LabelDto {
    id: String,
    name: String,
}

/// REST client for the task-store, with retry-with-backoff on retryable
/// failures. Idempotent calls get the full attempt budget; creates are
/// capped at 2 attempts.
pub struct RestTaskClient {
    base_url: String,
    token: String,
    client: Client,
    policy: RetryPolicy,
}

impl RestTaskClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: Client::new(),
            policy,
        }
    }

    fn with_retry<T>(
        &self,
        op_name: &str,
        policy: RetryPolicy,
        op: impl Fn() -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut attempt = 0;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(err) if err.is_retryable() => match policy.delay_after(attempt) {
                    Some(delay) => {
                        warn!(op = op_name, attempt = attempt + 1, %err, "retrying upstream call");
                        std::thread::sleep(delay);
                        attempt += 1;
                    }
                    None => return Err(err),
                },
                Err(err) => return Err(err),
            }
        }
    }

    fn check(&self, response: Response, resource: &str) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::AuthInvalid {
                service: "taskstore".to_string(),
            },
            StatusCode::NOT_FOUND => ApiError::NotFound {
                resource: resource.to_string(),
            },
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                ApiError::RateLimited { retry_after_secs }
            }
            s if s.is_server_error() => ApiError::Transient(format!("upstream returned {s}")),
            s => ApiError::Unknown(format!("upstream returned {s}")),
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        resource: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .query(query)
            .send()?;
        let response = self.check(response, resource)?;
        response
            .json()
            .map_err(|e| ApiError::Unknown(format!("bad response body: {e}")))
    }

    fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        resource: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(body)
            .send()?;
        let response = self.check(response, resource)?;
        response
            .json()
            .map_err(|e| ApiError::Unknown(format!("bad response body: {e}")))
    }
}

impl TaskApi for RestTaskClient {
    fn list_tasks(&self, filter: Option<&TaskFilter>) -> Result<Vec<Task>, ApiError> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(f) = filter {
            if let Some(label) = &f.label {
                query.push(("label", label));
            }
            if let Some(project) = &f.project {
                query.push(("project", project));
            }
        }

        self.with_retry("list_tasks", self.policy, || {
            self.get_json("/tasks", &query, "tasks")
        })
    }

    fn get_task(&self, task_id: &str) -> Result<Task, ApiError> {
        self.with_retry("get_task", self.policy, || {
            self.get_json(&format!("/tasks/{task_id}"), &[], &format!("task {task_id}"))
        })
    }

    fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<Task, ApiError> {
        // Update-by-id is idempotent; full retry budget.
        let task = self.with_retry("update_task", self.policy, || {
            self.post_json(
                &format!("/tasks/{task_id}"),
                update,
                &format!("task {task_id}"),
            )
        })?;
        info!(task_id, "task updated upstream");
        Ok(task)
    }

    fn complete_task(&self, task_id: &str) -> Result<bool, ApiError> {
        self.with_retry("complete_task", self.policy, || {
            let response = self
                .client
                .post(format!("{}/tasks/{task_id}/close", self.base_url))
                .bearer_auth(&self.token)
                .send()?;
            self.check(response, &format!("task {task_id}"))?;
            Ok(true)
        })
    }

    fn ensure_label(&self, name: &str) -> Result<String, ApiError> {
        let labels: Vec<LabelDto> = self.with_retry("list_labels", self.policy, || {
            self.get_json("/labels", &[], "labels")
        })?;

        if let Some(existing) = labels.iter().find(|l| l.name == name) {
            return Ok(existing.id.clone());
        }

        // Creation is not idempotent upstream; cap the attempts.
        let create_policy = self.policy.with_max_attempts(self.policy.max_attempts.min(2));
        let created: LabelDto = self.with_retry("create_label", create_policy, || {
            self.post_json("/labels", &serde_json::json!({ "name": name }), "labels")
        })?;
        info!(label = name, id = %created.id, "label created upstream");
        Ok(created.id)
    }
}
