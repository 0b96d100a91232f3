//! Shared test doubles for the job and handler tests.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use daybrief_api::{ApiError, ChatGateway, MessageRef, TaskApi, TaskFilter, TaskUpdate};
use daybrief_core::Task;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// In-memory task-store. `fail_list` makes listing fail (total outage);
/// `failing` ids fail on update/complete.
pub struct MockTasks {
    tasks: RefCell<HashMap<String, Task>>,
    pub failing: RefCell<Vec<String>>,
    pub fail_list: Cell<bool>,
    pub ensured_labels: RefCell<Vec<String>>,
}

impl MockTasks {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: RefCell::new(tasks.into_iter().map(|t| (t.id.clone(), t)).collect()),
            failing: RefCell::new(Vec::new()),
            fail_list: Cell::new(false),
            ensured_labels: RefCell::new(Vec::new()),
        }
    }

    pub fn task(&self, id: &str) -> Task {
        self.tasks.borrow()[id].clone()
    }

    fn check_failing(&self, id: &str) -> Result<(), ApiError> {
        if self.failing.borrow().iter().any(|f| f == id) {
            return Err(ApiError::Transient("injected failure".into()));
        }
        Ok(())
    }
}

impl TaskApi for MockTasks {
    fn list_tasks(&self, filter: Option<&TaskFilter>) -> Result<Vec<Task>, ApiError> {
        if self.fail_list.get() {
            return Err(ApiError::Transient("task-store unreachable".into()));
        }
        let mut out: Vec<Task> = self.tasks.borrow().values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(f) = filter {
            if let Some(label) = &f.label {
                out.retain(|t| t.has_label(label));
            }
        }
        Ok(out)
    }

    fn get_task(&self, task_id: &str) -> Result<Task, ApiError> {
        self.tasks
            .borrow()
            .get(task_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("task {task_id}"),
            })
    }

    fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<Task, ApiError> {
        self.check_failing(task_id)?;
        let mut tasks = self.tasks.borrow_mut();
        let task = tasks.get_mut(task_id).ok_or_else(|| ApiError::NotFound {
            resource: format!("task {task_id}"),
        })?;
        if let Some(p) = update.priority {
            task.priority = p;
        }
        if let Some(due) = update.due {
            task.due = Some(due);
        }
        if let Some(labels) = &update.labels {
            task.labels = labels.clone();
        }
        Ok(task.clone())
    }

    fn complete_task(&self, task_id: &str) -> Result<bool, ApiError> {
        self.check_failing(task_id)?;
        self.tasks
            .borrow_mut()
            .get_mut(task_id)
            .map(|t| {
                t.completed = true;
                true
            })
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("task {task_id}"),
            })
    }

    fn ensure_label(&self, name: &str) -> Result<String, ApiError> {
        self.ensured_labels.borrow_mut().push(name.to_string());
        Ok(format!("label-{name}"))
    }
}

/// Chat gateway double recording everything sent.
pub struct MockChat {
    pub sent: RefCell<Vec<(String, String)>>,
    pub tz: Option<Tz>,
    pub fail_send: Cell<bool>,
}

impl MockChat {
    pub fn new() -> Self {
        Self {
            sent: RefCell::new(Vec::new()),
            tz: Some("America/Chicago".parse().unwrap()),
            fail_send: Cell::new(false),
        }
    }

    pub fn without_timezone() -> Self {
        Self {
            tz: None,
            ..Self::new()
        }
    }

    pub fn sent_to(&self, user_id: &str) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter(|(u, _)| u == user_id)
            .map(|(_, t)| t.clone())
            .collect()
    }
}

impl ChatGateway for MockChat {
    fn send_message(&self, user_id: &str, text: &str) -> Result<MessageRef, ApiError> {
        if self.fail_send.get() {
            return Err(ApiError::Transient("gateway down".into()));
        }
        self.sent
            .borrow_mut()
            .push((user_id.to_string(), text.to_string()));
        Ok(format!("ts-{}", self.sent.borrow().len()))
    }

    fn send_ephemeral(&self, user_id: &str, _channel: &str, text: &str) -> Result<(), ApiError> {
        self.send_message(user_id, text).map(|_| ())
    }

    fn user_timezone(&self, user_id: &str) -> Result<Tz, ApiError> {
        self.tz.ok_or_else(|| ApiError::Unknown(format!("no timezone for {user_id}")))
    }
}
