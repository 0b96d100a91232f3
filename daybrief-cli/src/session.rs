//! In-process conversation state for the chat flows.
//!
//! A session remembers which task a user was last prompted to score so a
//! bare `4/3/am` reply can be attributed. Sessions expire after a TTL and
//! are never persisted; a restart simply re-prompts.

use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
struct Session {
    pending_score_task: Option<String>,
    last_seen: Instant,
}

#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: HashMap::new(),
        }
    }

    /// Remember that `user_id` was just asked to score `task_id`.
    pub fn set_pending_score(&mut self, user_id: &str, task_id: &str) {
        self.sessions.insert(
            user_id.to_string(),
            Session {
                pending_score_task: Some(task_id.to_string()),
                last_seen: Instant::now(),
            },
        );
    }

    /// Take the pending task for `user_id`, consuming it. Expired sessions
    /// count as absent.
    pub fn take_pending_score(&mut self, user_id: &str) -> Option<String> {
        let session = self.sessions.get_mut(user_id)?;
        if session.last_seen.elapsed() > self.ttl {
            self.sessions.remove(user_id);
            return None;
        }
        session.last_seen = Instant::now();
        session.pending_score_task.take()
    }

    pub fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.sessions.retain(|_, s| s.last_seen.elapsed() <= ttl);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}
