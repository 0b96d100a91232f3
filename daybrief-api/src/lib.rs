//! daybrief-api: external collaborators behind narrow interfaces.
//!
//! The task-store and chat gateway are consumed through the [`TaskApi`] and
//! [`ChatGateway`] traits; jobs never see transport types, only the typed
//! [`ApiError`] taxonomy.

pub mod chat;
pub mod error;
pub mod plan;
pub mod tasks;

pub use chat::{ChatGateway, HttpChatClient, MessageRef};
pub use error::ApiError;
pub use plan::{apply_brief_plan, ApplyReport};
pub use tasks::{RestTaskClient, TaskApi, TaskFilter, TaskUpdate};
