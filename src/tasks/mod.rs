// Async generation task tracking
// Author: kelexine (https://github.com/kelexine)

mod queue;

pub use queue::TaskQueue;

use crate::imagefx::reasons::ApiFailure;
use serde::{Deserialize, Serialize};

/// Lifecycle of a fire-and-poll generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Pending,
    Success,
    Failure,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "PENDING",
            TaskState::Success => "SUCCESS",
            TaskState::Failure => "FAILURE",
        }
    }
}

/// One tracked task. Results stay here until the retention window expires;
/// the poll endpoint copies successful images into the owning session.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    pub state: TaskState,
    pub images: Option<Vec<String>>,
    pub failure: Option<ApiFailure>,
    /// Cookie sid of the visitor who submitted the task. Only they may poll it.
    pub session_id: String,
    /// Save-flag captured at submission, applied on result write-back.
    pub save_images: bool,
    pub created_at: i64,
    pub finished_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskState::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(
            serde_json::to_string(&TaskState::Success).unwrap(),
            "\"SUCCESS\""
        );
        assert_eq!(
            serde_json::to_string(&TaskState::Failure).unwrap(),
            "\"FAILURE\""
        );
    }
}
