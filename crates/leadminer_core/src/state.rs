use serde::{Deserialize, Serialize};

pub const STATUS_IDLE: &str = "Idle";
/// Terminal status; the progress stream ends once it is observed.
pub const STATUS_COMPLETED: &str = "Completed";

/// Progress of a single run, as streamed to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub current: usize,
    pub total: usize,
    pub status: String,
    pub active: bool,
    pub preview: String,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            current: 0,
            total: 0,
            status: STATUS_IDLE.to_string(),
            active: false,
            preview: String::new(),
        }
    }
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}
