use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Editor tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Quiet interval after the last change before an autosave
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,

    /// Undo levels kept per session (0 = unlimited)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_autosave_debounce_ms() -> u64 {
    30_000
}

fn default_history_limit() -> usize {
    100
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_debounce_ms: default_autosave_debounce_ms(),
            history_limit: default_history_limit(),
        }
    }
}

impl EditorConfig {
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}
