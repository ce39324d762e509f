//! Dialog configuration.

use serde::Deserialize;

/// Tunables for the [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Clone, Deserialize)]
pub struct DialogConfig {
    /// Turns kept per user after background trimming.
    #[serde(default = "default_history_keep")]
    pub history_keep: usize,

    /// Earlier turns sent to the classifier as context.
    #[serde(default = "default_context_turns")]
    pub context_turns: usize,

    /// User turns during which a pending deletion can still be confirmed.
    #[serde(default = "default_confirmation_window_turns")]
    pub confirmation_window_turns: u64,

    /// Classifications below this confidence are treated as unknown.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_history_keep() -> usize {
    50
}

fn default_context_turns() -> usize {
    10
}

fn default_confirmation_window_turns() -> u64 {
    5
}

fn default_min_confidence() -> f64 {
    0.3
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            history_keep: default_history_keep(),
            context_turns: default_context_turns(),
            confirmation_window_turns: default_confirmation_window_turns(),
            min_confidence: default_min_confidence(),
        }
    }
}
