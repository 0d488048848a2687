//! # Last-progress tracking for stall detection.
//!
//! Cancellation in this crate is cooperative only: a body that never
//! re-checks its stop token cannot be terminated. What the control layer can
//! do is make such a stall visible. Bodies mark progress at the top of every
//! cycle; a supervisor compares the recorded instant with the task's dwell to
//! decide whether the body is stuck.

use std::collections::HashMap;
use std::time::Instant;

use tokio::sync::RwLock;

/// Records the most recent progress mark per task.
pub struct ProgressTracker {
    marks: RwLock<HashMap<String, Instant>>,
}

impl ProgressTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self {
            marks: RwLock::new(HashMap::new()),
        }
    }

    /// Records that `task` made progress now.
    pub async fn mark(&self, task: &str) {
        let mut marks = self.marks.write().await;
        marks.insert(task.to_string(), Instant::now());
    }

    /// The last time `task` marked progress, if it ever did.
    pub async fn last_progress(&self, task: &str) -> Option<Instant> {
        self.marks.read().await.get(task).copied()
    }

    /// All recorded marks, sorted by task name.
    pub async fn snapshot(&self) -> Vec<(String, Instant)> {
        let marks = self.marks.read().await;
        let mut all: Vec<(String, Instant)> =
            marks.iter().map(|(name, at)| (name.clone(), *at)).collect();
        all.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        all
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn marks_are_recorded_and_updated() {
        let tracker = ProgressTracker::new();
        assert!(tracker.last_progress("SignalQuality").await.is_none());

        tracker.mark("SignalQuality").await;
        let first = tracker
            .last_progress("SignalQuality")
            .await
            .expect("mark recorded");

        tracker.mark("SignalQuality").await;
        let second = tracker
            .last_progress("SignalQuality")
            .await
            .expect("mark recorded");
        assert!(second >= first);

        let snapshot = tracker.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, "SignalQuality");
    }
}
