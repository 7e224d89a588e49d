use serde::Serialize;

use crate::models::{Answer, Preferences};

/// Accumulates questionnaire answers step by step
///
/// Steps are 0-based group indices; a step equal to the group count is the
/// summary shown before suggestions are requested.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreferenceCollector {
    step: usize,
    answers: Preferences,
}

impl PreferenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn record(&mut self, title: impl Into<String>, answer: Answer) {
        self.answers.insert(title, answer);
    }

    pub fn next_step(&mut self, total_steps: usize) {
        if self.step < total_steps {
            self.step += 1;
        }
    }

    pub fn previous_step(&mut self) {
        self.step = self.step.saturating_sub(1);
    }

    /// Clears all answers and returns to the first step
    pub fn restart(&mut self) {
        *self = Self::default();
    }

    pub fn is_complete(&self, total_steps: usize) -> bool {
        self.step >= total_steps
    }

    pub fn answers(&self) -> &Preferences {
        &self.answers
    }
}
