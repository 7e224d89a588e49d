use serde::Serialize;

use crate::models::Destination;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MatcherError {
    #[error("No current suggestion to dislike: all {0} suggestions have been shown")]
    Exhausted(usize),
}

/// Cursor over a list of suggested destinations
///
/// Keeps every rejected destination name for the whole matching session, even
/// when the list is replaced, so a refill can ask for those to be excluded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Matcher {
    recommendations: Vec<Destination>,
    cursor: usize,
    disliked_names: Vec<String>,
}

impl Matcher {
    pub fn new(recommendations: Vec<Destination>) -> Self {
        Self {
            recommendations,
            cursor: 0,
            disliked_names: Vec::new(),
        }
    }

    /// Current candidate, or `None` once the list is exhausted
    pub fn suggest(&self) -> Option<&Destination> {
        self.recommendations.get(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.recommendations.len()
    }

    /// Rejects the current candidate and moves to the next one
    pub fn dislike(&mut self) -> Result<(), MatcherError> {
        let name = self
            .suggest()
            .map(|destination| destination.name.clone())
            .ok_or(MatcherError::Exhausted(self.recommendations.len()))?;

        self.disliked_names.push(name);
        self.cursor += 1;
        Ok(())
    }

    /// Swaps in a new list and rewinds the cursor; the dislike history is kept
    pub fn replace_suggestions(&mut self, suggestions: Vec<Destination>) {
        self.recommendations = suggestions;
        self.cursor = 0;
    }

    /// Appends to the current list without moving the cursor
    pub fn add_suggestions(&mut self, suggestions: Vec<Destination>) {
        self.recommendations.extend(suggestions);
    }

    pub fn list_suggestions(&self) -> &[Destination] {
        &self.recommendations
    }

    pub fn disliked_names(&self) -> &[String] {
        &self.disliked_names
    }

    pub fn get_index(&self) -> usize {
        self.cursor
    }

    pub fn get_recommendations_count(&self) -> usize {
        self.recommendations.len()
    }
}
