use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::Answer;

/// How a question is answered
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Exactly one option
    Radio,
    /// Any number of options
    Multiselect,
    /// Any number of options, rendered as pills
    Pills,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    /// Key under which the answer is stored in the preferences
    pub title: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: QuestionKind,
    pub options: Vec<String>,
}

/// Questions shown together on one step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionGroup {
    pub title: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum QuestionnaireError {
    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("Question '{0}' expects a single answer")]
    ExpectedSingle(String),

    #[error("Question '{0}' expects a list of answers")]
    ExpectedMultiple(String),

    #[error("'{option}' is not an option of question '{title}'")]
    UnknownOption { title: String, option: String },
}

/// Questionnaire definition supplied to the preference collector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Questionnaire {
    pub groups: Vec<QuestionGroup>,
}

impl Questionnaire {
    /// Number of steps, one per group
    pub fn step_count(&self) -> usize {
        self.groups.len()
    }

    pub fn find(&self, title: &str) -> Option<&Question> {
        self.groups
            .iter()
            .flat_map(|group| group.questions.iter())
            .find(|question| question.title == title)
    }

    /// Checks an answer's shape and options against its question
    pub fn validate_answer(&self, title: &str, answer: &Answer) -> Result<(), QuestionnaireError> {
        let question = self
            .find(title)
            .ok_or_else(|| QuestionnaireError::UnknownQuestion(title.to_string()))?;

        let chosen: Vec<&String> = match (question.kind, answer) {
            (QuestionKind::Radio, Answer::Single(value)) => vec![value],
            (QuestionKind::Radio, Answer::Multiple(_)) => {
                return Err(QuestionnaireError::ExpectedSingle(title.to_string()))
            }
            (_, Answer::Multiple(values)) => values.iter().collect(),
            (_, Answer::Single(_)) => {
                return Err(QuestionnaireError::ExpectedMultiple(title.to_string()))
            }
        };

        for option in chosen {
            if !question.options.contains(option) {
                return Err(QuestionnaireError::UnknownOption {
                    title: title.to_string(),
                    option: option.clone(),
                });
            }
        }

        Ok(())
    }

    /// Loads a questionnaire from a JSON file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read questionnaire {}", path))?;
        let questionnaire: Questionnaire = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse questionnaire {}", path))?;
        Ok(questionnaire)
    }
}

fn question(title: &str, text: &str, kind: QuestionKind, options: &[&str]) -> Question {
    Question {
        title: title.to_string(),
        question: text.to_string(),
        description: None,
        kind,
        options: options.iter().map(|o| o.to_string()).collect(),
    }
}

impl Default for Questionnaire {
    fn default() -> Self {
        let months = [
            "January", "February", "March", "April", "May", "June", "July", "August",
            "September", "October", "November", "December",
        ];

        let mut budget = question(
            "Budget",
            "How much would you like to spend for transportation and the accommodation?",
            QuestionKind::Radio,
            &[
                "Under CHF 500",
                "CHF 500 - CHF 1000",
                "CHF 1000 - CHF 2500",
                "More than CHF 2500",
            ],
        );
        budget.description = Some("Select your budget range".to_string());

        Self {
            groups: vec![
                QuestionGroup {
                    title: "When".to_string(),
                    questions: vec![
                        question(
                            "Travel Duration",
                            "How long would you like to travel?",
                            QuestionKind::Radio,
                            &["1-3 days", "4-7 days", "Longer than 1 week", "Other"],
                        ),
                        question(
                            "Month",
                            "Which month would you like to travel?",
                            QuestionKind::Pills,
                            &months,
                        ),
                    ],
                },
                QuestionGroup {
                    title: "What".to_string(),
                    questions: vec![
                        question(
                            "Type of Trip",
                            "What type of trip do you prefer?",
                            QuestionKind::Multiselect,
                            &[
                                "City trip",
                                "Beach vacation",
                                "Hiking vacation",
                                "General sports vacation",
                                "Relaxation / SPA vacation",
                                "Ski vacation / Après-ski",
                            ],
                        ),
                        question(
                            "Interests",
                            "What would you like to do most during your trip?",
                            QuestionKind::Multiselect,
                            &[
                                "Culture / Museums",
                                "Hiking / Nature",
                                "Beach / Relaxation",
                                "Party",
                                "Adventure",
                            ],
                        ),
                    ],
                },
                QuestionGroup {
                    title: "Where".to_string(),
                    questions: vec![
                        question(
                            "Climate",
                            "Do you prefer warm or cooler weather?",
                            QuestionKind::Radio,
                            &[
                                "Cool < 10°C",
                                "Warm > 20°C",
                                "Very warm > 30°C",
                                "Doesn't matter",
                            ],
                        ),
                        question(
                            "Destination",
                            "Where would you like to travel?",
                            QuestionKind::Radio,
                            &[
                                "Stay in Europe",
                                "North America",
                                "South America",
                                "Asia",
                                "Africa",
                                "Australia / Oceania",
                                "Doesn't matter",
                            ],
                        ),
                    ],
                },
                QuestionGroup {
                    title: "How".to_string(),
                    questions: vec![
                        question(
                            "Travel Companions",
                            "Who will you be traveling with?",
                            QuestionKind::Radio,
                            &["Solo", "Couple", "Family (with children)", "Friends", "Group"],
                        ),
                        question(
                            "Accommodation Preferences",
                            "What type of accommodation do you prefer?",
                            QuestionKind::Radio,
                            &[
                                "Hotel",
                                "Vacation Rental (Airbnb, etc.)",
                                "Hostel",
                                "Resort",
                                "Camping",
                                "Doesn't matter",
                            ],
                        ),
                        budget,
                    ],
                },
            ],
        }
    }
}
