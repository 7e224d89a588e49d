use serde::Serialize;
use std::{fmt::Display, str::FromStr};

use crate::models::{Destination, Preferences, UserInfo};

/// Phase of a single user's guided flow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Start,
    UserPreferences,
    RetrieveSuggestions,
    Matcher,
    PresentDetails,
}

/// Identifier declared by older clients for a refill stage; never reachable
const RESERVED_STAGE: &str = "retrieve_new_suggestions";

impl Stage {
    /// Stable identifier used for persistence and debugging
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::UserPreferences => "user_preferences",
            Stage::RetrieveSuggestions => "retrieve_suggestions",
            Stage::Matcher => "matcher",
            Stage::PresentDetails => "present_details",
        }
    }

    /// Whether the flow may move from `self` to `next`
    ///
    /// A failed suggestion fetch falls back from `RetrieveSuggestions` to
    /// `UserPreferences`. `PresentDetails` has no forward transition.
    pub fn can_transition_to(&self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Start, Stage::UserPreferences)
                | (Stage::UserPreferences, Stage::RetrieveSuggestions)
                | (Stage::RetrieveSuggestions, Stage::Matcher)
                | (Stage::RetrieveSuggestions, Stage::UserPreferences)
                | (Stage::Matcher, Stage::PresentDetails)
        )
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Stage {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Stage::Start),
            "user_preferences" => Ok(Stage::UserPreferences),
            "retrieve_suggestions" => Ok(Stage::RetrieveSuggestions),
            "matcher" => Ok(Stage::Matcher),
            "present_details" => Ok(Stage::PresentDetails),
            RESERVED_STAGE => Err(StateError::ReservedStage(s.to_string())),
            other => Err(StateError::UnknownStage(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StateError {
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    #[error("Stage '{0}' is reserved and cannot be entered")]
    ReservedStage(String),

    #[error("Cannot move from stage '{from}' to '{to}'")]
    IllegalTransition { from: Stage, to: Stage },

    #[error("Action requires stage '{expected}' but the session is at '{actual}'")]
    WrongStage { expected: Stage, actual: Stage },

    #[error("User information has not been provided")]
    MissingUserInfo,

    #[error("Preferences have not been submitted")]
    MissingPreferences,

    #[error("No destination has been matched")]
    MissingMatch,
}

/// Stage machine plus the user context accumulated along the flow
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplicationState {
    stage: Stage,
    user_info: Option<UserInfo>,
    preferences: Option<Preferences>,
    matched_destination: Option<Destination>,
}

impl ApplicationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn user_info(&self) -> Option<&UserInfo> {
        self.user_info.as_ref()
    }

    pub fn preferences(&self) -> Option<&Preferences> {
        self.preferences.as_ref()
    }

    pub fn matched_destination(&self) -> Option<&Destination> {
        self.matched_destination.as_ref()
    }

    /// Fails unless the flow is currently at `expected`
    pub fn require_stage(&self, expected: Stage) -> Result<(), StateError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(StateError::WrongStage {
                expected,
                actual: self.stage,
            })
        }
    }

    /// Records the user's identity and enters the questionnaire
    pub fn register_user(&mut self, user_info: UserInfo) -> Result<(), StateError> {
        self.check_transition(Stage::UserPreferences)?;
        self.user_info = Some(user_info);
        self.stage = Stage::UserPreferences;
        Ok(())
    }

    /// Fixes the preferences for this matching session and starts retrieval
    pub fn submit_preferences(&mut self, preferences: Preferences) -> Result<(), StateError> {
        self.check_transition(Stage::RetrieveSuggestions)?;
        if self.user_info.is_none() {
            return Err(StateError::MissingUserInfo);
        }
        self.preferences = Some(preferences);
        self.stage = Stage::RetrieveSuggestions;
        Ok(())
    }

    /// Moves to `next`, checking the transition table and the data it needs
    pub fn advance(&mut self, next: Stage) -> Result<(), StateError> {
        self.check_transition(next)?;
        match next {
            Stage::UserPreferences if self.user_info.is_none() => {
                return Err(StateError::MissingUserInfo)
            }
            Stage::RetrieveSuggestions | Stage::Matcher if self.preferences.is_none() => {
                return Err(StateError::MissingPreferences)
            }
            Stage::PresentDetails if self.matched_destination.is_none() => {
                return Err(StateError::MissingMatch)
            }
            _ => {}
        }
        self.stage = next;
        Ok(())
    }

    /// Stores the liked destination and moves on to presenting it
    pub fn accept_match(&mut self, destination: Destination) -> Result<(), StateError> {
        self.check_transition(Stage::PresentDetails)?;
        self.matched_destination = Some(destination);
        self.stage = Stage::PresentDetails;
        Ok(())
    }

    /// Returns every field to its initial value
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn check_transition(&self, next: Stage) -> Result<(), StateError> {
        if self.stage.can_transition_to(next) {
            Ok(())
        } else {
            Err(StateError::IllegalTransition {
                from: self.stage,
                to: next,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fixtures::destination, Answer};

    fn user() -> UserInfo {
        UserInfo::new("Anna", 28, "female").unwrap()
    }

    fn prefs() -> Preferences {
        let mut prefs = Preferences::new();
        prefs.insert("Climate", Answer::Single("Warm > 20°C".to_string()));
        prefs
    }

    fn matched_state() -> ApplicationState {
        let mut state = ApplicationState::new();
        state.register_user(user()).unwrap();
        state.submit_preferences(prefs()).unwrap();
        state.advance(Stage::Matcher).unwrap();
        state.accept_match(destination("Ibiza")).unwrap();
        state
    }

    #[test]
    fn test_stage_identifiers_round_trip() {
        for stage in [
            Stage::Start,
            Stage::UserPreferences,
            Stage::RetrieveSuggestions,
            Stage::Matcher,
            Stage::PresentDetails,
        ] {
            assert_eq!(stage.as_str().parse::<Stage>(), Ok(stage));
            assert_eq!(
                serde_json::to_value(stage).unwrap(),
                serde_json::json!(stage.as_str())
            );
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_reserved() {
        assert_eq!(
            "flying".parse::<Stage>(),
            Err(StateError::UnknownStage("flying".to_string()))
        );
        assert_eq!(
            "retrieve_new_suggestions".parse::<Stage>(),
            Err(StateError::ReservedStage(
                "retrieve_new_suggestions".to_string()
            ))
        );
    }

    #[test]
    fn test_full_flow() {
        let state = matched_state();
        assert_eq!(state.stage(), Stage::PresentDetails);
        assert_eq!(state.user_info().unwrap().name(), "Anna");
        assert_eq!(state.preferences(), Some(&prefs()));
        assert_eq!(state.matched_destination().unwrap().name, "Ibiza");
    }

    #[test]
    fn test_illegal_transition_keeps_stage() {
        let mut state = ApplicationState::new();
        let err = state.advance(Stage::Matcher).unwrap_err();

        assert_eq!(
            err,
            StateError::IllegalTransition {
                from: Stage::Start,
                to: Stage::Matcher
            }
        );
        assert_eq!(state.stage(), Stage::Start);
    }

    #[test]
    fn test_accept_match_requires_matcher_stage() {
        let mut state = ApplicationState::new();
        state.register_user(user()).unwrap();

        assert!(state.accept_match(destination("Ibiza")).is_err());
        assert!(state.matched_destination().is_none());
        assert_eq!(state.stage(), Stage::UserPreferences);
    }

    #[test]
    fn test_failed_retrieval_returns_to_questionnaire() {
        let mut state = ApplicationState::new();
        state.register_user(user()).unwrap();
        state.submit_preferences(prefs()).unwrap();

        state.advance(Stage::UserPreferences).unwrap();

        assert_eq!(state.stage(), Stage::UserPreferences);
        assert_eq!(state.preferences(), Some(&prefs()));
    }

    #[test]
    fn test_present_details_is_terminal() {
        let mut state = matched_state();
        for next in [
            Stage::Start,
            Stage::UserPreferences,
            Stage::RetrieveSuggestions,
            Stage::Matcher,
        ] {
            assert!(state.advance(next).is_err());
        }
        assert_eq!(state.stage(), Stage::PresentDetails);
    }

    #[test]
    fn test_require_stage() {
        let state = ApplicationState::new();
        assert!(state.require_stage(Stage::Start).is_ok());
        assert_eq!(
            state.require_stage(Stage::Matcher),
            Err(StateError::WrongStage {
                expected: Stage::Matcher,
                actual: Stage::Start
            })
        );
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = matched_state();
        state.reset();

        assert_eq!(state.stage(), Stage::Start);
        assert!(state.user_info().is_none());
        assert!(state.preferences().is_none());
        assert!(state.matched_destination().is_none());

        // Fresh state is usable again
        state.register_user(user()).unwrap();
        assert_eq!(state.stage(), Stage::UserPreferences);
    }
}
