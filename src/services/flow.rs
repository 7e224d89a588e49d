use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{
        Destination, DestinationDetails, LocationCategory, LocationDetails, Preferences, UserInfo,
    },
    services::{
        best_effort::best_effort,
        enrichment::ImageEnricher,
        providers::{LocationSource, RecommendationRequest, RecommendationSource},
    },
    session::{Matcher, MatcherError, Session, Stage, StateError},
};

/// One user action driving the flow forward
#[derive(Debug, Clone)]
pub enum UserAction {
    SubmitUserInfo(UserInfo),
    /// `None` submits whatever the session's collector has gathered
    RequestSuggestions(Option<Preferences>),
    Dislike,
    Like,
    /// Refill an exhausted matcher, excluding everything disliked so far
    RequestNewSuggestions,
    Reset,
}

impl UserAction {
    fn label(&self) -> &'static str {
        match self {
            UserAction::SubmitUserInfo(_) => "submit_user_info",
            UserAction::RequestSuggestions(_) => "request_suggestions",
            UserAction::Dislike => "dislike",
            UserAction::Like => "like",
            UserAction::RequestNewSuggestions => "request_new_suggestions",
            UserAction::Reset => "reset",
        }
    }
}

/// What a step produced, for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum StepOutcome {
    StageChanged(Stage),
    /// The destination now on offer, `None` once the list is exhausted
    Suggestion(Option<Destination>),
    /// The source produced nothing usable; the user may retry
    NoRecommendations,
    Matched(DestinationDetails),
}

/// Sequences the recommendation and location sources around a session
///
/// A step takes the session by value and hands back the updated one, so the
/// caller decides whether to keep it. Upstream failures become "no data"
/// outcomes here; contract violations come back as errors.
pub struct FlowOrchestrator {
    recommender: Arc<dyn RecommendationSource>,
    locations: Arc<dyn LocationSource>,
    enricher: ImageEnricher,
    recommendation_timeout: Duration,
    location_timeout: Duration,
}

impl FlowOrchestrator {
    pub fn new(
        recommender: Arc<dyn RecommendationSource>,
        locations: Arc<dyn LocationSource>,
        recommendation_timeout: Duration,
        location_timeout: Duration,
    ) -> Self {
        let enricher = ImageEnricher::new(Arc::clone(&locations), location_timeout);
        Self {
            recommender,
            locations,
            enricher,
            recommendation_timeout,
            location_timeout,
        }
    }

    pub async fn step(
        &self,
        mut session: Session,
        action: UserAction,
    ) -> AppResult<(Session, StepOutcome)> {
        tracing::debug!(
            session_id = %session.id,
            action = action.label(),
            stage = %session.state.stage(),
            "Running flow step"
        );
        session.touch();

        let outcome = match action {
            UserAction::SubmitUserInfo(user_info) => {
                session.state.register_user(user_info)?;
                session.collector.restart();
                StepOutcome::StageChanged(session.state.stage())
            }
            UserAction::RequestSuggestions(preferences) => {
                let preferences =
                    preferences.unwrap_or_else(|| session.collector.answers().clone());
                self.initial_fetch(&mut session, preferences).await?
            }
            UserAction::Dislike => {
                session.state.require_stage(Stage::Matcher)?;
                let matcher = session.matcher_mut()?;
                matcher.dislike()?;
                StepOutcome::Suggestion(matcher.suggest().cloned())
            }
            UserAction::Like => self.like(&mut session).await?,
            UserAction::RequestNewSuggestions => self.refill(&mut session).await?,
            UserAction::Reset => {
                session.reset();
                tracing::info!(session_id = %session.id, "Session reset");
                StepOutcome::StageChanged(session.state.stage())
            }
        };

        Ok((session, outcome))
    }

    async fn initial_fetch(
        &self,
        session: &mut Session,
        preferences: Preferences,
    ) -> AppResult<StepOutcome> {
        if preferences.is_empty() {
            return Err(AppError::InvalidInput(
                "Answer the questionnaire before asking for suggestions".to_string(),
            ));
        }

        session.state.submit_preferences(preferences)?;
        session.matcher = None;
        session.details = None;

        let request = self.request_for(session, None)?;
        let Some(batch) = self.fetch(&request).await else {
            session.state.advance(Stage::UserPreferences)?;
            return Ok(StepOutcome::NoRecommendations);
        };

        let batch = self.enricher.enrich(batch).await;
        let matcher = Matcher::new(batch);
        let first = matcher.suggest().cloned();
        session.matcher = Some(matcher);
        session.state.advance(Stage::Matcher)?;

        tracing::info!(session_id = %session.id, "Matching started");
        Ok(StepOutcome::Suggestion(first))
    }

    async fn refill(&self, session: &mut Session) -> AppResult<StepOutcome> {
        session.state.require_stage(Stage::Matcher)?;
        let matcher = session.matcher()?;
        if !matcher.is_exhausted() {
            return Err(AppError::Conflict(
                "Current suggestions are not exhausted yet".to_string(),
            ));
        }

        let exclude = matcher.disliked_names().to_vec();
        let request = self.request_for(session, Some(exclude))?;

        let Some(batch) = self.fetch(&request).await else {
            return Ok(StepOutcome::NoRecommendations);
        };

        let batch = self.enricher.enrich(batch).await;
        tracing::info!(
            session_id = %session.id,
            excluded = request.excluded().len(),
            suggestions = batch.len(),
            "Suggestions refilled"
        );

        let matcher = session.matcher_mut()?;
        matcher.replace_suggestions(batch);
        Ok(StepOutcome::Suggestion(matcher.suggest().cloned()))
    }

    async fn like(&self, session: &mut Session) -> AppResult<StepOutcome> {
        session.state.require_stage(Stage::Matcher)?;
        let matcher = session.matcher()?;
        let destination = matcher
            .suggest()
            .cloned()
            .ok_or(MatcherError::Exhausted(matcher.get_recommendations_count()))?;

        session.state.accept_match(destination)?;
        let details = self.present_details(session).await?;
        session.details = Some(details.clone());

        Ok(StepOutcome::Matched(details))
    }

    /// Gathers what the detail view shows for the matched destination
    ///
    /// Coordinates and overview are fetched one after the other; either may
    /// come back empty without affecting the other.
    pub async fn present_details(&self, session: &Session) -> AppResult<DestinationDetails> {
        session.state.require_stage(Stage::PresentDetails)?;
        let destination = session
            .state
            .matched_destination()
            .cloned()
            .ok_or(StateError::MissingMatch)?;
        let (preferences, user_info) = context(session)?;

        let location = self.locate(&destination.name).await;
        let overview = best_effort(
            self.recommendation_timeout,
            "overview",
            &destination.name,
            self.recommender
                .overview(&destination.name, preferences, user_info),
        )
        .await;

        tracing::info!(
            destination = %destination.name,
            has_location = location.is_some(),
            has_overview = overview.is_some(),
            "Destination details prepared"
        );

        Ok(DestinationDetails {
            destination,
            location,
            overview,
        })
    }

    async fn locate(&self, name: &str) -> Option<LocationDetails> {
        let candidates = best_effort(
            self.location_timeout,
            "location_search",
            name,
            self.locations.search(name, LocationCategory::Geos),
        )
        .await?;

        let location_id = candidates.into_iter().next()?.location_id;

        best_effort(
            self.location_timeout,
            "location_details",
            name,
            self.locations.details(&location_id),
        )
        .await
    }

    /// Asks the recommender for a batch; failure, timeout and empty all mean `None`
    async fn fetch(&self, request: &RecommendationRequest) -> Option<Vec<Destination>> {
        let batch = best_effort(
            self.recommendation_timeout,
            "recommend",
            self.recommender.name(),
            self.recommender.recommend(request),
        )
        .await?;

        if batch.is_empty() {
            tracing::info!(
                source = self.recommender.name(),
                "Recommendation source returned no destinations"
            );
            return None;
        }

        Some(batch)
    }

    fn request_for(
        &self,
        session: &Session,
        exclude: Option<Vec<String>>,
    ) -> AppResult<RecommendationRequest> {
        let (preferences, user_info) = context(session)?;
        Ok(RecommendationRequest {
            preferences: preferences.clone(),
            user_info: user_info.clone(),
            exclude,
        })
    }
}

fn context(session: &Session) -> Result<(&Preferences, &UserInfo), StateError> {
    let preferences = session
        .state
        .preferences()
        .ok_or(StateError::MissingPreferences)?;
    let user_info = session
        .state
        .user_info()
        .ok_or(StateError::MissingUserInfo)?;
    Ok((preferences, user_info))
}
