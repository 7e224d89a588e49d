use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Destination, DestinationDetails, Preferences, Questionnaire, UserInfo};
use crate::services::{StepOutcome, UserAction};
use crate::session::{ApplicationState, Session, Stage, StateError};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SubmitUserRequest {
    pub name: String,
    pub age: u16,
    pub gender: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SuggestionsRequest {
    /// Overrides the answers gathered step by step
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

/// Optional `?stage=` query: the stage the client believes the session is in.
/// A step is refused when the session has moved on.
#[derive(Debug, Default, Deserialize)]
pub struct StageGuard {
    pub stage: Option<String>,
}

impl StageGuard {
    fn check(&self, state: &ApplicationState) -> AppResult<()> {
        if let Some(raw) = &self.stage {
            let expected: Stage = raw.parse()?;
            state.require_stage(expected)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CollectorResponse {
    pub current_step: usize,
    pub total_steps: usize,
    pub complete: bool,
    pub answers: Preferences,
}

impl CollectorResponse {
    fn new(session: &Session, questionnaire: &Questionnaire) -> Self {
        let total_steps = questionnaire.step_count();
        Self {
            current_step: session.collector.current_step(),
            total_steps,
            complete: session.collector.is_complete(total_steps),
            answers: session.collector.answers().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatcherResponse {
    pub suggestion: Option<Destination>,
    pub index: usize,
    pub total: usize,
    pub exhausted: bool,
    pub disliked_names: Vec<String>,
}

impl From<&crate::session::Matcher> for MatcherResponse {
    fn from(matcher: &crate::session::Matcher) -> Self {
        Self {
            suggestion: matcher.suggest().cloned(),
            index: matcher.get_index(),
            total: matcher.get_recommendations_count(),
            exhausted: matcher.is_exhausted(),
            disliked_names: matcher.disliked_names().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub state: ApplicationState,
    pub matcher: Option<MatcherResponse>,
    pub details: Option<DestinationDetails>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            created_at: session.created_at,
            last_active: session.last_active,
            state: session.state.clone(),
            matcher: session.matcher.as_ref().map(MatcherResponse::from),
            details: session.details.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub stage: Stage,
    pub outcome: StepOutcome,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Questionnaire shown by the preference collector
pub async fn get_questionnaire(State(state): State<AppState>) -> Json<Questionnaire> {
    Json(state.questionnaire.as_ref().clone())
}

/// Start a new session
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionResponse>) {
    let session = state.sessions.create().await;
    (StatusCode::CREATED, Json(SessionResponse::from(&session)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(guard): Query<StageGuard>,
) -> AppResult<Json<SessionResponse>> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    guard.check(&session.state)?;
    Ok(Json(SessionResponse::from(&*session)))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.sessions.remove(id).await?;
    tracing::info!(session_id = %id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Register the traveller and open the questionnaire
pub async fn submit_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(guard): Query<StageGuard>,
    Json(request): Json<SubmitUserRequest>,
) -> AppResult<Json<StepResponse>> {
    let user_info = UserInfo::new(request.name, request.age, request.gender)?;
    run_step(&state, id, &guard, UserAction::SubmitUserInfo(user_info)).await
}

/// Record answers for the current questionnaire step
pub async fn record_answers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(answers): Json<Preferences>,
) -> AppResult<Json<CollectorResponse>> {
    for (title, answer) in answers.iter() {
        state.questionnaire.validate_answer(title, answer)?;
    }

    with_collector(&state, id, |session| {
        for (title, answer) in answers.iter() {
            session.collector.record(title, answer.clone());
        }
    })
    .await
}

pub async fn next_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CollectorResponse>> {
    let total_steps = state.questionnaire.step_count();
    with_collector(&state, id, |session| session.collector.next_step(total_steps)).await
}

pub async fn previous_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CollectorResponse>> {
    with_collector(&state, id, |session| session.collector.previous_step()).await
}

/// Clear all answers and go back to the first step
pub async fn restart_steps(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CollectorResponse>> {
    with_collector(&state, id, |session| session.collector.restart()).await
}

/// Submit preferences and fetch the first batch of suggestions
pub async fn request_suggestions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(guard): Query<StageGuard>,
    body: Option<Json<SuggestionsRequest>>,
) -> AppResult<Json<StepResponse>> {
    let request = body.map(|Json(request)| request).unwrap_or_default();

    if let Some(preferences) = &request.preferences {
        for (title, answer) in preferences.iter() {
            state.questionnaire.validate_answer(title, answer)?;
        }
    }

    run_step(&state, id, &guard, UserAction::RequestSuggestions(request.preferences)).await
}

/// The matcher's current position
pub async fn get_suggestion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MatcherResponse>> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    session.state.require_stage(Stage::Matcher)?;
    Ok(Json(MatcherResponse::from(session.matcher()?)))
}

pub async fn dislike(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(guard): Query<StageGuard>,
) -> AppResult<Json<StepResponse>> {
    run_step(&state, id, &guard, UserAction::Dislike).await
}

pub async fn like(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(guard): Query<StageGuard>,
) -> AppResult<Json<StepResponse>> {
    run_step(&state, id, &guard, UserAction::Like).await
}

/// Ask for a fresh batch once every suggestion has been disliked
pub async fn refill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(guard): Query<StageGuard>,
) -> AppResult<Json<StepResponse>> {
    run_step(&state, id, &guard, UserAction::RequestNewSuggestions).await
}

pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(guard): Query<StageGuard>,
) -> AppResult<Json<StepResponse>> {
    run_step(&state, id, &guard, UserAction::Reset).await
}

/// Details gathered for the matched destination
pub async fn get_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DestinationDetails>> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    session.state.require_stage(Stage::PresentDetails)?;

    let details = session.details.clone().ok_or(StateError::MissingMatch)?;
    Ok(Json(details))
}

// Helpers

/// Runs one flow step, keeping the updated session only when it succeeds
async fn run_step(
    state: &AppState,
    id: Uuid,
    guard: &StageGuard,
    action: UserAction,
) -> AppResult<Json<StepResponse>> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    guard.check(&session.state)?;

    let (updated, outcome) = state.flow.step(session.clone(), action).await?;
    *session = updated;

    Ok(Json(StepResponse {
        stage: session.state.stage(),
        outcome,
    }))
}

/// Applies a questionnaire navigation change; only valid while answering
async fn with_collector<F>(
    state: &AppState,
    id: Uuid,
    change: F,
) -> AppResult<Json<CollectorResponse>>
where
    F: FnOnce(&mut Session),
{
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    session.state.require_stage(Stage::UserPreferences)?;

    change(&mut *session);
    session.touch();

    Ok(Json(CollectorResponse::new(&session, &state.questionnaire)))
}

