use std::sync::Arc;

use crate::{models::Questionnaire, services::FlowOrchestrator, session::SessionStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub flow: Arc<FlowOrchestrator>,
    pub questionnaire: Arc<Questionnaire>,
}

impl AppState {
    pub fn new(flow: FlowOrchestrator, questionnaire: Questionnaire) -> Self {
        Self {
            sessions: SessionStore::new(),
            flow: Arc::new(flow),
            questionnaire: Arc::new(questionnaire),
        }
    }
}
