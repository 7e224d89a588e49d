mod handlers;
mod routes;
mod state;

pub use handlers::{CollectorResponse, MatcherResponse, SessionResponse, StepResponse};
pub use routes::create_router;
pub use state::AppState;
