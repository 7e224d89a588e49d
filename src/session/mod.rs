//! Per-user session state
//!
//! The matcher and the stage machine are owned by exactly one session and
//! only mutated by the flow step currently running for it.

mod collector;
mod matcher;
mod state;
mod store;

pub use collector::PreferenceCollector;
pub use matcher::{Matcher, MatcherError};
pub use state::{ApplicationState, Stage, StateError};
pub use store::{Session, SessionError, SessionHandle, SessionStore};
