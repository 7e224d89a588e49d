mod destination;
mod location;
mod preferences;
mod questionnaire;
mod user_info;

pub use destination::{parse_batch, BatchError, Destination, DestinationDetails};
pub use location::{
    LocationCandidate, LocationCategory, LocationDetails, Photo, PhotoImage, PhotoImages,
    PhotoSet, TripAdvisorDetails, TripAdvisorList, TripAdvisorLocation,
};
pub use preferences::{Answer, Preferences};
pub use questionnaire::{Question, QuestionGroup, QuestionKind, Questionnaire, QuestionnaireError};
pub use user_info::{UserInfo, ValidationError};

#[cfg(test)]
pub(crate) use destination::fixtures;
