mod best_effort;
pub mod enrichment;
pub mod flow;
pub mod providers;

pub use enrichment::ImageEnricher;
pub use flow::{FlowOrchestrator, StepOutcome, UserAction};
