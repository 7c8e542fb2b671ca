pub mod store;
pub mod trigger;

pub use store::{IngestOutcome, MinuteWindow, MinuteWindowStore, RetentionPolicy};
pub use trigger::EvaluationGuard;
