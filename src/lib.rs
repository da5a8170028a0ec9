#![deny(unreachable_pub)]

// Core modules
mod errors;
mod prelude;

// Shared data model
pub mod types;

// Feature modules
pub mod availability;
pub mod customization;
pub mod pricing;
pub mod prompt;
pub mod providers;

// Ambient
pub mod config;
pub mod logging;

#[cfg(test)]
mod tests;

// Re-exports
pub use availability::AvailabilityTier;
pub use config::EngineConfig;
pub use customization::{AnalysisPass, DirtyFieldSet, EditingSession, FieldId, ReconcileSummary};
pub use errors::{Error, Service};
pub use pricing::{PriceBreakdown, PricingRule, RuleCache, RuleSet, RuleStore};
pub use prompt::{render_prompt, EditInstruction};
pub use providers::{AnalysisProvider, RenderOutcome, RenderProvider, RenderRequest};
pub use types::*;
