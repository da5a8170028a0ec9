//! Rule-driven pricing.
//!
//! - **rules**: rule rows, [`RuleSet`] snapshots and key resolution
//! - **engine**: [`compute_price`] over a design state
//! - **cache**: TTL cache in front of a [`RuleStore`]

mod cache;
mod engine;
mod rules;

pub use cache::*;
pub use engine::*;
pub use rules::*;
