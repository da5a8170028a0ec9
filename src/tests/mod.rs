//! Cross-module tests.
//!
//! - **scenarios**: session, pricing and availability working together
//! - **golden_prompts**: exact rendered prompts for typical edit sessions

mod golden_prompts;
