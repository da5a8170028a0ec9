//! Consolidated type definitions for the customization core.
//!
//! This module contains the shared data model used across analysis payloads,
//! the live editing state, pricing and prompt synthesis.

mod analysis;
mod cake;
mod color;
mod design;

pub mod kind;

pub use analysis::*;
pub use cake::*;
pub use color::*;
pub use design::*;
