//! Edit-script synthesis for the render provider.

mod instruction;
mod policy;
mod synthesizer;

pub use instruction::*;
pub use policy::*;
pub use synthesizer::*;
