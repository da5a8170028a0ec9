//! Live design customization.
//!
//! - **EditingSession**: owns the live state, the baseline and the dirty set
//! - **DirtyFieldSet**: which fields the user touched since the baseline
//! - **reconcile**: merging analysis results without losing user edits
//! - **IdAllocator**: stable item identities across re-analysis

mod dirty;
mod ids;
mod reconcile;
mod session;

pub use dirty::*;
pub use ids::*;
pub use reconcile::*;
pub use session::*;
