//! Shared types for the Renoplan renovation planner.

mod api;
mod bom;
mod conversation;
mod project;
mod session;
mod vendor;

pub use api::*;
pub use bom::*;
pub use conversation::*;
pub use project::*;
pub use session::*;
pub use vendor::*;
