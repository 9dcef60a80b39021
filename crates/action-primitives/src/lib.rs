//! Action vocabulary and the browser boundary.
//!
//! - [`AgentAction`]: closed sum type over every operation the agent can request
//! - [`ActionResult`]: per-action outcome recorded in history
//! - [`ActionRegistry`]: availability-filtered vocabulary per page
//! - [`BrowserEnvironment`] / [`ActionExecutor`]: the narrow traits the
//!   agent loop and the replay engine drive the browser through

pub mod errors;
mod primitives;
pub mod registry;
mod result;
pub mod types;

pub use errors::*;
pub use primitives::*;
pub use registry::{ActionRegistry, ActionSpec, Availability};
pub use result::*;
pub use types::*;
