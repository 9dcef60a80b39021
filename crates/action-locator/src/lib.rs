//! Element re-identification for replays.
//!
//! A recorded [`ElementIdentity`](steptrail_core_types::ElementIdentity) is
//! looked up in a fresh element index through a fixed cascade of match
//! levels, most specific first:
//! - EXACT: full element hash
//! - STABLE: hash over the time-invariant attributes
//! - XPATH: literal XPath equality
//! - ATTRIBUTE: same node kind plus a unique `name`, `id` or `aria-label`

pub mod errors;
pub mod matcher;
pub mod types;

pub use errors::*;
pub use matcher::*;
pub use types::*;
