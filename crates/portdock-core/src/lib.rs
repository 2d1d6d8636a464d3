//! Pure domain layer for portdock: server records, snapshot change
//! detection, and the view projection consumed by presentation code.
//!
//! No IO, no async, no clocks: everything here is a deterministic
//! function of its inputs.

pub mod fingerprint;
pub mod projection;
pub mod types;

pub use fingerprint::should_replace;
pub use projection::{CategoryGroup, ViewState, project};
pub use types::{Category, ServerRecord};
