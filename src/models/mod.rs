//! Data models for the disk inventory backend.
//!
//! Field names serialize in camelCase to match the dashboard's JSON contract.

mod disk;
mod session;
mod snapshot;

pub use disk::*;
pub use session::*;
pub use snapshot::*;
