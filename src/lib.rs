pub mod artifacts;
pub use artifacts::*;

pub mod configuration;

pub mod error_handling;

pub mod replay;

pub mod scheduling;

pub mod snapshot_lifecycle;
pub use snapshot_lifecycle::*;
