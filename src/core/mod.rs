//! Core types and constants for parcel measurement

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
