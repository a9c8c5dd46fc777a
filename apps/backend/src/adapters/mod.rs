//! Adapters for external dependencies.

pub mod rooms_sea;

pub use rooms_sea::SeaStore;
