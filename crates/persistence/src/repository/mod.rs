//! Repository implementations for database operations

pub mod simulation;

pub use simulation::*;
