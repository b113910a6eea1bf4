//! Configuration types for Relay.
//!
//! This crate provides the configuration used by the request pipeline and the
//! `relay` binary: `.relay/config.yaml` files plus environment overrides.

pub mod types;
pub mod loader;
pub mod env;


pub use types::*;
pub use loader::*;
pub use env::*;
