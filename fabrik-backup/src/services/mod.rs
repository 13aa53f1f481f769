//! Service layer module.
//!
//! This module provides the service container that wires the credential,
//! storage and catalog services together.

pub mod container;

pub use container::ServiceContainer;
