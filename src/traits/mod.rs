//! Traits for abstraction and extensibility.
//!
//! - **Health monitoring**: [`Healthcheck`] for probing renderer liveness
//!
//! The renderer collaborator traits live in [`crate::factory`].

mod healthcheck;

pub use healthcheck::Healthcheck;
