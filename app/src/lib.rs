//! Client core for the My Money personal finance app.
//!
//! The crate follows a ports-and-adapters layout:
//!
//! - [`domain`] holds entities, the entity access services and the driven
//!   ports (`DocumentStore`, `IdentityProvider`, `LocalStorage`).
//! - [`state`] holds the observable auth and navigation stores.
//! - [`outbound`] provides in-process adapters for the ports.
//! - [`context`] wires stores and services into one [`AppContext`].
//! - [`config`] loads backend connection settings.

pub mod config;
pub mod context;
pub mod domain;
pub mod outbound;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{BackendConnection, BackendSettings};
pub use context::{AppContext, Backend};
