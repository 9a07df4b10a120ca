//! Morpheus resource provider
//!
//! Declarative management of Morpheus library records: option lists,
//! option types and tasks. [`resource`] holds the generic lifecycle,
//! [`resources`] the concrete record types and [`morpheus`] the API client.

pub mod config;
pub mod morpheus;
pub mod resource;
pub mod resources;
