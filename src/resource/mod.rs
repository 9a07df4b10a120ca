//! Resource lifecycle machinery
//!
//! Everything here is independent of any particular Morpheus record type.
//! Concrete types live in [`crate::resources`] and plug in through
//! [`FieldMapper`].
//!
//! # Architecture
//!
//! - [`state`] - Local state of one resource instance
//! - [`schema`] - Field tables, validation, planning and diffs
//! - [`mapper`] - Local state to request body and back
//! - [`reconciler`] - Create / read / update / delete / import
//! - [`registry`] - Resource type name to schema and handler
//! - [`memory`] - In-memory API, for driving a reconciler without an appliance
//!
//! # Example
//!
//! ```ignore
//! use crate::resource::{LocalState, ResourceRegistry};
//! use crate::morpheus::client::MorpheusClient;
//!
//! async fn create_list(client: &MorpheusClient) -> anyhow::Result<LocalState> {
//!     let registry = ResourceRegistry::for_client(client);
//!     let handler = registry.get("morpheus_api_option_list")?;
//!     let config = LocalState::new().with("name", "clouds").with("option_list", "clouds");
//!     Ok(handler.create(&config).await?)
//! }
//! ```

pub mod error;
pub mod mapper;
pub mod memory;
pub mod reconciler;
mod registry;
pub mod schema;
pub mod state;

pub use error::{Operation, ResourceError};
pub use mapper::FieldMapper;
pub use reconciler::{Plan, Reconciler, ResourceHandler};
pub use registry::*;
pub use schema::{ChangeSet, Schema};
pub use state::{FieldValue, LocalState};
