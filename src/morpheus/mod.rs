//! Morpheus API interaction module
//!
//! This module provides the core functionality for talking to a Morpheus
//! appliance: authentication, the HTTP client, typed records and the
//! per-collection remote operations the reconciler drives.
//!
//! # Module Structure
//!
//! - [`auth`] - Access token or OAuth password grant, with token caching
//! - [`client`] - Main client for making authenticated API requests
//! - [`http`] - HTTP utilities for REST API calls
//! - [`api`] - The [`EntityApi`](api::EntityApi) capability and its REST implementation
//! - [`models`] - Typed records decoded from API responses
//!
//! # Example
//!
//! ```ignore
//! use crate::morpheus::{api::{Collection, EntityApi, RestEndpoint}, auth::AuthMethod, client::MorpheusClient};
//!
//! async fn example() -> Result<(), crate::morpheus::error::ApiError> {
//!     let client = MorpheusClient::new("https://cmp.example.com", AuthMethod::AccessToken("...".into()))?;
//!     let tasks = RestEndpoint::new(client, Collection::TASKS);
//!     let task = tasks.get(12).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod models;
