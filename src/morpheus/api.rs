//! Remote entity operations
//!
//! [`EntityApi`] is the capability the reconciler drives: create, get by id,
//! find by name, update and delete on one Morpheus collection.
//! [`RestEndpoint`] is the implementation talking to a live appliance.

use super::client::MorpheusClient;
use super::error::ApiError;
use super::http::ApiResponse;
use async_trait::async_trait;
use serde_json::Value;

/// Remote operations on one kind of Morpheus record
#[async_trait]
pub trait EntityApi: Send + Sync {
    /// Create a record from a full request payload
    async fn create(&self, payload: &Value) -> Result<ApiResponse, ApiError>;

    /// Fetch a record by its numeric id
    async fn get(&self, id: i64) -> Result<ApiResponse, ApiError>;

    /// Fetch a record by its exact name; a miss is reported as 404
    async fn find_by_name(&self, name: &str) -> Result<ApiResponse, ApiError>;

    /// Replace a record's attributes
    async fn update(&self, id: i64, payload: &Value) -> Result<ApiResponse, ApiError>;

    /// Remove a record
    async fn delete(&self, id: i64) -> Result<ApiResponse, ApiError>;
}

/// A Morpheus REST collection and the JSON keys its responses use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    /// Path below the appliance root
    pub path: &'static str,
    /// Envelope key of a single record
    pub entity_key: &'static str,
    /// Envelope key of a record listing
    pub list_key: &'static str,
}

impl Collection {
    pub const OPTION_LISTS: Collection = Collection {
        path: "/api/library/option-type-lists",
        entity_key: "optionTypeList",
        list_key: "optionTypeLists",
    };

    pub const OPTION_TYPES: Collection = Collection {
        path: "/api/library/option-types",
        entity_key: "optionType",
        list_key: "optionTypes",
    };

    pub const TASKS: Collection = Collection {
        path: "/api/tasks",
        entity_key: "task",
        list_key: "tasks",
    };
}

/// [`EntityApi`] over HTTP
#[derive(Clone)]
pub struct RestEndpoint {
    client: MorpheusClient,
    collection: Collection,
}

impl RestEndpoint {
    pub fn new(client: MorpheusClient, collection: Collection) -> Self {
        Self { client, collection }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    fn record_path(&self, id: i64) -> String {
        format!("{}/{}", self.collection.path, id)
    }
}

#[async_trait]
impl EntityApi for RestEndpoint {
    async fn create(&self, payload: &Value) -> Result<ApiResponse, ApiError> {
        let url = self.client.api_url(self.collection.path)?;
        self.client.post(&url, payload).await
    }

    async fn get(&self, id: i64) -> Result<ApiResponse, ApiError> {
        let url = self.client.api_url(&self.record_path(id))?;
        self.client.get(&url).await
    }

    async fn find_by_name(&self, name: &str) -> Result<ApiResponse, ApiError> {
        let path = format!(
            "{}?name={}",
            self.collection.path,
            urlencoding::encode(name)
        );
        let url = self.client.api_url(&path)?;
        let listing = self.client.get(&url).await?;

        // The name filter is a substring match on some appliances
        let id = listing
            .body
            .get(self.collection.list_key)
            .and_then(|v| v.as_array())
            .and_then(|items| {
                items
                    .iter()
                    .find(|item| item.get("name").and_then(|n| n.as_str()) == Some(name))
            })
            .and_then(|item| item.get("id"))
            .and_then(|id| id.as_i64());

        match id {
            Some(id) => self.get(id).await,
            None => Err(ApiError::NameNotFound {
                collection: self.collection.list_key.to_string(),
                name: name.to_string(),
            }),
        }
    }

    async fn update(&self, id: i64, payload: &Value) -> Result<ApiResponse, ApiError> {
        let url = self.client.api_url(&self.record_path(id))?;
        self.client.put(&url, payload).await
    }

    async fn delete(&self, id: i64) -> Result<ApiResponse, ApiError> {
        let url = self.client.api_url(&self.record_path(id))?;
        self.client.delete(&url).await
    }
}
