//! Create / read / update / delete state machine
//!
//! One [`Reconciler`] per resource type, parameterized by the type's
//! [`FieldMapper`] and the [`EntityApi`] it talks to. All state lives in the
//! [`LocalState`] passed in; a non-empty id means the remote record exists.
//!
//! Operations never mutate their input. A failed call leaves the caller's
//! state exactly as it was.

use super::error::{Operation, ResourceError};
use super::mapper::FieldMapper;
use super::schema::{ChangeSet, Schema};
use super::state::LocalState;
use crate::morpheus::api::EntityApi;
use crate::morpheus::http::ApiResponse;
use crate::morpheus::models::RemoteEntity;
use async_trait::async_trait;
use serde_json::Value;

/// Planned state and the changes it implies
#[derive(Debug, Clone)]
pub struct Plan {
    pub planned: LocalState,
    pub changes: ChangeSet,
}

/// Lifecycle entry points a host drives for one resource type
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn schema(&self) -> &'static Schema;

    /// Check user configuration without touching the API
    fn validate(&self, config: &LocalState) -> Result<(), ResourceError>;

    /// Desired state for `config` and its diff against `prior`
    fn plan(&self, prior: Option<&LocalState>, config: &LocalState) -> Result<Plan, ResourceError>;

    async fn create(&self, config: &LocalState) -> Result<LocalState, ResourceError>;

    async fn read(&self, state: &LocalState) -> Result<LocalState, ResourceError>;

    async fn update(&self, prior: &LocalState, config: &LocalState) -> Result<LocalState, ResourceError>;

    /// Returns the state with its id cleared
    async fn delete(&self, state: &LocalState) -> Result<LocalState, ResourceError>;

    /// Seed a state from an external id; the next read fills in the rest
    fn import_state(&self, id: &str) -> Result<LocalState, ResourceError>;
}

pub struct Reconciler<M, A> {
    mapper: M,
    api: A,
}

impl<M, A> Reconciler<M, A>
where
    M: FieldMapper,
    A: EntityApi,
{
    pub fn new(mapper: M, api: A) -> Self {
        Self { mapper, api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn kind(&self) -> &'static str {
        self.mapper.kind()
    }

    fn parse_id(&self, id: &str) -> Result<i64, ResourceError> {
        id.parse().map_err(|_| ResourceError::InvalidId {
            kind: self.kind(),
            id: id.to_string(),
        })
    }

    /// Raw record under the collection's entity key
    fn raw_entity<'r>(&self, operation: Operation, response: &'r ApiResponse) -> Result<&'r Value, ResourceError> {
        let key = self.mapper.collection().entity_key;
        response.entity(key).ok_or_else(|| {
            // should not happen
            tracing::error!("{} {}: no '{}' in response", operation, self.kind(), key);
            ResourceError::InvariantViolation {
                kind: self.kind(),
                operation,
            }
        })
    }

    /// Id of a written record, read before any typed decode so that an
    /// attribute the record types cannot parse never loses it
    fn written_id(&self, operation: Operation, response: &ApiResponse) -> Result<i64, ResourceError> {
        let raw = self.raw_entity(operation, response)?;
        raw.get("id").and_then(Value::as_i64).ok_or_else(|| {
            tracing::error!("{} {}: response record has no numeric id", operation, self.kind());
            ResourceError::InvariantViolation {
                kind: self.kind(),
                operation,
            }
        })
    }

    /// Pull the typed record out of a response envelope
    fn unpack(&self, operation: Operation, response: &ApiResponse) -> Result<M::Entity, ResourceError> {
        let raw = self.raw_entity(operation, response)?;
        serde_json::from_value(raw.clone()).map_err(|source| {
            tracing::error!("{} {}: undecodable record: {}", operation, self.kind(), source);
            ResourceError::Decode {
                kind: self.kind(),
                source,
            }
        })
    }
}

#[async_trait]
impl<M, A> ResourceHandler for Reconciler<M, A>
where
    M: FieldMapper,
    A: EntityApi,
{
    fn schema(&self) -> &'static Schema {
        self.mapper.schema()
    }

    fn validate(&self, config: &LocalState) -> Result<(), ResourceError> {
        self.schema().validate(config)
    }

    fn plan(&self, prior: Option<&LocalState>, config: &LocalState) -> Result<Plan, ResourceError> {
        self.validate(config)?;
        let schema = self.schema();
        let planned = schema.plan(prior, config);
        let changes = match prior {
            Some(prior) => schema.diff(prior, &planned),
            None => schema.diff(&LocalState::new(), &planned),
        };
        Ok(Plan { planned, changes })
    }

    async fn create(&self, config: &LocalState) -> Result<LocalState, ResourceError> {
        let Plan { planned, .. } = self.plan(None, config)?;
        let payload = self.mapper.encode(&planned, None);

        let response = self.api.create(&payload).await.map_err(|err| {
            tracing::error!("API FAILURE: create {}: {}", self.kind(), err);
            ResourceError::Api {
                kind: self.kind(),
                operation: Operation::Create,
                source: err,
            }
        })?;
        tracing::debug!("API RESPONSE: create {}: {}", self.kind(), response.status);

        let id = self.written_id(Operation::Create, &response)?;
        let mut created = planned;
        created.set_id(id.to_string());
        self.schema().seal_secrets(&mut created);
        tracing::info!("Created {} {} ({})", self.kind(), id, created.get_str("name"));

        // The record exists now; losing its id would orphan it
        match self.read(&created).await {
            Ok(refreshed) => Ok(refreshed),
            Err(err) => {
                tracing::warn!(
                    "Refresh after creating {} {} failed: {}",
                    self.kind(),
                    created.id(),
                    err
                );
                Ok(created)
            }
        }
    }

    async fn read(&self, state: &LocalState) -> Result<LocalState, ResourceError> {
        let name = state.get_str("name");

        // id always wins over name once the record has been identified
        let (identity, result) = if state.is_present() {
            let id = self.parse_id(state.id())?;
            (state.id(), self.api.get(id).await)
        } else if !name.is_empty() {
            (name, self.api.find_by_name(name).await)
        } else {
            return Err(ResourceError::MissingIdentity { kind: self.kind() });
        };

        let response = result.map_err(|err| {
            if err.is_not_found() {
                tracing::warn!("API 404: {} {}: {}", self.kind(), identity, err);
            } else {
                tracing::error!("API FAILURE: read {} {}: {}", self.kind(), identity, err);
            }
            ResourceError::from_api(self.kind(), Operation::Read, identity, err)
        })?;
        tracing::debug!("API RESPONSE: read {} {}: {}", self.kind(), identity, response.status);

        let entity = self.unpack(Operation::Read, &response)?;
        let mut refreshed = state.clone();
        refreshed.set_id(entity.id().to_string());
        self.mapper.decode(&entity, &mut refreshed);
        Ok(refreshed)
    }

    async fn update(&self, prior: &LocalState, config: &LocalState) -> Result<LocalState, ResourceError> {
        if !prior.is_present() {
            return Err(ResourceError::MissingIdentity { kind: self.kind() });
        }
        let id = self.parse_id(prior.id())?;

        let Plan { planned, changes } = self.plan(Some(prior), config)?;
        if changes.is_empty() {
            tracing::info!("{} {}: no changes", self.kind(), prior.id());
            return Ok(prior.clone());
        }

        let payload = self.mapper.encode(&planned, Some(&changes));
        let response = self.api.update(id, &payload).await.map_err(|err| {
            tracing::error!("API FAILURE: update {} {}: {}", self.kind(), id, err);
            ResourceError::from_api(self.kind(), Operation::Update, prior.id(), err)
        })?;
        tracing::debug!("API RESPONSE: update {} {}: {}", self.kind(), id, response.status);

        let id = self.written_id(Operation::Update, &response)?;
        let mut updated = planned;
        // the id should not change, but the server is authoritative
        updated.set_id(id.to_string());
        self.schema().seal_secrets(&mut updated);
        tracing::info!("Updated {} {}", self.kind(), updated.id());

        self.read(&updated).await
    }

    async fn delete(&self, state: &LocalState) -> Result<LocalState, ResourceError> {
        let mut deleted = state.clone();
        if !state.is_present() {
            tracing::debug!("{} has no id, nothing to delete", self.kind());
            return Ok(deleted);
        }
        let id = self.parse_id(state.id())?;

        match self.api.delete(id).await {
            Ok(response) => {
                tracing::debug!("API RESPONSE: delete {} {}: {}", self.kind(), id, response.status);
                tracing::info!("Deleted {} {}", self.kind(), id);
            }
            Err(err) if err.is_not_found() => {
                tracing::warn!("API 404: {} {} already gone: {}", self.kind(), id, err);
            }
            Err(err) => {
                tracing::error!("API FAILURE: delete {} {}: {}", self.kind(), id, err);
                return Err(ResourceError::Api {
                    kind: self.kind(),
                    operation: Operation::Delete,
                    source: err,
                });
            }
        }

        deleted.clear_id();
        Ok(deleted)
    }

    fn import_state(&self, id: &str) -> Result<LocalState, ResourceError> {
        self.parse_id(id)?;
        Ok(LocalState::with_id(id))
    }
}
