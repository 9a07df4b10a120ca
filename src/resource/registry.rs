//! Resource Registry
//!
//! Maps resource type names to their schema and, once a client is
//! available, to a [`ResourceHandler`] wired to that client.

use super::error::ResourceError;
use super::mapper::FieldMapper;
use super::reconciler::{Reconciler, ResourceHandler};
use super::schema::Schema;
use crate::morpheus::api::{EntityApi, RestEndpoint};
use crate::morpheus::client::MorpheusClient;
use crate::resources::{ApiOptionList, CheckboxOptionType, PowerShellScriptTask, TypeaheadOptionType};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Schemas of every supported resource type, keyed by type name
static SCHEMAS: OnceLock<BTreeMap<&'static str, &'static Schema>> = OnceLock::new();

pub fn get_schemas() -> &'static BTreeMap<&'static str, &'static Schema> {
    SCHEMAS.get_or_init(|| {
        [
            crate::resources::api_option_list::schema(),
            crate::resources::checkbox_option_type::schema(),
            crate::resources::typeahead_option_type::schema(),
            crate::resources::powershell_script_task::schema(),
        ]
        .into_iter()
        .map(|schema| (schema.type_name, schema))
        .collect()
    })
}

/// Get a schema by resource type name
pub fn get_schema(type_name: &str) -> Option<&'static Schema> {
    get_schemas().get(type_name).copied()
}

/// All resource type names, sorted
pub fn get_all_type_names() -> Vec<&'static str> {
    get_schemas().keys().copied().collect()
}

/// Handlers bound to one Morpheus client
#[derive(Default)]
pub struct ResourceRegistry {
    handlers: BTreeMap<&'static str, Box<dyn ResourceHandler>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every supported resource type, talking to `client`
    pub fn for_client(client: &MorpheusClient) -> Self {
        let mut registry = Self::new();
        registry.register_with(ApiOptionList, client);
        registry.register_with(CheckboxOptionType, client);
        registry.register_with(TypeaheadOptionType, client);
        registry.register_with(PowerShellScriptTask, client);
        registry
    }

    fn register_with<M>(&mut self, mapper: M, client: &MorpheusClient)
    where
        M: FieldMapper + 'static,
    {
        let endpoint = RestEndpoint::new(client.clone(), mapper.collection());
        self.register(mapper, endpoint);
    }

    /// Bind `mapper` to `api` under the mapper's type name
    pub fn register<M, A>(&mut self, mapper: M, api: A)
    where
        M: FieldMapper + 'static,
        A: EntityApi + 'static,
    {
        let type_name = mapper.schema().type_name;
        tracing::debug!("Registering resource type {}", type_name);
        self.handlers
            .insert(type_name, Box::new(Reconciler::new(mapper, api)));
    }

    pub fn get(&self, type_name: &str) -> Result<&dyn ResourceHandler, ResourceError> {
        self.handlers
            .get(type_name)
            .map(|handler| handler.as_ref())
            .ok_or_else(|| ResourceError::UnknownResource(type_name.to_string()))
    }

    pub fn type_names(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }
}
