//! `morpheus_api_option_list`: an option list fed by a Morpheus object listing

use crate::morpheus::api::Collection;
use crate::morpheus::models::OptionList;
use crate::resource::mapper::FieldMapper;
use crate::resource::schema::{ChangeSet, FieldSchema, Schema};
use crate::resource::state::LocalState;
use serde_json::{json, Value};
use std::sync::OnceLock;

pub const TYPE_NAME: &str = "morpheus_api_option_list";

const VISIBILITIES: &[&str] = &["private", "public", ""];

const OBJECT_LISTS: &[&str] = &[
    "clouds",
    "instanceTypeClouds",
    "environments",
    "groups",
    "instances",
    "instance-wiki",
    "networks",
    "instanceNetworks",
    "servicePlans",
    "resourcePools",
    "securityGroups",
    "servers",
    "server-wiki",
];

static SCHEMA: OnceLock<Schema> = OnceLock::new();

pub fn schema() -> &'static Schema {
    SCHEMA.get_or_init(|| {
        Schema::new(
            TYPE_NAME,
            "Provides a Morpheus api option list resource.",
            vec![
                FieldSchema::string("name")
                    .required()
                    .describe("The name of the option list"),
                FieldSchema::string("description")
                    .describe("The description of the option list"),
                FieldSchema::string("visibility")
                    .default("private")
                    .one_of(VISIBILITIES)
                    .describe("Whether the option list is visible in sub-tenants or not"),
                FieldSchema::string("option_list")
                    .optional_computed()
                    .one_of(OBJECT_LISTS)
                    .describe("The Morpheus object option list"),
                FieldSchema::string("translation_script")
                    .optional_computed()
                    .describe("A js script to translate the result data object into an Array containing objects with properties 'name' and 'value'."),
                FieldSchema::string("request_script")
                    .optional_computed()
                    .describe("A js script to manipulate the request payload."),
            ],
        )
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApiOptionList;

impl FieldMapper for ApiOptionList {
    type Entity = OptionList;

    fn kind(&self) -> &'static str {
        "option list"
    }

    fn schema(&self) -> &'static Schema {
        schema()
    }

    fn collection(&self) -> Collection {
        Collection::OPTION_LISTS
    }

    fn encode(&self, planned: &LocalState, _changes: Option<&ChangeSet>) -> Value {
        json!({
            "optionTypeList": {
                "name": planned.get_str("name"),
                "description": planned.get_str("description"),
                "type": "api",
                "apiType": planned.get_str("option_list"),
                "visibility": planned.get_str("visibility"),
                "translationScript": planned.get_str("translation_script"),
                "requestScript": planned.get_str("request_script"),
            }
        })
    }

    fn decode(&self, entity: &OptionList, state: &mut LocalState) {
        state.set("name", entity.name.as_str());
        state.set("description", entity.description.as_str());
        state.set("visibility", entity.visibility.as_str());
        state.set("option_list", entity.api_type.as_str());
        state.set("translation_script", entity.translation_script.as_str());
        state.set("request_script", entity.request_script.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uses_api_list_type() {
        let planned = schema().plan(
            None,
            &LocalState::new()
                .with("name", "clouds")
                .with("option_list", "clouds"),
        );
        let body = ApiOptionList.encode(&planned, None);

        assert_eq!(body["optionTypeList"]["type"], "api");
        assert_eq!(body["optionTypeList"]["apiType"], "clouds");
        assert_eq!(body["optionTypeList"]["visibility"], "private");
        assert_eq!(body["optionTypeList"]["translationScript"], "");
    }

    #[test]
    fn test_unknown_object_list_is_rejected() {
        let config = LocalState::new()
            .with("name", "x")
            .with("option_list", "volumes");
        assert!(schema().validate(&config).is_err());
    }
}
