//! `morpheus_typeahead_option_type`

use super::option_type::{common_fields, common_payload, decode_common};
use crate::morpheus::api::Collection;
use crate::morpheus::models::OptionType;
use crate::resource::mapper::{is_on_value, on_off, FieldMapper};
use crate::resource::schema::{ChangeSet, FieldSchema, Schema};
use crate::resource::state::LocalState;
use serde_json::{json, Value};
use std::sync::OnceLock;

pub const TYPE_NAME: &str = "morpheus_typeahead_option_type";

static SCHEMA: OnceLock<Schema> = OnceLock::new();

pub fn schema() -> &'static Schema {
    SCHEMA.get_or_init(|| {
        let mut fields = common_fields();
        fields.extend([
            FieldSchema::string("field_name")
                .optional_computed()
                .describe("The field name of the typeahead option type"),
            FieldSchema::string("field_label")
                .optional_computed()
                .describe("The label associated with the field in the UI"),
            FieldSchema::string("placeholder")
                .optional_computed()
                .describe("Text in the field used as a placeholder for example purposes"),
            FieldSchema::string("default_value")
                .optional_computed()
                .describe("The default value of the option type"),
            FieldSchema::string("help_block")
                .optional_computed()
                .describe("Text that provides additional details about the use of the option type"),
            FieldSchema::int("option_list_id")
                .optional_computed()
                .describe("The ID of the associated option list"),
            FieldSchema::bool("allow_multiple_selections")
                .optional_computed()
                .describe("Whether to allow multiple options to be select"),
            FieldSchema::bool("required")
                .default(false)
                .describe("Whether the option type is required"),
        ]);
        Schema::new(
            TYPE_NAME,
            "Provides a Morpheus typeahead option type resource",
            fields,
        )
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeaheadOptionType;

impl FieldMapper for TypeaheadOptionType {
    type Entity = OptionType;

    fn kind(&self) -> &'static str {
        "typeahead option type"
    }

    fn schema(&self) -> &'static Schema {
        schema()
    }

    fn collection(&self) -> Collection {
        Collection::OPTION_TYPES
    }

    fn encode(&self, planned: &LocalState, _changes: Option<&ChangeSet>) -> Value {
        let mut body = common_payload(planned, "typeahead");
        body["defaultValue"] = json!(planned.get_str("default_value"));
        body["placeHolder"] = json!(planned.get_str("placeholder"));
        body["helpBlock"] = json!(planned.get_str("help_block"));
        body["required"] = json!(planned.get_bool("required"));
        body["config"] = json!({
            "multiSelect": on_off(planned.get_bool("allow_multiple_selections")),
        });
        body["optionList"] = json!({ "id": planned.get_int("option_list_id") });
        json!({ "optionType": body })
    }

    fn decode(&self, entity: &OptionType, state: &mut LocalState) {
        decode_common(entity, state);
        state.set("placeholder", entity.place_holder.as_str());
        state.set("default_value", entity.default_value.as_str());
        state.set("help_block", entity.help_block.as_str());
        state.set("option_list_id", entity.option_list.id);
        state.set(
            "allow_multiple_selections",
            is_on_value(entity.config.multi_select.as_ref()),
        );
        state.set("required", entity.required);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morpheus::models::{IdRef, OptionTypeConfig};

    #[test]
    fn test_encode_nests_config_and_option_list() {
        let config = LocalState::new()
            .with("name", "tf-typeahead")
            .with("placeholder", "pick one")
            .with("option_list_id", 12_i64)
            .with("allow_multiple_selections", true);
        let planned = schema().plan(None, &config);
        let body = TypeaheadOptionType.encode(&planned, None);
        let option_type = &body["optionType"];

        assert_eq!(option_type["type"], "typeahead");
        assert_eq!(option_type["placeHolder"], "pick one");
        assert_eq!(option_type["config"]["multiSelect"], "on");
        assert_eq!(option_type["optionList"]["id"], 12);
        assert_eq!(option_type["required"], false);
    }

    #[test]
    fn test_decode_multi_select_sentinel() {
        let mut entity = OptionType {
            id: 3,
            name: "tf-typeahead".into(),
            option_list: IdRef { id: 12 },
            config: OptionTypeConfig {
                multi_select: Some(json!("off")),
            },
            ..Default::default()
        };
        let mut state = LocalState::new();
        TypeaheadOptionType.decode(&entity, &mut state);
        assert!(!state.get_bool("allow_multiple_selections"));
        assert_eq!(state.get_int("option_list_id"), 12);

        entity.config.multi_select = Some(json!("on"));
        TypeaheadOptionType.decode(&entity, &mut state);
        assert!(state.get_bool("allow_multiple_selections"));

        entity.config.multi_select = None;
        TypeaheadOptionType.decode(&entity, &mut state);
        assert!(!state.get_bool("allow_multiple_selections"));
    }

    #[test]
    fn test_only_name_is_required() {
        let config = LocalState::new().with("name", "x");
        assert!(schema().validate(&config).is_ok());
    }
}
