//! `morpheus_checkbox_option_type`

use super::option_type::{common_fields, common_payload, decode_common};
use crate::morpheus::api::Collection;
use crate::morpheus::models::OptionType;
use crate::resource::mapper::{is_on, on_off, FieldMapper};
use crate::resource::schema::{ChangeSet, FieldSchema, Schema};
use crate::resource::state::LocalState;
use serde_json::{json, Value};
use std::sync::OnceLock;

pub const TYPE_NAME: &str = "morpheus_checkbox_option_type";

static SCHEMA: OnceLock<Schema> = OnceLock::new();

pub fn schema() -> &'static Schema {
    SCHEMA.get_or_init(|| {
        let mut fields = common_fields();
        fields.extend([
            FieldSchema::string("field_name")
                .required()
                .describe("The field name of the checkbox option type"),
            FieldSchema::string("field_label")
                .required()
                .describe("The label associated with the field in the UI"),
            FieldSchema::bool("default_checked")
                .optional_computed()
                .describe("Whether the checkbox option type is checked by default"),
        ]);
        Schema::new(
            TYPE_NAME,
            "Provides a Morpheus checkbox option type resource",
            fields,
        )
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckboxOptionType;

impl FieldMapper for CheckboxOptionType {
    type Entity = OptionType;

    fn kind(&self) -> &'static str {
        "checkbox option type"
    }

    fn schema(&self) -> &'static Schema {
        schema()
    }

    fn collection(&self) -> Collection {
        Collection::OPTION_TYPES
    }

    fn encode(&self, planned: &LocalState, _changes: Option<&ChangeSet>) -> Value {
        let mut body = common_payload(planned, "checkbox");
        body["defaultValue"] = json!(on_off(planned.get_bool("default_checked")));
        json!({ "optionType": body })
    }

    fn decode(&self, entity: &OptionType, state: &mut LocalState) {
        decode_common(entity, state);
        state.set("default_checked", is_on(&entity.default_value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LocalState {
        LocalState::new()
            .with("name", "tf-checkbox")
            .with("field_name", "agree")
            .with("field_label", "I agree")
    }

    #[test]
    fn test_default_checked_is_sent_as_on_off() {
        let planned = schema().plan(None, &config().with("default_checked", true));
        let body = CheckboxOptionType.encode(&planned, None);
        assert_eq!(body["optionType"]["defaultValue"], "on");
        assert_eq!(body["optionType"]["type"], "checkbox");
        assert_eq!(body["optionType"]["labels"], json!([]));

        let planned = schema().plan(None, &config());
        let body = CheckboxOptionType.encode(&planned, None);
        assert_eq!(body["optionType"]["defaultValue"], "off");
    }

    #[test]
    fn test_anything_but_on_decodes_unchecked() {
        for (remote, expected) in [("on", true), ("off", false), ("", false), ("true", false)] {
            let entity = OptionType {
                id: 7,
                default_value: remote.to_string(),
                ..Default::default()
            };
            let mut state = LocalState::new();
            CheckboxOptionType.decode(&entity, &mut state);
            assert_eq!(state.get_bool("default_checked"), expected, "remote {:?}", remote);
        }
    }

    #[test]
    fn test_field_label_is_required() {
        let config = LocalState::new().with("name", "x").with("field_name", "y");
        assert!(schema().validate(&config).is_err());
    }
}
