//! Attributes shared by every option type input

use crate::morpheus::models::OptionType;
use crate::resource::mapper::string_array;
use crate::resource::schema::FieldSchema;
use crate::resource::state::LocalState;
use serde_json::{json, Value};

/// Fields common to checkbox and typeahead inputs. `field_name` and
/// `field_label` are left to the caller since their presence differs.
pub(crate) fn common_fields() -> Vec<FieldSchema> {
    vec![
        FieldSchema::string("name").required().describe("The name of the option type"),
        FieldSchema::string("description")
            .optional_computed()
            .describe("The description of the option type"),
        FieldSchema::string_set("labels")
            .optional_computed()
            .describe("The organization labels associated with the option type (Only supported on Morpheus 5.5.3 or higher)"),
        FieldSchema::bool("export_meta")
            .default(false)
            .describe("Whether to export the option type as a tag"),
        FieldSchema::string("dependent_field")
            .optional_computed()
            .describe("The field or code used to trigger the reloading of the field"),
        FieldSchema::string("visibility_field")
            .optional_computed()
            .describe("The field or code used to trigger the visibility of the field"),
        FieldSchema::string("require_field")
            .optional_computed()
            .describe("The field or code used to trigger the requirement of this field"),
        FieldSchema::bool("show_on_edit")
            .optional_computed()
            .describe("Whether the option type will display in the edit section of the provisioned resource"),
        FieldSchema::bool("editable")
            .optional_computed()
            .describe("Whether the value of the option type can be edited after the initial request"),
        FieldSchema::bool("display_value_on_details")
            .default(false)
            .describe("Display the selected value of the option type on the associated resource's details page"),
    ]
}

/// `optionType` body with the shared attributes filled in
pub(crate) fn common_payload(planned: &LocalState, input_type: &str) -> Value {
    json!({
        "name": planned.get_str("name"),
        "description": planned.get_str("description"),
        "labels": string_array(planned, "labels"),
        "type": input_type,
        "fieldName": planned.get_str("field_name"),
        "fieldLabel": planned.get_str("field_label"),
        "exportMeta": planned.get_bool("export_meta"),
        "dependsOnCode": planned.get_str("dependent_field"),
        "visibleOnCode": planned.get_str("visibility_field"),
        "requireOnCode": planned.get_str("require_field"),
        "showOnEdit": planned.get_bool("show_on_edit"),
        "editable": planned.get_bool("editable"),
        "displayValueOnDetails": planned.get_bool("display_value_on_details"),
    })
}

pub(crate) fn decode_common(entity: &OptionType, state: &mut LocalState) {
    state.set("name", entity.name.as_str());
    state.set("description", entity.description.as_str());
    state.set("labels", entity.labels.clone());
    state.set("field_name", entity.field_name.as_str());
    state.set("field_label", entity.field_label.as_str());
    state.set("export_meta", entity.export_meta);
    state.set("dependent_field", entity.depends_on_code.as_str());
    state.set("visibility_field", entity.visible_on_code.as_str());
    state.set("require_field", entity.require_on_code.as_str());
    state.set("show_on_edit", entity.show_on_edit);
    state.set("editable", entity.editable);
    state.set("display_value_on_details", entity.display_value_on_details);
}
