//! Typed Morpheus API records
//!
//! Only the attributes the provider reads back are modelled. Morpheus sends
//! `null` for many unset attributes, so scalars go through [`nullable`] and
//! land on their zero value instead of failing the whole decode.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize `null` (or a missing key, with `#[serde(default)]`) as `T::default()`
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Anything the API hands back with a numeric identity
pub trait RemoteEntity {
    fn id(&self) -> i64;
    fn name(&self) -> &str;
}

/// `/api/library/option-type-lists` record
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionList {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub api_type: String,
    #[serde(default, deserialize_with = "nullable")]
    pub visibility: String,
    #[serde(default, deserialize_with = "nullable")]
    pub translation_script: String,
    #[serde(default, deserialize_with = "nullable")]
    pub request_script: String,
}

impl RemoteEntity for OptionList {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Reference to another record by id
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdRef {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTypeConfig {
    /// `"on"` / `"off"`, older appliances also send `null`
    #[serde(default)]
    pub multi_select: Option<Value>,
}

/// `/api/library/option-types` record, shared by every input type
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionType {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub field_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub field_label: String,
    #[serde(default, deserialize_with = "nullable")]
    pub export_meta: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub depends_on_code: String,
    #[serde(default, deserialize_with = "nullable")]
    pub visible_on_code: String,
    #[serde(default, deserialize_with = "nullable")]
    pub require_on_code: String,
    #[serde(default, deserialize_with = "nullable")]
    pub show_on_edit: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub editable: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub display_value_on_details: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub place_holder: String,
    #[serde(default, deserialize_with = "nullable")]
    pub default_value: String,
    #[serde(default, deserialize_with = "nullable")]
    pub help_block: String,
    #[serde(default, deserialize_with = "nullable")]
    pub required: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub config: OptionTypeConfig,
    #[serde(default, deserialize_with = "nullable")]
    pub option_list: IdRef,
}

impl RemoteEntity for OptionType {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Execution options of a task; the key set depends on the task type
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOptions {
    #[serde(default, deserialize_with = "nullable")]
    pub host: String,
    #[serde(default, deserialize_with = "nullable")]
    pub port: String,
    #[serde(default, deserialize_with = "nullable")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable")]
    pub password_hash: String,
    #[serde(default, rename = "winrm.elevated", deserialize_with = "nullable")]
    pub winrm_elevated: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFile {
    #[serde(default, deserialize_with = "nullable")]
    pub source_type: String,
    #[serde(default, deserialize_with = "nullable")]
    pub content_ref: String,
    #[serde(default, deserialize_with = "nullable")]
    pub content_path: String,
    #[serde(default, deserialize_with = "nullable")]
    pub repository: IdRef,
    #[serde(default, deserialize_with = "nullable")]
    pub content: String,
}

/// `/api/tasks` record
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub code: String,
    #[serde(default, deserialize_with = "nullable")]
    pub task_options: TaskOptions,
    #[serde(default, deserialize_with = "nullable")]
    pub file: TaskFile,
    #[serde(default, deserialize_with = "nullable")]
    pub result_type: String,
    #[serde(default, deserialize_with = "nullable")]
    pub execute_target: String,
    #[serde(default, deserialize_with = "nullable")]
    pub retryable: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub retry_count: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub retry_delay_seconds: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub allow_custom_config: bool,
}

impl RemoteEntity for Task {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_type_tolerates_nulls() {
        let record: OptionType = serde_json::from_value(json!({
            "id": 41,
            "name": "size",
            "description": null,
            "labels": null,
            "type": "typeahead",
            "config": {"multiSelect": "on"},
            "optionList": null
        }))
        .unwrap();

        assert_eq!(record.id(), 41);
        assert_eq!(record.description, "");
        assert!(record.labels.is_empty());
        assert_eq!(record.option_list.id, 0);
        assert_eq!(record.config.multi_select, Some(json!("on")));
    }

    #[test]
    fn test_task_reads_nested_options() {
        let record: Task = serde_json::from_value(json!({
            "id": 9,
            "name": "reboot",
            "taskType": {"id": 3, "code": "winrmTask", "name": "PowerShell Script"},
            "taskOptions": {"winrm.elevated": "on", "passwordHash": "ABCD", "host": null},
            "file": {"sourceType": "local", "content": "Restart-Computer", "repository": null},
            "retryCount": 5,
            "dateCreated": "2024-03-01 10:00:00"
        }))
        .unwrap();

        assert_eq!(record.id(), 9);
        assert_eq!(record.task_options.winrm_elevated, "on");
        assert_eq!(record.task_options.password_hash, "ABCD");
        assert_eq!(record.task_options.host, "");
        assert_eq!(record.file.content, "Restart-Computer");
        assert_eq!(record.file.repository.id, 0);
        assert_eq!(record.retry_count, 5);
    }
}
