//! `morpheus_powershell_script_task`: a `winrmTask` task
//!
//! The remote target password is write only. Morpheus answers with a
//! `passwordHash` instead, and local state keeps that digest; the schema's
//! [`DiffSuppress::Sha256Digest`] rule then treats the configured plaintext
//! as unchanged for as long as it hashes to the stored value.

use crate::morpheus::api::Collection;
use crate::morpheus::models::Task;
use crate::resource::mapper::{is_on, secret_digest, FieldMapper};
use crate::resource::schema::{ChangeSet, DiffSuppress, FieldSchema, Schema};
use crate::resource::state::LocalState;
use serde_json::{json, Map, Value};
use std::sync::OnceLock;

pub const TYPE_NAME: &str = "morpheus_powershell_script_task";

const TASK_TYPE_CODE: &str = "winrmTask";

const RESULT_TYPES: &[&str] = &["value", "keyValue", "json"];
const SOURCE_TYPES: &[&str] = &["local", "url", "repository"];
const EXECUTE_TARGETS: &[&str] = &["local", "remote", "resource"];

/// Remote target attributes: local field and `taskOptions` key
const REMOTE_TARGET: &[(&str, &str)] = &[
    ("remote_target_host", "host"),
    ("remote_target_port", "port"),
    ("remote_target_username", "username"),
    ("remote_target_password", "password"),
];

static SCHEMA: OnceLock<Schema> = OnceLock::new();

pub fn schema() -> &'static Schema {
    SCHEMA.get_or_init(|| {
        Schema::new(
            TYPE_NAME,
            "Provides a Morpheus powershell script task resource",
            vec![
                FieldSchema::string("name")
                    .required()
                    .describe("The name of the powershell script task"),
                FieldSchema::string("code")
                    .describe("The code of the powershell script task"),
                FieldSchema::string("result_type")
                    .one_of(RESULT_TYPES)
                    .describe("The expected result type (value, keyValue, json)"),
                FieldSchema::bool("elevated_shell")
                    .default(false)
                    .describe("Whether to run the script in an elevated shell"),
                FieldSchema::string("source_type")
                    .required()
                    .one_of(SOURCE_TYPES)
                    .describe("The source of the powershell script (local, url or repository)"),
                FieldSchema::string("script_content")
                    .describe("The content of the powershell script. Used when the local source type is specified"),
                FieldSchema::string("script_path")
                    .describe("The path of the powershell script, either the url or the path in the repository"),
                FieldSchema::int("repository_id")
                    .describe("The ID of the git repository integration"),
                FieldSchema::string("version_ref")
                    .describe("The git reference of the repository to pull (main, master, etc.)"),
                FieldSchema::string("execute_target")
                    .default("local")
                    .one_of(EXECUTE_TARGETS)
                    .describe("Where the script is executed (local, remote or resource)"),
                FieldSchema::string("remote_target_host")
                    .describe("The hostname or ip address of the remote target"),
                FieldSchema::string("remote_target_port")
                    .describe("The port used to connect to the remote target"),
                FieldSchema::string("remote_target_username")
                    .describe("The username of the user account used to authenticate to the remote target"),
                FieldSchema::string("remote_target_password")
                    .suppress_diff(DiffSuppress::Sha256Digest)
                    .sensitive()
                    .describe("The password of the user account used to authenticate to the remote target"),
                FieldSchema::bool("retryable")
                    .default(false)
                    .describe("Whether to retry the task if there is a failure"),
                FieldSchema::int("retry_count")
                    .default(5_i64)
                    .describe("The number of times to retry the task if there is a failure"),
                FieldSchema::int("retry_delay_seconds")
                    .default(10_i64)
                    .describe("The number of seconds to wait between retry attempts"),
                FieldSchema::bool("allow_custom_config")
                    .default(false)
                    .describe("Custom configuration data to pass during the execution of the shell script"),
            ],
        )
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PowerShellScriptTask;

impl PowerShellScriptTask {
    fn source_options(planned: &LocalState) -> Value {
        let mut file = Map::new();
        for (field, key) in [("script_content", "content"), ("script_path", "contentPath")] {
            let value = planned.get_str(field);
            if !value.is_empty() {
                file.insert(key.into(), json!(value));
            }
        }
        file.insert("contentRef".into(), json!(planned.get_str("version_ref")));
        file.insert(
            "repository".into(),
            json!({ "id": planned.get_int("repository_id") }),
        );
        file.insert("sourceType".into(), json!(planned.get_str("source_type")));
        Value::Object(file)
    }

    /// Remote target attributes go out when set on create and when changed on update
    fn task_options(planned: &LocalState, changes: Option<&ChangeSet>) -> Value {
        let mut options = Map::new();
        let elevated = if planned.get_bool("elevated_shell") {
            json!("on")
        } else {
            Value::Null
        };
        options.insert("winrm.elevated".into(), elevated);

        for (field, key) in REMOTE_TARGET {
            let value = planned.get_str(field);
            let send = match changes {
                None => !value.is_empty(),
                Some(changes) => changes.has_change(field),
            };
            if send {
                options.insert((*key).into(), json!(value));
            }
        }
        Value::Object(options)
    }
}

impl FieldMapper for PowerShellScriptTask {
    type Entity = Task;

    fn kind(&self) -> &'static str {
        "powershell script task"
    }

    fn schema(&self) -> &'static Schema {
        schema()
    }

    fn collection(&self) -> Collection {
        Collection::TASKS
    }

    fn encode(&self, planned: &LocalState, changes: Option<&ChangeSet>) -> Value {
        json!({
            "task": {
                "name": planned.get_str("name"),
                "code": planned.get_str("code"),
                "file": Self::source_options(planned),
                "taskType": { "code": TASK_TYPE_CODE },
                "taskOptions": Self::task_options(planned, changes),
                "resultType": planned.get_str("result_type"),
                "executeTarget": planned.get_str("execute_target"),
                "retryable": planned.get_bool("retryable"),
                "retryCount": planned.get_int("retry_count"),
                "retryDelaySeconds": planned.get_int("retry_delay_seconds"),
                "allowCustomConfig": planned.get_bool("allow_custom_config"),
            }
        })
    }

    fn decode(&self, entity: &Task, state: &mut LocalState) {
        let options = &entity.task_options;
        let file = &entity.file;

        state.set("name", entity.name.as_str());
        state.set("code", entity.code.as_str());
        state.set("result_type", entity.result_type.as_str());
        state.set("source_type", file.source_type.as_str());
        state.set("script_content", file.content.as_str());
        state.set("script_path", file.content_path.as_str());
        state.set("version_ref", file.content_ref.as_str());
        state.set("repository_id", file.repository.id);
        state.set("elevated_shell", is_on(&options.winrm_elevated));
        state.set("execute_target", entity.execute_target.as_str());
        state.set("remote_target_host", options.host.as_str());
        state.set("remote_target_port", options.port.as_str());
        state.set("remote_target_username", options.username.as_str());
        let password = secret_digest(
            &options.password_hash,
            state.get_str("remote_target_password"),
        );
        state.set("remote_target_password", password);
        state.set("retryable", entity.retryable);
        state.set("retry_count", entity.retry_count);
        state.set("retry_delay_seconds", entity.retry_delay_seconds);
        state.set("allow_custom_config", entity.allow_custom_config);
    }
}
