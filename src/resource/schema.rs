//! Resource schemas
//!
//! A [`Schema`] is the field table of one resource type. Besides describing
//! the fields it owns the host-side rules built on them: validation of user
//! configuration, planning (defaults and computed carry-over) and the diff
//! that decides whether an update is needed at all.

use super::error::ResourceError;
use super::state::{FieldValue, LocalState};
use serde::Serialize;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `input`
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Bool,
    Int,
    StringSet,
}

impl FieldKind {
    pub fn zero_value(self) -> FieldValue {
        match self {
            Self::String => FieldValue::String(String::new()),
            Self::Bool => FieldValue::Bool(false),
            Self::Int => FieldValue::Int(0),
            Self::StringSet => FieldValue::Set(Default::default()),
        }
    }

    fn accepts(self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (Self::String, FieldValue::String(_))
                | (Self::Bool, FieldValue::Bool(_))
                | (Self::Int, FieldValue::Int(_))
                | (Self::StringSet, FieldValue::Set(_))
        )
    }
}

/// Who supplies a field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
    /// Set by the remote side only
    Computed,
    /// Optional; when unset the remote value is kept
    OptionalComputed,
}

/// How two differing values of a field may still count as unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffSuppress {
    /// Stored value is the hex SHA-256 of the configured plaintext
    Sha256Digest,
}

impl DiffSuppress {
    pub fn suppresses(self, stored: &FieldValue, candidate: &FieldValue) -> bool {
        match self {
            Self::Sha256Digest => match (stored.as_str(), candidate.as_str()) {
                (Some(stored), Some(candidate)) => {
                    stored.eq_ignore_ascii_case(&sha256_hex(candidate))
                }
                _ => false,
            },
        }
    }
}

/// One row of a field table
#[derive(Debug, Clone, Serialize)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_of: Option<&'static [&'static str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_suppress: Option<DiffSuppress>,
    pub sensitive: bool,
}

impl FieldSchema {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            presence: Presence::Optional,
            description: "",
            default: None,
            one_of: None,
            diff_suppress: None,
            sensitive: false,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn bool(name: &'static str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn int(name: &'static str) -> Self {
        Self::new(name, FieldKind::Int)
    }

    pub fn string_set(name: &'static str) -> Self {
        Self::new(name, FieldKind::StringSet)
    }

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    pub fn computed(mut self) -> Self {
        self.presence = Presence::Computed;
        self
    }

    pub fn optional_computed(mut self) -> Self {
        self.presence = Presence::OptionalComputed;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.one_of = Some(allowed);
        self
    }

    pub fn suppress_diff(mut self, rule: DiffSuppress) -> Self {
        self.diff_suppress = Some(rule);
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    fn check(&self, value: &FieldValue, problems: &mut Vec<String>) {
        if !self.kind.accepts(value) {
            problems.push(format!(
                "{}: expected {:?}, got {}",
                self.name,
                self.kind,
                value.type_name()
            ));
            return;
        }
        if let (Some(allowed), Some(s)) = (self.one_of, value.as_str()) {
            if !allowed.contains(&s) {
                problems.push(format!(
                    "{}: expected one of [{}], got {:?}",
                    self.name,
                    allowed.join(", "),
                    s
                ));
            }
        }
    }
}

/// Field table and metadata of one resource type
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub type_name: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn new(type_name: &'static str, description: &'static str, fields: Vec<FieldSchema>) -> Self {
        Self {
            type_name,
            description,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check user configuration against the field table, reporting every problem at once
    pub fn validate(&self, config: &LocalState) -> Result<(), ResourceError> {
        let mut problems = Vec::new();

        for (name, _) in config.fields() {
            if self.field(name).is_none() {
                problems.push(format!("{}: unknown field", name));
            }
        }

        for field in &self.fields {
            match (config.get(field.name), field.presence) {
                (Some(_), Presence::Computed) => {
                    problems.push(format!("{}: computed field cannot be set", field.name))
                }
                (Some(value), _) => field.check(value, &mut problems),
                (None, Presence::Required) => {
                    problems.push(format!("{}: is required", field.name))
                }
                (None, _) => {}
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ResourceError::InvalidConfig(problems))
        }
    }

    /// Desired state for `config`: defaults filled in, unset computed
    /// fields carried over from `prior`
    pub fn plan(&self, prior: Option<&LocalState>, config: &LocalState) -> LocalState {
        let mut planned = LocalState::with_id(prior.map(LocalState::id).unwrap_or_default());

        for field in &self.fields {
            let value = config.get(field.name).cloned().or_else(|| {
                if let Some(default) = &field.default {
                    return Some(default.clone());
                }
                match field.presence {
                    Presence::Computed | Presence::OptionalComputed => {
                        prior.and_then(|p| p.get(field.name)).cloned()
                    }
                    _ => None,
                }
            });

            if let Some(value) = value {
                planned.set(field.name, value);
            }
        }

        planned
    }

    /// Replace configured plaintext of digest-compared fields with its
    /// digest. Applied once, where planned values become stored state.
    pub fn seal_secrets(&self, state: &mut LocalState) {
        for field in &self.fields {
            if field.diff_suppress != Some(DiffSuppress::Sha256Digest) {
                continue;
            }
            let digest = match state.get(field.name).and_then(FieldValue::as_str) {
                Some(plaintext) if !plaintext.is_empty() => sha256_hex(plaintext),
                _ => continue,
            };
            state.set(field.name, digest);
        }
    }

    /// Fields whose value differs between `prior` and `planned`
    pub fn diff(&self, prior: &LocalState, planned: &LocalState) -> ChangeSet {
        let mut changes = Vec::new();

        for field in &self.fields {
            let zero = field.kind.zero_value();
            let old = prior.get(field.name).unwrap_or(&zero);
            let new = planned.get(field.name).unwrap_or(&zero);

            if old == new {
                continue;
            }
            if let Some(rule) = field.diff_suppress {
                if rule.suppresses(old, new) {
                    tracing::debug!("{}.{}: diff suppressed", self.type_name, field.name);
                    continue;
                }
            }

            changes.push(FieldChange {
                field: field.name,
                sensitive: field.sensitive,
                old: old.clone(),
                new: new.clone(),
            });
        }

        ChangeSet { changes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub sensitive: bool,
    pub old: FieldValue,
    pub new: FieldValue,
}

/// Result of [`Schema::diff`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn has_change(&self, field: &str) -> bool {
        self.changes.iter().any(|c| c.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.changes.iter()
    }

    /// JSON rendering with sensitive values masked
    pub fn to_report(&self) -> Value {
        let mut report = Map::new();
        for change in &self.changes {
            let entry = if change.sensitive {
                json!({"old": "(sensitive)", "new": "(sensitive)"})
            } else {
                json!({"old": change.old, "new": change.new})
            };
            report.insert(change.field.to_string(), entry);
        }
        Value::Object(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(
            "test_resource",
            "",
            vec![
                FieldSchema::string("name").required(),
                FieldSchema::string("description").optional_computed(),
                FieldSchema::string("visibility")
                    .default("private")
                    .one_of(&["private", "public", ""]),
                FieldSchema::bool("editable"),
                FieldSchema::int("retry_count").default(5_i64),
                FieldSchema::string_set("labels").optional_computed(),
                FieldSchema::string("password")
                    .suppress_diff(DiffSuppress::Sha256Digest)
                    .sensitive(),
            ],
        )
    }

    #[test]
    fn test_sha256_hex_is_lowercase_and_fixed_length() {
        let digest = sha256_hex("S3cr3t!");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_validate_reports_all_problems() {
        let config = LocalState::new()
            .with("visibility", "everyone")
            .with("editable", "yes")
            .with("colour", "red");

        let Err(ResourceError::InvalidConfig(problems)) = schema().validate(&config) else {
            panic!("expected invalid configuration");
        };
        assert_eq!(problems.len(), 4);
        assert!(problems.iter().any(|p| p.starts_with("name: is required")));
        assert!(problems.iter().any(|p| p.starts_with("visibility: expected one of")));
        assert!(problems.iter().any(|p| p.starts_with("editable: expected Bool")));
        assert!(problems.iter().any(|p| p.starts_with("colour: unknown field")));
    }

    #[test]
    fn test_plan_applies_defaults_and_keeps_computed() {
        let prior = LocalState::with_id("3")
            .with("name", "old")
            .with("description", "from server")
            .with("editable", true);
        let config = LocalState::new().with("name", "new");

        let planned = schema().plan(Some(&prior), &config);

        assert_eq!(planned.id(), "3");
        assert_eq!(planned.get_str("name"), "new");
        assert_eq!(planned.get_str("visibility"), "private");
        assert_eq!(planned.get_int("retry_count"), 5);
        // optional + computed and unset: remote value wins
        assert_eq!(planned.get_str("description"), "from server");
        // plain optional and unset: back to zero
        assert!(!planned.contains("editable"));
    }

    #[test]
    fn test_diff_treats_missing_as_zero() {
        let schema = schema();
        let prior = LocalState::with_id("3")
            .with("name", "n")
            .with("visibility", "private")
            .with("retry_count", 5_i64)
            .with("editable", false);
        let planned = schema.plan(Some(&prior), &LocalState::new().with("name", "n"));

        assert!(schema.diff(&prior, &planned).is_empty());
    }

    #[test]
    fn test_diff_suppresses_matching_digest() {
        let schema = schema();
        let prior = LocalState::with_id("3")
            .with("name", "n")
            .with("visibility", "private")
            .with("retry_count", 5_i64)
            .with("password", sha256_hex("S3cr3t!").to_uppercase());

        let same = LocalState::new().with("name", "n").with("password", "S3cr3t!");
        let planned = schema.plan(Some(&prior), &same);
        assert!(schema.diff(&prior, &planned).is_empty());

        let other = LocalState::new().with("name", "n").with("password", "hunter2");
        let planned = schema.plan(Some(&prior), &other);
        let changes = schema.diff(&prior, &planned);
        assert!(changes.has_change("password"));
        assert_eq!(changes.iter().count(), 1);
        assert_eq!(changes.to_report()["password"]["new"], "(sensitive)");
    }

    #[test]
    fn test_seal_secrets_hashes_hex_looking_plaintext_too() {
        let hex_plaintext = "ab".repeat(32);
        let mut state = LocalState::new()
            .with("name", "n")
            .with("password", hex_plaintext.as_str());

        schema().seal_secrets(&mut state);

        assert_eq!(state.get_str("password"), sha256_hex(&hex_plaintext));
        assert_eq!(state.get_str("name"), "n");

        let mut empty = LocalState::new().with("password", "");
        schema().seal_secrets(&mut empty);
        assert_eq!(empty.get_str("password"), "");
    }
}
