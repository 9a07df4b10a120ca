//! In-memory [`EntityApi`]
//!
//! Behaves like one Morpheus collection: numeric ids, envelope keys, 404 for
//! unknown ids, updates merged into the stored record. Every call is recorded so tests can
//! assert which remote operations a reconciler issued.

use crate::morpheus::api::{Collection, EntityApi};
use crate::morpheus::error::ApiError;
use crate::morpheus::http::ApiResponse;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Remote call as seen by the collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create,
    Get(i64),
    FindByName(String),
    Update(i64),
    Delete(i64),
}

type Normalizer = Box<dyn Fn(&mut Map<String, Value>) + Send + Sync>;

#[derive(Default)]
struct Inner {
    records: BTreeMap<i64, Map<String, Value>>,
    next_id: i64,
    calls: Vec<Call>,
    fail_next: Option<StatusCode>,
}

pub struct InMemoryApi {
    collection: Collection,
    inner: Mutex<Inner>,
    normalizer: Option<Normalizer>,
}

impl InMemoryApi {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            inner: Mutex::new(Inner {
                next_id: 1,
                ..Default::default()
            }),
            normalizer: None,
        }
    }

    /// Server-side rewrite applied to every stored record (defaults, hashing, ...)
    pub fn with_normalizer(
        mut self,
        normalizer: impl Fn(&mut Map<String, Value>) + Send + Sync + 'static,
    ) -> Self {
        self.normalizer = Some(Box::new(normalizer));
        self
    }

    /// Make the next call fail with `status`
    pub fn fail_next(&self, status: StatusCode) {
        self.lock().fail_next = Some(status);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn record(&self, id: i64) -> Option<Value> {
        self.lock().records.get(&id).cloned().map(Value::Object)
    }

    /// Store a record directly, bypassing the call log
    pub fn insert(&self, record: Value) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        let mut record = match record {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        record.insert("id".into(), json!(id));
        inner.records.insert(id, record);
        id
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Log the call and consume a pending injected failure
    fn begin(&self, call: Call) -> Result<MutexGuard<'_, Inner>, ApiError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        match inner.fail_next.take() {
            Some(status) => Err(ApiError::Status {
                status,
                message: "injected failure".into(),
            }),
            None => Ok(inner),
        }
    }

    fn not_found(id: i64) -> ApiError {
        ApiError::Status {
            status: StatusCode::NOT_FOUND,
            message: format!("record {} not found", id),
        }
    }

    fn envelope(&self, record: &Map<String, Value>) -> ApiResponse {
        let mut body = Map::new();
        body.insert("success".into(), Value::Bool(true));
        body.insert(
            self.collection.entity_key.into(),
            Value::Object(record.clone()),
        );
        ApiResponse {
            status: StatusCode::OK,
            body: Value::Object(body),
        }
    }

    fn payload_fields(&self, payload: &Value) -> Map<String, Value> {
        payload
            .get(self.collection.entity_key)
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default()
    }

    fn normalize(&self, record: &mut Map<String, Value>) {
        if let Some(normalizer) = &self.normalizer {
            normalizer(record);
        }
    }
}

/// Nested objects are merged key by key, everything else is replaced
fn merge(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match value {
            Value::Object(nested) if matches!(target.get(&key), Some(Value::Object(_))) => {
                if let Some(Value::Object(existing)) = target.get_mut(&key) {
                    merge(existing, nested);
                }
            }
            value => {
                target.insert(key, value);
            }
        }
    }
}

#[async_trait]
impl EntityApi for InMemoryApi {
    async fn create(&self, payload: &Value) -> Result<ApiResponse, ApiError> {
        let mut record = self.payload_fields(payload);
        self.normalize(&mut record);

        let mut inner = self.begin(Call::Create)?;
        let id = inner.next_id;
        inner.next_id += 1;
        record.insert("id".into(), json!(id));
        inner.records.insert(id, record.clone());
        Ok(self.envelope(&record))
    }

    async fn get(&self, id: i64) -> Result<ApiResponse, ApiError> {
        let inner = self.begin(Call::Get(id))?;
        match inner.records.get(&id) {
            Some(record) => Ok(self.envelope(record)),
            None => Err(Self::not_found(id)),
        }
    }

    async fn find_by_name(&self, name: &str) -> Result<ApiResponse, ApiError> {
        let inner = self.begin(Call::FindByName(name.to_string()))?;
        inner
            .records
            .values()
            .find(|r| r.get("name").and_then(|n| n.as_str()) == Some(name))
            .map(|record| self.envelope(record))
            .ok_or_else(|| ApiError::NameNotFound {
                collection: self.collection.list_key.to_string(),
                name: name.to_string(),
            })
    }

    async fn update(&self, id: i64, payload: &Value) -> Result<ApiResponse, ApiError> {
        let fields = self.payload_fields(payload);
        let mut inner = self.begin(Call::Update(id))?;
        let Some(record) = inner.records.get_mut(&id) else {
            return Err(Self::not_found(id));
        };
        merge(record, fields);
        self.normalize(record);
        Ok(self.envelope(record))
    }

    async fn delete(&self, id: i64) -> Result<ApiResponse, ApiError> {
        let mut inner = self.begin(Call::Delete(id))?;
        match inner.records.remove(&id) {
            Some(_) => Ok(ApiResponse {
                status: StatusCode::OK,
                body: json!({"success": true}),
            }),
            None => Err(Self::not_found(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_merges_nested_objects() {
        let api = InMemoryApi::new(Collection::TASKS);
        let id = api.insert(json!({"name": "t", "taskOptions": {"host": "a", "port": "5985"}}));

        api.update(id, &json!({"task": {"taskOptions": {"host": "b"}}}))
            .await
            .unwrap();

        let record = api.record(id).unwrap();
        assert_eq!(record["taskOptions"], json!({"host": "b", "port": "5985"}));
        assert_eq!(record["name"], "t");
        assert_eq!(api.calls(), vec![Call::Update(id)]);
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let api = InMemoryApi::new(Collection::OPTION_LISTS);
        let id = api.insert(json!({"name": "clouds"}));
        api.fail_next(StatusCode::BAD_GATEWAY);

        let err = api.get(id).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert!(api.get(id).await.is_ok());
        assert!(api.get(id + 1).await.unwrap_err().is_not_found());
    }
}
