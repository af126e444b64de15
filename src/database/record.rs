use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// System fields that only the store may set, never API input
pub const SYSTEM_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

/// Errors that can occur during Record operations
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),
}

/// Current time in the wire format used for every record timestamp
pub fn timestamp() -> String {
    timestamp_of(Utc::now())
}

pub fn timestamp_of(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// An untyped record: a JSON object keyed by camelCase field names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create a new empty record
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Create record from API input JSON, dropping system fields
    pub fn from_api_input(json: Value) -> Result<Self, RecordError> {
        match json {
            Value::Object(map) => {
                let mut record = Self::new();
                for (key, value) in map {
                    record.set(key, value);
                }
                Ok(record)
            }
            _ => Err(RecordError::InvalidJson("Expected JSON object".to_string())),
        }
    }

    /// Create record from stored data (system fields allowed)
    pub fn from_stored(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Get field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Field value or JSON null when absent
    pub fn value_of(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&Value::Null)
    }

    /// Set field value, ignoring attempts to write system fields
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        if SYSTEM_FIELDS.contains(&key.as_str()) {
            tracing::warn!("Attempted to set system field '{}' - ignoring", key);
            return self;
        }
        self.0.insert(key, value.into());
        self
    }

    /// Set system field (store only)
    pub(crate) fn set_system_field(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Builder-style `set`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Remove field and return its value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Copy of the record without the given field
    pub fn without(mut self, key: &str) -> Self {
        self.0.remove(key);
        self
    }

    /// Shallow merge: every field of `patch` overwrites the same field here
    pub fn merge(&mut self, patch: Record) -> &mut Self {
        for (key, value) in patch.0 {
            self.set(key, value);
        }
        self
    }

    /// Fail when any field is absent, null, false or an empty string
    pub fn require(&self, fields: &[&str]) -> Result<(), RecordError> {
        for field in fields {
            let present = match self.get(field) {
                None | Some(Value::Null) | Some(Value::Bool(false)) => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            };
            if !present {
                return Err(RecordError::MissingRequiredField(field.to_string()));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    // ========================================
    // Standard field accessors
    // ========================================

    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    pub fn school_id(&self) -> Option<&str> {
        self.get_str("schoolId")
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get_str("userId")
    }

    /// `isActive` must be literally true
    pub fn is_active(&self) -> bool {
        self.get("isActive").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.datetime("createdAt")
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.datetime("updatedAt")
    }

    /// Parse an RFC 3339 field
    pub fn datetime(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get_str(key)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub(crate) fn touch_updated_at(&mut self) -> &mut Self {
        self.set_system_field("updatedAt", timestamp())
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.into_value()
    }
}
