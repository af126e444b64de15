use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use super::collection::Collection;
use super::record::{timestamp, Record};
use crate::filter::Filter;

/// Errors raised by store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{collection} with id {id} not found")]
    NotFound { collection: String, id: String },
    #[error("{0}")]
    Seed(String),
}

impl StoreError {
    fn not_found(collection: Collection, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.name().to_string(),
            id: id.to_string(),
        }
    }
}

/// Per-school counts shown on dashboards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolStats {
    pub total_students: usize,
    pub total_teachers: usize,
    pub total_classes: usize,
    pub active_students: usize,
    pub active_teachers: usize,
}

type Tables = HashMap<Collection, HashMap<String, Record>>;

/// In-memory collection store shared by every request.
///
/// Each operation holds the lock for its own duration only; there are no
/// transactions and concurrent writers to one record are last-write-wins.
#[derive(Clone, Default)]
pub struct Store {
    tables: Arc<RwLock<Tables>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record with a generated id and fresh timestamps
    pub async fn create(&self, collection: Collection, mut record: Record) -> Record {
        let id = collection.generate_id();
        let now = timestamp();
        record
            .set_system_field("id", id.clone())
            .set_system_field("createdAt", now.clone())
            .set_system_field("updatedAt", now);

        let mut tables = self.tables.write().await;
        tables.entry(collection).or_default().insert(id, record.clone());
        tracing::debug!(collection = %collection, id = record.id().unwrap_or_default(), "record created");
        record
    }

    /// Insert or replace a record under a caller-chosen id.
    ///
    /// Timestamps already present on the record are kept; missing ones are stamped.
    pub async fn put(&self, collection: Collection, id: impl Into<String>, mut record: Record) -> Record {
        let id = id.into();
        let now = timestamp();
        record.set_system_field("id", id.clone());
        if record.get("createdAt").is_none() {
            record.set_system_field("createdAt", now.clone());
        }
        if record.get("updatedAt").is_none() {
            record.set_system_field("updatedAt", now);
        }

        let mut tables = self.tables.write().await;
        tables.entry(collection).or_default().insert(id, record.clone());
        record
    }

    pub async fn find_by_id(&self, collection: Collection, id: &str) -> Option<Record> {
        let tables = self.tables.read().await;
        tables.get(&collection).and_then(|t| t.get(id)).cloned()
    }

    /// All matching records, oldest first
    pub async fn find(&self, collection: Collection, filter: &Filter) -> Vec<Record> {
        let tables = self.tables.read().await;
        let mut records: Vec<Record> = tables
            .get(&collection)
            .map(|t| t.values().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        drop(tables);

        records.sort_by(creation_order);
        records
    }

    pub async fn count(&self, collection: Collection, filter: &Filter) -> usize {
        let tables = self.tables.read().await;
        tables
            .get(&collection)
            .map(|t| t.values().filter(|r| filter.matches(r)).count())
            .unwrap_or(0)
    }

    /// Shallow-merge `patch` into the stored record and bump `updatedAt`
    pub async fn update(&self, collection: Collection, id: &str, patch: Record) -> Result<Record, StoreError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .get_mut(&collection)
            .and_then(|t| t.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        record.merge(patch);
        record.touch_updated_at();
        Ok(record.clone())
    }

    /// Remove a record, returning what was stored
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<Record, StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .get_mut(&collection)
            .and_then(|t| t.remove(id))
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    // ========================================
    // Domain helpers
    // ========================================

    pub async fn school_stats(&self, school_id: &str) -> SchoolStats {
        let by_school = Filter::new().eq("schoolId", school_id);
        let students = self.find(Collection::Students, &by_school).await;
        let teachers = self.find(Collection::Teachers, &by_school).await;

        SchoolStats {
            total_students: students.len(),
            total_teachers: teachers.len(),
            total_classes: self.count(Collection::Classes, &by_school).await,
            active_students: students.iter().filter(|s| s.is_active()).count(),
            active_teachers: teachers.iter().filter(|t| t.is_active()).count(),
        }
    }

    pub async fn user_by_email(&self, email: &str) -> Option<Record> {
        let filter = Filter::new().eq("email", email);
        self.find(Collection::Users, &filter).await.into_iter().next()
    }

    pub async fn users_by_school(&self, school_id: &str) -> Vec<Record> {
        self.find(Collection::Users, &Filter::new().eq("schoolId", school_id)).await
    }

    /// Whether any record in the collection has `field == value`
    pub async fn exists(&self, collection: Collection, field: &str, value: impl Into<Value>) -> bool {
        self.count(collection, &Filter::new().eq(field, value)).await > 0
    }
}

fn creation_order(a: &Record, b: &Record) -> Ordering {
    let by_time = match (a.created_at(), b.created_at()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.value_of("createdAt").as_str().cmp(&b.value_of("createdAt").as_str()),
    };
    by_time.then_with(|| a.id().cmp(&b.id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(school: &str, name: &str) -> Record {
        Record::new().with("schoolId", school).with("name", name).with("isActive", true)
    }

    #[tokio::test]
    async fn create_stamps_system_fields() {
        let store = Store::new();
        let record = store.create(Collection::Students, student("school-1", "Emma")).await;
        assert!(record.id().unwrap().starts_with("student-"));
        assert!(record.created_at().is_some());
        assert_eq!(record.get("createdAt"), record.get("updatedAt"));
    }

    #[tokio::test]
    async fn find_returns_creation_order() {
        let store = Store::new();
        for name in ["a", "b", "c"] {
            store.create(Collection::Students, student("school-1", name)).await;
        }
        store.create(Collection::Students, student("school-2", "x")).await;

        let found = store
            .find(Collection::Students, &Filter::new().eq("schoolId", "school-1"))
            .await;
        let names: Vec<_> = found.iter().filter_map(|r| r.get_str("name")).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn update_merges_and_bumps_updated_at() {
        let store = Store::new();
        let created = store.create(Collection::Students, student("school-1", "Emma")).await;
        let id = created.id().unwrap().to_string();

        let patch = Record::from_api_input(serde_json::json!({ "grade": "11", "id": "hijack" })).unwrap();
        let updated = store.update(Collection::Students, &id, patch).await.unwrap();

        assert_eq!(updated.id(), Some(id.as_str()));
        assert_eq!(updated.get_str("name"), Some("Emma"));
        assert_eq!(updated.get_str("grade"), Some("11"));
        assert!(updated.updated_at() >= created.updated_at());
        assert_eq!(updated.get("createdAt"), created.get("createdAt"));
    }

    #[tokio::test]
    async fn missing_records_report_not_found() {
        let store = Store::new();
        let err = store.update(Collection::Classes, "class-x", Record::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "classes with id class-x not found");
        assert!(store.delete(Collection::Classes, "class-x").await.is_err());
    }

    #[tokio::test]
    async fn delete_returns_removed_record() {
        let store = Store::new();
        let created = store.create(Collection::Documents, Record::new().with("title", "t")).await;
        let id = created.id().unwrap();
        let removed = store.delete(Collection::Documents, id).await.unwrap();
        assert_eq!(removed, created);
        assert!(store.find_by_id(Collection::Documents, id).await.is_none());
    }

    #[tokio::test]
    async fn put_replaces_under_composite_key() {
        let store = Store::new();
        let key = "attendance-class-1-2024-12-01";
        store.put(Collection::Attendance, key, Record::new().with("records", 1)).await;
        store.put(Collection::Attendance, key, Record::new().with("records", 2)).await;

        let all = store.find(Collection::Attendance, &Filter::new()).await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("records"), Some(&Value::from(2)));
    }

    #[tokio::test]
    async fn school_stats_counts_active_members() {
        let store = Store::new();
        store.create(Collection::Students, student("school-1", "a")).await;
        store
            .create(Collection::Students, student("school-1", "b").with("isActive", false))
            .await;
        store.create(Collection::Teachers, student("school-1", "t")).await;
        store.create(Collection::Classes, Record::new().with("schoolId", "school-2")).await;

        let stats = store.school_stats("school-1").await;
        assert_eq!(stats.total_students, 2);
        assert_eq!(stats.active_students, 1);
        assert_eq!(stats.total_teachers, 1);
        assert_eq!(stats.total_classes, 0);
    }
}
