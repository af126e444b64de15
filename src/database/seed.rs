// database/seed.rs - sample data loaded into a fresh store
//
// The fixture is a YAML map of collection name to a list of records. Records
// carry their own ids and creation timestamps. User passwords are written in
// plain text in the fixture and hashed on load.

use std::collections::BTreeMap;

use serde_json::Value;

use super::collection::Collection;
use super::record::Record;
use super::store::{Store, StoreError};
use crate::auth::password;

const SAMPLE_FIXTURE: &str = include_str!("../../fixtures/seed.yaml");

/// Load the bundled sample fixture
pub async fn load_sample_data(store: &Store, bcrypt_cost: u32) -> Result<usize, StoreError> {
    load_fixture(store, SAMPLE_FIXTURE, bcrypt_cost).await
}

/// Parse a YAML fixture and put every record into the store
pub async fn load_fixture(store: &Store, yaml: &str, bcrypt_cost: u32) -> Result<usize, StoreError> {
    let fixture: BTreeMap<String, Vec<Value>> =
        serde_yaml::from_str(yaml).map_err(|e| StoreError::Seed(format!("invalid fixture: {}", e)))?;

    let mut loaded = 0;
    for (name, records) in fixture {
        let collection = Collection::from_name(&name)
            .ok_or_else(|| StoreError::Seed(format!("unknown collection '{}'", name)))?;

        for value in records {
            let Value::Object(map) = value else {
                return Err(StoreError::Seed(format!("{} entries must be objects", name)));
            };
            let mut record = Record::from_stored(map);
            let id = record
                .id()
                .map(str::to_string)
                .ok_or_else(|| StoreError::Seed(format!("{} entry without id", name)))?;

            if collection == Collection::Users {
                if let Some(Value::String(plain)) = record.remove("password") {
                    let hashed = password::hash(plain, bcrypt_cost)
                        .await
                        .map_err(|e| StoreError::Seed(format!("hashing password for {}: {}", id, e)))?;
                    record.set("password", hashed);
                }
            }

            store.put(collection, id, record).await;
            loaded += 1;
        }
    }

    tracing::info!(records = loaded, "sample data loaded");
    Ok(loaded)
}
