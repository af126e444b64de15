// handlers/protected/resource.rs - tenant-scoped CRUD shared by roster resources
//
// Students, teachers and classes behave identically apart from their names,
// who may write them and which event a new record announces.

use serde_json::Value;

use crate::auth::Role;
use crate::database::{Collection, Record};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Tenant};
use crate::services::notifications::NotificationEvent;
use crate::state::AppState;

pub struct ResourceSpec {
    pub collection: Collection,
    /// Envelope key for one record
    pub singular: &'static str,
    /// Envelope key for a list
    pub plural: &'static str,
    /// Capitalised name used in messages
    pub label: &'static str,
    pub writers: &'static [Role],
    pub required: &'static [&'static str],
    pub created_event: Option<NotificationEvent>,
}

impl ResourceSpec {
    /// GET /api/<plural> - records of the tenant's school
    pub async fn list(&self, state: &AppState, tenant: &Tenant) -> ApiResult {
        let records = state.store.find(self.collection, &tenant.scope(Filter::new())).await;
        Ok(ApiResponse::ok().with(self.plural, records))
    }

    /// GET /api/<plural>/:id
    pub async fn get(&self, state: &AppState, tenant: &Tenant, id: &str) -> ApiResult {
        let record = self.load(state, tenant, id).await?;
        Ok(ApiResponse::ok().with(self.singular, record))
    }

    /// POST /api/<plural> - the record always lands in the tenant's school
    pub async fn create(&self, state: &AppState, user: &AuthUser, tenant: &Tenant, body: Value) -> ApiResult {
        let created = self.insert(state, user, tenant, body).await?;

        if let (Some(event), Some(school_id)) = (self.created_event, created.school_id()) {
            state
                .notifications()
                .send_event(event, &created.clone().into_value(), school_id)
                .await;
        }

        Ok(self.created_response(created))
    }

    /// Validate and store a new record without announcing it
    pub async fn insert(&self, state: &AppState, user: &AuthUser, tenant: &Tenant, body: Value) -> Result<Record, ApiError> {
        user.require_role(self.writers)?;
        let school_id = tenant.require()?;

        let mut record = Record::from_api_input(body)?;
        record.require(self.required)?;
        record.set("schoolId", school_id);

        let created = state.store.create(self.collection, record).await;
        tracing::info!(collection = %self.collection, id = created.id().unwrap_or_default(), "record created");
        Ok(created)
    }

    pub fn created_response(&self, created: Record) -> ApiResponse {
        ApiResponse::created()
            .with(self.singular, created)
            .message(&format!("{} created successfully", self.label))
    }

    /// PUT /api/<plural>/:id - shallow merge of the provided fields
    pub async fn update(&self, state: &AppState, user: &AuthUser, tenant: &Tenant, id: &str, body: Value) -> ApiResult {
        user.require_role(self.writers)?;
        self.load(state, tenant, id).await?;

        let mut patch = Record::from_api_input(body)?;
        if !tenant.unrestricted {
            patch.remove("schoolId");
        }
        let updated = state.store.update(self.collection, id, patch).await?;

        Ok(ApiResponse::ok()
            .with(self.singular, updated)
            .message(&format!("{} updated successfully", self.label)))
    }

    /// DELETE /api/<plural>/:id
    pub async fn delete(&self, state: &AppState, user: &AuthUser, tenant: &Tenant, id: &str) -> ApiResult {
        user.require_role(self.writers)?;
        self.load(state, tenant, id).await?;

        let removed = state.store.delete(self.collection, id).await?;
        Ok(ApiResponse::ok()
            .with(self.singular, removed)
            .message(&format!("{} deleted successfully", self.label)))
    }

    /// By-id lookup that hides other schools' records
    pub async fn load(&self, state: &AppState, tenant: &Tenant, id: &str) -> Result<Record, ApiError> {
        let record = state.store.find_by_id(self.collection, id).await;
        tenant.visible(record, &format!("{} not found", self.label))
    }
}
