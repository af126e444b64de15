// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every handler receives the `AuthUser` extension. Handlers mounted behind the
// tenant middleware also receive the `Tenant` scope for the request.

pub mod ai;
pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod billing;
pub mod chat;
pub mod classes;
pub mod documents;
pub mod notifications;
pub mod reports;
pub mod resource;
pub mod schools;
pub mod students;
pub mod teachers;
pub mod users;
