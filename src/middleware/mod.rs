pub mod auth;
pub mod response;
pub mod tenant;

pub use auth::{authenticate, jwt_auth_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use tenant::{tenant_middleware, Tenant};
