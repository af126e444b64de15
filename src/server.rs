// server.rs - Router assembly
//
// Public routes → protected routes (JWT, then tenant scope) → account and
// billing routes (JWT only) → WebSocket and static uploads.

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::handlers::{protected, public, realtime};
use crate::middleware::{jwt_auth_middleware, tenant_middleware};
use crate::state::AppState;

/// Build the full application router around `state`
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.server.max_request_size_bytes;
    let uploads = ServeDir::new(&state.config.server.uploads_dir);

    Router::new()
        .merge(public_routes())
        .merge(account_routes(&state))
        .merge(tenant_routes(&state))
        .route("/ws", get(realtime::ws_handler))
        .nest_service("/uploads", uploads)
        .fallback(|| async { ApiError::not_found("Route not found") })
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(public::health))
        .route("/api/auth/login", post(public::login))
}

/// Routes that need an authenticated user but no tenant scope
fn account_routes(state: &AppState) -> Router<AppState> {
    use protected::{auth, billing};

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/profile", put(auth::profile))
        .route("/api/auth/change-password", put(auth::change_password))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/billing/school/:schoolId", get(billing::school))
        .route("/api/billing/school/:schoolId/subscription", put(billing::subscription))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

/// Routes scoped to a school; the JWT layer runs before the tenant layer
fn tenant_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(school_routes())
        .merge(roster_routes())
        .merge(classroom_routes())
        .merge(messaging_routes())
        .route_layer(from_fn_with_state(state.clone(), tenant_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

fn school_routes() -> Router<AppState> {
    use protected::{schools, users};

    Router::new()
        .route("/api/schools", get(schools::list).post(schools::create))
        .route("/api/schools/:id", get(schools::get).put(schools::update))
        .route("/api/schools/:id/stats", get(schools::stats))
        .route("/api/schools/:id/users", get(schools::users))
        .route("/api/schools/:id/subscription", put(schools::subscription))
        .route("/api/users", get(users::list))
        .route("/api/users/:id", get(users::get).put(users::update).delete(users::delete))
}

fn roster_routes() -> Router<AppState> {
    use protected::{classes, students, teachers};

    Router::new()
        .route("/api/students", get(students::list).post(students::create))
        .route(
            "/api/students/:id",
            get(students::get).put(students::update).delete(students::delete),
        )
        .route("/api/teachers", get(teachers::list).post(teachers::create))
        .route(
            "/api/teachers/:id",
            get(teachers::get).put(teachers::update).delete(teachers::delete),
        )
        .route("/api/classes", get(classes::list).post(classes::create))
        .route(
            "/api/classes/:id",
            get(classes::get).put(classes::update).delete(classes::delete),
        )
}

fn classroom_routes() -> Router<AppState> {
    use protected::{assignments, attendance, documents, reports};

    Router::new()
        .route(
            "/api/attendance/class/:classId/:date",
            get(attendance::get_class).post(attendance::mark_class),
        )
        .route("/api/attendance/student/:studentId", get(attendance::get_student))
        .route("/api/assignments", post(assignments::create))
        .route("/api/assignments/class/:classId", get(assignments::list_for_class))
        .route("/api/assignments/student/:studentId", get(assignments::list_for_student))
        .route("/api/assignments/:id", put(assignments::update).delete(assignments::delete))
        .route("/api/reports/attendance", post(reports::attendance))
        .route("/api/reports/performance", post(reports::performance))
        .route("/api/documents", get(documents::list))
        .route("/api/documents/download/:id", get(documents::download))
        .route("/api/documents/:id", get(documents::get).delete(documents::delete))
}

fn messaging_routes() -> Router<AppState> {
    use protected::{ai, chat, notifications};

    Router::new()
        .route("/api/notifications", get(notifications::list).post(notifications::create))
        .route("/api/notifications/announce", post(notifications::announce))
        .route("/api/notifications/unread/count", get(notifications::unread_count))
        .route("/api/notifications/read-all", put(notifications::mark_all_read))
        .route("/api/notifications/:id", delete(notifications::delete))
        .route("/api/notifications/:id/read", put(notifications::mark_read))
        .route("/api/chat/history", get(chat::history).delete(chat::clear))
        .route("/api/ai/chat", post(ai::chat))
        .route("/api/ai/generate-document", post(ai::generate_document))
        .route("/api/ai/chat-history", get(ai::chat_history).delete(ai::clear_history))
        .route("/api/ai/suggestions", get(ai::suggestions))
        .route("/api/ai/voice", post(ai::voice))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if security.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
