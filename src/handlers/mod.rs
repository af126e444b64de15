// handlers/mod.rs - HTTP and WebSocket handlers by access tier
//
// Public (no auth) → Protected (JWT auth + tenant scope) → Realtime (token in query)

pub mod protected; // JWT authentication required (/api/*)
pub mod public; // No authentication required (/api/health, /api/auth/login)
pub mod realtime; // WebSocket rooms (/ws)
