//! REST and SSE surface.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /api/tools/execute/{*target}` | run a tool, streamed as SSE |
//! | `GET /api/tools` | paginated tool summaries |
//! | `GET /api/packages`, `GET /api/packages/{*name}` | package catalog |
//! | `GET /health` | liveness |
//! | `GET /swagger-ui` | OpenAPI docs |

mod docs;
pub mod dto;
pub mod envelope;
mod error;
pub mod rate_limit;
mod router;
pub mod routes;
mod state;

pub use envelope::{ApiError, ApiSuccess, ErrorCode};
pub use error::ServerError;
pub use rate_limit::{RateDecision, RateLimiter};
pub use router::{build_router, serve};
pub use state::ServerState;
