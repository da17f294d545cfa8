//! Chat relay service.
//!
//! A small HTTP proxy holding shared upstream keys. Clients without a key of
//! their own post here; the relay picks a model, applies the trial rate
//! limit to the gateway provider, and normalizes replies to `{reply}` and
//! failures to `{error}`.

pub mod models;
pub mod rate_limit;
pub mod server;
pub mod types;

pub use models::RelayModel;
pub use rate_limit::{InMemoryRateLimitStore, RateLimitConfig, RateLimitStore};
pub use server::{
    GATEWAY_PROVIDER, OPENROUTER_PROVIDER, RelayError, RelayState, RouteError, caller_key, router,
    serve,
};
pub use types::{HealthBody, RelayErrorBody, RelayReply, RelayRequest};
