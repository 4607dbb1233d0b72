pub mod api;
pub mod auth;
pub mod backoff;
pub mod live;
pub mod transport;

pub use api::{ApiClient, RetryPolicy};
pub use backoff::{BackoffConfig, ConnectionState, Reconnector};
pub use live::{LiveFeed, LiveSettings};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
