pub mod common;
pub mod config;
pub mod context;
pub mod error;
pub mod network;
pub mod state;
pub mod sync;

pub use context::AppContext;
pub use error::{ApiError, ErrorKind};
