pub mod error;
pub mod handlers;
pub mod pagination;
pub mod server;
pub mod wire;

pub use error::ApiError;
pub use pagination::{Page, PageLimits, PageParams};
pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};
