pub mod client;
pub mod http;

pub use client::{ApiError, ApiResult, UserApi};
pub use http::HttpUserApi;
