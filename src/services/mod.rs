pub mod api;
pub mod normalize;
pub mod payload;
pub mod session;
pub mod storage;
pub mod value;
