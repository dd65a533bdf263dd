//! 中间件

pub mod cache;

pub use cache::CacheMiddleware;
