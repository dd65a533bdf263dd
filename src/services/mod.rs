//! 业务逻辑服务模块
//!
//! 封装数据获取、统计计算和响应缓存

pub mod cache;          // 响应缓存
pub mod price;          // 行情数据源
pub mod stats_service;  // 区间统计
