//! 行情数据源模块
//!
//! 通过 `PriceFetcher` 抽象外部数据源，生产环境使用 Yahoo Finance，测试中可替换为固定数据

pub mod yahoo;

use anyhow::Result;
use async_trait::async_trait;
use crate::models::PriceSeries;

pub use yahoo::YahooFetcher;

/// 历史行情数据源
///
/// 三种结果：空序列（无效代码、已退市或区间内无数据）、非空序列、错误。
/// 实现不做重试，`start` / `end` 原样由实现解释。
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    async fn fetch(
        &self,
        symbol: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<PriceSeries>;
}
